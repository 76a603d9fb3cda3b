use serde::{Deserialize, Serialize};
use crate::acquisition::error::{Result, SignalError};
use crate::acquisition::segment::SegmentedSignals;
/// One located peak. Padding entries carry the padding index and NaN metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakRecord {
    pub index: i64,
    pub height: f64,
    pub width: f64, // samples, NaN when not computed
    pub area: f64,  // NaN when not computed
}
impl PeakRecord {
    fn padding(padding_value: i64) -> Self {
        Self {
            index: padding_value,
            height: f64::NAN,
            width: f64::NAN,
            area: f64::NAN,
        }
    }
}
/// Settings shared by both locators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakOptions {
    pub max_number_of_peaks: usize,
    pub padding_value: i64,
    pub compute_width: bool,
    pub compute_area: bool,
    /// Fraction of the peak height bounding width and area.
    pub threshold: f64,
}
impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            max_number_of_peaks: 5,
            padding_value: -1,
            compute_width: false,
            compute_area: false,
            threshold: 0.5,
        }
    }
}
impl PeakOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_number_of_peaks == 0 {
            return Err(SignalError::invalid("max_number_of_peaks must be at least 1"));
        }
        if !self.threshold.is_finite() {
            return Err(SignalError::invalid(format!(
                "peak threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}
/// Fixed-size peak output, sorted by descending height.
#[derive(Clone, Debug, PartialEq)]
pub struct PeakTable {
    records: Vec<PeakRecord>,
    found: usize,
    has_width: bool,
    has_area: bool,
}
impl PeakTable {
    pub fn records(&self) -> &[PeakRecord] {
        &self.records
    }
    /// Number of real (non-padding) entries.
    pub fn found(&self) -> usize {
        self.found
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn indices(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.index).collect()
    }
    pub fn heights(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.height).collect()
    }
    pub fn widths(&self) -> Option<Vec<f64>> {
        self.has_width
            .then(|| self.records.iter().map(|r| r.width).collect())
    }
    pub fn areas(&self) -> Option<Vec<f64>> {
        self.has_area
            .then(|| self.records.iter().map(|r| r.area).collect())
    }
    /// Column by name: `Index`, `Height`, `Width` or `Area`.
    pub fn metric(&self, name: &str) -> Result<Vec<f64>> {
        let column: fn(&PeakRecord) -> f64 = match name {
            "Index" => |r: &PeakRecord| r.index as f64,
            "Height" => |r: &PeakRecord| r.height,
            "Width" => |r: &PeakRecord| r.width,
            "Area" => |r: &PeakRecord| r.area,
            other => {
                return Err(SignalError::invalid(format!(
                    "unknown peak metric '{other}' (expected Index, Height, Width or Area)"
                )))
            }
        };
        Ok(self.records.iter().map(column).collect())
    }
}
pub trait PeakLocator: Send + Sync {
    fn compute(&self, signal: &[f64]) -> Result<PeakTable>;
}
// First maximal index in `signal[start..end]`.
fn window_peak(signal: &[f64], start: usize, end: usize) -> usize {
    let mut best = start;
    for i in start + 1..end {
        if signal[i] > signal[best] {
            best = i;
        }
    }
    best
}
fn candidate(signal: &[f64], start: usize, end: usize, options: &PeakOptions) -> PeakRecord {
    let peak = window_peak(signal, start, end);
    let height = signal[peak];
    let mut record = PeakRecord {
        index: peak as i64,
        height,
        width: f64::NAN,
        area: f64::NAN,
    };
    if options.compute_width || options.compute_area {
        let level = options.threshold * height;
        let mut left = peak;
        while left > start && signal[left - 1] >= level {
            left -= 1;
        }
        let mut right = peak;
        while right + 1 < end && signal[right + 1] >= level {
            right += 1;
        }
        if options.compute_width {
            record.width = (right - left + 1) as f64;
        }
        if options.compute_area {
            record.area = signal[left..=right].iter().sum();
        }
    }
    record
}
fn finish(mut candidates: Vec<PeakRecord>, options: &PeakOptions) -> PeakTable {
    candidates.sort_by(|a, b| b.height.total_cmp(&a.height));
    candidates.truncate(options.max_number_of_peaks);
    let found = candidates.len();
    candidates.resize(
        options.max_number_of_peaks,
        PeakRecord::padding(options.padding_value),
    );
    PeakTable {
        records: candidates,
        found,
        has_width: options.compute_width,
        has_area: options.compute_area,
    }
}
fn check_signal(signal: &[f64]) -> Result<()> {
    if signal.is_empty() {
        return Err(SignalError::invalid("peak location needs a non-empty signal"));
    }
    Ok(())
}
/// One candidate per window of `window_size` samples, advancing by `window_step`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlidingWindowPeakLocator {
    pub window_size: usize,
    /// Defaults to `window_size`.
    #[serde(default)]
    pub window_step: Option<usize>,
    #[serde(default)]
    pub options: PeakOptions,
}
impl SlidingWindowPeakLocator {
    pub fn new(window_size: usize, options: PeakOptions) -> Self {
        Self {
            window_size,
            window_step: None,
            options,
        }
    }
    pub fn with_step(mut self, window_step: usize) -> Self {
        self.window_step = Some(window_step);
        self
    }
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SignalError::invalid("window_size must be at least 1"));
        }
        if self.window_step == Some(0) {
            return Err(SignalError::invalid("window_step must be at least 1"));
        }
        self.options.validate()
    }
}
impl PeakLocator for SlidingWindowPeakLocator {
    fn compute(&self, signal: &[f64]) -> Result<PeakTable> {
        self.validate()?;
        check_signal(signal)?;
        let step = self.window_step.unwrap_or(self.window_size);
        let candidates = (0..signal.len())
            .step_by(step)
            .map(|start| {
                let end = (start + self.window_size).min(signal.len());
                candidate(signal, start, end, &self.options)
            })
            .collect();
        Ok(finish(candidates, &self.options))
    }
}
/// Single candidate: the maximum of the whole signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalPeakLocator {
    #[serde(default)]
    pub options: PeakOptions,
}
impl GlobalPeakLocator {
    pub fn new(options: PeakOptions) -> Self {
        Self { options }
    }
}
impl PeakLocator for GlobalPeakLocator {
    fn compute(&self, signal: &[f64]) -> Result<PeakTable> {
        self.options.validate()?;
        check_signal(signal)?;
        let peak = candidate(signal, 0, signal.len(), &self.options);
        Ok(finish(vec![peak], &self.options))
    }
}
/// Locator selection, as read from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeakLocatorConfig {
    SlidingWindow(SlidingWindowPeakLocator),
    Global(GlobalPeakLocator),
}
impl Default for PeakLocatorConfig {
    fn default() -> Self {
        PeakLocatorConfig::Global(GlobalPeakLocator::default())
    }
}
impl PeakLocatorConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            PeakLocatorConfig::SlidingWindow(locator) => locator.validate(),
            PeakLocatorConfig::Global(locator) => locator.options.validate(),
        }
    }
    pub fn build(&self) -> Box<dyn PeakLocator> {
        match *self {
            PeakLocatorConfig::SlidingWindow(locator) => Box::new(locator),
            PeakLocatorConfig::Global(locator) => Box::new(locator),
        }
    }
}
/// One table per extracted segment of `channel`; indices are relative to the segment.
pub fn compute_segments(
    locator: &dyn PeakLocator,
    segments: &SegmentedSignals,
    channel: &str,
) -> Result<Vec<PeakTable>> {
    segments
        .segments(channel)?
        .map(|segment| locator.compute(segment.samples))
        .collect()
}
