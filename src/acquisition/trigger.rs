use serde::{Deserialize, Serialize};
use crate::acquisition::error::{Result, SignalError};
/// Inclusive sample interval of one detected event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRange {
    pub start: usize,
    pub end: usize,
}
impl TriggerRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
    pub fn sample_count(&self) -> usize {
        self.end - self.start + 1
    }
}
/// Buffering and cap shared by every detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerWindow {
    pub pre_buffer: usize,
    pub post_buffer: usize,
    /// `None` or `Some(0)` accept every non-overlapping trigger.
    pub max_triggers: Option<usize>,
}
impl TriggerWindow {
    pub fn new(pre_buffer: usize, post_buffer: usize) -> Self {
        Self {
            pre_buffer,
            post_buffer,
            max_triggers: None,
        }
    }
    pub fn with_max_triggers(mut self, max_triggers: usize) -> Self {
        self.max_triggers = Some(max_triggers);
        self
    }
}
/// Turns a trigger channel into ordered, non-overlapping ranges.
pub trait TriggerDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect(&self, signal: &[f64]) -> Vec<TriggerRange>;
}
// Greedy non-overlap plus cap.
struct Accepted {
    ranges: Vec<TriggerRange>,
    cap: Option<usize>,
}
impl Accepted {
    fn new(window: &TriggerWindow) -> Self {
        Self {
            ranges: Vec::new(),
            cap: window.max_triggers.filter(|&m| m > 0),
        }
    }
    fn offer(&mut self, candidate: TriggerRange) {
        let clear = self
            .ranges
            .last()
            .map_or(true, |last| candidate.start > last.end);
        if clear {
            self.ranges.push(candidate);
        }
    }
    fn is_full(&self) -> bool {
        self.cap.map_or(false, |m| self.ranges.len() >= m)
    }
}
fn rising_edge(signal: &[f64], i: usize, threshold: f64) -> bool {
    signal[i - 1] <= threshold && signal[i] > threshold
}
// First index at or after `from` whose sample is not above `level`.
fn run_end(signal: &[f64], from: usize, level: f64) -> usize {
    signal[from..]
        .iter()
        .position(|&v| !(v > level))
        .map_or(signal.len(), |offset| from + offset)
}
fn check_threshold(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SignalError::invalid(format!("{name} must be finite, got {value}")))
    }
}
/// Fixed-length window around every rising edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedWindow {
    pub threshold: f64,
    #[serde(default)]
    pub window: TriggerWindow,
}
impl TriggerDetector for FixedWindow {
    fn name(&self) -> &'static str {
        "fixed_window"
    }
    fn detect(&self, signal: &[f64]) -> Vec<TriggerRange> {
        let n = signal.len();
        let mut accepted = Accepted::new(&self.window);
        for i in 1..n {
            if !rising_edge(signal, i, self.threshold) {
                continue;
            }
            let idx = i - 1;
            let Some(start) = idx.checked_sub(self.window.pre_buffer) else {
                continue;
            };
            let Some(end) = idx.checked_add(self.window.post_buffer) else {
                continue;
            };
            if end >= n {
                continue;
            }
            accepted.offer(TriggerRange::new(start, end));
            if accepted.is_full() {
                break;
            }
        }
        accepted.ranges
    }
}
/// Window stretched over the time the signal stays above threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DynamicWindow {
    pub threshold: f64,
    #[serde(default)]
    pub window: TriggerWindow,
}
impl TriggerDetector for DynamicWindow {
    fn name(&self) -> &'static str {
        "dynamic_window"
    }
    fn detect(&self, signal: &[f64]) -> Vec<TriggerRange> {
        let n = signal.len();
        let mut accepted = Accepted::new(&self.window);
        let mut i = 1;
        while i < n {
            if !rising_edge(signal, i, self.threshold) {
                i += 1;
                continue;
            }
            let start = i.saturating_sub(self.window.pre_buffer);
            let j = run_end(signal, i, self.threshold);
            let end = (j - 1).saturating_add(self.window.post_buffer).min(n - 1);
            accepted.offer(TriggerRange::new(start, end));
            if accepted.is_full() {
                break;
            }
            i = j + 1;
        }
        accepted.ranges
    }
}
/// Hysteresis detector: arms above `threshold`, closes below `lower_threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoubleThreshold {
    pub threshold: f64,
    /// Falls back to `threshold` when unset or NaN.
    #[serde(default)]
    pub lower_threshold: Option<f64>,
    #[serde(default)]
    pub debounce_enabled: bool,
    #[serde(default)]
    pub min_window_duration: Option<usize>, // samples
    #[serde(default)]
    pub window: TriggerWindow,
}
impl DoubleThreshold {
    pub fn new(threshold: f64, window: TriggerWindow) -> Self {
        Self {
            threshold,
            lower_threshold: None,
            debounce_enabled: false,
            min_window_duration: None,
            window,
        }
    }
    pub fn with_lower_threshold(mut self, lower_threshold: f64) -> Self {
        self.lower_threshold = Some(lower_threshold);
        self
    }
    pub fn with_debounce(mut self, min_window_duration: usize) -> Self {
        self.debounce_enabled = true;
        self.min_window_duration = Some(min_window_duration);
        self
    }
    pub fn effective_lower_threshold(&self) -> f64 {
        self.lower_threshold
            .filter(|v| !v.is_nan())
            .unwrap_or(self.threshold)
    }
}
impl TriggerDetector for DoubleThreshold {
    fn name(&self) -> &'static str {
        "double_threshold"
    }
    fn detect(&self, signal: &[f64]) -> Vec<TriggerRange> {
        let n = signal.len();
        let lower = self.effective_lower_threshold();
        let debounce = self
            .min_window_duration
            .filter(|_| self.debounce_enabled);
        let mut accepted = Accepted::new(&self.window);
        let mut i = 1;
        while i < n {
            if !rising_edge(signal, i, self.threshold) {
                i += 1;
                continue;
            }
            let j = match debounce {
                Some(min_duration) => {
                    let above = run_end(signal, i, self.threshold) - i;
                    if above < min_duration {
                        i += above + 1;
                        continue;
                    }
                    i + min_duration.max(1)
                }
                None => run_end(signal, i, self.threshold),
            };
            let start = i.saturating_sub(self.window.pre_buffer);
            let k = run_end(signal, j.min(n), lower);
            let end = (k - 1).saturating_add(self.window.post_buffer).min(n - 1);
            accepted.offer(TriggerRange::new(start, end));
            if accepted.is_full() {
                break;
            }
            i = k + 1;
        }
        accepted.ranges
    }
}
/// Detector selection, as read from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TriggerMode {
    FixedWindow(FixedWindow),
    DynamicWindow(DynamicWindow),
    DoubleThreshold(DoubleThreshold),
}
impl TriggerMode {
    pub fn validate(&self) -> Result<()> {
        match self {
            TriggerMode::FixedWindow(p) => check_threshold("threshold", p.threshold),
            TriggerMode::DynamicWindow(p) => check_threshold("threshold", p.threshold),
            TriggerMode::DoubleThreshold(p) => {
                check_threshold("threshold", p.threshold)?;
                match p.lower_threshold {
                    Some(lower) if !lower.is_nan() => check_threshold("lower_threshold", lower),
                    _ => Ok(()),
                }
            }
        }
    }
    pub fn window(&self) -> &TriggerWindow {
        match self {
            TriggerMode::FixedWindow(p) => &p.window,
            TriggerMode::DynamicWindow(p) => &p.window,
            TriggerMode::DoubleThreshold(p) => &p.window,
        }
    }
    pub fn build(&self) -> Box<dyn TriggerDetector> {
        match *self {
            TriggerMode::FixedWindow(p) => Box::new(p),
            TriggerMode::DynamicWindow(p) => Box::new(p),
            TriggerMode::DoubleThreshold(p) => Box::new(p),
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn assert_non_overlapping(ranges: &[TriggerRange], n: usize) {
        for range in ranges {
            assert!(range.start <= range.end && range.end < n);
        }
        for pair in ranges.windows(2) {
            assert!(pair[1].start > pair[0].end, "{pair:?} overlap");
        }
    }
    fn pulses(n: usize, every: usize, width: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i % every >= 1 && i % every <= width { 5.0 } else { 0.0 })
            .collect()
    }
    #[test]
    fn fixed_window_records_crossing_one_sample_early() {
        let signal = [0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0, 3.0, 3.0, 0.0];
        let detector = FixedWindow {
            threshold: 1.0,
            window: TriggerWindow::new(0, 0),
        };
        assert_eq!(
            detector.detect(&signal),
            vec![TriggerRange::new(1, 1), TriggerRange::new(7, 7)]
        );
    }
    #[test]
    fn fixed_window_drops_ranges_outside_signal() {
        let signal = [0.0, 2.0, 0.0, 0.0, 2.0];
        let detector = FixedWindow {
            threshold: 1.0,
            window: TriggerWindow::new(1, 2),
        };
        assert!(detector.detect(&signal).is_empty());
        let detector = FixedWindow {
            threshold: 1.0,
            window: TriggerWindow::new(0, 1),
        };
        assert_eq!(
            detector.detect(&signal),
            vec![TriggerRange::new(0, 1), TriggerRange::new(3, 4)]
        );
    }
    #[test]
    fn fixed_window_suppresses_overlap() {
        let signal = [0.0, 2.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0];
        let detector = FixedWindow {
            threshold: 1.0,
            window: TriggerWindow::new(0, 3),
        };
        assert_eq!(detector.detect(&signal), vec![TriggerRange::new(0, 3)]);
    }
    #[test]
    fn dynamic_window_tracks_pulse_width() {
        let signal = [0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0, 3.0, 3.0, 0.0];
        let detector = DynamicWindow {
            threshold: 1.0,
            window: TriggerWindow::new(1, 1),
        };
        assert_eq!(
            detector.detect(&signal),
            vec![TriggerRange::new(1, 5), TriggerRange::new(7, 10)]
        );
    }
    #[test]
    fn dynamic_window_clamps_at_signal_end() {
        let signal = [0.0, 2.0, 2.0, 2.0];
        let detector = DynamicWindow {
            threshold: 1.0,
            window: TriggerWindow::new(5, 5),
        };
        assert_eq!(detector.detect(&signal), vec![TriggerRange::new(0, 3)]);
    }
    #[test]
    fn double_threshold_debounce_rejects_blip() {
        let blip = [0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0];
        let detector = DoubleThreshold::new(1.0, TriggerWindow::default()).with_debounce(3);
        assert!(detector.detect(&blip).is_empty());
        let sustained = [0.0, 0.0, 5.0, 5.0, 5.0, 0.0, 0.0];
        assert_eq!(detector.detect(&sustained), vec![TriggerRange::new(2, 4)]);
        let without_debounce = DoubleThreshold::new(1.0, TriggerWindow::default());
        assert_eq!(without_debounce.detect(&blip), vec![TriggerRange::new(2, 2)]);
    }
    #[test]
    fn double_threshold_extends_with_lower_threshold() {
        let signal = [0.0, 3.0, 3.0, 1.5, 1.5, 0.2, 0.0, 0.0];
        let detector = DoubleThreshold::new(2.0, TriggerWindow::new(0, 1)).with_lower_threshold(1.0);
        assert_eq!(detector.detect(&signal), vec![TriggerRange::new(1, 5)]);
        let nan_lower = DoubleThreshold::new(2.0, TriggerWindow::new(0, 1)).with_lower_threshold(f64::NAN);
        assert_eq!(nan_lower.detect(&signal), vec![TriggerRange::new(1, 3)]);
    }
    #[test]
    fn trigger_cap_limits_every_detector() {
        let signal = pulses(400, 20, 4);
        let window = TriggerWindow::new(0, 2).with_max_triggers(3);
        let detectors: Vec<Box<dyn TriggerDetector>> = vec![
            Box::new(FixedWindow { threshold: 1.0, window }),
            Box::new(DynamicWindow { threshold: 1.0, window }),
            Box::new(DoubleThreshold::new(1.0, window).with_debounce(2)),
        ];
        for detector in &detectors {
            let ranges = detector.detect(&signal);
            assert_eq!(ranges.len(), 3, "{}", detector.name());
            assert_non_overlapping(&ranges, signal.len());
        }
    }
    #[test]
    fn zero_cap_means_unlimited() {
        let signal = pulses(400, 20, 4);
        let detector = DynamicWindow {
            threshold: 1.0,
            window: TriggerWindow::new(3, 3).with_max_triggers(0),
        };
        let ranges = detector.detect(&signal);
        assert_eq!(ranges.len(), 20);
        assert_non_overlapping(&ranges, signal.len());
    }
    #[test]
    fn wide_buffers_never_overlap() {
        let signal = pulses(300, 7, 2);
        let window = TriggerWindow::new(4, 6);
        for mode in [
            TriggerMode::FixedWindow(FixedWindow { threshold: 1.0, window }),
            TriggerMode::DynamicWindow(DynamicWindow { threshold: 1.0, window }),
            TriggerMode::DoubleThreshold(DoubleThreshold::new(1.0, window)),
        ] {
            let ranges = mode.build().detect(&signal);
            assert!(!ranges.is_empty());
            assert_non_overlapping(&ranges, signal.len());
        }
    }
    #[test]
    fn short_signals_produce_nothing() {
        let detector = DynamicWindow {
            threshold: 0.0,
            window: TriggerWindow::default(),
        };
        assert!(detector.detect(&[]).is_empty());
        assert!(detector.detect(&[1.0]).is_empty());
    }
    #[test]
    fn huge_post_buffer_stays_inside_signal() {
        let signal = [0.0, 2.0, 2.0, 0.0, 2.0, 0.0];
        let window = TriggerWindow::new(0, usize::MAX);
        let fixed = FixedWindow { threshold: 1.0, window };
        assert!(fixed.detect(&signal).is_empty());
        let detectors: Vec<Box<dyn TriggerDetector>> = vec![
            Box::new(DynamicWindow { threshold: 1.0, window }),
            Box::new(DoubleThreshold::new(1.0, window)),
            Box::new(DoubleThreshold::new(1.0, window).with_debounce(2)),
        ];
        for detector in &detectors {
            let ranges = detector.detect(&signal);
            assert_eq!(ranges, vec![TriggerRange::new(1, 5)], "{}", detector.name());
            assert_eq!(ranges[0].sample_count(), 5);
        }
        let mode: TriggerMode = serde_json::from_str(
            r#"{"mode": "dynamic_window", "threshold": 1.0, "window": {"post_buffer": 18446744073709551615}}"#,
        )
        .unwrap();
        mode.validate().unwrap();
        assert_eq!(mode.window().post_buffer, usize::MAX);
        let ranges = mode.build().detect(&[0.0, 2.0, 2.0, 0.0]);
        assert_eq!(ranges, vec![TriggerRange::new(1, 3)]);
    }
    #[test]
    fn trigger_mode_from_json() {
        let mode: TriggerMode = serde_json::from_str(
            r#"{"mode": "double_threshold", "threshold": 2.0, "lower_threshold": 1.0,
                "debounce_enabled": true, "min_window_duration": 4,
                "window": {"pre_buffer": 8, "post_buffer": 8, "max_triggers": 10}}"#,
        )
        .unwrap();
        match mode {
            TriggerMode::DoubleThreshold(p) => {
                assert_eq!(p.effective_lower_threshold(), 1.0);
                assert_eq!(p.min_window_duration, Some(4));
                assert_eq!(p.window.max_triggers, Some(10));
            }
            other => panic!("unexpected mode {other:?}"),
        }
        assert!(TriggerMode::FixedWindow(FixedWindow {
            threshold: f64::INFINITY,
            window: TriggerWindow::default()
        })
        .validate()
        .is_err());
    }
}
