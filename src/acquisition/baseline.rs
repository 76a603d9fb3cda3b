use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use crate::acquisition::error::{Result, SignalError};
use crate::acquisition::store::SignalStore;
/// How far back the rolling minimum looks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum BaselineWindow {
    /// Every prior sample (`-1` in numeric form).
    Unbounded,
    /// The last `w` prior samples, `w >= 1`.
    Samples(usize),
}
impl Default for BaselineWindow {
    fn default() -> Self {
        BaselineWindow::Unbounded
    }
}
impl TryFrom<i64> for BaselineWindow {
    type Error = SignalError;
    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(BaselineWindow::Unbounded),
            w if w >= 1 => usize::try_from(w)
                .map(BaselineWindow::Samples)
                .map_err(|_| SignalError::invalid(format!("baseline window {w} is too large"))),
            w => Err(SignalError::invalid(format!(
                "baseline window must be -1 (unbounded) or at least 1, got {w}"
            ))),
        }
    }
}
impl From<BaselineWindow> for i64 {
    fn from(window: BaselineWindow) -> Self {
        match window {
            BaselineWindow::Unbounded => -1,
            BaselineWindow::Samples(w) => i64::try_from(w).unwrap_or(i64::MAX),
        }
    }
}
impl BaselineWindow {
    /// Window covering `duration_s` seconds of a time axis sampled every `time_step_s`.
    pub fn from_duration(duration_s: f64, time_step_s: f64) -> Result<Self> {
        if !(duration_s > 0.0) || !duration_s.is_finite() {
            return Err(SignalError::invalid(format!(
                "baseline duration must be positive, got {duration_s}"
            )));
        }
        if !(time_step_s > 0.0) {
            return Err(SignalError::invalid(format!(
                "time step must be positive, got {time_step_s}"
            )));
        }
        let bins = (duration_s / time_step_s).floor();
        if bins < 1.0 {
            return Err(SignalError::invalid(format!(
                "baseline duration {duration_s} s is shorter than one sample ({time_step_s} s)"
            )));
        }
        Ok(BaselineWindow::Samples(bins as usize))
    }
}
/// Window given either directly or as a duration resolved against the time axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSpan {
    Samples(BaselineWindow),
    Duration(f64), // seconds
}
impl Default for BaselineSpan {
    fn default() -> Self {
        BaselineSpan::Samples(BaselineWindow::Unbounded)
    }
}
impl BaselineSpan {
    pub fn resolve(&self, store: &SignalStore) -> Result<BaselineWindow> {
        match *self {
            BaselineSpan::Samples(window) => Ok(window),
            BaselineSpan::Duration(duration_s) => {
                BaselineWindow::from_duration(duration_s, store.time_step()?)
            }
        }
    }
}
/// Rolling-minimum baseline of `original`: `out[0] = 0`, and for `i >= 1`
/// `out[i] = original[i] - min(original[lo..i])` with `lo` set by the window.
pub fn baseline_restored(original: &[f64], window: BaselineWindow) -> Vec<f64> {
    let mut out = vec![0.0; original.len()];
    let mut minima: VecDeque<usize> = VecDeque::new(); // indices with increasing values
    for i in 1..original.len() {
        let newest = i - 1;
        while minima
            .back()
            .map_or(false, |&j| original[j] >= original[newest])
        {
            minima.pop_back();
        }
        minima.push_back(newest);
        if let BaselineWindow::Samples(w) = window {
            let lo = i.saturating_sub(w);
            while minima.front().map_or(false, |&j| j < lo) {
                minima.pop_front();
            }
        }
        if let Some(&j) = minima.front() {
            out[i] = original[i] - original[j];
        }
    }
    out
}
/// In-place form of [`baseline_restored`], reading only the pre-call samples.
pub fn restore_baseline(samples: &mut [f64], window: BaselineWindow) {
    let restored = baseline_restored(samples, window);
    samples.copy_from_slice(&restored);
}
impl SignalStore {
    pub fn apply_baseline_restoration(&mut self, window: BaselineWindow) -> Result<()> {
        self.try_for_each_channel(|_, samples| {
            restore_baseline(samples, window);
            Ok(())
        })?;
        log::debug!("baseline restoration ({window:?}) applied to all channels");
        Ok(())
    }
    pub fn apply_baseline_restoration_to_signal(&mut self, name: &str, window: BaselineWindow) -> Result<()> {
        restore_baseline(self.signal_mut(name)?, window);
        log::debug!("baseline restoration ({window:?}) applied to '{name}'");
        Ok(())
    }
}
