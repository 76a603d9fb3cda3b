use crate::acquisition::error::{Result, SignalError};
use crate::acquisition::segment::SegmentedSignals;
use crate::acquisition::store::SignalStore;
use crate::acquisition::trigger::{TriggerDetector, TriggerMode, TriggerRange};
/// Runs one detector over a nominated channel and slices every channel by the result.
pub struct TriggeringSystem {
    trigger_channel: String,
    detector: Box<dyn TriggerDetector>,
    ranges: Vec<TriggerRange>,
    segments: SegmentedSignals,
}
impl TriggeringSystem {
    pub fn new(trigger_channel: impl Into<String>, detector: Box<dyn TriggerDetector>) -> Self {
        Self {
            trigger_channel: trigger_channel.into(),
            detector,
            ranges: Vec::new(),
            segments: SegmentedSignals::default(),
        }
    }
    pub fn from_mode(trigger_channel: impl Into<String>, mode: &TriggerMode) -> Result<Self> {
        mode.validate()?;
        let window = mode.window();
        log::debug!(
            "trigger window: {} samples before, {} after, cap {:?}",
            window.pre_buffer,
            window.post_buffer,
            window.max_triggers
        );
        Ok(Self::new(trigger_channel, mode.build()))
    }
    pub fn trigger_channel(&self) -> &str {
        &self.trigger_channel
    }
    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }
    /// Detect on the trigger channel, then extract every channel. Previous output is discarded.
    pub fn run(&mut self, store: &SignalStore) -> Result<&SegmentedSignals> {
        self.ranges.clear();
        self.segments = SegmentedSignals::default();
        store.time()?;
        if !store.has_signal(&self.trigger_channel) {
            return Err(SignalError::UnknownDetector {
                name: self.trigger_channel.clone(),
            });
        }
        let signal = store.get_signal(&self.trigger_channel)?;
        self.ranges = self.detector.detect(signal);
        if self.ranges.is_empty() {
            log::warn!(
                "{} found no triggers on '{}'",
                self.detector.name(),
                self.trigger_channel
            );
        } else {
            log::debug!(
                "{} accepted {} triggers on '{}'",
                self.detector.name(),
                self.ranges.len(),
                self.trigger_channel
            );
        }
        self.segments = SegmentedSignals::extract(store, &self.ranges)?;
        Ok(&self.segments)
    }
    pub fn ranges(&self) -> &[TriggerRange] {
        &self.ranges
    }
    pub fn segments(&self) -> &SegmentedSignals {
        &self.segments
    }
    /// Hand over the last output, leaving the system empty.
    pub fn take_segments(&mut self) -> SegmentedSignals {
        self.ranges.clear();
        std::mem::take(&mut self.segments)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::store::uniform_time_axis;
    use crate::acquisition::trigger::{DoubleThreshold, FixedWindow, TriggerWindow};
    fn store() -> SignalStore {
        let signal = vec![0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0, 3.0, 3.0, 0.0];
        let mut store = SignalStore::new(signal.len());
        store
            .add_time(uniform_time_axis(signal.len(), 10.0).unwrap())
            .unwrap();
        store.add_signal("FSC", signal).unwrap();
        store.add_signal("SSC", vec![1.0; 11]).unwrap();
        store
    }
    fn fixed(pre: usize, post: usize) -> TriggerMode {
        TriggerMode::FixedWindow(FixedWindow {
            threshold: 1.0,
            window: TriggerWindow::new(pre, post),
        })
    }
    #[test]
    fn run_extracts_all_channels() {
        let mut system = TriggeringSystem::from_mode("FSC", &fixed(0, 1)).unwrap();
        let segments = system.run(&store()).unwrap();
        assert_eq!(segments.segment_ids(), &[0, 0, 1, 1]);
        assert_eq!(segments.signal("FSC").unwrap(), &[0.0, 2.0, 0.0, 3.0]);
        assert_eq!(segments.signal("SSC").unwrap(), &[1.0; 4]);
        assert_eq!(
            system.ranges(),
            &[TriggerRange::new(1, 2), TriggerRange::new(7, 8)]
        );
    }
    #[test]
    fn rerun_replaces_previous_output() {
        let store = store();
        let mut system = TriggeringSystem::from_mode("FSC", &fixed(0, 0)).unwrap();
        system.run(&store).unwrap();
        system.run(&store).unwrap();
        assert_eq!(system.ranges().len(), 2);
        assert_eq!(system.segments().time().len(), 2);
    }
    #[test]
    fn unknown_channel_and_missing_time_are_errors() {
        let mut system = TriggeringSystem::from_mode("FL3", &fixed(0, 0)).unwrap();
        assert!(matches!(
            system.run(&store()),
            Err(SignalError::UnknownDetector { .. })
        ));
        let mut bare = SignalStore::new(4);
        bare.create_zero_signal("FL3").unwrap();
        assert!(matches!(system.run(&bare), Err(SignalError::MissingTimeAxis)));
    }
    #[test]
    fn zero_triggers_is_an_empty_result() {
        let mode = TriggerMode::DoubleThreshold(
            DoubleThreshold::new(10.0, TriggerWindow::default()).with_debounce(3),
        );
        let mut system = TriggeringSystem::from_mode("FSC", &mode).unwrap();
        let segments = system.run(&store()).unwrap();
        assert!(segments.is_empty());
        assert!(segments.signal("SSC").unwrap().is_empty());
        assert_eq!(system.detector_name(), "double_threshold");
    }
}
