use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::acquisition::error::{Result, SignalError};
use crate::acquisition::store::SignalStore;
/// Bounds used to clip samples before quantization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Saturation {
    /// Minimum and maximum of the signal itself.
    #[default]
    Auto,
    Fixed { min: f64, max: f64 },
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DigitizerReport {
    pub min: f64,
    pub max: f64,
    pub is_saturated: bool,
}
/// Converts samples into integer codes over `2^bit_depth` levels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Digitizer {
    pub bit_depth: u32,
    #[serde(default)]
    pub saturation: Saturation,
}
impl Default for Digitizer {
    fn default() -> Self {
        Self {
            bit_depth: 10,
            saturation: Saturation::Auto,
        }
    }
}
impl Digitizer {
    pub fn new(bit_depth: u32, saturation: Saturation) -> Self {
        Self {
            bit_depth,
            saturation,
        }
    }
    pub fn levels(&self) -> u64 {
        1u64.checked_shl(self.bit_depth).unwrap_or(u64::MAX)
    }
    pub fn validate(&self) -> Result<()> {
        if !(1..=32).contains(&self.bit_depth) {
            return Err(SignalError::invalid(format!(
                "bit depth must be between 1 and 32, got {}",
                self.bit_depth
            )));
        }
        if let Saturation::Fixed { min, max } = self.saturation {
            if !(min < max) {
                return Err(SignalError::invalid(format!(
                    "saturation bounds must satisfy min < max, got ({min}, {max})"
                )));
            }
        }
        Ok(())
    }
    fn bounds(&self, samples: &[f64]) -> (f64, f64) {
        match self.saturation {
            Saturation::Fixed { min, max } => (min, max),
            Saturation::Auto if samples.is_empty() => (0.0, 0.0),
            Saturation::Auto => {
                let (lo, hi) = samples.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &v| (lo.min(v), hi.max(v)),
                );
                if lo <= hi {
                    (lo, hi)
                } else {
                    (0.0, 0.0) // no finite samples
                }
            }
        }
    }
    /// Quantize in place.
    ///
    /// Sample `x` becomes the index `i` of the first level with `x <= level[i]`,
    /// after clipping to the saturation bounds.
    pub fn digitize(&self, samples: &mut [f64]) -> Result<DigitizerReport> {
        self.validate()?;
        let (min, max) = self.bounds(samples);
        let is_saturated = samples.iter().any(|&v| v < min || v > max);
        let top = (self.levels() - 1) as f64;
        let step = (max - min) / top;
        for v in samples.iter_mut() {
            let clipped = v.clamp(min, max);
            *v = if step > 0.0 {
                ((clipped - min) / step).ceil().clamp(0.0, top)
            } else {
                0.0
            };
        }
        if is_saturated {
            log::info!("signal values have been clipped to the saturation boundaries ({min}, {max})");
        }
        Ok(DigitizerReport {
            min,
            max,
            is_saturated,
        })
    }
}
impl SignalStore {
    /// Digitize every channel; returns the report of each channel by name.
    pub fn digitize(&mut self, digitizer: &Digitizer) -> Result<BTreeMap<String, DigitizerReport>> {
        digitizer.validate()?;
        let reports = self.try_map_channels(|_, samples| digitizer.digitize(samples))?;
        log::debug!(
            "digitized {} channels at {} bits",
            reports.len(),
            digitizer.bit_depth
        );
        Ok(reports)
    }
    pub fn digitize_signal(&mut self, name: &str, digitizer: &Digitizer) -> Result<DigitizerReport> {
        digitizer.digitize(self.signal_mut(name)?)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn codes_follow_right_closed_bins() {
        let digitizer = Digitizer::new(2, Saturation::Fixed { min: 0.0, max: 3.0 });
        let mut data = vec![0.0, 0.5, 1.0, 1.2, 2.9, 3.0];
        let report = digitizer.digitize(&mut data).unwrap();
        assert_eq!(data, vec![0.0, 1.0, 1.0, 2.0, 3.0, 3.0]);
        assert!(!report.is_saturated);
    }
    #[test]
    fn out_of_range_samples_saturate() {
        let digitizer = Digitizer::new(2, Saturation::Fixed { min: 0.0, max: 3.0 });
        let mut data = vec![-4.0, 1.0, 10.0];
        let report = digitizer.digitize(&mut data).unwrap();
        assert_eq!(data, vec![0.0, 1.0, 3.0]);
        assert!(report.is_saturated);
    }
    #[test]
    fn auto_bounds_span_the_signal() {
        let digitizer = Digitizer::new(8, Saturation::Auto);
        let mut data = vec![-1.0, 0.0, 1.0];
        let report = digitizer.digitize(&mut data).unwrap();
        assert_eq!((report.min, report.max), (-1.0, 1.0));
        assert_eq!(data[0], 0.0);
        assert_eq!(data[2], 255.0);
        assert!(!report.is_saturated);
    }
    #[test]
    fn flat_signal_maps_to_zero() {
        let mut data = vec![2.0; 4];
        Digitizer::new(4, Saturation::Auto).digitize(&mut data).unwrap();
        assert_eq!(data, vec![0.0; 4]);
    }
    #[test]
    fn invalid_settings_are_rejected() {
        let mut data = vec![1.0];
        assert!(Digitizer::new(0, Saturation::Auto).digitize(&mut data).is_err());
        assert!(Digitizer::new(33, Saturation::Auto).digitize(&mut data).is_err());
        assert!(Digitizer::new(8, Saturation::Fixed { min: 1.0, max: 1.0 })
            .digitize(&mut data)
            .is_err());
    }
    #[test]
    fn store_digitizes_each_channel() {
        let mut store = SignalStore::new(3);
        store.add_time(vec![0.0, 1.0, 2.0]).unwrap();
        store.add_signal("FSC", vec![0.0, 1.0, 2.0]).unwrap();
        store.add_signal("SSC", vec![5.0, 5.0, 6.0]).unwrap();
        let reports = store.digitize(&Digitizer::new(1, Saturation::Auto)).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports["SSC"].min, 5.0);
        assert_eq!(store.get_signal("FSC").unwrap(), &[0.0, 1.0, 1.0]);
        assert_eq!(store.time().unwrap(), &[0.0, 1.0, 2.0]);
    }
    #[test]
    fn single_channel_digitization() {
        let mut store = SignalStore::new(4);
        store.add_time(vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        store.add_signal("FSC", vec![0.0, 0.5, 1.2, 3.0]).unwrap();
        store.add_signal("SSC", vec![0.25; 4]).unwrap();
        let digitizer = Digitizer::new(2, Saturation::Fixed { min: 0.0, max: 3.0 });
        let report = store.digitize_signal("FSC", &digitizer).unwrap();
        assert!(!report.is_saturated);
        assert_eq!(store.get_signal("FSC").unwrap(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(store.get_signal("SSC").unwrap(), &[0.25; 4]);
        assert_eq!(store.time().unwrap(), &[0.0, 1.0, 2.0, 3.0]);
        assert!(matches!(
            store.digitize_signal("FL1", &digitizer),
            Err(SignalError::NotFound { .. })
        ));
    }
}
