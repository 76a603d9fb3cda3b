use std::collections::HashMap;
use crate::acquisition::error::{Result, SignalError};
/// Parallel pulse descriptors for one channel: width, center and amplitude.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PulseTrain {
    pub widths: Vec<f64>,  // seconds (sigma)
    pub centers: Vec<f64>, // seconds
    pub amplitudes: Vec<f64>,
}
impl PulseTrain {
    pub fn new(widths: Vec<f64>, centers: Vec<f64>, amplitudes: Vec<f64>) -> Result<Self> {
        let train = Self {
            widths,
            centers,
            amplitudes,
        };
        train.validate()?;
        Ok(train)
    }
    pub fn validate(&self) -> Result<()> {
        validate_shape(&self.widths, &self.centers, &self.amplitudes)
    }
    pub fn len(&self) -> usize {
        self.centers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
    /// Keep only pulses centered inside `[0, run_time]`.
    pub fn within(&self, run_time: f64) -> Self {
        let mut out = Self::default();
        for ((&width, &center), &amplitude) in self
            .widths
            .iter()
            .zip(&self.centers)
            .zip(&self.amplitudes)
        {
            if (0.0..=run_time).contains(&center) {
                out.widths.push(width);
                out.centers.push(center);
                out.amplitudes.push(amplitude);
            }
        }
        out
    }
}
pub(crate) fn validate_shape(widths: &[f64], centers: &[f64], amplitudes: &[f64]) -> Result<()> {
    if widths.len() != centers.len() || centers.len() != amplitudes.len() {
        return Err(SignalError::ShapeMismatch {
            widths: widths.len(),
            centers: centers.len(),
            amplitudes: amplitudes.len(),
        });
    }
    Ok(())
}
/// Supplier of per-particle pulses (arrival time, duration and coupling power).
pub trait ParticleSource {
    fn pulses_for(&mut self, channel: &str, run_time: f64) -> Result<PulseTrain>;
}
/// In-memory source serving fixed pulse trains, for tests and deterministic playback.
///
/// Channels without a dedicated train get the shared one, if any.
#[derive(Clone, Debug, Default)]
pub struct ManualParticleSource {
    shared: Option<PulseTrain>,
    per_channel: HashMap<String, PulseTrain>,
}
impl ManualParticleSource {
    pub fn new(shared: PulseTrain) -> Self {
        Self {
            shared: Some(shared),
            per_channel: HashMap::new(),
        }
    }
    pub fn with_channel(mut self, channel: impl Into<String>, train: PulseTrain) -> Self {
        self.per_channel.insert(channel.into(), train);
        self
    }
    /// Evenly spaced pulses of equal width and amplitude.
    pub fn evenly_spaced(count: usize, run_time: f64, width: f64, amplitude: f64) -> Self {
        let spacing = run_time / (count as f64 + 1.0);
        let centers = (1..=count).map(|k| k as f64 * spacing).collect();
        Self::new(PulseTrain {
            widths: vec![width; count],
            centers,
            amplitudes: vec![amplitude; count],
        })
    }
}
impl ParticleSource for ManualParticleSource {
    fn pulses_for(&mut self, channel: &str, run_time: f64) -> Result<PulseTrain> {
        let train = self
            .per_channel
            .get(channel)
            .or(self.shared.as_ref())
            .cloned()
            .unwrap_or_default();
        train.validate()?;
        Ok(train.within(run_time))
    }
}
