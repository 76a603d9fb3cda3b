use rayon::prelude::*;
use crate::acquisition::error::Result;
use crate::acquisition::source::{validate_shape, PulseTrain};
use crate::acquisition::store::SignalStore;
/// Write `background + sum of Gaussian pulses` into `out`, one value per time stamp.
pub fn render_gaussian_pulses(
    time: &[f64],
    widths: &[f64],
    centers: &[f64],
    amplitudes: &[f64],
    background: f64,
    out: &mut [f64],
) -> Result<()> {
    validate_shape(widths, centers, amplitudes)?;
    for (sample, &t) in out.iter_mut().zip(time) {
        let mut value = background;
        for ((&width, &center), &amplitude) in widths.iter().zip(centers).zip(amplitudes) {
            let dt = t - center;
            value += amplitude * (-(dt * dt) / (2.0 * width * width)).exp();
        }
        *sample = value;
    }
    Ok(())
}
impl SignalStore {
    /// Overwrite one channel with Gaussian pulses on top of `background`.
    pub fn generate_pulses_to_signal(
        &mut self,
        name: &str,
        widths: &[f64],
        centers: &[f64],
        amplitudes: &[f64],
        background: f64,
    ) -> Result<()> {
        validate_shape(widths, centers, amplitudes)?;
        let (time, samples) = self.time_and_signal_mut(name)?;
        render_gaussian_pulses(time, widths, centers, amplitudes, background, samples)?;
        log::debug!("synthesized {} pulses into '{}'", centers.len(), name);
        Ok(())
    }
    /// Bulk form of [`SignalStore::generate_pulses_to_signal`] over every channel.
    pub fn generate_pulses(
        &mut self,
        widths: &[f64],
        centers: &[f64],
        amplitudes: &[f64],
        background: f64,
    ) -> Result<()> {
        validate_shape(widths, centers, amplitudes)?;
        let (time, channels) = self.time_and_channels_mut()?;
        channels.par_iter_mut().try_for_each(|(_, samples)| {
            render_gaussian_pulses(time, widths, centers, amplitudes, background, samples)
        })?;
        log::debug!(
            "synthesized {} pulses into {} channels",
            centers.len(),
            channels.len()
        );
        Ok(())
    }
    pub fn generate_pulse_train(&mut self, name: &str, train: &PulseTrain, background: f64) -> Result<()> {
        self.generate_pulses_to_signal(
            name,
            &train.widths,
            &train.centers,
            &train.amplitudes,
            background,
        )
    }
}
