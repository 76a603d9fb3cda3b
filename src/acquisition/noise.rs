use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};
use crate::acquisition::error::{Result, SignalError};
use crate::acquisition::store::SignalStore;
/// Mean above which shot noise is drawn from the normal approximation.
pub const POISSON_NORMAL_APPROX_THRESHOLD: f64 = 1e6;
fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    if !std_dev.is_finite() || std_dev < 0.0 || !mean.is_finite() {
        return Err(SignalError::invalid(format!(
            "gaussian noise needs a finite mean and a finite, non-negative standard deviation (got {mean}, {std_dev})"
        )));
    }
    Normal::new(mean, std_dev).map_err(|e| SignalError::invalid(e.to_string()))
}
/// Add independent `Normal(mean, std_dev)` draws to every sample.
pub fn add_gaussian_noise<R: Rng + ?Sized>(
    samples: &mut [f64],
    mean: f64,
    std_dev: f64,
    rng: &mut R,
) -> Result<()> {
    let dist = normal(mean, std_dev)?;
    for v in samples.iter_mut() {
        *v += dist.sample(rng);
    }
    Ok(())
}
/// Replace every sample with a shot-noise count drawn around its value.
///
/// Below [`POISSON_NORMAL_APPROX_THRESHOLD`] the draw is `Poisson(value)`,
/// above it `round(Normal(value, sqrt(value)))`.
pub fn add_poisson_noise<R: Rng + ?Sized>(samples: &mut [f64], rng: &mut R) -> Result<()> {
    if let Some((index, &value)) = samples
        .iter()
        .enumerate()
        .find(|(_, v)| **v < 0.0 || v.is_nan())
    {
        if value.is_nan() {
            return Err(SignalError::invalid(format!(
                "poisson noise requires finite samples (index {index} is NaN)"
            )));
        }
        return Err(SignalError::NegativeValue { index, value });
    }
    for v in samples.iter_mut() {
        *v = poisson_draw(*v, rng)?;
    }
    Ok(())
}
fn poisson_draw<R: Rng + ?Sized>(value: f64, rng: &mut R) -> Result<f64> {
    if value == 0.0 {
        return Ok(0.0);
    }
    if value < POISSON_NORMAL_APPROX_THRESHOLD {
        let dist = Poisson::new(value).map_err(|e| SignalError::invalid(e.to_string()))?;
        return Ok(dist.sample(rng));
    }
    Ok(normal(value, value.sqrt())?.sample(rng).round())
}
impl SignalStore {
    pub fn add_gaussian_noise(&mut self, mean: f64, std_dev: f64) -> Result<()> {
        normal(mean, std_dev)?;
        self.try_for_each_channel_seeded(|_, samples, rng| {
            add_gaussian_noise(samples, mean, std_dev, rng)
        })?;
        log::debug!("added gaussian noise (mean {mean}, std {std_dev}) to all channels");
        Ok(())
    }
    pub fn add_gaussian_noise_to_signal(&mut self, name: &str, mean: f64, std_dev: f64) -> Result<()> {
        let (samples, rng) = self.signal_and_rng_mut(name)?;
        add_gaussian_noise(samples, mean, std_dev, rng)?;
        log::debug!("added gaussian noise (mean {mean}, std {std_dev}) to '{name}'");
        Ok(())
    }
    pub fn add_poisson_noise(&mut self) -> Result<()> {
        self.try_for_each_channel_seeded(|_, samples, rng| add_poisson_noise(samples, rng))?;
        log::debug!("added poisson noise to all channels");
        Ok(())
    }
    pub fn add_poisson_noise_to_signal(&mut self, name: &str) -> Result<()> {
        let (samples, rng) = self.signal_and_rng_mut(name)?;
        add_poisson_noise(samples, rng)?;
        log::debug!("added poisson noise to '{name}'");
        Ok(())
    }
}
