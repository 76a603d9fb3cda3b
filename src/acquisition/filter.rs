use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use crate::acquisition::baseline::BaselineSpan;
use crate::acquisition::error::{Result, SignalError};
use crate::acquisition::fft::apply_frequency_response;
use crate::acquisition::store::SignalStore;
/// Magnitude response used by the Bessel-shaped low-pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BesselResponse {
    /// Cascaded single-pole response, same as the Butterworth-shaped stage.
    #[default]
    Cascade,
    /// Normalized Bessel polynomial, orders 1 to 4.
    Polynomial,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LowPassShape {
    Butterworth,
    Bessel(BesselResponse),
}
/// Frequency-domain low-pass stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LowPass {
    pub shape: LowPassShape,
    pub cutoff_hz: f64,
    pub order: u32,
    pub gain: f64,
}
impl LowPass {
    pub fn butterworth(cutoff_hz: f64, order: u32) -> Self {
        Self {
            shape: LowPassShape::Butterworth,
            cutoff_hz,
            order,
            gain: 1.0,
        }
    }
    pub fn bessel(cutoff_hz: f64, order: u32, response: BesselResponse) -> Self {
        Self {
            shape: LowPassShape::Bessel(response),
            cutoff_hz,
            order,
            gain: 1.0,
        }
    }
    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }
    pub fn validate(&self, sampling_rate_hz: f64) -> Result<()> {
        if !(sampling_rate_hz > 0.0) {
            return Err(SignalError::invalid(format!(
                "sampling rate must be positive, got {sampling_rate_hz}"
            )));
        }
        let nyquist_hz = sampling_rate_hz / 2.0;
        if self.cutoff_hz >= nyquist_hz {
            return Err(SignalError::InvalidCutoff {
                cutoff_hz: self.cutoff_hz,
                nyquist_hz,
            });
        }
        if !(self.cutoff_hz > 0.0) {
            return Err(SignalError::invalid(format!(
                "cutoff frequency must be positive, got {}",
                self.cutoff_hz
            )));
        }
        if self.order < 1 {
            return Err(SignalError::invalid("filter order must be at least 1"));
        }
        if self.shape == LowPassShape::Bessel(BesselResponse::Polynomial) && self.order > 4 {
            return Err(SignalError::invalid(format!(
                "bessel polynomial response supports orders 1 to 4, got {}",
                self.order
            )));
        }
        Ok(())
    }
    /// `|H(f)|` of this stage, excluding gain.
    pub fn magnitude(&self, freq_hz: f64) -> f64 {
        let ratio = freq_hz / self.cutoff_hz;
        match self.shape {
            LowPassShape::Butterworth | LowPassShape::Bessel(BesselResponse::Cascade) => {
                (1.0 / (1.0 + ratio * ratio).sqrt()).powi(self.order as i32)
            }
            LowPassShape::Bessel(BesselResponse::Polynomial) => {
                bessel_polynomial_magnitude(self.order, ratio)
            }
        }
    }
    /// Filter one buffer in place.
    pub fn apply(&self, samples: &mut [f64], sampling_rate_hz: f64) -> Result<()> {
        self.validate(sampling_rate_hz)?;
        apply_frequency_response(samples, sampling_rate_hz, self.gain, |f| self.magnitude(f));
        Ok(())
    }
}
// Reverse Bessel polynomial coefficients, highest power first.
fn bessel_coefficients(order: u32) -> &'static [f64] {
    match order {
        1 => &[1.0, 1.0],
        2 => &[1.0, 3.0, 3.0],
        3 => &[1.0, 6.0, 15.0, 15.0],
        4 => &[1.0, 10.0, 45.0, 105.0, 105.0],
        _ => &[],
    }
}
fn bessel_polynomial_magnitude(order: u32, omega: f64) -> f64 {
    let coefficients = bessel_coefficients(order);
    let Some(&dc) = coefficients.last() else {
        return 0.0;
    };
    let s = Complex64::new(0.0, omega);
    let denominator = coefficients
        .iter()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * s + c);
    dc / denominator.norm()
}
pub fn butterworth_low_pass_filter(
    samples: &mut [f64],
    sampling_rate_hz: f64,
    cutoff_hz: f64,
    order: u32,
    gain: f64,
) -> Result<()> {
    LowPass::butterworth(cutoff_hz, order)
        .with_gain(gain)
        .apply(samples, sampling_rate_hz)
}
pub fn bessel_low_pass_filter(
    samples: &mut [f64],
    sampling_rate_hz: f64,
    cutoff_hz: f64,
    order: u32,
    gain: f64,
) -> Result<()> {
    LowPass::bessel(cutoff_hz, order, BesselResponse::Cascade)
        .with_gain(gain)
        .apply(samples, sampling_rate_hz)
}
impl SignalStore {
    pub fn apply_low_pass(&mut self, filter: &LowPass, sampling_rate_hz: f64) -> Result<()> {
        filter.validate(sampling_rate_hz)?;
        self.try_for_each_channel(|_, samples| filter.apply(samples, sampling_rate_hz))?;
        log::debug!(
            "{:?} low-pass (fc {} Hz, order {}) applied to all channels",
            filter.shape,
            filter.cutoff_hz,
            filter.order
        );
        Ok(())
    }
    pub fn apply_low_pass_to_signal(
        &mut self,
        name: &str,
        filter: &LowPass,
        sampling_rate_hz: f64,
    ) -> Result<()> {
        filter.apply(self.signal_mut(name)?, sampling_rate_hz)
    }
    pub fn apply_butterworth_lowpass(
        &mut self,
        sampling_rate_hz: f64,
        cutoff_hz: f64,
        order: u32,
        gain: f64,
    ) -> Result<()> {
        self.apply_low_pass(
            &LowPass::butterworth(cutoff_hz, order).with_gain(gain),
            sampling_rate_hz,
        )
    }
    pub fn apply_bessel_lowpass(
        &mut self,
        sampling_rate_hz: f64,
        cutoff_hz: f64,
        order: u32,
        gain: f64,
    ) -> Result<()> {
        self.apply_low_pass(
            &LowPass::bessel(cutoff_hz, order, BesselResponse::Cascade).with_gain(gain),
            sampling_rate_hz,
        )
    }
}
fn unit_gain() -> f64 {
    1.0
}
/// One conditioning stage applied to every channel of a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Circuit {
    ButterworthLowPass {
        cutoff_hz: f64,
        order: u32,
        #[serde(default = "unit_gain")]
        gain: f64,
    },
    BesselLowPass {
        cutoff_hz: f64,
        order: u32,
        #[serde(default = "unit_gain")]
        gain: f64,
        #[serde(default)]
        response: BesselResponse,
    },
    BaselineRestoration {
        #[serde(default)]
        window: BaselineSpan,
    },
}
impl Circuit {
    pub fn name(&self) -> &'static str {
        match self {
            Circuit::ButterworthLowPass { .. } => "butterworth_low_pass",
            Circuit::BesselLowPass { .. } => "bessel_low_pass",
            Circuit::BaselineRestoration { .. } => "baseline_restoration",
        }
    }
    fn low_pass(&self) -> Option<LowPass> {
        match *self {
            Circuit::ButterworthLowPass {
                cutoff_hz,
                order,
                gain,
            } => Some(LowPass::butterworth(cutoff_hz, order).with_gain(gain)),
            Circuit::BesselLowPass {
                cutoff_hz,
                order,
                gain,
                response,
            } => Some(LowPass::bessel(cutoff_hz, order, response).with_gain(gain)),
            Circuit::BaselineRestoration { .. } => None,
        }
    }
    /// Check parameters that do not depend on the store contents.
    pub fn validate(&self, sampling_rate_hz: f64) -> Result<()> {
        if let Some(filter) = self.low_pass() {
            return filter.validate(sampling_rate_hz);
        }
        if let Circuit::BaselineRestoration {
            window: BaselineSpan::Duration(duration_s),
        } = *self
        {
            if !(duration_s > 0.0) {
                return Err(SignalError::invalid(format!(
                    "baseline duration must be positive, got {duration_s}"
                )));
            }
        }
        Ok(())
    }
    /// Apply this stage to every channel; the sampling rate comes from the time axis.
    pub fn process(&self, store: &mut SignalStore) -> Result<()> {
        if let Circuit::BaselineRestoration { window } = self {
            let window = window.resolve(store)?;
            return store.apply_baseline_restoration(window);
        }
        match self.low_pass() {
            Some(filter) => {
                let sampling_rate_hz = 1.0 / store.time_step()?;
                store.apply_low_pass(&filter, sampling_rate_hz)
            }
            None => Ok(()),
        }
    }
}
/// Apply circuits in order.
pub fn process_chain(circuits: &[Circuit], store: &mut SignalStore) -> Result<()> {
    for circuit in circuits {
        log::debug!("processing circuit {}", circuit.name());
        circuit.process(store)?;
    }
    Ok(())
}
