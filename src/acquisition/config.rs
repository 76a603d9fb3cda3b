use std::collections::HashSet;
use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::acquisition::baseline::{BaselineSpan, BaselineWindow};
use crate::acquisition::digitizer::Digitizer;
use crate::acquisition::error::{Result, SignalError};
use crate::acquisition::filter::Circuit;
use crate::acquisition::peak::{GlobalPeakLocator, PeakLocatorConfig, PeakOptions};
use crate::acquisition::store::TIME_CHANNEL;
use crate::acquisition::trigger::{DoubleThreshold, TriggerMode, TriggerWindow};
/// Noise stage applied to one channel, in listed order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoiseConfig {
    Gaussian {
        #[serde(default)]
        mean: f64,
        std_dev: f64,
    },
    Poisson,
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(default)]
    pub background: f64,
    #[serde(default)]
    pub noise: Vec<NoiseConfig>,
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggeringConfig {
    pub channel: String,
    pub detector: TriggerMode,
}
/// Everything needed to simulate one acquisition run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    pub sampling_rate_hz: f64,
    pub run_time_s: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub circuits: Vec<Circuit>,
    #[serde(default)]
    pub digitizer: Option<Digitizer>,
    pub triggering: TriggeringConfig,
    #[serde(default)]
    pub peak_locator: PeakLocatorConfig,
}
impl Default for AcquisitionConfig {
    fn default() -> Self {
        let channel = |name: &str| ChannelConfig {
            name: name.to_owned(),
            background: 0.05,
            noise: vec![NoiseConfig::Gaussian {
                mean: 0.0,
                std_dev: 0.005,
            }],
        };
        Self {
            sampling_rate_hz: 1.0e6,
            run_time_s: 2.0e-3,
            seed: Some(42),
            channels: vec![channel("FSC"), channel("SSC")],
            circuits: vec![
                Circuit::ButterworthLowPass {
                    cutoff_hz: 1.0e5,
                    order: 2,
                    gain: 1.0,
                },
                Circuit::BaselineRestoration {
                    window: BaselineSpan::Samples(BaselineWindow::Unbounded),
                },
            ],
            digitizer: None,
            triggering: TriggeringConfig {
                channel: "FSC".to_owned(),
                detector: TriggerMode::DoubleThreshold(
                    DoubleThreshold::new(0.3, TriggerWindow::new(20, 20))
                        .with_lower_threshold(0.1)
                        .with_debounce(4),
                ),
            },
            peak_locator: PeakLocatorConfig::Global(GlobalPeakLocator::new(PeakOptions {
                max_number_of_peaks: 1,
                compute_width: true,
                compute_area: true,
                ..Default::default()
            })),
        }
    }
}
impl AcquisitionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
    /// Samples in the run: `ceil(run_time * sampling_rate)`.
    pub fn n_elements(&self) -> usize {
        (self.run_time_s * self.sampling_rate_hz).ceil() as usize
    }
    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_rate_hz > 0.0) || !self.sampling_rate_hz.is_finite() {
            return Err(SignalError::invalid(format!(
                "sampling_rate_hz must be positive, got {}",
                self.sampling_rate_hz
            )));
        }
        if !(self.run_time_s > 0.0) || !self.run_time_s.is_finite() {
            return Err(SignalError::invalid(format!(
                "run_time_s must be positive, got {}",
                self.run_time_s
            )));
        }
        if self.n_elements() < 2 {
            return Err(SignalError::invalid(
                "run must span at least two samples",
            ));
        }
        if self.channels.is_empty() {
            return Err(SignalError::invalid("at least one channel is required"));
        }
        let mut names = HashSet::new();
        for channel in &self.channels {
            if channel.name == TIME_CHANNEL {
                return Err(SignalError::invalid(format!(
                    "'{TIME_CHANNEL}' is reserved for the time axis"
                )));
            }
            if !names.insert(channel.name.as_str()) {
                return Err(SignalError::AlreadyExists {
                    name: channel.name.clone(),
                });
            }
            for noise in &channel.noise {
                if let NoiseConfig::Gaussian { mean, std_dev } = *noise {
                    if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
                        return Err(SignalError::invalid(format!(
                            "channel '{}': invalid gaussian noise ({mean}, {std_dev})",
                            channel.name
                        )));
                    }
                }
            }
        }
        for circuit in &self.circuits {
            circuit.validate(self.sampling_rate_hz)?;
        }
        if let Some(digitizer) = &self.digitizer {
            digitizer.validate()?;
        }
        if !names.contains(self.triggering.channel.as_str()) {
            return Err(SignalError::UnknownDetector {
                name: self.triggering.channel.clone(),
            });
        }
        self.triggering.detector.validate()?;
        self.peak_locator.validate()
    }
}
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AcquisitionConfig> {
    let json = fs::read_to_string(path)?;
    AcquisitionConfig::from_json_str(&json)
}
pub fn save_config<P: AsRef<Path>>(config: &AcquisitionConfig, path: P) -> Result<()> {
    fs::write(path, config.to_json_string()?)?;
    Ok(())
}
