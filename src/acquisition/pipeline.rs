use std::collections::BTreeMap;
use crate::acquisition::config::{AcquisitionConfig, NoiseConfig};
use crate::acquisition::digitizer::DigitizerReport;
use crate::acquisition::error::Result;
use crate::acquisition::filter::process_chain;
use crate::acquisition::peak::{compute_segments, PeakTable};
use crate::acquisition::segment::SegmentedSignals;
use crate::acquisition::source::ParticleSource;
use crate::acquisition::store::{uniform_time_axis, SignalStore};
use crate::acquisition::trigger::TriggerRange;
use crate::acquisition::triggering::TriggeringSystem;
/// Output of one simulated acquisition.
#[derive(Debug)]
pub struct AcquisitionRun {
    pub store: SignalStore,
    pub ranges: Vec<TriggerRange>,
    pub segments: SegmentedSignals,
    pub peaks: BTreeMap<String, Vec<PeakTable>>, // channel -> one table per segment
    pub digitizer_reports: Option<BTreeMap<String, DigitizerReport>>,
}
impl AcquisitionRun {
    pub fn event_count(&self) -> usize {
        self.segments.segment_count()
    }
}
/// Synthesis, noise, conditioning, triggering and peak location for one configured run.
pub struct AcquisitionPipeline<S: ParticleSource> {
    config: AcquisitionConfig,
    source: S,
}
impl<S: ParticleSource> AcquisitionPipeline<S> {
    pub fn new(config: AcquisitionConfig, source: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, source })
    }
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }
    pub fn run(&mut self) -> Result<AcquisitionRun> {
        let mut store = self.synthesize()?;
        self.add_noise(&mut store)?;
        process_chain(&self.config.circuits, &mut store)?;
        let digitizer_reports = match &self.config.digitizer {
            Some(digitizer) => Some(store.digitize(digitizer)?),
            None => None,
        };
        let triggering = &self.config.triggering;
        let mut system = TriggeringSystem::from_mode(triggering.channel.as_str(), &triggering.detector)?;
        system.run(&store)?;
        let ranges = system.ranges().to_vec();
        let segments = system.take_segments();
        let locator = self.config.peak_locator.build();
        let mut peaks = BTreeMap::new();
        for channel in segments.channel_names() {
            let tables = compute_segments(locator.as_ref(), &segments, channel)?;
            peaks.insert(channel.to_owned(), tables);
        }
        log::info!(
            "acquisition of {} samples over {} channels: {} events on '{}'",
            store.n_elements(),
            store.channel_count(),
            ranges.len(),
            triggering.channel
        );
        Ok(AcquisitionRun {
            store,
            ranges,
            segments,
            peaks,
            digitizer_reports,
        })
    }
    fn synthesize(&mut self) -> Result<SignalStore> {
        let n = self.config.n_elements();
        let mut store = match self.config.seed {
            Some(seed) => SignalStore::with_seed(n, seed),
            None => SignalStore::new(n),
        };
        store.add_time(uniform_time_axis(n, self.config.sampling_rate_hz)?)?;
        for channel in &self.config.channels {
            store.create_zero_signal(&channel.name)?;
            let train = self
                .source
                .pulses_for(&channel.name, self.config.run_time_s)?;
            store.generate_pulse_train(&channel.name, &train, channel.background)?;
        }
        Ok(store)
    }
    fn add_noise(&self, store: &mut SignalStore) -> Result<()> {
        for channel in &self.config.channels {
            for noise in &channel.noise {
                match *noise {
                    NoiseConfig::Gaussian { mean, std_dev } => {
                        store.add_gaussian_noise_to_signal(&channel.name, mean, std_dev)?
                    }
                    NoiseConfig::Poisson => store.add_poisson_noise_to_signal(&channel.name)?,
                }
            }
        }
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::config::{ChannelConfig, TriggeringConfig};
    use crate::acquisition::digitizer::{Digitizer, Saturation};
    use crate::acquisition::peak::{GlobalPeakLocator, PeakLocatorConfig, PeakOptions};
    use crate::acquisition::source::{ManualParticleSource, PulseTrain};
    use crate::acquisition::trigger::{DynamicWindow, TriggerMode, TriggerWindow};
    fn quiet_config() -> AcquisitionConfig {
        AcquisitionConfig {
            sampling_rate_hz: 1000.0,
            run_time_s: 1.0,
            seed: Some(1),
            channels: vec![
                ChannelConfig {
                    name: "FSC".into(),
                    background: 0.0,
                    noise: vec![],
                },
                ChannelConfig {
                    name: "SSC".into(),
                    background: 0.0,
                    noise: vec![],
                },
            ],
            circuits: vec![],
            digitizer: None,
            triggering: TriggeringConfig {
                channel: "FSC".into(),
                detector: TriggerMode::DynamicWindow(DynamicWindow {
                    threshold: 0.5,
                    window: TriggerWindow::new(5, 5),
                }),
            },
            peak_locator: PeakLocatorConfig::Global(GlobalPeakLocator::new(PeakOptions {
                max_number_of_peaks: 2,
                ..Default::default()
            })),
        }
    }
    #[test]
    fn pipeline_finds_every_pulse() {
        let source = ManualParticleSource::evenly_spaced(4, 1.0, 0.003, 2.0);
        let mut pipeline = AcquisitionPipeline::new(quiet_config(), source).unwrap();
        let run = pipeline.run().unwrap();
        assert_eq!(run.store.n_elements(), 1000);
        assert_eq!(run.event_count(), 4);
        assert_eq!(run.peaks["FSC"].len(), 4);
        assert_eq!(run.peaks["SSC"].len(), 4);
        for table in &run.peaks["FSC"] {
            assert!((table.heights()[0] - 2.0).abs() < 0.05);
            assert_eq!(table.indices()[1], -1);
        }
        assert_eq!(run.segments.time().len(), run.segments.signal("SSC").unwrap().len());
        assert!(run.digitizer_reports.is_none());
    }
    #[test]
    fn seeded_runs_are_reproducible() {
        let mut config = quiet_config();
        for channel in &mut config.channels {
            channel.noise = vec![NoiseConfig::Gaussian {
                mean: 0.0,
                std_dev: 0.05,
            }];
        }
        let train = PulseTrain::new(vec![0.004; 2], vec![0.25, 0.75], vec![3.0, 1.5]).unwrap();
        let run = |config: AcquisitionConfig| {
            let mut pipeline =
                AcquisitionPipeline::new(config, ManualParticleSource::new(train.clone())).unwrap();
            pipeline.run().unwrap()
        };
        let first = run(config.clone());
        let second = run(config);
        assert_eq!(first.ranges, second.ranges);
        assert_eq!(
            first.store.get_signal("SSC").unwrap(),
            second.store.get_signal("SSC").unwrap()
        );
    }
    #[test]
    fn digitizer_runs_before_triggering() {
        let mut config = quiet_config();
        config.digitizer = Some(Digitizer::new(4, Saturation::Fixed { min: 0.0, max: 15.0 }));
        if let TriggerMode::DynamicWindow(detector) = &mut config.triggering.detector {
            detector.threshold = 5.5;
        }
        let source = ManualParticleSource::evenly_spaced(2, 1.0, 0.003, 10.0);
        let run = AcquisitionPipeline::new(config, source).unwrap().run().unwrap();
        let reports = run.digitizer_reports.as_ref().unwrap();
        assert!(!reports["FSC"].is_saturated);
        assert!(run
            .store
            .get_signal("FSC")
            .unwrap()
            .iter()
            .all(|v| v.fract() == 0.0 && (0.0..=15.0).contains(v)));
        assert_eq!(run.event_count(), 2);
    }
    #[test]
    fn silent_source_gives_no_events() {
        let mut pipeline =
            AcquisitionPipeline::new(quiet_config(), ManualParticleSource::default()).unwrap();
        let run = pipeline.run().unwrap();
        assert_eq!(run.event_count(), 0);
        assert!(run.peaks["FSC"].is_empty());
    }
    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = quiet_config();
        config.triggering.channel = "FL2".into();
        assert!(AcquisitionPipeline::new(config, ManualParticleSource::default()).is_err());
    }
}
