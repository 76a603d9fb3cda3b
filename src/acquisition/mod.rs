// src/acquisition/mod.rs
// 声明采集链的各个子模块
pub mod baseline;
pub mod config;
pub mod digitizer;
pub mod error;
pub mod fft;
pub mod filter;
pub mod noise;
pub mod peak;
pub mod pipeline;
pub mod pulse;
pub mod segment;
pub mod source;
pub mod store;
pub mod trigger;
pub mod triggering;
// 公开导出常用类型，方便外部调用
pub use baseline::{baseline_restored, restore_baseline, BaselineSpan, BaselineWindow};
pub use config::{
    load_config, save_config, AcquisitionConfig, ChannelConfig, NoiseConfig, TriggeringConfig,
};
pub use digitizer::{Digitizer, DigitizerReport, Saturation};
pub use error::{Result, SignalError};
pub use filter::{
    bessel_low_pass_filter, butterworth_low_pass_filter, process_chain, BesselResponse, Circuit,
    LowPass, LowPassShape,
};
pub use noise::{add_gaussian_noise, add_poisson_noise, POISSON_NORMAL_APPROX_THRESHOLD};
pub use peak::{
    compute_segments, GlobalPeakLocator, PeakLocator, PeakLocatorConfig, PeakOptions, PeakRecord,
    PeakTable, SlidingWindowPeakLocator,
};
pub use pipeline::{AcquisitionPipeline, AcquisitionRun};
pub use pulse::render_gaussian_pulses;
pub use segment::{Segment, SegmentedSignals};
pub use source::{ManualParticleSource, ParticleSource, PulseTrain};
pub use store::{uniform_time_axis, SignalStore, TIME_CHANNEL};
pub use trigger::{
    DoubleThreshold, DynamicWindow, FixedWindow, TriggerDetector, TriggerMode, TriggerRange,
    TriggerWindow,
};
pub use triggering::TriggeringSystem;
