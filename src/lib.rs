// src/lib.rs
//! Simulated flow-cytometer acquisition chain.
//!
//! Pulses are synthesized into a [`SignalStore`], corrupted with noise,
//! conditioned by low-pass and baseline-restoration circuits, then scanned by a
//! trigger detector. Every channel is sliced by the accepted trigger ranges and
//! each slice is summarized by a peak locator.
pub mod acquisition;
pub use acquisition::{
    AcquisitionConfig, AcquisitionPipeline, AcquisitionRun, SignalError, SignalStore,
};
