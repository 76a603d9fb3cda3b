use thiserror::Error;
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("signal '{name}' not found")]
    NotFound { name: String },
    #[error("signal '{name}' already exists")]
    AlreadyExists { name: String },
    #[error("size mismatch: expected {expected} samples, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("widths, centers and amplitudes must have the same length (got {widths}, {centers}, {amplitudes})")]
    ShapeMismatch {
        widths: usize,
        centers: usize,
        amplitudes: usize,
    },
    #[error("time axis is missing or does not match the channel length")]
    MissingTimeAxis,
    #[error("trigger detector '{name}' has no signal in the store")]
    UnknownDetector { name: String },
    #[error("cutoff frequency {cutoff_hz} Hz must be below the Nyquist frequency {nyquist_hz} Hz")]
    InvalidCutoff { cutoff_hz: f64, nyquist_hz: f64 },
    #[error("poisson noise requires non-negative samples (index {index} is {value})")]
    NegativeValue { index: usize, value: f64 },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
pub type Result<T> = std::result::Result<T, SignalError>;
impl SignalError {
    pub(crate) fn not_found(name: &str) -> Self {
        SignalError::NotFound {
            name: name.to_owned(),
        }
    }
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SignalError::InvalidArgument(message.into())
    }
}
