use rmsg_api::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("max ({max}) minus min ({min}) is negative")]
    RangeInverted { min: i64, max: i64 },

    #[error("step must not be zero")]
    StepIsZero,

    #[error("step ({step}) is less than zero")]
    StepLessThanZero { step: i32 },

    #[error("the number of steps ({steps}) is larger than {limit}")]
    TooManySteps { steps: i128, limit: i128 },

    #[error("MCU value {value} is outside the signed 64-bit range (bound {bound})")]
    McuOverflow { value: i128, bound: i64 },

    #[error("cannot parse MCU value {text:?}: {reason}")]
    McuParseError { text: String, reason: String },

    #[error("external program closed its output after {answered} responses")]
    PrematureProcessExit { answered: usize },

    #[error("cannot start '{program}': {source}")]
    ProcessStartFailed { program: String, source: std::io::Error },

    #[error("process pipe ({context}): {source}")]
    ProcessIo { context: &'static str, source: std::io::Error },

    #[error("record sink: {0}")]
    Sink(#[source] std::io::Error),
}

impl GenerateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::RangeInverted { .. }
            | GenerateError::StepIsZero
            | GenerateError::StepLessThanZero { .. }
            | GenerateError::TooManySteps { .. } => ErrorKind::Config,
            GenerateError::McuOverflow { .. } => ErrorKind::Arithmetic,
            GenerateError::McuParseError { .. } | GenerateError::PrematureProcessExit { .. } => {
                ErrorKind::Protocol
            }
            GenerateError::ProcessStartFailed { .. } => ErrorKind::Lifecycle,
            GenerateError::ProcessIo { .. } | GenerateError::Sink(_) => ErrorKind::Io,
        }
    }
}
