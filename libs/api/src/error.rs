/// Category of a generation error. Lets the caller tell configuration
/// mistakes apart from failures that happened mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid range or strategy configuration, detected before any output.
    Config,
    /// The running MCU value left the signed 64-bit range.
    Arithmetic,
    /// The external program broke the line protocol.
    Protocol,
    /// The external program could not be started.
    Lifecycle,
    /// Pipe or sink I/O failure.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Arithmetic => f.write_str("arithmetic"),
            ErrorKind::Protocol => f.write_str("protocol"),
            ErrorKind::Lifecycle => f.write_str("lifecycle"),
            ErrorKind::Io => f.write_str("io"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("line too long: {len} bytes (max {max})")]
    LineTooLong { len: usize, max: usize },

    #[error("line too long: {len} bytes (max {max}) and no newline found")]
    Unterminated { len: usize, max: usize },
}
