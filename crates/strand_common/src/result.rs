//! Common result and error types for the strand toolchain.

/// The result type for API calls that can only fail through misuse.
///
/// Problems found in a schematic never surface here: they are reported as
/// diagnostics and the analysis returns `Ok` with an error status. `Err`
/// means the caller asked for something that does not exist (an unknown
/// circuit, a netlist that was never built) or that strand itself is broken.
pub type StrandResult<T> = Result<T, InternalError>;

/// An internal error: a bug in strand or a misuse of its API.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("no netlist for circuit `alu`");
        assert_eq!(
            format!("{err}"),
            "internal error: no netlist for circuit `alu`"
        );
    }

    #[test]
    fn err_path_keeps_message() {
        let r: StrandResult<u32> = Err(InternalError::new("unknown circuit"));
        assert_eq!(r.unwrap_err().message, "unknown circuit");
    }

    #[test]
    fn from_string() {
        let err: InternalError = format!("circuit {} missing", 3).into();
        assert_eq!(err.message, "circuit 3 missing");
    }
}
