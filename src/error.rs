//! Structured error handling and exit codes.

use serde::Serialize;

use crate::accessor::AccessorError;
use crate::duplicates::FinderError;

/// Exit codes for the DynaDupe application.
///
/// - 0: Success (run completed, whether or not duplicates were found)
/// - 1: General error (read failure, bad configuration, ...)
/// - 2: Usage error (wrong arguments; reported by the argument parser)
/// - 3: Connection failed (table or region unreachable)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: The run completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Usage: Wrong number or shape of arguments.
    Usage = 2,
    /// Connection failed: The table could not be reached.
    ConnectionFailed = 3,
    /// Interrupted: Run was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DD000",
            Self::GeneralError => "DD001",
            Self::Usage => "DD002",
            Self::ConnectionFailed => "DD003",
            Self::Interrupted => "DD130",
        }
    }

    /// Exit code for an argument-parsing outcome.
    ///
    /// Help and version requests are reported through the same error type
    /// but are not failures.
    #[must_use]
    pub fn for_parse_error(err: &clap::Error) -> Self {
        if err.use_stderr() {
            Self::Usage
        } else {
            Self::Success
        }
    }

    /// Pick the exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(finder) = cause.downcast_ref::<FinderError>() {
                match finder {
                    FinderError::Interrupted => return Self::Interrupted,
                    FinderError::Accessor(a) if a.is_connection() => {
                        return Self::ConnectionFailed
                    }
                    _ => {}
                }
            }
            if let Some(accessor) = cause.downcast_ref::<AccessorError>() {
                if accessor.is_connection() {
                    return Self::ConnectionFailed;
                }
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn connection_error() -> AccessorError {
        AccessorError::Connection {
            region: "r".into(),
            table: "t".into(),
            message: "nope".into(),
        }
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::Usage.as_i32(), 2);
        assert_eq!(ExitCode::ConnectionFailed.as_i32(), 3);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_code_prefixes() {
        assert_eq!(ExitCode::Success.code_prefix(), "DD000");
        assert_eq!(ExitCode::Interrupted.code_prefix(), "DD130");
    }

    #[test]
    fn test_for_parse_error_wrong_positional_count() {
        use clap::Parser;

        for args in [
            vec!["dynadupe", "eu-central-1", "users"],
            vec!["dynadupe", "r", "t", "a", "extra"],
            vec!["dynadupe"],
        ] {
            let err = crate::cli::Cli::try_parse_from(args).unwrap_err();
            assert_eq!(ExitCode::for_parse_error(&err), ExitCode::Usage);
            assert_eq!(ExitCode::for_parse_error(&err).as_i32(), err.exit_code());
        }
    }

    #[test]
    fn test_for_parse_error_help_is_success() {
        use clap::Parser;

        let err = crate::cli::Cli::try_parse_from(["dynadupe", "--help"]).unwrap_err();
        assert_eq!(ExitCode::for_parse_error(&err), ExitCode::Success);
    }

    #[test]
    fn test_for_error_interrupted() {
        let err = anyhow::Error::new(FinderError::Interrupted);
        assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);
    }

    #[test]
    fn test_for_error_connection_with_context() {
        let err = Err::<(), _>(connection_error())
            .context("Failed to open table")
            .unwrap_err();
        assert_eq!(ExitCode::for_error(&err), ExitCode::ConnectionFailed);
    }

    #[test]
    fn test_for_error_connection_through_finder() {
        let err = anyhow::Error::new(FinderError::Accessor(connection_error()));
        assert_eq!(ExitCode::for_error(&err), ExitCode::ConnectionFailed);
    }

    #[test]
    fn test_for_error_read_failure_is_general() {
        let err = anyhow::Error::new(FinderError::Accessor(AccessorError::Read {
            operation: "scan",
            message: "throttled".into(),
        }));
        assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    }

    #[test]
    fn test_structured_error_includes_context() {
        let err = Err::<(), _>(connection_error())
            .context("Failed to open table")
            .unwrap_err();
        let structured = StructuredError::new(&err, ExitCode::ConnectionFailed);

        assert_eq!(structured.code, "DD003");
        assert_eq!(structured.exit_code, 3);
        assert!(structured.message.starts_with("Failed to open table: "));
        assert!(!structured.interrupted);
    }
}
