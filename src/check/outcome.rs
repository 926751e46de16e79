// src/check/outcome.rs
use std::time::Duration;

/// Message reported when a script is killed for running past its deadline.
pub const TIMEOUT_MESSAGE: &str = "Timeout";

/// Result of one check invocation, either a single script or a whole group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
    pub elapsed: Duration,
}

impl ExecutionOutcome {
    pub fn new(success: bool, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success,
            message: message.into(),
            elapsed,
        }
    }

    pub fn timed_out(elapsed: Duration) -> Self {
        Self::new(false, TIMEOUT_MESSAGE, elapsed)
    }

    pub fn is_timeout(&self) -> bool {
        !self.success && self.message == TIMEOUT_MESSAGE
    }
}

/// Build the message for a finished script from its captured streams.
///
/// Both streams are trimmed and empty ones are skipped; the rest are joined
/// with a newline. A non-empty result is rendered as an escaped, quoted
/// literal so script output can never break the line framing of the
/// response body. No output at all yields an empty string.
pub fn compose_message(stdout: &str, stderr: &str) -> String {
    let parts: Vec<&str> = [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        return String::new();
    }

    format!("{:?}", parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_output_gives_empty_message() {
        assert_eq!(compose_message("", ""), "");
        assert_eq!(compose_message("  \n", "\t"), "");
    }

    #[test]
    fn test_single_stream_is_quoted() {
        assert_eq!(compose_message("ok\n", ""), "\"ok\"");
        assert_eq!(compose_message("", "boom\n"), "\"boom\"");
    }

    #[test]
    fn test_both_streams_joined_with_escaped_newline() {
        assert_eq!(compose_message(" out ", "err\n"), "\"out\\nerr\"");
    }

    #[test]
    fn test_control_characters_are_escaped() {
        assert_eq!(compose_message("a\tb\"c", ""), "\"a\\tb\\\"c\"");
    }

    #[test]
    fn test_timeout_outcome() {
        let outcome = ExecutionOutcome::timed_out(Duration::from_secs(10));
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Timeout");
        assert!(outcome.is_timeout());
        assert!(!ExecutionOutcome::new(false, "\"Timeout\"", Duration::ZERO).is_timeout());
    }

    proptest! {
        #[test]
        fn composed_message_is_single_line(stdout in ".*", stderr in ".*") {
            let message = compose_message(&stdout, &stderr);
            prop_assert!(!message.contains('\n'));
            prop_assert!(!message.contains('\r'));
        }

        #[test]
        fn message_is_empty_only_without_output(stdout in "\\s*[a-z]{0,3}\\s*", stderr in "\\s*[a-z]{0,3}\\s*") {
            let silent = stdout.trim().is_empty() && stderr.trim().is_empty();
            prop_assert_eq!(compose_message(&stdout, &stderr).is_empty(), silent);
        }
    }
}
