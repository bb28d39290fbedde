//! Error types for the deployment orchestration core.

use thiserror::Error;

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, DeployError>;

/// Errors that can occur while orchestrating a deployment.
///
/// Each fatal step of the sequence has its own variant so callers can tell
/// a precondition failure from a build failure from a launch failure without
/// string matching.
#[derive(Error, Debug)]
pub enum DeployError {
    /// One or more required files are absent from the working directory.
    #[error("missing required files: {}", files.join(", "))]
    MissingFiles {
        /// Every absent file, in the order it was checked.
        files: Vec<String>,
    },

    /// The container runtime binary could not be executed.
    #[error("container runtime '{binary}' is not available on PATH")]
    RuntimeUnavailable {
        /// Binary name that was probed.
        binary: String,
    },

    /// The image build exited non-zero.
    #[error("image build failed for '{image}'")]
    BuildFailed {
        /// Image tag that was being built.
        image: String,
    },

    /// The detached run exited non-zero.
    #[error("failed to launch container '{container}': {stderr}")]
    LaunchFailed {
        /// Container name that was being launched.
        container: String,
        /// Captured stderr from the runtime CLI.
        stderr: String,
    },

    /// The service never answered its health endpoint within the deadline.
    #[error("service at {url} not ready after {attempts} attempts ({waited_secs}s)")]
    ReadinessTimeout {
        /// Health URL that was polled.
        url: String,
        /// Number of poll attempts made.
        attempts: u32,
        /// Seconds spent waiting.
        waited_secs: u64,
    },

    /// IO error invoking the runtime CLI or touching the filesystem.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error from a health or smoke probe.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed JSON in a probe response.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_lists_every_name() {
        let err = DeployError::MissingFiles {
            files: vec!["app.py".to_string(), "Dockerfile".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("app.py"));
        assert!(msg.contains("Dockerfile"));
    }

    #[test]
    fn test_readiness_timeout_display() {
        let err = DeployError::ReadinessTimeout {
            url: "http://localhost:5000/health".to_string(),
            attempts: 9,
            waited_secs: 120,
        };
        let msg = err.to_string();
        assert!(msg.contains("http://localhost:5000/health"));
        assert!(msg.contains('9'));
        assert!(msg.contains("120"));
    }
}
