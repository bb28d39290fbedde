//! Shared constants for the embedctl CLI.
//!
//! Centralizes the fixed values from the deployment contract so they are
//! discoverable and maintainable. Everything here can be overridden through
//! `.embedrc.toml` (see `config.rs`) except the required-file list.

/// Files that must exist in the working directory before a deploy proceeds.
///
/// `docker-compose.yml` is checked for parity with the service's repository
/// layout even though the launch path uses a direct `run` invocation.
pub const REQUIRED_FILES: &[&str] = &[
    "app.py",
    "requirements.txt",
    "Dockerfile",
    "docker-compose.yml",
];

/// Default image tag for the embedding service.
pub const DEFAULT_IMAGE: &str = "nomic-embed-api";

/// Default container name. At most one instance with this name runs at a time.
pub const DEFAULT_CONTAINER: &str = "nomic-embed-api";

/// Default container runtime binary.
pub const DEFAULT_RUNTIME: &str = "docker";

/// Default restart policy for the launched instance.
pub const DEFAULT_RESTART_POLICY: &str = "unless-stopped";

/// Host port the service is published on.
pub const DEFAULT_HOST_PORT: u16 = 5000;

/// Port the service listens on inside the container.
pub const DEFAULT_CONTAINER_PORT: u16 = 5000;

/// Directory (relative to the working directory) where model files persist
/// across redeploys.
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Mount point for the models directory inside the container.
pub const CONTAINER_MODELS_PATH: &str = "/app/models";

/// Overall readiness deadline. The first deploy downloads model weights
/// inside the container, which dominates startup time.
pub const DEFAULT_READINESS_TIMEOUT_SECS: u64 = 120;

/// First readiness-poll delay; doubles on each failed attempt.
pub const DEFAULT_READINESS_INITIAL_DELAY_MS: u64 = 500;

/// Cap for the readiness-poll backoff.
pub const DEFAULT_READINESS_MAX_DELAY_MS: u64 = 5_000;

/// How many log lines to show during status/log inspection.
pub const DEFAULT_LOG_TAIL_LINES: u32 = 20;

/// Sample text sent to the embed endpoint during smoke tests.
pub const SMOKE_SAMPLE_TEXT: &str = "The quick brown fox jumps over the lazy dog";

/// Spinner tick interval in milliseconds.
pub const SPINNER_TICK_MS: u64 = 100;
