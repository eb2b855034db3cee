//! Service configuration
//!
//! Settings are assembled once at startup from defaults, an optional
//! `bundle-delta.toml`, and environment variables, then shared read-only
//! with the build runner, publisher, and orchestrator.

pub mod file;
pub mod loader;

pub use file::{
    BuildSettings, ExitException, PipelineSettings, Settings, StatusSettings, StorageSettings,
    WorkspaceSettings, CONFIG_FILE_NAME, DEFAULT_THRESHOLD_BYTES,
};
pub use loader::ConfigLoader;
