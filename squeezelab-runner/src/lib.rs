//! SqueezeLab Runner: configuration, data loading, orchestration, export.
//!
//! This crate builds on `squeezelab-core` to provide:
//! - TOML analysis configuration with validation and hashing
//! - Bar loading with file / fetch / synthetic fallback
//! - A single-run entry point producing a fingerprinted result
//! - CSV, JSON, and Markdown artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{AnalysisConfig, BreakoutSection, ConfigError, DataSection, SqueezeSection};
pub use data_loader::{load_bars, LoadError, LoadOptions, LoadedData};
pub use export::{generate_report, save_artifacts, summary_table};
pub use runner::{run_analysis, run_analysis_on_data, AnalysisResult, RunError, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<AnalysisConfig>();
        assert_sync::<AnalysisConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<AnalysisResult>();
        assert_sync::<AnalysisResult>();
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
