//! Shared setup for commands that load periods.
//!
//! [`CliRunner`] resolves configuration (CLI flags over config file over
//! defaults), installs logging, starts the async runtime and builds the
//! period loader.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use histatlas::config::{config_file_path, ConfigFile};
use histatlas::fetch::{build_channel, ChannelMode};
use histatlas::loader::PeriodLoader;
use histatlas::logging::{init_logging, WorkerGuard};
use histatlas::period::{load_manifest, PeriodTable};
use histatlas::transform::StandardTransform;
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;
use crate::GlobalArgs;

pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    runtime: Runtime,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Load configuration, apply CLI overrides and start logging and the
    /// runtime.
    pub fn new(args: &GlobalArgs) -> Result<Self, CliError> {
        let config_path = args.config.clone().unwrap_or_else(config_file_path);
        let mut config = ConfigFile::load_from(&config_path)?;
        apply_overrides(&mut config, args);

        let guard = init_logging(log_level(args.verbose), args.log_file.as_deref())?;
        let runtime = Runtime::new().map_err(CliError::Runtime)?;

        Ok(Self {
            config,
            config_path,
            runtime,
            _log_guard: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = histatlas::VERSION,
            command,
            config = %self.config_path.display(),
            "HistAtlas starting"
        );
    }

    /// The period table from the configured manifest.
    pub fn periods(&self) -> Result<PeriodTable, CliError> {
        let manifest = self.config.data.manifest.as_ref().ok_or_else(|| {
            CliError::Config(
                "No period manifest specified. \
                 Use --manifest or set manifest in config.ini [data] section."
                    .to_string(),
            )
        })?;
        Ok(load_manifest(manifest)?)
    }

    /// Build a loader from the resolved configuration.
    pub fn loader(&self) -> Result<PeriodLoader, CliError> {
        let periods = self.periods()?;
        let fetch_config = self.config.fetch_config()?;

        // The delegated channel's dispatcher lives on this runtime.
        let _guard = self.runtime.enter();
        let channel = build_channel(&fetch_config)?;
        let transform = Arc::new(StandardTransform::new(self.config.transform_config()));

        Ok(PeriodLoader::new(
            periods,
            channel,
            transform,
            self.config.loader_config(),
        ))
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

fn apply_overrides(config: &mut ConfigFile, args: &GlobalArgs) {
    if let Some(base_url) = &args.base_url {
        config.data.base_url = Some(base_url.clone());
    }
    if let Some(manifest) = &args.manifest {
        config.data.manifest = Some(manifest.clone());
    }
    if args.direct {
        config.fetch.mode = ChannelMode::Direct;
    }
}

/// Default filter for a `-v` count. `RUST_LOG` still wins.
fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
