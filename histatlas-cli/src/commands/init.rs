//! Init command - write a configuration file.

use histatlas::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::GlobalArgs;

/// Run the init command.
pub fn run(args: &GlobalArgs, force: bool) -> Result<(), CliError> {
    let path = args.config.clone().unwrap_or_else(config_file_path);
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }

    let mut config = ConfigFile::load_from(&path).unwrap_or_default();
    if let Some(base_url) = &args.base_url {
        config.data.base_url = Some(base_url.clone());
    }
    if let Some(manifest) = &args.manifest {
        config.data.manifest = Some(manifest.clone());
    }
    config.save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    if config.data.base_url.is_none() || config.data.manifest.is_none() {
        println!("Set base_url and manifest in the [data] section before loading periods.");
    }
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args_for(path: PathBuf) -> GlobalArgs {
        GlobalArgs {
            config: Some(path),
            base_url: Some("https://maps.example/periods".to_string()),
            manifest: Some(PathBuf::from("periods.json")),
            direct: false,
            log_file: None,
            verbose: 0,
        }
    }

    #[test]
    fn test_init_writes_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        run(&args_for(path.clone()), false).unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(
            config.data.base_url.as_deref(),
            Some("https://maps.example/periods")
        );
        assert_eq!(config.data.manifest, Some(PathBuf::from("periods.json")));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[data]\n").unwrap();

        let result = run(&args_for(path.clone()), false);
        assert!(matches!(result, Err(CliError::Config(_))));

        run(&args_for(path), true).unwrap();
    }
}
