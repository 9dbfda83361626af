use clap::{Args, Subcommand};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use mood_diary::RawStoreConfig;

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# mood-diary configuration

# Directory for local diary files (default: platform data dir + mood-diary)
# data_dir: ~/.local/share/mood-diary

# Remote document store endpoint
# endpoint: https://api.jsonbin.io/v3/b

# Set to false to keep entries in memory only
local_storage: true

# Remote store; takes precedence over `diary store set`
# store:
#   bin_id: your-bin-id
#   master_key: your-master-key
#   access_key: your-access-key
"#;

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                let store = config.store.as_ref().and_then(RawStoreConfig::normalize);
                match format {
                    OutputFormat::Json => {
                        let mut value = serde_json::to_value(config)?;
                        value["store"] = match &store {
                            Some(s) => json!({
                                "binId": s.bin_id,
                                "masterKey": s.masked_master_key(),
                                "accessKey": s.masked_access_key(),
                            }),
                            None => serde_json::Value::Null,
                        };
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("endpoint: {}", config.endpoint.value);
                        println!("  source: {}", config.endpoint.source);
                        println!();

                        println!("local_storage: {}", config.local_storage.value);
                        println!("  source: {}", config.local_storage.source);
                        println!();

                        match &store {
                            Some(s) => {
                                println!("store.bin_id: {}", s.bin_id);
                                println!("store.master_key: {}", s.masked_master_key());
                                println!("store.access_key: {}", s.masked_access_key());
                            }
                            None => println!("store: (not set)"),
                        }
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'diary config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_template_parses() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, DEFAULT_CONFIG).unwrap();

        let config = Config::load(Some(path.clone())).unwrap();
        assert_eq!(config.config_file, Some(path));
        assert!(config.local_storage.value);
    }

    #[test]
    fn test_init_writes_file_once() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");
        let config = Config::load(Some(path.clone())).unwrap();
        let command = ConfigCommand {
            command: ConfigSubcommand::Init,
        };

        command.run(&config, Some(path.clone())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        fs::write(&path, "local_storage: false\n").unwrap();
        command.run(&config, Some(path.clone())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "local_storage: false\n");
    }
}
