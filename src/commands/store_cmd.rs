use clap::{Args, Subcommand};

use mood_diary::resolver::resolve_config;
use mood_diary::{LocalStore, RawStoreConfig};

use crate::config::Config;

/// Manage the store configuration saved in local storage
#[derive(Args)]
pub struct StoreCommand {
    #[command(subcommand)]
    pub command: StoreSubcommand,
}

#[derive(Subcommand)]
pub enum StoreSubcommand {
    /// Save a store configuration
    Set {
        /// Document (bin) id
        #[arg(long)]
        bin_id: String,

        #[arg(long)]
        master_key: Option<String>,

        #[arg(long)]
        access_key: Option<String>,
    },

    /// Show the saved and the active store configuration
    Show,

    /// Remove the saved store configuration
    Clear,
}

impl StoreCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let local = config.local_store();

        match &self.command {
            StoreSubcommand::Set {
                bin_id,
                master_key,
                access_key,
            } => {
                let raw = RawStoreConfig {
                    bin_id: Some(bin_id.clone()),
                    master_key: master_key.clone(),
                    access_key: access_key.clone(),
                };
                let store = raw.normalize().ok_or("Bin id must not be blank")?;
                local.try_write_stored_config(&store)?;

                println!("Saved store configuration for bin {}", store.bin_id);
                if has_inline_store(config) {
                    println!(
                        "Note: a store is configured in the config file or environment and takes precedence."
                    );
                }
                Ok(())
            }
            StoreSubcommand::Show => {
                show(config, &local);
                Ok(())
            }
            StoreSubcommand::Clear => {
                local.try_clear_stored_config()?;
                println!("Removed saved store configuration.");
                Ok(())
            }
        }
    }
}

fn has_inline_store(config: &Config) -> bool {
    config
        .store
        .as_ref()
        .and_then(RawStoreConfig::normalize)
        .is_some()
}

fn show(config: &Config, local: &LocalStore) {
    match local.read_stored_config() {
        Some(saved) => {
            println!("Saved store:");
            println!("  bin_id:     {}", saved.bin_id);
            println!("  master_key: {}", saved.masked_master_key());
            println!("  access_key: {}", saved.masked_access_key());
        }
        None => println!("Saved store: (none)"),
    }
    println!();

    let resolved = resolve_config(config.store.as_ref(), local);
    match (resolved.config, resolved.origin) {
        (Some(active), Some(origin)) => {
            println!("Active store: {} ({})", active.bin_id, origin);
        }
        _ => println!("Active store: (none, entries stay on this device)"),
    }
}
