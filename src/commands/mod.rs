use clap::ValueEnum;

mod config_cmd;
mod entry_cmd;
mod status_cmd;
mod store_cmd;

pub use config_cmd::ConfigCommand;
pub use entry_cmd::{AddCommand, DeleteCommand, ListCommand};
pub use status_cmd::StatusCommand;
pub use store_cmd::StoreCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
