//! Shows where the diary currently lives.

use chrono::{DateTime, Local, Utc};
use clap::Args;
use serde_json::json;

use mood_diary::SyncController;

use super::OutputFormat;

/// Show sync mode, store configuration and timestamps
#[derive(Args)]
pub struct StatusCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string())
}

impl StatusCommand {
    pub async fn run(
        &self,
        controller: &mut SyncController,
    ) -> Result<(), Box<dyn std::error::Error>> {
        controller.refresh().await;
        let state = controller.state();

        match self.format {
            OutputFormat::Json => {
                let output = json!({
                    "mode": state.mode,
                    "backend": controller.remote_backend(),
                    "origin": state.origin,
                    "binId": state.active_config.as_ref().map(|c| c.bin_id.clone()),
                    "storageAvailable": controller.storage_available(),
                    "lastRemoteSync": state.last_remote_sync,
                    "lastLocalSave": state.last_local_save,
                    "entries": state.cached_entries.len(),
                    "cloudError": state.cloud_error.as_ref().map(|e| e.to_string()),
                    "status": controller.status(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                println!("Sync Status");
                println!("===========");
                println!();

                println!("Mode:             {}", state.mode);
                match (&state.active_config, state.origin) {
                    (Some(config), Some(origin)) => {
                        println!("Store:            {} ({})", config.bin_id, origin);
                        println!("Backend:          {}", controller.remote_backend());
                    }
                    _ => println!("Store:            (not configured)"),
                }
                match controller.local_store().data_dir() {
                    Some(dir) if controller.storage_available() => {
                        println!("Local storage:    {}", dir.display());
                    }
                    _ => println!("Local storage:    unavailable"),
                }
                println!("Last cloud sync:  {}", format_time(state.last_remote_sync));
                println!("Last local save:  {}", format_time(state.last_local_save));
                if let Some(e) = &state.cloud_error {
                    println!("Cloud error:      {}", e);
                }
                println!();
                println!("[{}] {}", controller.status().tone, controller.status());
            }
        }
        Ok(())
    }
}
