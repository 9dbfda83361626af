use chrono::Local;
use clap::Args;
use serde_json::{json, Map, Value};

use mood_diary::models::MOOD_SCALE;
use mood_diary::sync::build_history_summary;
use mood_diary::{DeleteOutcome, Entry, SyncController};

use super::OutputFormat;

/// List diary entries
#[derive(Args)]
pub struct ListCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ListCommand {
    pub async fn run(
        &self,
        controller: &mut SyncController,
    ) -> Result<(), Box<dyn std::error::Error>> {
        controller.refresh().await;

        match self.format {
            OutputFormat::Json => {
                let output = json!({
                    "entries": controller.entries(),
                    "mode": controller.mode(),
                    "status": controller.status(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                for entry in controller.entries() {
                    print_entry(entry);
                }
                if !controller.entries().is_empty() {
                    println!();
                }
                println!("{}", controller.status());
            }
        }
        Ok(())
    }
}

/// Add or replace the entry for a date
#[derive(Args)]
pub struct AddCommand {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    #[arg(long)]
    dosage: Option<String>,

    /// Mood label; one of the scale labels (e.g. "🙂 Gut") or free text
    #[arg(long, short)]
    mood: Option<String>,

    #[arg(long)]
    concentration_morning: Option<String>,

    #[arg(long)]
    concentration_afternoon: Option<String>,

    #[arg(long)]
    overstimulation_morning: Option<String>,

    #[arg(long)]
    overstimulation_evening: Option<String>,

    /// Homework load
    #[arg(long)]
    homework: Option<String>,

    #[arg(long)]
    appetite: Option<String>,

    #[arg(long)]
    outburst: bool,

    #[arg(long)]
    headache: bool,

    #[arg(long)]
    stomachache: bool,

    #[arg(long)]
    dizziness: bool,

    /// Free-form observations
    #[arg(long)]
    notes: Option<String>,
}

impl AddCommand {
    /// Builds the entry through the same normalization as stored data, so
    /// the legacy concentration field is back-filled.
    fn to_entry(&self) -> Entry {
        let date = self
            .date
            .clone()
            .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());

        let mut map = Map::new();
        map.insert("datum".to_string(), Value::String(date));
        let texts = [
            ("dosierung", &self.dosage),
            ("stimmung", &self.mood),
            ("konz_morgen", &self.concentration_morning),
            ("konz_nachmittag", &self.concentration_afternoon),
            ("vorm", &self.overstimulation_morning),
            ("abend", &self.overstimulation_evening),
            ("hausaufgaben", &self.homework),
            ("appetit", &self.appetite),
            ("auff", &self.notes),
        ];
        for (key, value) in texts {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        map.insert("ausbr".to_string(), Value::Bool(self.outburst));
        map.insert("kopfweh".to_string(), Value::Bool(self.headache));
        map.insert("bauchweh".to_string(), Value::Bool(self.stomachache));
        map.insert("schwindel".to_string(), Value::Bool(self.dizziness));

        Entry::from(Value::Object(map))
    }

    pub async fn run(
        &self,
        controller: &mut SyncController,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let entry = self.to_entry();
        let date = entry.date.clone();

        let entries = controller.save_entry(entry).await?;

        println!("Saved entry for {}", date);
        println!("  {}", build_history_summary(&entries, None));
        println!();
        println!("{}", controller.status());
        Ok(())
    }
}

/// Delete the entry for a date
#[derive(Args)]
pub struct DeleteCommand {
    /// Date (YYYY-MM-DD)
    date: String,
}

impl DeleteCommand {
    pub async fn run(
        &self,
        controller: &mut SyncController,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match controller.delete_entry(&self.date).await {
            DeleteOutcome::Deleted(entries) => {
                println!("Deleted entry from {}", self.date);
                println!("  {}", build_history_summary(&entries, None));
                println!();
                println!("{}", controller.status());
                Ok(())
            }
            DeleteOutcome::NotFound => Err(controller.status().message.clone().into()),
        }
    }
}

fn print_entry(entry: &Entry) {
    println!("{}", entry);
    if let Some(score) = entry.mood_score() {
        println!("    Mood: {}", format_mood_score(score));
    }
    let details = [
        ("Concentration", format_pair(&entry.concentration_morning, &entry.concentration_afternoon)),
        ("Overstimulation", format_pair(&entry.overstimulation_morning, &entry.overstimulation_evening)),
        ("Homework", entry.homework_load.clone()),
        ("Appetite", entry.appetite.clone()),
    ];
    for (label, value) in details {
        if !value.is_empty() {
            println!("    {}: {}", label, value);
        }
    }
    for line in entry.notes.lines() {
        println!("    > {}", line);
    }
}

/// Bar plus value, e.g. `■■■□□ 3/5`.
fn format_mood_score(score: u8) -> String {
    let total = MOOD_SCALE.len();
    let filled = usize::from(score).min(total);
    format!(
        "{}{} {}/{}",
        "■".repeat(filled),
        "□".repeat(total - filled),
        score,
        total
    )
}

/// Joins morning and later values as "a / b", skipping blanks.
fn format_pair(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, true) => String::new(),
        (false, true) => first.to_string(),
        (true, false) => second.to_string(),
        (false, false) => format!("{} / {}", first, second),
    }
}
