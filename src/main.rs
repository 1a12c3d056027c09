//! Headless driver for exercising the key-press pipeline and the launcher
//! from a terminal. Key codes arrive one per line on stdin; `/query <text>`
//! ranks launcher commands and `/run <id>` executes one.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use keytally::launcher::UsageStore;
use keytally::{Database, KeyboardMonitor, LauncherController, SettingsStore};

fn data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".keytally"))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let data_dir = data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    info!("Loaded settings: {:?}", settings.general());

    let database = Database::new(data_dir.join("keytally.sqlite3"))?;

    let mut monitor = KeyboardMonitor::new();
    let aggregator = monitor.start(Arc::new(database.clone()))?;

    let launcher = LauncherController::new(
        UsageStore::new(data_dir.join("usage.json")),
        Box::new(|command| {
            println!("-> would dispatch {:?}", command.action);
            Ok(())
        }),
    );

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(query) = line.strip_prefix("/query") {
            for result in launcher.results(query.trim()) {
                println!(
                    "{:>6}  {:>8.1}  {}",
                    result.match_score, result.usage_score, result.command.title
                );
            }
            continue;
        }

        if let Some(id) = line.strip_prefix("/run") {
            if let Err(err) = launcher.execute(id.trim()) {
                eprintln!("error: {err:#}");
            }
            continue;
        }

        match line.parse::<i64>() {
            Ok(key_code) => aggregator.record_key_down(key_code),
            Err(_) => eprintln!("expected a key code, /query <text> or /run <id>"),
        }
    }

    monitor.stop().await?;

    let total = database.total_press_count().await?;
    println!("total presses on record: {total}");
    for record in database.top_key_presses(10).await? {
        println!("{:>8}  {}", record.count, record.key_name);
    }

    Ok(())
}
