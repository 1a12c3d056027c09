//! Per-command execution statistics backing launcher ranking.
//!
//! The map is rewritten to disk on every execution; executions are
//! human-triggered and rare, so a wholesale write per mutation is fine.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::RwLock,
};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};

use super::command::LauncherCommand;

const FRESHNESS_WINDOW_SECS: f64 = 60.0 * 60.0 * 24.0 * 7.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandUsage {
    pub execution_count: u32,
    pub last_executed_at: Option<DateTime<Utc>>,
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct UsageStore {
    path: PathBuf,
    clock: Clock,
    usage_map: RwLock<HashMap<String, CommandUsage>>,
}

impl UsageStore {
    pub fn new(path: PathBuf) -> Self {
        Self::with_clock(path, Box::new(Utc::now))
    }

    /// Injectable clock so ranking and decay are testable at fixed instants.
    pub fn with_clock(path: PathBuf, clock: Clock) -> Self {
        let usage_map = Self::load_usage_map(&path);
        Self {
            path,
            clock,
            usage_map: RwLock::new(usage_map),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn record_execution(&self, command_id: &str) {
        if command_id.is_empty() {
            return;
        }

        let mut guard = self.usage_map.write().unwrap();
        let usage = guard.entry(command_id.to_string()).or_default();
        usage.execution_count += 1;
        usage.last_executed_at = Some(self.now());

        self.persist(&guard);
    }

    pub fn usage(&self, command_id: &str) -> CommandUsage {
        self.usage_map
            .read()
            .unwrap()
            .get(command_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn usage_score(&self, command_id: &str, now: DateTime<Utc>) -> f64 {
        score_for(&self.usage(command_id), now)
    }

    /// Empty-query ordering: usage score, then most recent execution
    /// (never-executed sorts last), then execution count, then catalog order.
    pub fn sorted_for_empty_query(&self, commands: &[LauncherCommand]) -> Vec<LauncherCommand> {
        let now = self.now();

        let mut indexed: Vec<(usize, &LauncherCommand)> = commands.iter().enumerate().collect();
        indexed.sort_by(|(lhs_index, lhs), (rhs_index, rhs)| {
            let lhs_usage = self.usage(&lhs.id);
            let rhs_usage = self.usage(&rhs.id);

            score_for(&rhs_usage, now)
                .total_cmp(&score_for(&lhs_usage, now))
                .then_with(|| rhs_usage.last_executed_at.cmp(&lhs_usage.last_executed_at))
                .then_with(|| rhs_usage.execution_count.cmp(&lhs_usage.execution_count))
                .then_with(|| lhs_index.cmp(rhs_index))
        });

        indexed.into_iter().map(|(_, command)| command.clone()).collect()
    }

    fn load_usage_map(path: &PathBuf) -> HashMap<String, CommandUsage> {
        if !path.exists() {
            return HashMap::new();
        }

        // Corrupt usage data is discarded rather than treated as fatal.
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    fn persist(&self, data: &HashMap<String, CommandUsage>) {
        let serialized = match serde_json::to_string_pretty(data) {
            Ok(serialized) => serialized,
            Err(err) => {
                error!("Failed to serialize launcher usage map: {err}");
                return;
            }
        };

        if let Err(err) = fs::write(&self.path, serialized) {
            error!(
                "Failed to persist launcher usage map to {}: {err}",
                self.path.display()
            );
        }
    }
}

/// `log2(count + 1) * 100` for frequency plus a linear freshness decay over a
/// seven-day window for recency.
fn score_for(usage: &CommandUsage, now: DateTime<Utc>) -> f64 {
    if usage.execution_count == 0 {
        return 0.0;
    }

    let frequency_score = (f64::from(usage.execution_count) + 1.0).log2() * 100.0;

    let recency_score = match usage.last_executed_at {
        Some(last_executed_at) => {
            let age = (now - last_executed_at).num_milliseconds().max(0) as f64 / 1000.0;
            let freshness = (1.0 - age.min(FRESHNESS_WINDOW_SECS) / FRESHNESS_WINDOW_SECS).max(0.0);
            freshness * 100.0
        }
        None => 0.0,
    };

    frequency_score + recency_score
}
