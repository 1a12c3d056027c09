//! Query/execute surface tying the catalog, matcher and usage store together.

use anyhow::{bail, Result};
use log::{info, warn};

use super::command::{builtin_commands, LauncherCommand};
use super::fuzzy::{self, MatchResult};
use super::usage::UsageStore;

type CommandExecutor = Box<dyn Fn(&LauncherCommand) -> Result<()> + Send + Sync>;

pub struct LauncherController {
    commands: Vec<LauncherCommand>,
    usage_store: UsageStore,
    executor: CommandExecutor,
}

impl LauncherController {
    pub fn new(usage_store: UsageStore, executor: CommandExecutor) -> Self {
        Self {
            commands: builtin_commands(),
            usage_store,
            executor,
        }
    }

    pub fn commands(&self) -> &[LauncherCommand] {
        &self.commands
    }

    /// Ranked results for `query`; an empty or whitespace query lists the
    /// whole catalog ordered by usage.
    pub fn results(&self, query: &str) -> Vec<MatchResult> {
        fuzzy::rank(&self.commands, query, &self.usage_store)
    }

    /// Runs the command with `command_id` and, only when the action
    /// succeeds, records the execution for future ranking.
    pub fn execute(&self, command_id: &str) -> Result<()> {
        let Some(command) = self.commands.iter().find(|c| c.id == command_id) else {
            bail!("unknown launcher command: {command_id}");
        };

        match (self.executor)(command) {
            Ok(()) => {
                self.usage_store.record_execution(&command.id);
                info!("Executed launcher command {}", command.id);
                Ok(())
            }
            Err(err) => {
                warn!("Launcher command {} failed: {err:#}", command.id);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store_path(tag: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("keytally-controller-{tag}-{unique}.json"))
    }

    fn counting_controller(tag: &str) -> (LauncherController, Arc<AtomicUsize>) {
        let executions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&executions);
        let controller = LauncherController::new(
            UsageStore::new(temp_store_path(tag)),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        (controller, executions)
    }

    #[test]
    fn execute_dispatches_and_records_usage() {
        let (controller, executions) = counting_controller("dispatch");

        controller.execute("tile-left-half").unwrap();

        assert_eq!(executions.load(Ordering::SeqCst), 1);
        let results = controller.results("");
        assert_eq!(results[0].command.id, "tile-left-half");
        assert_eq!(results[0].sort_key.execution_count, 1);
    }

    #[test]
    fn unknown_command_id_is_an_error() {
        let (controller, executions) = counting_controller("unknown");

        let err = controller.execute("no-such-command").unwrap_err();
        assert!(err.to_string().contains("no-such-command"));
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_execution_does_not_record_usage() {
        let controller = LauncherController::new(
            UsageStore::new(temp_store_path("failure")),
            Box::new(|_| Err(anyhow!("accessibility permission denied"))),
        );

        assert!(controller.execute("tile-left-half").is_err());
        let results = controller.results("");
        assert!(results.iter().all(|r| r.sort_key.execution_count == 0));
    }

    #[test]
    fn results_rank_by_query() {
        let (controller, _) = counting_controller("query");

        let results = controller.results("right");
        assert_eq!(results[0].command.id, "tile-right-half");
    }

    #[test]
    fn repeated_executions_float_a_command_to_the_top() {
        let (controller, _) = counting_controller("float");

        for _ in 0..3 {
            controller.execute("tile-right-half").unwrap();
        }

        let results = controller.results("");
        assert_eq!(results[0].command.id, "tile-right-half");
    }
}
