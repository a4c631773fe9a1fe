use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use crate::error::{Error, Result};
use tracing::{info, error, warn};

/// Task Supervisor - owns the long-lived background tasks of the process
///
/// ## Purpose
/// Every named task returns `Result<()>`. The supervisor reports the first task that
/// exits and drains the rest on shutdown, aborting whatever outlives the grace period.
///
/// ## Usage
/// ```rust,ignore
/// let mut supervisor = TaskSupervisor::new();
/// supervisor.spawn("updater", async move {
///     updater.run(cancel).await;
///     Ok(())
/// });
///
/// let exited = supervisor.wait_next().await;
/// cancel.cancel();
/// supervisor.shutdown(Duration::from_secs(10)).await?;
/// ```
pub struct TaskSupervisor {
    tasks: JoinSet<(String, Result<()>)>,
}

/// A task that has finished, with its outcome.
#[derive(Debug)]
pub struct TaskExit {
    pub name: String,
    pub result: Result<()>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        TaskSupervisor {
            tasks: JoinSet::new(),
        }
    }

    /// Spawn a new background task and register it for monitoring
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        info!("Spawned background task: {}", name);

        let task_name = name.clone();
        self.tasks.spawn(async move { (task_name, future.await) });
        self
    }

    /// Get count of active tasks
    pub fn active_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for the next task to finish. `None` once no tasks are left.
    pub async fn wait_next(&mut self) -> Option<TaskExit> {
        let joined = self.tasks.join_next().await?;
        Some(Self::exit_from(joined))
    }

    /// Waits for every remaining task, aborting them once `grace` has elapsed.
    /// Returns the first failure, if any.
    pub async fn shutdown(&mut self, grace: Duration) -> Result<()> {
        info!("Shutting down {} background tasks", self.tasks.len());

        let mut first_failure = None;
        let drained = tokio::time::timeout(grace, async {
            while let Some(exit) = self.wait_next().await {
                if let Err(e) = exit.result {
                    error!("Task {} failed: {}", exit.name, e);
                    first_failure.get_or_insert(Error::TaskFailure(format!("{}: {}", exit.name, e)));
                } else {
                    info!("Task {} completed", exit.name);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Grace period elapsed, aborting {} tasks", self.tasks.len());
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
            first_failure.get_or_insert(Error::TaskFailure("shutdown grace period elapsed".to_string()));
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn exit_from(joined: std::result::Result<(String, Result<()>), JoinError>) -> TaskExit {
        match joined {
            Ok((name, result)) => TaskExit { name, result },
            Err(e) => TaskExit {
                name: "<unknown>".to_string(),
                result: Err(Error::TaskFailure(e.to_string())),
            },
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_next_reports_exiting_task() {
        let mut supervisor = TaskSupervisor::new();
        supervisor
            .spawn("forever", async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .spawn("broken", async { Err(Error::ConfigError("bad".to_string())) });

        let exit = supervisor.wait_next().await.unwrap();

        assert_eq!(exit.name, "broken");
        assert!(exit.result.is_err());
        assert_eq!(supervisor.active_task_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_tasks() {
        let mut supervisor = TaskSupervisor::new();
        supervisor.spawn("quick", async { Ok(()) });
        supervisor.spawn("slower", async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        });

        assert!(supervisor.shutdown(Duration::from_secs(5)).await.is_ok());
        assert_eq!(supervisor.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_after_grace_period() {
        let mut supervisor = TaskSupervisor::new();
        supervisor.spawn("stuck", async {
            std::future::pending::<()>().await;
            Ok(())
        });

        let result = supervisor.shutdown(Duration::from_millis(20)).await;

        assert!(matches!(result, Err(Error::TaskFailure(_))));
        assert_eq!(supervisor.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_reports_failure() {
        let mut supervisor = TaskSupervisor::new();
        supervisor.spawn("broken", async { Err(Error::ConfigError("bad".to_string())) });

        assert!(supervisor.shutdown(Duration::from_secs(5)).await.is_err());
    }
}
