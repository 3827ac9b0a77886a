//! Run command

use std::process::Command;

use anyhow::{bail, Result};
use expbackoff_core::retry::{RetryExecutorBuilder, TracingObserver};
use expbackoff_core::types::RetryPolicy;

use crate::cli::RunArgs;
use crate::output;

/// A command line re-executed on every attempt
#[derive(Debug, Clone)]
struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    fn from_args(mut command: Vec<String>) -> Option<Self> {
        if command.is_empty() {
            return None;
        }
        let program = command.remove(0);
        Some(Self {
            program,
            args: command,
        })
    }

    /// Run to completion and return its exit code
    ///
    /// `None` when the process could not be started or was killed by a
    /// signal; neither ever matches the expected code.
    fn execute(&self) -> Option<i32> {
        match Command::new(&self.program).args(&self.args).status() {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::warn!("Failed to start {}: {}", self.program, e);
                None
            }
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

pub async fn run(args: RunArgs, policy: RetryPolicy) -> Result<()> {
    let Some(command) = CommandLine::from_args(args.command) else {
        bail!("No command given");
    };
    let display = command.to_string();
    let max_attempts = policy.max_attempts();

    let executor = RetryExecutorBuilder::new()
        .with_policy(policy)
        .with_observer(TracingObserver::new(display.clone()))
        .build()?;

    let code = executor
        .invoke_with(Some(args.expect), CommandLine::execute, command)
        .await?;

    match code {
        Some(code) if code == args.expect => {
            output::success(&format!("{} exited with {}", display, code));
            Ok(())
        }
        last => {
            let last = last.map_or_else(|| "no exit code".to_string(), |c| c.to_string());
            output::error(&format!(
                "{} did not exit with {} after {} attempts (last: {})",
                display, args.expect, max_attempts, last
            ));
            bail!("Retries exhausted for {}", display)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use expbackoff_core::retry::StatsObserver;
    use std::sync::Arc;
    use std::time::Duration;

    fn shell(script: &str) -> CommandLine {
        CommandLine::from_args(vec!["sh".into(), "-c".into(), script.into()]).unwrap()
    }

    #[test]
    fn test_from_args_splits_program() {
        let command =
            CommandLine::from_args(vec!["curl".into(), "-sf".into(), "localhost".into()]).unwrap();

        assert_eq!(command.program, "curl");
        assert_eq!(command.args, vec!["-sf", "localhost"]);
        assert_eq!(command.to_string(), "curl -sf localhost");
        assert!(CommandLine::from_args(Vec::new()).is_none());
    }

    #[test]
    fn test_execute_reports_exit_code() {
        assert_eq!(shell("exit 0").execute(), Some(0));
        assert_eq!(shell("exit 3").execute(), Some(3));
    }

    #[test]
    fn test_execute_missing_program() {
        let command = CommandLine::from_args(vec!["expbackoff-no-such-program".into()]).unwrap();
        assert_eq!(command.execute(), None);
    }

    #[tokio::test]
    async fn test_retries_until_file_appears() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        // Fails on the first run, creates the marker, succeeds on the second
        let script = format!(
            "test -e {0} && exit 0; touch {0}; exit 1",
            marker.display()
        );

        let stats = Arc::new(StatsObserver::new());
        let executor = RetryExecutorBuilder::new()
            .with_policy(RetryPolicy::new(3, Duration::from_millis(1), 2.0))
            .with_observer(Arc::clone(&stats))
            .build()
            .unwrap();

        let code = executor
            .invoke_with(Some(0), CommandLine::execute, shell(&script))
            .await
            .unwrap();

        assert_eq!(code, Some(0));
        assert_eq!(stats.attempt_starts(), 2);
        assert_eq!(stats.rejections(), 1);
    }

    #[tokio::test]
    async fn test_run_exhausted_is_error() {
        let policy = RetryPolicy::new(1, Duration::from_millis(1), 2.0);
        let args = RunArgs {
            expect: 0,
            command: vec!["sh".into(), "-c".into(), "exit 4".into()],
        };

        let err = run(args, policy).await.unwrap_err();
        assert!(err.to_string().contains("Retries exhausted"));
    }

    #[tokio::test]
    async fn test_run_expected_nonzero_code() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1), 2.0);
        let args = RunArgs {
            expect: 4,
            command: vec!["sh".into(), "-c".into(), "exit 4".into()],
        };

        assert!(run(args, policy).await.is_ok());
    }
}
