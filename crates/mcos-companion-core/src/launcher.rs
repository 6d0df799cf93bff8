//! Fire-and-forget process launching.
//!
//! A launch hands the catalog's command string to the platform shell and returns as
//! soon as the child exists. Exit status and output are never observed; tokio reaps
//! the dropped child in the background.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Seam between the launch handler and the OS process facility.
pub trait ProcessLauncher: Send + Sync {
    /// Start `command` detached. Returns the child's pid when the platform reports one.
    fn launch(&self, command: &str) -> Result<Option<u32>, LaunchError>;
}

/// Runs commands through `sh -c` (or `cmd /C` on Windows) in their own process group.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLauncher;

impl ShellLauncher {
    pub fn new() -> Self {
        Self
    }

    fn command(command: &str) -> Command {
        #[cfg(windows)]
        let mut cmd = {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        };

        // New process group: launched apps outlive the server.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        cmd
    }
}

impl ProcessLauncher for ShellLauncher {
    fn launch(&self, command: &str) -> Result<Option<u32>, LaunchError> {
        debug!("Spawning detached command: {}", command);
        let child = Self::command(command)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: command.to_string(),
                source,
            })?;
        Ok(child.id())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn launch_returns_before_the_child_exits() {
        let started = Instant::now();
        let pid = ShellLauncher::new().launch("sleep 5").unwrap();
        assert!(pid.is_some());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn launched_command_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("launched");
        ShellLauncher::new()
            .launch(&format!("touch '{}'", marker.display()))
            .unwrap();
        for _ in 0..50 {
            if marker.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("launched command never ran");
    }
}
