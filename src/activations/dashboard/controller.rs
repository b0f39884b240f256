use super::secret::{Credentials, UnitInstance};
use super::types::ServiceStatus;
use crate::config::{DashboardConfig, TimingConfig};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` exited with {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Control over the service unit that serves the dashboard
#[async_trait]
pub trait ServiceControl: Send + Sync + 'static {
    /// Whether the unit is active. Any failure to find out reads as `false`.
    async fn is_running(&self, unit: &UnitInstance) -> bool;

    /// Ask the service manager to start the unit with the login credentials
    /// in its environment. Returns once the request was accepted.
    async fn start(&self, unit: &UnitInstance, credentials: &Credentials) -> Result<(), ControlError>;

    /// Ask the service manager to stop the unit
    async fn stop(&self, unit: &UnitInstance) -> Result<(), ControlError>;

    async fn status(&self, unit: &UnitInstance) -> ServiceStatus {
        ServiceStatus::from_active(self.is_running(unit).await)
    }
}

/// `systemctl` backed controller
///
/// Commands are spawned from an argument vector, never through a shell, and
/// each call is bounded by `timeout`; a call that overruns is killed.
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: PathBuf,
    user_scope: bool,
    timeout: Duration,
}

impl Systemctl {
    pub fn new(program: impl Into<PathBuf>, user_scope: bool, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            user_scope,
            timeout,
        }
    }

    pub fn from_config(dashboard: &DashboardConfig, timing: &TimingConfig) -> Self {
        Self::new(
            Self::find_binary(&dashboard.systemctl),
            dashboard.user_scope,
            timing.command_timeout(),
        )
    }

    /// Resolve the program on PATH, keeping the bare name if that fails
    fn find_binary(name: &str) -> PathBuf {
        which::which(name).unwrap_or_else(|_| PathBuf::from(name))
    }

    fn command(&self, action: &str, unit: &UnitInstance) -> Command {
        let mut cmd = Command::new(&self.program);
        if self.user_scope {
            cmd.arg("--user");
        }
        cmd.arg(action);
        if action == "is-active" {
            cmd.arg("--quiet");
        }
        cmd.arg(unit.service_name())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Loggable form of a command, with the instance key masked
    fn describe(&self, action: &str, unit: &UnitInstance) -> String {
        let scope = if self.user_scope { " --user" } else { "" };
        format!("{}{} {} {}", self.program.display(), scope, action, unit.redacted())
    }

    async fn run(&self, mut cmd: Command, command: String) -> Result<Output, ControlError> {
        let child = cmd.spawn().map_err(|source| ControlError::Spawn {
            command: command.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                tracing::debug!("`{}` returned {:?}", command, output.status.code());
                Ok(output)
            }
            Ok(Err(source)) => Err(ControlError::Spawn { command, source }),
            Err(_) => Err(ControlError::Timeout {
                command,
                timeout: self.timeout,
            }),
        }
    }

    async fn request(&self, action: &str, unit: &UnitInstance, cmd: Command) -> Result<(), ControlError> {
        let command = self.describe(action, unit);
        tracing::debug!("Running `{}`", command);
        let output = self.run(cmd, command.clone()).await?;
        if output.status.success() {
            Ok(())
        } else {
            // systemctl names the failing unit, and with it the secret.
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ControlError::Failed {
                command,
                code: output.status.code(),
                stderr: unit.scrub(stderr.trim()),
            })
        }
    }
}

#[async_trait]
impl ServiceControl for Systemctl {
    async fn is_running(&self, unit: &UnitInstance) -> bool {
        let command = self.describe("is-active", unit);
        match self.run(self.command("is-active", unit), command).await {
            Ok(output) => output.status.success(),
            Err(e) => {
                tracing::warn!("Could not query dashboard state: {}", e);
                false
            }
        }
    }

    async fn start(&self, unit: &UnitInstance, credentials: &Credentials) -> Result<(), ControlError> {
        let mut cmd = self.command("start", unit);
        // Only the child sees the credentials; our own environment is untouched.
        cmd.envs(credentials.env_vars());
        self.request("start", unit, cmd).await
    }

    async fn stop(&self, unit: &UnitInstance) -> Result<(), ControlError> {
        self.request("stop", unit, self.command("stop", unit)).await
    }
}
