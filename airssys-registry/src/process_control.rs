//! Manager process control via SSH + systemctl (spec.md §4.7, supplemented
//! from `original_source/python/actors/registry.py`'s `_systemctl_command`).
//! Shells out with `tokio::process::Command` rather than the teacher's
//! `airssys-osl` process executor: that crate is not part of this
//! transformed workspace and this is a single fire-and-forget shell-out, not
//! a supervised OS-operation pipeline.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::process::Command;

// Layer 3: Internal module imports
use crate::config::ProcessControlConfig;

/// 30s timeout on the SSH round-trip, matching the original's
/// `subprocess.run(..., timeout=30)`.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Restart,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
        }
    }
}

/// Outcome of a process-control request, mapped directly onto
/// `RegistryReply::ManagerStatus`.
pub struct ManagerStatus {
    pub running: bool,
    pub error: Option<String>,
}

/// Run `ssh <host> sudo systemctl <action> <service>` for `manager_id`,
/// bounded by [`COMMAND_TIMEOUT`]. Reports "unknown manager" if `manager_id`
/// has no entry in `config`.
pub async fn run(config: &ProcessControlConfig, manager_id: &str, action: Action) -> ManagerStatus {
    let Some((host, service)) = config.resolve(manager_id) else {
        return ManagerStatus {
            running: false,
            error: Some(format!("unknown manager: {manager_id}")),
        };
    };

    let remote_cmd = format!("sudo systemctl {} {service}", action.as_str());
    let mut command = Command::new("ssh");
    command.arg(&host.ssh).arg(&remote_cmd);

    tracing::info!(manager_id, ssh = %host.ssh, cmd = %remote_cmd, "executing process control command");

    match tokio::time::timeout(COMMAND_TIMEOUT, command.output()).await {
        Ok(Ok(output)) if output.status.success() => ManagerStatus {
            running: action != Action::Stop,
            error: None,
        },
        Ok(Ok(output)) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::error!(manager_id, %stderr, "process control command failed");
            ManagerStatus {
                running: false,
                error: Some(stderr),
            }
        }
        Ok(Err(source)) => {
            tracing::error!(manager_id, %source, "failed to spawn ssh");
            ManagerStatus {
                running: false,
                error: Some(source.to_string()),
            }
        }
        Err(_) => {
            tracing::error!(manager_id, "process control command timed out");
            ManagerStatus {
                running: false,
                error: Some("SSH timeout".to_string()),
            }
        }
    }
}
