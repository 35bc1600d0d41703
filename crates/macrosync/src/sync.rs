// ── External full-sync command ──
//
// Runs the configured inventory→monitoring sync tool for one device:
// `{argv...} -v -w {device_id} [-t]`.

use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },
}

/// The full-sync command, as an argv vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommand {
    argv: Vec<String>,
}

impl SyncCommand {
    /// `None` when `argv` is empty (sync disabled).
    pub fn new(argv: Vec<String>) -> Option<Self> {
        (!argv.is_empty()).then_some(Self { argv })
    }

    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Full argv for one run.
    pub fn args_for(&self, device_id: u64, retag: bool) -> Vec<String> {
        let mut args = self.argv.clone();
        args.extend(["-v".to_owned(), "-w".to_owned(), device_id.to_string()]);
        if retag {
            args.push("-t".to_owned());
        }
        args
    }

    /// Run to completion; non-zero exit is an error.
    pub async fn run(&self, device_id: u64, retag: bool) -> Result<(), SyncError> {
        let args = self.args_for(device_id, retag);
        let (program, rest) = args.split_first().ok_or_else(|| SyncError::Spawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;
        info!(command = ?args, "executing sync command");

        let status = Command::new(program)
            .args(rest)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| SyncError::Spawn {
                program: program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            warn!(%status, device_id, "sync command failed");
            Err(SyncError::Failed {
                program: program.clone(),
                status,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn empty_argv_disables_sync() {
        assert!(SyncCommand::new(vec![]).is_none());
    }

    #[test]
    fn device_flags_are_appended() {
        let cmd = SyncCommand::new(argv(&["python3", "netbox_zabbix_sync.py"])).unwrap();
        assert_eq!(
            cmd.args_for(12, false),
            argv(&["python3", "netbox_zabbix_sync.py", "-v", "-w", "12"])
        );
        assert_eq!(cmd.args_for(12, true).last().map(String::as_str), Some("-t"));
        assert_eq!(cmd.program(), "python3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_status_is_checked() {
        let ok = SyncCommand::new(argv(&["true"])).unwrap();
        ok.run(1, false).await.unwrap();

        let fail = SyncCommand::new(argv(&["false"])).unwrap();
        assert!(matches!(fail.run(1, true).await, Err(SyncError::Failed { .. })));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let cmd = SyncCommand::new(argv(&["/nonexistent/macrosync-sync"])).unwrap();
        assert!(matches!(cmd.run(1, false).await, Err(SyncError::Spawn { .. })));
    }
}
