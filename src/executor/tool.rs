use super::runner;
use super::Transformer;
use crate::error::Error;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

/// The `motionphoto2` binary, which merges Live Photo stills and clips into
/// motion photos and copies everything else through.
#[derive(Debug, Clone)]
pub struct MotionPhoto {
    binary: PathBuf,
    timeout: Duration,
}

impl MotionPhoto {
    /// Fails when `binary` is missing, not a regular file or not executable.
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Result<Self, Error> {
        let binary = binary.into();
        let metadata = fs::metadata(&binary).map_err(|_| {
            Error::InvalidConfig(format!("motionphoto2 binary not found: {}", binary.display()))
        })?;
        if !metadata.is_file() {
            return Err(Error::InvalidConfig(format!(
                "motionphoto2 binary not found: {}",
                binary.display()
            )));
        }
        if !is_executable(&metadata) {
            return Err(Error::InvalidConfig(format!(
                "motionphoto2 binary is not executable: {}",
                binary.display()
            )));
        }
        Ok(Self { binary, timeout })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn command(&self, input_dir: &Path, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("--input-directory")
            .arg(input_dir)
            .arg("--output-directory")
            .arg(output_dir)
            .args(["--exif-match", "--copy-unmuxed", "--recursive"]);
        command
    }
}

impl Transformer for MotionPhoto {
    fn transform(&self, input_dir: &Path, output_dir: &Path) -> Result<String, Error> {
        let mut command = self.command(input_dir, output_dir);
        let command_line = runner::describe(&command);
        info!("Running: {}", command_line);

        let result =
            runner::run_with_timeout(&mut command, self.timeout).map_err(|e| Error::ToolFailed {
                command: command_line.clone(),
                status: format!("launch error ({})", e),
                output: String::new(),
            })?;

        if result.timed_out {
            return Err(Error::ToolTimeout {
                command: command_line,
                timeout: self.timeout,
                output: result.output,
            });
        }

        match result.status {
            Some(status) if status.success() => {
                info!("motionphoto2 completed");
                debug!("motionphoto2 output: {}", result.output.trim_end());
                Ok(result.output)
            }
            status => Err(Error::ToolFailed {
                command: command_line,
                status: status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown status".to_string()),
                output: result.output,
            }),
        }
    }
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn system_tool(name: &str) -> PathBuf {
        ["/bin", "/usr/bin"]
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .find(|path| path.is_file())
            .unwrap()
    }

    #[test]
    fn test_missing_binary_is_config_error() {
        let tmp = tempdir().unwrap();
        let err = MotionPhoto::new(tmp.path().join("nope"), Duration::from_secs(1)).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("not found"));

        let err = MotionPhoto::new(tmp.path(), Duration::from_secs(1)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_binary_is_rejected() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("motionphoto2");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        let err = MotionPhoto::new(&path, Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("not executable"));
    }

    #[test]
    fn test_command_line_contract() {
        let tool = MotionPhoto {
            binary: PathBuf::from("/usr/local/bin/motionphoto2"),
            timeout: Duration::from_secs(3600),
        };
        let command = tool.command(Path::new("/tmp/stage"), Path::new("/data/output"));
        assert_eq!(
            runner::describe(&command),
            "/usr/local/bin/motionphoto2 --input-directory /tmp/stage \
             --output-directory /data/output --exif-match --copy-unmuxed --recursive"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_maps_to_result() {
        let tmp = tempdir().unwrap();

        let ok = MotionPhoto::new(system_tool("true"), Duration::from_secs(10)).unwrap();
        assert!(ok.transform(tmp.path(), tmp.path()).is_ok());

        let failing = MotionPhoto::new(system_tool("false"), Duration::from_secs(10)).unwrap();
        match failing.transform(tmp.path(), tmp.path()) {
            Err(Error::ToolFailed { command, status, .. }) => {
                assert!(command.contains("false --input-directory"));
                assert!(status.contains('1'));
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_tool_times_out() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let tmp = tempdir().unwrap();
        let script = tmp.path().join("motionphoto2");
        fs::write(&script, "#!/bin/sh\necho converting\nsleep 10\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let tool = MotionPhoto::new(&script, Duration::from_millis(200)).unwrap();
        let started = Instant::now();
        match tool.transform(tmp.path(), tmp.path()) {
            Err(Error::ToolTimeout { command, timeout, output }) => {
                assert!(command.contains("--input-directory"));
                assert_eq!(timeout, Duration::from_millis(200));
                assert!(output.contains("converting"));
            }
            other => panic!("expected ToolTimeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
