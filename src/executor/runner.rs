use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the output readers may lag behind the child's exit. Processes
/// spawned by the child can hold the pipes open after it is gone.
const READER_GRACE: Duration = Duration::from_secs(1);

/// Result of a finished or killed child process.
#[derive(Debug)]
pub struct CommandOutput {
    /// stdout followed by stderr, lossily decoded.
    pub output: String,
    /// `None` when the child was killed at the deadline.
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.is_some_and(|s| s.success())
    }
}

/// Run `command` to completion, killing it once `timeout` has elapsed.
/// Both output streams are drained on helper threads so a chatty child
/// cannot block on a full pipe. The call returns at most `READER_GRACE`
/// after the child exits or is killed; output still held by surviving
/// grandchildren is cut off at that point.
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> io::Result<CommandOutput> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let deadline = Instant::now() + timeout;
    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Some(status);
        }
        if Instant::now() >= deadline {
            timed_out = true;
            // The child may have exited since try_wait; wait() reaps either way.
            let _ = child.kill();
            child.wait()?;
            break None;
        }
        thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
    };

    let drain_deadline = Instant::now() + READER_GRACE;
    let mut output = collect(stdout, drain_deadline);
    output.push_str(&collect(stderr, drain_deadline));

    Ok(CommandOutput {
        output,
        status,
        timed_out,
    })
}

/// Program and arguments joined by spaces, for logs and error messages.
pub fn describe(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A stream drained on a detached thread. `done` fires at end of stream.
struct StreamReader {
    buf: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

fn spawn_reader<R: Read + Send + 'static>(mut reader: R) -> StreamReader {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let (tx, done) = mpsc::channel();
    let sink = Arc::clone(&buf);
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        let _ = tx.send(());
    });
    StreamReader { buf, done }
}

/// Whatever `reader` has captured once it finishes or `deadline` passes.
fn collect(reader: Option<StreamReader>, deadline: Instant) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    let _ = reader
        .done
        .recv_timeout(deadline.saturating_duration_since(Instant::now()));
    let bytes = reader.buf.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_both_streams() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo out; echo err >&2; exit 3"]);
        let result = run_with_timeout(&mut command, Duration::from_secs(10)).unwrap();

        assert!(!result.success());
        assert!(!result.timed_out);
        assert_eq!(result.status.and_then(|s| s.code()), Some(3));
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[test]
    fn test_success() {
        let mut command = Command::new("true");
        let result = run_with_timeout(&mut command, Duration::from_secs(10)).unwrap();
        assert!(result.success());
    }

    #[test]
    fn test_kills_on_timeout() {
        let mut command = Command::new("sleep");
        command.arg("30");
        let started = Instant::now();
        let result = run_with_timeout(&mut command, Duration::from_millis(200)).unwrap();

        assert!(result.timed_out);
        assert!(result.status.is_none());
        assert!(!result.success());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_surviving_grandchild_does_not_hold_up_timeout() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo started; sleep 8; echo done"]);
        let started = Instant::now();
        let result = run_with_timeout(&mut command, Duration::from_millis(300)).unwrap();

        assert!(result.timed_out);
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(result.output.contains("started"));
        assert!(!result.output.contains("done"));
    }

    #[test]
    fn test_describe() {
        let mut command = Command::new("motionphoto2");
        command.args(["--input-directory", "/tmp/in", "--recursive"]);
        assert_eq!(
            describe(&command),
            "motionphoto2 --input-directory /tmp/in --recursive"
        );
    }
}
