use std::fmt::Debug;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Monotonic time bound carried through a discovery operation.
///
/// Every suspension point (subprocess execution, chained lookups) checks the
/// deadline; an already-expired deadline short-circuits to "no results yet"
/// before any work starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No bound. Callers further down may still impose their own.
    pub fn none() -> Self {
        Self(None)
    }

    /// Expires `timeout` from now.
    pub fn within(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    pub fn expired(&self) -> bool {
        match self.0 {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }

    /// Time left, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// The earlier of two bounds.
    pub fn earliest(self, other: Deadline) -> Self {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Self(Some(a.min(b))),
            (Some(a), None) => Self(Some(a)),
            (None, b) => Self(b),
        }
    }
}

/// Outcome of one external tool invocation.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// Process ran and exited zero; combined stdout+stderr bytes.
    Success(Vec<u8>),
    /// Process ran but exited non-zero (or was killed at the deadline).
    /// Output may still carry partial or error text worth surfacing.
    ToolFailure { output: Vec<u8>, code: Option<i32> },
    /// The process could not be started at all (tool missing, permissions,
    /// deadline already expired).
    InvocationFailure(String),
}

impl ToolOutcome {
    /// Output bytes when the invocation succeeded.
    pub fn success_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Success(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Seam to the external bundle-management tool.
///
/// `args` are the tool's own arguments ("ls --format json"); implementations
/// know how to reach the binary. The tool is optional on a host; its absence
/// is an `InvocationFailure`, never a panic or a hard error.
pub trait ComposeTool: Send + Sync + Debug {
    fn run(&self, args: &[&str], deadline: Deadline) -> ToolOutcome;

    /// Same invocation through the legacy hyphenated binary, for hosts that
    /// only carry the old standalone tool.
    fn run_legacy(&self, args: &[&str], deadline: Deadline) -> ToolOutcome;
}

/// Production invoker: `docker compose <args>` / `docker-compose <args>`.
#[derive(Debug, Clone)]
pub struct ComposeCli {
    /// Bound applied when the caller's deadline is unbounded.
    default_timeout: Duration,
}

impl ComposeCli {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    fn bound(&self, deadline: Deadline) -> Deadline {
        match deadline.remaining() {
            Some(_) => deadline,
            None => Deadline::within(self.default_timeout),
        }
    }
}

impl Default for ComposeCli {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl ComposeTool for ComposeCli {
    fn run(&self, args: &[&str], deadline: Deadline) -> ToolOutcome {
        let mut cmd = Command::new("docker");
        cmd.arg("compose").args(args);
        run_with_deadline(cmd, self.bound(deadline))
    }

    fn run_legacy(&self, args: &[&str], deadline: Deadline) -> ToolOutcome {
        let mut cmd = Command::new("docker-compose");
        cmd.args(args);
        run_with_deadline(cmd, self.bound(deadline))
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs a subprocess with a bounded wait, capturing combined output.
///
/// When the deadline lapses the child is killed and NOT waited on; whatever
/// output was produced so far is returned as a `ToolFailure`.
pub fn run_with_deadline(mut cmd: Command, deadline: Deadline) -> ToolOutcome {
    if deadline.expired() {
        debug!("prazo esgotado antes de iniciar {:?}", cmd.get_program());
        return ToolOutcome::InvocationFailure("deadline expired before invocation".to_string());
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return ToolOutcome::InvocationFailure(err.to_string()),
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_handle = thread::spawn(move || drain(stdout));
    let err_handle = thread::spawn(move || drain(stderr));

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let mut output = out_handle.join().unwrap_or_default();
                output.extend(err_handle.join().unwrap_or_default());
                return if status.success() {
                    ToolOutcome::Success(output)
                } else {
                    ToolOutcome::ToolFailure {
                        output,
                        code: status.code(),
                    }
                };
            }
            Ok(None) => {
                if deadline.expired() {
                    warn!("subprocesso excedeu o prazo, encerrando");
                    let _ = child.kill();
                    // Kill closes the pipes; collect what already arrived.
                    let mut output = out_handle.join().unwrap_or_default();
                    output.extend(err_handle.join().unwrap_or_default());
                    return ToolOutcome::ToolFailure { output, code: None };
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                let _ = child.kill();
                return ToolOutcome::InvocationFailure(err.to_string());
            }
        }
    }
}

fn drain<R: Read>(reader: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        let _ = reader.read_to_end(&mut buf);
    }
    buf
}
