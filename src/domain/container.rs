use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Canonical length of a shortened container/image identifier.
pub const SHORT_ID_LEN: usize = 12;

/// Label set by compose-aware tooling to tie a container to its project.
pub const PROJECT_LABEL: &str = "com.docker.compose.project";

/// Label carrying the declared service name a container realizes.
pub const SERVICE_LABEL: &str = "com.docker.compose.service";

/// Truncates a runtime identifier to its canonical short form.
///
/// Image identifiers may carry a `sha256:` prefix, which is stripped before
/// truncation.
pub fn short_id(id: &str) -> String {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.chars().take(SHORT_ID_LEN).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Exited,
    Dead,
    Unknown,
}

impl ContainerState {
    /// Parses the runtime's state word (`running`, `exited`, ...).
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "created" => Self::Created,
            "running" | "up" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "exited" | "stopped" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    /// Derives a state from human status text ("Up 2 hours", "Exited (0) ...").
    ///
    /// Paused containers report "Up ... (Paused)", so that check runs first.
    pub fn from_status_text(status: &str) -> Self {
        let status = status.to_lowercase();
        if status.contains("paused") {
            Self::Paused
        } else if status.contains("restarting") {
            Self::Restarting
        } else if status.contains("up") {
            Self::Running
        } else if status.contains("exited") {
            Self::Exited
        } else if status.contains("created") {
            Self::Created
        } else if status.contains("dead") {
            Self::Dead
        } else {
            Self::Unknown
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        };
        write!(f, "{word}")
    }
}

/// Point-in-time snapshot of a runtime container.
///
/// Snapshots are rebuilt on every discovery call; nothing here is cached
/// across calls.
#[derive(Debug, Clone)]
pub struct Container {
    /// Short canonical identifier (see [`SHORT_ID_LEN`]).
    pub id: String,
    pub name: String,
    pub image: String,
    pub command: String,
    /// Human status text as reported by the runtime.
    pub status: String,
    pub state: ContainerState,
    /// Creation time, when the source reported one.
    pub created: Option<DateTime<Utc>>,
    pub ports: Vec<String>,
    pub labels: HashMap<String, String>,
}

impl Container {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Declared service name, when the runtime labelled it.
    pub fn service(&self) -> Option<&str> {
        self.label(SERVICE_LABEL)
    }

    /// Display name combining the container name and its service, when known.
    pub fn display_name(&self) -> String {
        match self.service() {
            Some(service) if !service.is_empty() => format!("{} ({})", self.name, service),
            _ => self.name.clone(),
        }
    }
}

/// One processed stats reading for a container.
///
/// Fields the source could not supply stay at their defaults and flip
/// `partial` on, so a zero here is distinguishable from a real zero reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSample {
    pub cpu_percent: f64,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub memory_percent: f64,
    pub net_rx: u64,
    pub net_tx: u64,
    pub block_read: u64,
    pub block_write: u64,
    /// True when at least one field could not be decoded from the source.
    pub partial: bool,
}
