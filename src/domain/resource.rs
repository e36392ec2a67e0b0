use chrono::{DateTime, Utc};

/// Image list entry for the image view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    /// Short identifier, `sha256:` prefix stripped.
    pub id: String,
    /// Repository:tag references; untagged images carry `<none>:<none>`.
    pub repo_tags: Vec<String>,
    /// Size text as reported by the runtime ("125MB").
    pub size: String,
    pub created: Option<DateTime<Utc>>,
}

/// Volume list entry for the volume view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSummary {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
}

/// Network list entry for the network view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSummary {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
}
