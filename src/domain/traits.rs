use super::{Container, ImageSummary, NetworkSummary, StatsSample, VolumeSummary};
use anyhow::Result;
use std::fmt::Debug;

/// Trait for container runtime operations.
///
/// This is the seam to the runtime client: implementations talk to the real
/// runtime (CLI, daemon socket), consumers only see snapshots. Discovery
/// treats every call as best-effort; an error narrows the result set, it
/// never aborts a discovery chain.
pub trait ContainerRuntime: Send + Sync + Debug {
    /// List containers; `all` includes stopped ones.
    fn list_containers(&self, all: bool) -> Result<Vec<Container>>;

    /// List containers carrying the exact label `key=value`.
    fn containers_with_label(&self, key: &str, value: &str) -> Result<Vec<Container>>;

    /// Detailed inspection output (pretty JSON text) for a container.
    fn inspect_container(&self, id: &str) -> Result<String>;

    /// Log tail for a container, timestamps included.
    fn container_logs(&self, id: &str, tail: usize) -> Result<String>;

    /// One-shot stats sample for a container.
    fn container_stats(&self, id: &str) -> Result<StatsSample>;

    fn start_container(&self, id: &str) -> Result<()>;

    fn stop_container(&self, id: &str) -> Result<()>;

    fn restart_container(&self, id: &str) -> Result<()>;

    fn pause_container(&self, id: &str) -> Result<()>;

    fn unpause_container(&self, id: &str) -> Result<()>;

    fn kill_container(&self, id: &str) -> Result<()>;

    fn remove_container(&self, id: &str) -> Result<()>;

    fn list_images(&self) -> Result<Vec<ImageSummary>>;

    fn inspect_image(&self, id: &str) -> Result<String>;

    fn remove_image(&self, id: &str, force: bool) -> Result<()>;

    fn list_volumes(&self) -> Result<Vec<VolumeSummary>>;

    fn inspect_volume(&self, name: &str) -> Result<String>;

    fn remove_volume(&self, name: &str, force: bool) -> Result<()>;

    fn list_networks(&self) -> Result<Vec<NetworkSummary>>;

    fn inspect_network(&self, id: &str) -> Result<String>;

    fn remove_network(&self, id: &str) -> Result<()>;

    /// Remove stopped containers.
    fn prune_containers(&self) -> Result<()>;

    /// Remove unused images.
    fn prune_images(&self) -> Result<()>;

    /// Remove unused volumes.
    fn prune_volumes(&self) -> Result<()>;

    /// Check the runtime is reachable.
    fn ping(&self) -> Result<()>;
}
