use crate::domain::{
    Container, ContainerRuntime, ImageSummary, NetworkSummary, StatsSample, VolumeSummary,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default log tail length for the container log view.
const LOG_TAIL: usize = 100;

/// Simple resource views and lifecycle pass-throughs over the runtime client.
pub struct ResourceService {
    runtime: Arc<dyn ContainerRuntime>,
}

/// Which resource classes a cleanup run touches.
#[derive(Debug, Clone)]
pub struct PruneOptions {
    pub containers: bool,
    pub images: bool,
    pub volumes: bool,
}

impl PruneOptions {
    pub fn all() -> Self {
        Self {
            containers: true,
            images: true,
            volumes: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.containers && !self.images && !self.volumes
    }
}

impl ResourceService {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    pub fn containers(&self, all: bool) -> Result<Vec<Container>> {
        self.runtime.list_containers(all)
    }

    pub fn inspect_container(&self, id: &str) -> Result<String> {
        self.runtime.inspect_container(id)
    }

    pub fn container_logs(&self, id: &str) -> Result<String> {
        self.runtime.container_logs(id, LOG_TAIL)
    }

    pub fn container_stats(&self, id: &str) -> Result<StatsSample> {
        self.runtime.container_stats(id)
    }

    pub fn start(&self, id: &str) -> Result<()> {
        self.runtime.start_container(id)
    }

    pub fn stop(&self, id: &str) -> Result<()> {
        self.runtime.stop_container(id)
    }

    pub fn restart(&self, id: &str) -> Result<()> {
        self.runtime.restart_container(id)
    }

    pub fn pause(&self, id: &str) -> Result<()> {
        self.runtime.pause_container(id)
    }

    pub fn unpause(&self, id: &str) -> Result<()> {
        self.runtime.unpause_container(id)
    }

    pub fn kill(&self, id: &str) -> Result<()> {
        self.runtime.kill_container(id)
    }

    pub fn remove_container(&self, id: &str) -> Result<()> {
        self.runtime.remove_container(id)
    }

    pub fn images(&self) -> Result<Vec<ImageSummary>> {
        self.runtime.list_images()
    }

    pub fn inspect_image(&self, id: &str) -> Result<String> {
        self.runtime.inspect_image(id)
    }

    pub fn remove_image(&self, id: &str, force: bool) -> Result<()> {
        self.runtime.remove_image(id, force)
    }

    pub fn volumes(&self) -> Result<Vec<VolumeSummary>> {
        self.runtime.list_volumes()
    }

    pub fn inspect_volume(&self, name: &str) -> Result<String> {
        self.runtime.inspect_volume(name)
    }

    pub fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        self.runtime.remove_volume(name, force)
    }

    pub fn networks(&self) -> Result<Vec<NetworkSummary>> {
        self.runtime.list_networks()
    }

    pub fn inspect_network(&self, id: &str) -> Result<String> {
        self.runtime.inspect_network(id)
    }

    pub fn remove_network(&self, id: &str) -> Result<()> {
        self.runtime.remove_network(id)
    }

    pub fn ping(&self) -> Result<()> {
        self.runtime.ping()
    }

    /// Cleans up unused resources, continuing even if individual operations
    /// fail.
    pub fn prune(&self, options: &PruneOptions) -> Result<()> {
        info!(" Limpando recursos do runtime...");

        if options.containers {
            match self.runtime.prune_containers() {
                Ok(_) => debug!("containers parados removidos"),
                Err(e) => warn!("falha ao remover containers: {}", e),
            }
        }

        if options.images {
            match self.runtime.prune_images() {
                Ok(_) => debug!("imagens não utilizadas removidas"),
                Err(e) => warn!("falha ao remover imagens: {}", e),
            }
        }

        if options.volumes {
            match self.runtime.prune_volumes() {
                Ok(_) => debug!("volumes órfãos removidos"),
                Err(e) => warn!("falha ao remover volumes: {}", e),
            }
        }

        info!(" Limpeza concluída");
        Ok(())
    }
}
