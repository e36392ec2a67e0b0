use crate::domain::{
    Container, ContainerRuntime, ContainerState, ImageSummary, NetworkSummary, PROJECT_LABEL,
    SERVICE_LABEL, StatsSample, VolumeSummary,
};
use crate::infra::compose_cli::{ComposeTool, Deadline, ToolOutcome};
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory runtime client for tests: containers with labels and states,
/// a command log, and a `fail_on` switch to simulate failing operations.
#[derive(Debug, Default)]
pub struct MockRuntime {
    containers: RwLock<Vec<Container>>,
    images: RwLock<Vec<ImageSummary>>,
    volumes: RwLock<Vec<VolumeSummary>>,
    networks: RwLock<Vec<NetworkSummary>>,
    stats: RwLock<HashMap<String, StatsSample>>,
    commands: RwLock<Vec<String>>,
    fail_on: RwLock<Vec<String>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain container whose id equals its name.
    pub fn add_container(&self, name: &str, state: ContainerState) {
        self.push(plain_container(name, state));
    }

    /// Adds a container labelled as belonging to a compose project/service.
    pub fn add_compose_container(
        &self,
        name: &str,
        state: ContainerState,
        project: &str,
        service: &str,
    ) {
        let mut container = plain_container(name, state);
        container
            .labels
            .insert(PROJECT_LABEL.to_string(), project.to_string());
        container
            .labels
            .insert(SERVICE_LABEL.to_string(), service.to_string());
        self.push(container);
    }

    pub fn push(&self, container: Container) {
        self.containers.write().unwrap().push(container);
    }

    pub fn set_stats(&self, id: &str, sample: StatsSample) {
        self.stats.write().unwrap().insert(id.to_string(), sample);
    }

    pub fn set_fail_on(&self, operation: &str) {
        self.fail_on.write().unwrap().push(operation.to_string());
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.read().unwrap().clone()
    }

    pub fn state_of(&self, name: &str) -> Option<ContainerState> {
        self.containers
            .read()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.state)
    }

    fn record(&self, command: &str) {
        self.commands.write().unwrap().push(command.to_string());
    }

    fn check_fail(&self, operation: &str) -> Result<()> {
        if self.fail_on.read().unwrap().iter().any(|op| op == operation) {
            bail!("falha simulada em: {}", operation);
        }
        Ok(())
    }

    fn set_state(&self, id: &str, state: ContainerState) -> Result<()> {
        let mut containers = self.containers.write().unwrap();
        match containers.iter_mut().find(|c| c.id == id || c.name == id) {
            Some(container) => {
                container.state = state;
                Ok(())
            }
            None => bail!("container {} não encontrado", id),
        }
    }
}

fn plain_container(name: &str, state: ContainerState) -> Container {
    Container {
        id: name.to_string(),
        name: name.to_string(),
        image: "img:latest".to_string(),
        command: String::new(),
        status: String::new(),
        state,
        created: None,
        ports: Vec::new(),
        labels: HashMap::new(),
    }
}

impl ContainerRuntime for MockRuntime {
    fn list_containers(&self, all: bool) -> Result<Vec<Container>> {
        self.record(&format!("list:{}", if all { "all" } else { "running" }));
        self.check_fail("list_containers")?;

        let containers = self.containers.read().unwrap();
        Ok(containers
            .iter()
            .filter(|c| all || c.state.is_running())
            .cloned()
            .collect())
    }

    fn containers_with_label(&self, key: &str, value: &str) -> Result<Vec<Container>> {
        self.record(&format!("label:{key}={value}"));
        self.check_fail("containers_with_label")?;

        let containers = self.containers.read().unwrap();
        Ok(containers
            .iter()
            .filter(|c| c.label(key) == Some(value))
            .cloned()
            .collect())
    }

    fn inspect_container(&self, id: &str) -> Result<String> {
        self.record(&format!("inspect:{id}"));
        self.check_fail("inspect_container")?;
        Ok(format!("{{\"Id\":\"{id}\"}}"))
    }

    fn container_logs(&self, id: &str, tail: usize) -> Result<String> {
        self.record(&format!("logs:{id}:{tail}"));
        self.check_fail("container_logs")?;
        Ok(format!("logs de {id}\n"))
    }

    fn container_stats(&self, id: &str) -> Result<StatsSample> {
        self.record(&format!("stats:{id}"));
        self.check_fail("container_stats")?;

        match self.stats.read().unwrap().get(id) {
            Some(sample) => Ok(sample.clone()),
            None => bail!("sem estatísticas para {}", id),
        }
    }

    fn start_container(&self, id: &str) -> Result<()> {
        self.record(&format!("start:{id}"));
        self.check_fail("start")?;
        self.set_state(id, ContainerState::Running)
    }

    fn stop_container(&self, id: &str) -> Result<()> {
        self.record(&format!("stop:{id}"));
        self.check_fail("stop")?;
        self.set_state(id, ContainerState::Exited)
    }

    fn restart_container(&self, id: &str) -> Result<()> {
        self.record(&format!("restart:{id}"));
        self.check_fail("restart")?;
        self.set_state(id, ContainerState::Running)
    }

    fn pause_container(&self, id: &str) -> Result<()> {
        self.record(&format!("pause:{id}"));
        self.check_fail("pause")?;
        self.set_state(id, ContainerState::Paused)
    }

    fn unpause_container(&self, id: &str) -> Result<()> {
        self.record(&format!("unpause:{id}"));
        self.check_fail("unpause")?;
        self.set_state(id, ContainerState::Running)
    }

    fn kill_container(&self, id: &str) -> Result<()> {
        self.record(&format!("kill:{id}"));
        self.check_fail("kill")?;
        self.set_state(id, ContainerState::Exited)
    }

    fn remove_container(&self, id: &str) -> Result<()> {
        self.record(&format!("rm:{id}"));
        self.check_fail("remove_container")?;
        self.containers
            .write()
            .unwrap()
            .retain(|c| c.id != id && c.name != id);
        Ok(())
    }

    fn list_images(&self) -> Result<Vec<ImageSummary>> {
        self.record("list:images");
        self.check_fail("list_images")?;
        Ok(self.images.read().unwrap().clone())
    }

    fn inspect_image(&self, id: &str) -> Result<String> {
        self.record(&format!("inspect_image:{id}"));
        Ok(format!("{{\"Id\":\"{id}\"}}"))
    }

    fn remove_image(&self, id: &str, force: bool) -> Result<()> {
        self.record(&format!("rmi:{id}:{force}"));
        self.check_fail("remove_image")?;
        Ok(())
    }

    fn list_volumes(&self) -> Result<Vec<VolumeSummary>> {
        self.record("list:volumes");
        self.check_fail("list_volumes")?;
        Ok(self.volumes.read().unwrap().clone())
    }

    fn inspect_volume(&self, name: &str) -> Result<String> {
        self.record(&format!("inspect_volume:{name}"));
        Ok(format!("{{\"Name\":\"{name}\"}}"))
    }

    fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        self.record(&format!("volume_rm:{name}:{force}"));
        self.check_fail("remove_volume")?;
        Ok(())
    }

    fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        self.record("list:networks");
        self.check_fail("list_networks")?;
        Ok(self.networks.read().unwrap().clone())
    }

    fn inspect_network(&self, id: &str) -> Result<String> {
        self.record(&format!("inspect_network:{id}"));
        Ok(format!("{{\"Id\":\"{id}\"}}"))
    }

    fn remove_network(&self, id: &str) -> Result<()> {
        self.record(&format!("network_rm:{id}"));
        self.check_fail("remove_network")?;
        Ok(())
    }

    fn prune_containers(&self) -> Result<()> {
        self.record("prune:containers");
        self.check_fail("prune_containers")?;
        Ok(())
    }

    fn prune_images(&self) -> Result<()> {
        self.record("prune:images");
        self.check_fail("prune_images")?;
        Ok(())
    }

    fn prune_volumes(&self) -> Result<()> {
        self.record("prune:volumes");
        self.check_fail("prune_volumes")?;
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        self.record("ping");
        self.check_fail("ping")?;
        Ok(())
    }
}

/// Scripted compose tool: canned outcomes keyed by the joined argument list,
/// plus an invocation log. Unscripted invocations report the tool as absent,
/// which is the common case discovery must tolerate.
#[derive(Debug, Default)]
pub struct MockComposeTool {
    responses: RwLock<HashMap<String, ToolOutcome>>,
    legacy_responses: RwLock<HashMap<String, ToolOutcome>>,
    invocations: RwLock<Vec<String>>,
}

impl MockComposeTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, args: &[&str], outcome: ToolOutcome) {
        self.responses
            .write()
            .unwrap()
            .insert(args.join(" "), outcome);
    }

    /// Shorthand for a successful invocation returning `output`.
    pub fn set_success(&self, args: &[&str], output: &str) {
        self.set_response(args, ToolOutcome::Success(output.as_bytes().to_vec()));
    }

    pub fn set_legacy_response(&self, args: &[&str], outcome: ToolOutcome) {
        self.legacy_responses
            .write()
            .unwrap()
            .insert(args.join(" "), outcome);
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.read().unwrap().clone()
    }

    fn lookup(&self, table: &RwLock<HashMap<String, ToolOutcome>>, key: &str) -> ToolOutcome {
        table
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| {
                ToolOutcome::InvocationFailure("ferramenta compose não instalada".to_string())
            })
    }
}

impl ComposeTool for MockComposeTool {
    fn run(&self, args: &[&str], _deadline: Deadline) -> ToolOutcome {
        let key = args.join(" ");
        self.invocations.write().unwrap().push(key.clone());
        self.lookup(&self.responses, &key)
    }

    fn run_legacy(&self, args: &[&str], _deadline: Deadline) -> ToolOutcome {
        let key = args.join(" ");
        self.invocations
            .write()
            .unwrap()
            .push(format!("legacy:{key}"));
        self.lookup(&self.legacy_responses, &key)
    }
}
