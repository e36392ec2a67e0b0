use crate::domain::{Container, ContainerRuntime, Project, Service};
use crate::infra::compose_cli::{ComposeTool, Deadline, ToolOutcome};
use crate::infra::compose_file::{self, DeclarationError};
use crate::services::{ContainerMatcher, ProjectLister};
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Public entry points of the discovery/reconciliation engine.
///
/// Every operation takes a [`Deadline`] and honors it: an expired deadline
/// yields an empty (or partial) result immediately ("no results yet", never
/// a data error) and in-flight tool invocations are bounded by it.
pub struct ComposeService {
    runtime: Arc<dyn ContainerRuntime>,
    tool: Arc<dyn ComposeTool>,
    lister: ProjectLister,
    matcher: ContainerMatcher,
}

impl ComposeService {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        tool: Arc<dyn ComposeTool>,
        scan_root: PathBuf,
    ) -> Self {
        let lister = ProjectLister::new(tool.clone(), scan_root);
        let matcher = ContainerMatcher::new(runtime.clone(), tool.clone());
        Self {
            runtime,
            tool,
            lister,
            matcher,
        }
    }

    /// Full project inventory. Empty is a valid terminal state.
    pub fn list_projects(&self, deadline: Deadline) -> Vec<Project> {
        if deadline.expired() {
            debug!("prazo esgotado, listagem de projetos retornando vazia");
            return Vec::new();
        }
        self.lister.list(deadline)
    }

    /// Declared services for the project at `path`.
    ///
    /// Reads and parses the declaration; when the scanner finds nothing the
    /// tool's own service listing is tried before the parse error surfaces.
    pub fn list_services(
        &self,
        path: &Path,
        deadline: Deadline,
    ) -> Result<Vec<Service>, DeclarationError> {
        if deadline.expired() {
            debug!("prazo esgotado, listagem de serviços retornando vazia");
            return Ok(Vec::new());
        }

        let content = compose_file::read(path)?;

        match compose_file::parse_services(&content) {
            Ok(services) => Ok(services),
            Err(parse_err) => {
                debug!("scanner não encontrou serviços, tentando a ferramenta compose");
                match self.tool_service_names(path, deadline) {
                    Some(services) if !services.is_empty() => Ok(services),
                    _ => Err(parse_err),
                }
            }
        }
    }

    /// Containers belonging to the named project.
    pub fn containers_for_project(&self, name: &str, deadline: Deadline) -> Vec<Container> {
        if deadline.expired() {
            debug!("prazo esgotado, associação de containers retornando vazia");
            return Vec::new();
        }
        self.matcher.containers_for(name, deadline)
    }

    /// Fills each service's observed containers and, where live samples are
    /// available, aggregated cpu/memory. Best-effort: absent observations
    /// leave the fields empty rather than implying a zero reading.
    pub fn annotate_services(&self, services: &mut [Service], project: &str, deadline: Deadline) {
        let containers = self.containers_for_project(project, deadline);
        if containers.is_empty() {
            return;
        }

        for service in services.iter_mut() {
            let realized: Vec<&Container> = containers
                .iter()
                .filter(|container| realizes(container, &service.name))
                .collect();
            if realized.is_empty() {
                continue;
            }

            service.containers = Some(realized.iter().map(|c| c.name.clone()).collect());

            let mut cpu = 0.0;
            let mut memory = 0u64;
            let mut sampled = false;
            for container in realized.iter().filter(|c| c.state.is_running()) {
                if deadline.expired() {
                    break;
                }
                match self.runtime.container_stats(&container.id) {
                    Ok(sample) if !sample.partial => {
                        cpu += sample.cpu_percent;
                        memory += sample.memory_usage;
                        sampled = true;
                    }
                    Ok(_) => debug!("amostra parcial ignorada para {}", container.name),
                    Err(err) => debug!("estatísticas indisponíveis para {}: {}", container.name, err),
                }
            }
            if sampled {
                service.cpu_percent = Some(cpu);
                service.memory_usage = Some(memory);
            }
        }
    }

    /// Starts the project in detached mode.
    pub fn up(&self, path: &Path, deadline: Deadline) -> Result<()> {
        self.lifecycle(path, &["up", "-d"], "subindo projeto compose", deadline)
    }

    /// Stops and removes the project's containers.
    pub fn down(&self, path: &Path, deadline: Deadline) -> Result<()> {
        self.lifecycle(path, &["down"], "derrubando projeto compose", deadline)
    }

    /// Pulls the project's images.
    pub fn pull(&self, path: &Path, deadline: Deadline) -> Result<()> {
        self.lifecycle(path, &["pull"], "baixando imagens do projeto", deadline)
    }

    /// Project logs as one text blob.
    pub fn logs(&self, path: &Path, deadline: Deadline) -> Result<String> {
        self.capture(path, &["logs"], "lendo logs do projeto", deadline)
    }

    /// Raw `ps` text for the project directory.
    pub fn ps_text(&self, path: &Path, deadline: Deadline) -> Result<String> {
        self.capture(path, &["ps"], "listando containers do projeto", deadline)
    }

    /// Rendered configuration for the project directory.
    pub fn config_text(&self, path: &Path, deadline: Deadline) -> Result<String> {
        self.capture(path, &["config"], "validando configuração do projeto", deadline)
    }

    fn tool_service_names(&self, path: &Path, deadline: Deadline) -> Option<Vec<Service>> {
        let file = compose_file::locate(path).ok()?;
        let file = file.to_string_lossy().into_owned();
        let outcome = self
            .tool
            .run(&["--file", &file, "config", "--services"], deadline);

        let bytes = outcome.success_bytes()?;
        let names: Vec<Service> = String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Service::named)
            .collect();
        Some(names)
    }

    fn lifecycle(
        &self,
        path: &Path,
        action: &[&str],
        context: &str,
        deadline: Deadline,
    ) -> Result<()> {
        let dir = path.to_string_lossy().into_owned();
        let mut args = vec!["--project-directory", dir.as_str()];
        args.extend_from_slice(action);

        match self.tool.run(&args, deadline) {
            ToolOutcome::Success(_) => Ok(()),
            ToolOutcome::ToolFailure { output, code } => {
                bail!(
                    "{context}: ferramenta compose retornou código {:?}: {}",
                    code,
                    String::from_utf8_lossy(&output).trim()
                )
            }
            ToolOutcome::InvocationFailure(cause) => bail!("{context}: {cause}"),
        }
    }

    fn capture(
        &self,
        path: &Path,
        action: &[&str],
        context: &str,
        deadline: Deadline,
    ) -> Result<String> {
        let dir = path.to_string_lossy().into_owned();
        let mut args = vec!["--project-directory", dir.as_str()];
        args.extend_from_slice(action);

        match self.tool.run(&args, deadline) {
            ToolOutcome::Success(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            ToolOutcome::ToolFailure { output, code } => {
                // Partial output still has diagnostic value; surface it.
                warn!("{context}: código {:?}", code);
                bail!(
                    "{context}: ferramenta compose retornou código {:?}: {}",
                    code,
                    String::from_utf8_lossy(&output).trim()
                )
            }
            ToolOutcome::InvocationFailure(cause) => bail!("{context}: {cause}"),
        }
    }
}

/// Whether a container realizes the named service: by service label first,
/// then by the `<project>_<service>_<index>` naming convention.
fn realizes(container: &Container, service: &str) -> bool {
    if let Some(labelled) = container.service() {
        return labelled == service;
    }
    container
        .name
        .split(['_', '-'])
        .any(|token| token == service)
}
