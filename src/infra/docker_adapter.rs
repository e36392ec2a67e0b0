use crate::domain::{
    Container, ContainerRuntime, ContainerState, ImageSummary, NetworkSummary, StatsSample,
    VolumeSummary, short_id,
};
use crate::infra::stats;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Runtime client backed by the `docker` CLI.
///
/// Listing commands request `--format '{{json .}}'`, one JSON object per
/// line; the adapter normalizes those lines into domain snapshots. The wire
/// protocol itself stays with the CLI.
#[derive(Debug)]
pub struct DockerAdapter;

impl DockerAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Whether the runtime CLI is present on this host.
    pub fn available() -> bool {
        Command::new("docker")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Default for DockerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// One `docker ps` line in json format.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PsLine {
    #[serde(alias = "ID")]
    id: String,
    #[serde(alias = "Names")]
    names: String,
    #[serde(alias = "Image")]
    image: String,
    #[serde(alias = "Command")]
    command: String,
    #[serde(alias = "CreatedAt")]
    created_at: String,
    #[serde(alias = "Status")]
    status: String,
    #[serde(alias = "State")]
    state: String,
    #[serde(alias = "Ports")]
    ports: String,
    #[serde(alias = "Labels")]
    labels: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageLine {
    #[serde(alias = "ID")]
    id: String,
    #[serde(alias = "Repository")]
    repository: String,
    #[serde(alias = "Tag")]
    tag: String,
    #[serde(alias = "CreatedAt")]
    created_at: String,
    #[serde(alias = "Size")]
    size: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VolumeLine {
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Driver")]
    driver: String,
    #[serde(alias = "Mountpoint")]
    mountpoint: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NetworkLine {
    #[serde(alias = "ID")]
    id: String,
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Driver")]
    driver: String,
    #[serde(alias = "Scope")]
    scope: String,
}

impl ContainerRuntime for DockerAdapter {
    fn list_containers(&self, all: bool) -> Result<Vec<Container>> {
        let mut args = vec!["ps"];
        if all {
            args.push("-a");
        }
        args.extend(["--format", "{{json .}}"]);

        let output = docker_output(&args, "listando containers")?;
        Ok(parse_lines::<PsLine>(&output)
            .into_iter()
            .map(container_from_line)
            .collect())
    }

    fn containers_with_label(&self, key: &str, value: &str) -> Result<Vec<Container>> {
        let filter = format!("label={key}={value}");
        let args = ["ps", "-a", "--filter", &filter, "--format", "{{json .}}"];

        let output = docker_output(&args, "listando containers por label")?;
        Ok(parse_lines::<PsLine>(&output)
            .into_iter()
            .map(container_from_line)
            .collect())
    }

    fn inspect_container(&self, id: &str) -> Result<String> {
        let output = docker_output(&["inspect", id], &format!("inspecionando container {id}"))?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    fn container_logs(&self, id: &str, tail: usize) -> Result<String> {
        let tail = tail.to_string();
        let args = ["logs", "--timestamps", "--tail", &tail, id];
        // Containers write to both streams; capture them together.
        let output = Command::new("docker")
            .args(args)
            .output()
            .with_context(|| format!("lendo logs de {id}"))?;
        if !output.status.success() {
            bail!(
                "docker logs retornou status {:?}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    fn container_stats(&self, id: &str) -> Result<StatsSample> {
        let args = ["stats", "--no-stream", "--format", "{{json .}}", id];
        let output = docker_output(&args, &format!("coletando estatísticas de {id}"))?;
        let text = String::from_utf8_lossy(&output);
        let line = text
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default();
        Ok(stats::decode_line(line))
    }

    fn start_container(&self, id: &str) -> Result<()> {
        docker(["start", id], &format!("iniciando container {id}"))
    }

    fn stop_container(&self, id: &str) -> Result<()> {
        docker(["stop", "-t", "10", id], &format!("parando container {id}"))
    }

    fn restart_container(&self, id: &str) -> Result<()> {
        docker(
            ["restart", "-t", "10", id],
            &format!("reiniciando container {id}"),
        )
    }

    fn pause_container(&self, id: &str) -> Result<()> {
        docker(["pause", id], &format!("pausando container {id}"))
    }

    fn unpause_container(&self, id: &str) -> Result<()> {
        docker(["unpause", id], &format!("retomando container {id}"))
    }

    fn kill_container(&self, id: &str) -> Result<()> {
        docker(["kill", id], &format!("matando container {id}"))
    }

    fn remove_container(&self, id: &str) -> Result<()> {
        docker(["rm", "-f", id], &format!("removendo container {id}"))
    }

    fn list_images(&self) -> Result<Vec<ImageSummary>> {
        let output = docker_output(&["images", "--format", "{{json .}}"], "listando imagens")?;
        Ok(parse_lines::<ImageLine>(&output)
            .into_iter()
            .map(|line| {
                let repo_tag = if line.repository.is_empty() || line.repository == "<none>" {
                    "<none>:<none>".to_string()
                } else {
                    format!("{}:{}", line.repository, line.tag)
                };
                ImageSummary {
                    id: short_id(&line.id),
                    repo_tags: vec![repo_tag],
                    size: line.size,
                    created: parse_created(&line.created_at),
                }
            })
            .collect())
    }

    fn inspect_image(&self, id: &str) -> Result<String> {
        let output = docker_output(
            &["image", "inspect", id],
            &format!("inspecionando imagem {id}"),
        )?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    fn remove_image(&self, id: &str, force: bool) -> Result<()> {
        let mut args = vec!["rmi"];
        if force {
            args.push("-f");
        }
        args.push(id);
        docker(args, &format!("removendo imagem {id}"))
    }

    fn list_volumes(&self) -> Result<Vec<VolumeSummary>> {
        let output = docker_output(
            &["volume", "ls", "--format", "{{json .}}"],
            "listando volumes",
        )?;
        Ok(parse_lines::<VolumeLine>(&output)
            .into_iter()
            .map(|line| VolumeSummary {
                name: line.name,
                driver: line.driver,
                mountpoint: line.mountpoint,
            })
            .collect())
    }

    fn inspect_volume(&self, name: &str) -> Result<String> {
        let output = docker_output(
            &["volume", "inspect", name],
            &format!("inspecionando volume {name}"),
        )?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        let mut args = vec!["volume", "rm"];
        if force {
            args.push("-f");
        }
        args.push(name);
        docker(args, &format!("removendo volume {name}"))
    }

    fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let output = docker_output(
            &["network", "ls", "--format", "{{json .}}"],
            "listando redes",
        )?;
        Ok(parse_lines::<NetworkLine>(&output)
            .into_iter()
            .map(|line| NetworkSummary {
                id: short_id(&line.id),
                name: line.name,
                driver: line.driver,
                scope: line.scope,
            })
            .collect())
    }

    fn inspect_network(&self, id: &str) -> Result<String> {
        let output = docker_output(
            &["network", "inspect", id],
            &format!("inspecionando rede {id}"),
        )?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    fn remove_network(&self, id: &str) -> Result<()> {
        docker(["network", "rm", id], &format!("removendo rede {id}"))
    }

    fn prune_containers(&self) -> Result<()> {
        docker(["container", "prune", "-f"], "removendo containers parados")
    }

    fn prune_images(&self) -> Result<()> {
        docker(["image", "prune", "-af"], "removendo imagens não utilizadas")
    }

    fn prune_volumes(&self) -> Result<()> {
        docker(["volume", "prune", "-f"], "removendo volumes órfãos")
    }

    fn ping(&self) -> Result<()> {
        docker(
            ["version", "--format", "{{.Server.Version}}"],
            "verificando acesso ao runtime",
        )
    }
}

fn container_from_line(line: PsLine) -> Container {
    let state = if line.state.is_empty() {
        ContainerState::from_status_text(&line.status)
    } else {
        ContainerState::parse(&line.state)
    };

    // Multiple names are comma-joined; keep the first, without the leading
    // slash some versions prepend.
    let name = line
        .names
        .split(',')
        .next()
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string();

    Container {
        id: short_id(&line.id),
        name,
        image: line.image,
        command: line.command.trim_matches('"').to_string(),
        status: line.status,
        state,
        created: parse_created(&line.created_at),
        ports: split_list(&line.ports),
        labels: parse_labels(&line.labels),
    }
}

/// "2024-03-05 10:11:12 +0000 UTC" -> UTC timestamp; None when absent.
fn parse_created(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Drop the trailing zone name; the numeric offset is authoritative.
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    let candidate = format!("{} {} {}", parts[0], parts[1], parts[2]);
    DateTime::parse_from_str(&candidate, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// "a=1,b=2" -> {a: 1, b: 2}
fn parse_labels(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_lines<T: DeserializeOwned>(output: &[u8]) -> Vec<T> {
    let text = String::from_utf8_lossy(output);
    let mut parsed = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(value) => parsed.push(value),
            Err(err) => debug!("linha ignorada na saída do runtime: {}", err),
        }
    }
    parsed
}

fn docker<I, S>(args: I, context: &str) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let status = docker_status(args, context)?;
    ensure_success(status, context)
}

fn docker_status<I, S>(args: I, context: &str) -> Result<ExitStatus>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new("docker")
        .args(args.into_iter().map(|item| item.as_ref().to_os_string()))
        .status()
        .with_context(|| context.to_string())
}

fn docker_output(args: &[&str], context: &str) -> Result<Vec<u8>> {
    let output = Command::new("docker")
        .args(args)
        .output()
        .with_context(|| context.to_string())?;

    if !output.status.success() {
        bail!(
            "docker retornou status {:?} ({context}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(output.stdout)
}

fn ensure_success(status: ExitStatus, context: &str) -> Result<()> {
    if status.success() {
        return Ok(());
    }

    bail!("docker retornou status {:?} ({context})", status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PROJECT_LABEL, SERVICE_LABEL};

    #[test]
    fn test_container_from_ps_line() {
        let line: PsLine = serde_json::from_str(
            r#"{"ID":"abcdef1234567890","Names":"/myapp_web_1","Image":"nginx:latest",
                "Command":"\"nginx -g daemon off\"","CreatedAt":"2024-03-05 10:11:12 +0000 UTC",
                "Status":"Up 2 hours","State":"running",
                "Ports":"0.0.0.0:8080->80/tcp, :::8080->80/tcp",
                "Labels":"com.docker.compose.project=myapp,com.docker.compose.service=web"}"#,
        )
        .unwrap();

        let container = container_from_line(line);
        assert_eq!(container.id, "abcdef123456");
        assert_eq!(container.name, "myapp_web_1");
        assert_eq!(container.state, ContainerState::Running);
        assert_eq!(container.ports.len(), 2);
        assert_eq!(container.label(PROJECT_LABEL), Some("myapp"));
        assert_eq!(container.label(SERVICE_LABEL), Some("web"));
        assert!(container.created.is_some());
    }

    #[test]
    fn test_state_derived_from_status_when_absent() {
        let line = PsLine {
            id: "0123456789abcdef".into(),
            names: "old_tool".into(),
            status: "Exited (0) 3 days ago".into(),
            ..PsLine::default()
        };
        let container = container_from_line(line);
        assert_eq!(container.state, ContainerState::Exited);
        assert!(container.created.is_none());
    }

    #[test]
    fn test_parse_labels_tolerates_garbage() {
        let labels = parse_labels("a=1,notapair,=empty,b=2");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("a").map(String::as_str), Some("1"));
        assert_eq!(labels.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parse_lines_skips_bad_json() {
        let output = b"{\"ID\":\"aaa\"}\nnot json\n{\"ID\":\"bbb\"}\n";
        let lines = parse_lines::<PsLine>(output);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_parse_created_handles_zone_suffix() {
        let parsed = parse_created("2023-09-26 13:04:04 +0200 CEST");
        assert!(parsed.is_some());
        assert!(parse_created("").is_none());
        assert!(parse_created("yesterday").is_none());
    }
}
