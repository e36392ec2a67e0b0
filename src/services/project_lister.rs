use crate::domain::Project;
use crate::infra::compose_cli::{ComposeTool, Deadline, ToolOutcome};
use crate::infra::compose_file::{self, DECLARATION_CANDIDATES};
use crate::infra::interpret::{self, ProjectRecord};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Depth bound for the declaration-file scan.
const MAX_SCAN_DEPTH: usize = 6;

/// Builds the full compose project inventory.
///
/// Every step is best-effort: an absent tool, unreadable output or an
/// unreadable directory only narrows the result, it never fails the listing.
pub struct ProjectLister {
    tool: Arc<dyn ComposeTool>,
    scan_root: PathBuf,
}

impl ProjectLister {
    pub fn new(tool: Arc<dyn ComposeTool>, scan_root: PathBuf) -> Self {
        Self { tool, scan_root }
    }

    /// Full inventory: tool listing, path resolution, filesystem scan,
    /// merge. An empty result is a valid terminal state, not an error.
    pub fn list(&self, deadline: Deadline) -> Vec<Project> {
        let mut candidates = self.tool_projects(deadline);

        for project in &mut candidates {
            if project.path.as_os_str().is_empty() {
                project.path = self.resolve_path(&project.name, deadline);
            }
        }

        // Scanned candidates only fill names the tool did not report;
        // the tool's view of a known project is authoritative.
        for scanned in self.scan_declarations() {
            if !candidates.iter().any(|p| p.name == scanned.name) {
                candidates.push(scanned);
            }
        }

        merge_candidates(candidates)
    }

    /// Step 1: the tool's listing subcommand, through the interpreter.
    fn tool_projects(&self, deadline: Deadline) -> Vec<Project> {
        match self.tool.run(&["ls", "--format", "json"], deadline) {
            ToolOutcome::Success(bytes) => match interpret::interpret::<ProjectRecord>(&bytes) {
                Ok(interpreted) => {
                    debug!(
                        "listagem compose interpretada via {:?} ({} projeto(s))",
                        interpreted.strategy,
                        interpreted.records.len()
                    );
                    interpreted.records.into_iter().map(project_from_record).collect()
                }
                Err(err) => {
                    debug!("saída da listagem compose não interpretada: {}", err);
                    Vec::new()
                }
            },
            ToolOutcome::ToolFailure { output, code } => {
                debug!(
                    "listagem compose falhou (código {:?}): {}",
                    code,
                    String::from_utf8_lossy(&output).trim()
                );
                Vec::new()
            }
            ToolOutcome::InvocationFailure(cause) => {
                debug!("ferramenta compose indisponível: {}", cause);
                Vec::new()
            }
        }
    }

    /// Step 2: secondary lookups for a project the listing left pathless.
    ///
    /// Falls back to the current directory when both lookups fail; that
    /// value is unverified and logged as such, never surfaced as an error.
    fn resolve_path(&self, name: &str, deadline: Deadline) -> PathBuf {
        // (a) per-project configuration, working_dir field
        if let ToolOutcome::Success(bytes) = self.tool.run(
            &["--project-name", name, "config", "--format", "json"],
            deadline,
        ) {
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                if let Some(dir) = value.get("working_dir").and_then(|v| v.as_str()) {
                    if !dir.is_empty() {
                        return PathBuf::from(dir);
                    }
                }
            }
        }

        // (b) verbose listing, path column of the matching line
        if let ToolOutcome::Success(bytes) = self.tool.run(&["ls", "-a"], deadline) {
            let text = String::from_utf8_lossy(&bytes);
            for line in text.lines() {
                if line.contains(name) {
                    let columns: Vec<&str> = line.split_whitespace().collect();
                    if columns.len() >= 3 {
                        return PathBuf::from(columns[2]);
                    }
                }
            }
        }

        debug!(
            "caminho do projeto {} não verificado, assumindo diretório atual",
            name
        );
        PathBuf::from(".")
    }

    /// Step 3: scan the tree for declaration files by canonical name.
    fn scan_declarations(&self) -> Vec<Project> {
        let mut found = Vec::new();
        walk_for_declarations(&self.scan_root, 0, &mut found);
        debug!("varredura encontrou {} declaração(ões)", found.len());
        found
    }
}

fn project_from_record(record: ProjectRecord) -> Project {
    let mut project = Project::new(record.name, record.path);
    project.config_files = record.config_files;
    if !record.status.is_empty() {
        project.status = record.status;
    }
    project
}

fn walk_for_declarations(dir: &Path, depth: usize, out: &mut Vec<Project>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("diretório ignorado na varredura {:?}: {}", dir, err);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if path.is_dir() {
            if file_name.starts_with('.') {
                continue;
            }
            walk_for_declarations(&path, depth + 1, out);
        } else if DECLARATION_CANDIDATES.contains(&file_name) {
            let dir_path = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));

            // Prefer the declaration's own name field over the directory.
            let name = fs::read_to_string(&path)
                .ok()
                .and_then(|content| compose_file::declared_name(&content))
                .or_else(|| {
                    dir_path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(String::from)
                })
                .unwrap_or_else(|| "unknown".to_string());

            let mut project = Project::new(name, dir_path);
            project.config_files = path.display().to_string();
            out.push(project);
        }
    }
}

/// Merges discovery candidates into the final inventory.
///
/// A non-empty path discovered for a name is propagated to every same-named
/// candidate before deduplication on `name:path`.
pub fn merge_candidates(mut candidates: Vec<Project>) -> Vec<Project> {
    let mut known_paths: HashMap<String, PathBuf> = HashMap::new();
    for project in &candidates {
        if !project.path.as_os_str().is_empty() {
            known_paths
                .entry(project.name.clone())
                .or_insert_with(|| project.path.clone());
        }
    }

    for project in &mut candidates {
        if project.path.as_os_str().is_empty() {
            if let Some(path) = known_paths.get(&project.name) {
                project.path = path.clone();
            }
        }
    }

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|project| seen.insert(project.merge_key()))
        .collect()
}
