use crate::domain::{Container, ContainerRuntime, MatchKey, PROJECT_LABEL};
use crate::infra::compose_cli::{ComposeTool, Deadline, ToolOutcome};
use crate::infra::interpret::{self, ContainerRecord};
use std::sync::Arc;
use tracing::debug;

/// Resolves which runtime containers belong to a compose project.
///
/// Strategies form an ordered fallback chain; each one runs only when every
/// previous one came back empty, and none of them is fatal: a failing
/// runtime or tool call degrades that strategy to zero results.
pub struct ContainerMatcher {
    runtime: Arc<dyn ContainerRuntime>,
    tool: Arc<dyn ComposeTool>,
}

impl ContainerMatcher {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, tool: Arc<dyn ComposeTool>) -> Self {
        Self { runtime, tool }
    }

    pub fn containers_for(&self, project: &str, deadline: Deadline) -> Vec<Container> {
        if project.is_empty() {
            return Vec::new();
        }

        let key = MatchKey::new(project);

        let mut matched = self.label_pass(key.original());
        if matched.is_empty() {
            matched = self.variant_pass(&key);
        }
        if matched.is_empty() {
            matched = self.lowercase_pass(&key);
        }
        if matched.is_empty() {
            matched = self.tool_pass(project, deadline);
        }
        if matched.is_empty() {
            matched = self.token_pass(&key);
        }

        debug!(
            "{} container(s) associados ao projeto {}",
            matched.len(),
            project
        );
        matched
    }

    /// Step 1: exact project-label lookup.
    fn label_pass(&self, name: &str) -> Vec<Container> {
        self.label_lookup(name)
    }

    /// Step 2: dash/underscore respellings, over labels and names.
    ///
    /// The name check follows the `<project>_<service>_<index>` convention:
    /// a container belongs here when its name equals a spelling variant or
    /// starts with one followed by a separator.
    fn variant_pass(&self, key: &MatchKey) -> Vec<Container> {
        let mut found = Vec::new();

        for variant in key.alternate_spellings() {
            append_unique(&mut found, self.label_lookup(variant));
        }

        let by_name: Vec<Container> = self
            .all_containers()
            .into_iter()
            .filter(|container| name_matches_pattern(key, &container.name))
            .collect();
        append_unique(&mut found, by_name);

        found
    }

    /// Step 3: fully lowercased name, when it differs.
    fn lowercase_pass(&self, key: &MatchKey) -> Vec<Container> {
        match key.lowered() {
            Some(lower) => self.label_lookup(lower),
            None => Vec::new(),
        }
    }

    /// Step 4: the tool's own per-project listing, cross-referenced against
    /// the runtime by identifier prefix (tool ids may be shorter or longer
    /// than the runtime's canonical short form).
    fn tool_pass(&self, project: &str, deadline: Deadline) -> Vec<Container> {
        let mut records = self.tool_records(
            self.tool
                .run(&["--project-name", project, "ps", "--format", "json"], deadline),
        );

        // Older tool generations: plain text, then the hyphenated binary.
        if records.is_empty() {
            records = self.tool_records(
                self.tool
                    .run(&["--project-name", project, "ps"], deadline),
            );
        }
        if records.is_empty() {
            records = self.tool_records(
                self.tool
                    .run_legacy(&["--project-name", project, "ps"], deadline),
            );
        }

        if records.is_empty() {
            return Vec::new();
        }

        let all = self.all_containers();
        let mut found = Vec::new();
        for record in records {
            let record_id = record.short_id();
            if record_id.is_empty() {
                continue;
            }
            let hit = all.iter().find(|container| {
                container.id.starts_with(&record_id) || record_id.starts_with(&container.id)
            });
            if let Some(container) = hit {
                append_unique(&mut found, vec![container.clone()]);
            }
        }
        found
    }

    /// Step 5: last resort. Split every container name on underscores and
    /// look for a token equal to the project name or one of its variants
    /// (covers `<project>_<service>_<index>` naming without any labels).
    fn token_pass(&self, key: &MatchKey) -> Vec<Container> {
        let mut found = Vec::new();
        for container in self.all_containers() {
            let is_match = container
                .name
                .split('_')
                .any(|token| key.matches(token));
            if is_match {
                append_unique(&mut found, vec![container]);
            }
        }
        found
    }

    fn label_lookup(&self, value: &str) -> Vec<Container> {
        match self.runtime.containers_with_label(PROJECT_LABEL, value) {
            Ok(containers) => containers,
            Err(err) => {
                debug!("consulta por label {}={} falhou: {}", PROJECT_LABEL, value, err);
                Vec::new()
            }
        }
    }

    fn all_containers(&self) -> Vec<Container> {
        match self.runtime.list_containers(true) {
            Ok(containers) => containers,
            Err(err) => {
                debug!("listagem completa de containers falhou: {}", err);
                Vec::new()
            }
        }
    }

    fn tool_records(&self, outcome: ToolOutcome) -> Vec<ContainerRecord> {
        match outcome {
            ToolOutcome::Success(bytes) => {
                match interpret::interpret::<ContainerRecord>(&bytes) {
                    Ok(interpreted) => interpreted.records,
                    Err(err) => {
                        debug!("saída do ps compose não interpretada: {}", err);
                        Vec::new()
                    }
                }
            }
            ToolOutcome::ToolFailure { code, .. } => {
                debug!("ps compose falhou (código {:?})", code);
                Vec::new()
            }
            ToolOutcome::InvocationFailure(cause) => {
                debug!("ferramenta compose indisponível: {}", cause);
                Vec::new()
            }
        }
    }
}

/// Whether a container name follows the project's naming pattern: equal to
/// one of the spelling variants, or prefixed by one plus a separator.
fn name_matches_pattern(key: &MatchKey, name: &str) -> bool {
    let name = name.to_lowercase();
    key.all_forms().iter().any(|form| {
        let form = form.to_lowercase();
        if name == form {
            return true;
        }
        name.strip_prefix(&form)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|next| next == '_' || next == '-')
    })
}

/// Appends containers not yet collected, deduplicating by identifier.
fn append_unique(collected: &mut Vec<Container>, incoming: Vec<Container>) {
    for container in incoming {
        if !collected.iter().any(|c| c.id == container.id) {
            collected.push(container);
        }
    }
}
