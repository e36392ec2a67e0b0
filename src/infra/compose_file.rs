use crate::domain::Service;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Canonical declaration filenames, probed in this order.
pub const DECLARATION_CANDIDATES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Recoverable declaration conditions the caller branches on.
#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("nenhum arquivo compose encontrado em {0}")]
    NotFound(PathBuf),
    #[error("falha ao ler {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("arquivo compose vazio: {0}")]
    EmptyDeclaration(PathBuf),
    #[error("nenhuma seção 'services' reconhecida na declaração")]
    InvalidFormat,
}

/// Resolves a declaration file from a path.
///
/// A regular file is used directly; a directory is probed for the canonical
/// filenames in order.
pub fn locate(path: &Path) -> Result<PathBuf, DeclarationError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        for candidate in DECLARATION_CANDIDATES {
            let full = path.join(candidate);
            if full.is_file() {
                debug!("declaração encontrada: {:?}", full);
                return Ok(full);
            }
        }
    }
    Err(DeclarationError::NotFound(path.to_path_buf()))
}

/// Locates and reads a declaration, distinguishing the empty-file case.
pub fn read(path: &Path) -> Result<String, DeclarationError> {
    let file = locate(path)?;
    let content = fs::read_to_string(&file).map_err(|source| DeclarationError::ReadFailure {
        path: file.clone(),
        source,
    })?;
    if content.is_empty() {
        return Err(DeclarationError::EmptyDeclaration(file));
    }
    Ok(content)
}

/// Indentation depth of a line: each space counts 1, each tab counts 4.
///
/// Tabs are counted without validating alignment consistency against spaces;
/// callers rely on this tolerance.
fn indent_of(line: &str) -> usize {
    let mut depth = 0;
    for ch in line.chars() {
        match ch {
            ' ' => depth += 1,
            '\t' => depth += 4,
            _ => break,
        }
    }
    depth
}

fn skippable(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Extracts the declaration's own top-level `name:` value, when present.
pub fn declared_name(content: &str) -> Option<String> {
    for line in content.lines() {
        let trimmed = line.trim();
        if skippable(trimmed) {
            continue;
        }
        if indent_of(line) == 0 {
            if let Some(value) = trimmed.strip_prefix("name:") {
                let value = unquote(value);
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Two-pass indentation scanner over declaration text.
///
/// This is deliberately not a full YAML parser: the declaration format is a
/// YAML subset and the scanner only needs the `services` section, direct
/// `image:` scalars and port list items. Pass 1 finds the section and its
/// direct children; pass 2 re-scans for each service's attributes.
pub fn parse_services(content: &str) -> Result<Vec<Service>, DeclarationError> {
    let names = scan_service_names(content);
    if names.is_empty() {
        return Err(DeclarationError::InvalidFormat);
    }

    Ok(names
        .into_iter()
        .map(|name| scan_service_attributes(content, name))
        .collect())
}

/// Pass 1: find the `services` section and its direct child entries.
fn scan_service_names(content: &str) -> Vec<String> {
    let mut in_services = false;
    let mut services_indent = 0;
    let mut names: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if skippable(trimmed) {
            continue;
        }
        let indent = indent_of(line);

        if !in_services {
            if trimmed.starts_with("services:") {
                in_services = true;
                services_indent = indent;
            }
            continue;
        }

        // Any content at the section's depth or above ends it.
        if indent <= services_indent {
            in_services = false;
            continue;
        }

        if indent == services_indent + 2 && trimmed.ends_with(':') {
            let name = trimmed.trim_end_matches(':').to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    names
}

/// Pass 2: collect one service's direct scalar attributes and port items.
fn scan_service_attributes(content: &str, name: String) -> Service {
    let mut service = Service::named(name);
    let mut in_definition = false;
    let mut service_indent = 0;
    // Key of the list currently open at the attribute depth, used to decide
    // whether a list item is a port mapping.
    let mut list_key: Option<String> = None;

    let header = format!("{}:", service.name);

    for line in content.lines() {
        let trimmed = line.trim();
        if skippable(trimmed) {
            continue;
        }
        let indent = indent_of(line);

        if !in_definition {
            if trimmed.starts_with(&header) {
                in_definition = true;
                service_indent = indent;
                list_key = None;
            }
            continue;
        }

        if indent <= service_indent {
            in_definition = false;
            continue;
        }

        if indent == service_indent + 2 {
            if let Some(image) = trimmed.strip_prefix("image:") {
                service.image = Some(unquote(image).to_string());
                list_key = None;
            } else if trimmed.ends_with(':') {
                list_key = Some(trimmed.trim_end_matches(':').to_lowercase());
            } else {
                list_key = None;
            }
        } else if indent == service_indent + 4 {
            if let Some(item) = trimmed.strip_prefix("- ") {
                let is_ports = list_key.as_deref().is_some_and(|key| key.contains("port"));
                if is_ports {
                    service.ports.push(unquote(item).to_string());
                }
            }
        }
    }

    service
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FIXTURE: &str = r#"services:
  web:
    image: nginx:latest
    ports:
      - "8080:80"
  db:
    image: postgres:14
"#;

    #[test]
    fn test_locate_prefers_direct_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("anything.yml");
        fs::write(&file, "services:\n").unwrap();
        assert_eq!(locate(&file).unwrap(), file);
    }

    #[test]
    fn test_locate_probes_candidates_in_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("compose.yaml"), "services:\n").unwrap();
        fs::write(temp.path().join("docker-compose.yml"), "services:\n").unwrap();

        let found = locate(temp.path()).unwrap();
        assert_eq!(found, temp.path().join("docker-compose.yml"));
    }

    #[test]
    fn test_locate_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            locate(temp.path()),
            Err(DeclarationError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_empty_file_is_distinct() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("compose.yml"), "").unwrap();
        assert!(matches!(
            read(temp.path()),
            Err(DeclarationError::EmptyDeclaration(_))
        ));
    }

    #[test]
    fn test_parses_fixture_services() {
        let services = parse_services(FIXTURE).unwrap();
        assert_eq!(services.len(), 2);

        let web = &services[0];
        assert_eq!(web.name, "web");
        assert_eq!(web.image.as_deref(), Some("nginx:latest"));
        assert_eq!(web.ports, vec!["8080:80"]);

        let db = &services[1];
        assert_eq!(db.name, "db");
        assert_eq!(db.image.as_deref(), Some("postgres:14"));
        assert!(db.ports.is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let content = "# top comment\n\nservices:\n  # inline comment\n  api:\n\n    image: app:1\n";
        let services = parse_services(content).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "api");
        assert_eq!(services[0].image.as_deref(), Some("app:1"));
    }

    #[test]
    fn test_tab_counts_as_four_units() {
        // A tab-indented sibling section at depth 4 must not read as a
        // service entry (those live at depth 2).
        let content = "services:\n  api:\n\tbuild: .\n  worker:\n    image: w:1\n";
        let services = parse_services(content).unwrap();
        let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["api", "worker"]);
    }

    #[test]
    fn test_section_ends_at_shallower_indent() {
        let content = "services:\n  api:\n    image: app:1\nvolumes:\n  data:\n";
        let services = parse_services(content).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "api");
    }

    #[test]
    fn test_non_port_lists_are_ignored() {
        let content = "services:\n  api:\n    image: app:1\n    environment:\n      - FOO=bar\n    ports:\n      - 9000:9000\n";
        let services = parse_services(content).unwrap();
        assert_eq!(services[0].ports, vec!["9000:9000"]);
    }

    #[test]
    fn test_missing_services_section_is_invalid_format() {
        assert!(matches!(
            parse_services("volumes:\n  data:\n"),
            Err(DeclarationError::InvalidFormat)
        ));
    }

    #[test]
    fn test_declared_name_extraction() {
        assert_eq!(
            declared_name("name: storefront\nservices:\n  web:\n"),
            Some("storefront".to_string())
        );
        assert_eq!(
            declared_name("name: \"quoted\"\nservices:\n"),
            Some("quoted".to_string())
        );
        assert_eq!(declared_name("services:\n  name-less:\n"), None);
    }
}
