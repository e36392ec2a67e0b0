use crate::domain::{ContainerState, short_id};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Which decode strategy produced the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Strict JSON array of objects.
    JsonArray,
    /// Single JSON object, wrapped as a one-element result (some tool
    /// versions emit one object instead of a one-element array).
    JsonObject,
    /// Whitespace-tokenized tabular text.
    Table,
}

/// A record type the tabular fallback knows how to assemble.
pub trait TableRecord: Sized {
    /// Column names that mark the first output line as a header.
    const HEADER_TOKENS: &'static [&'static str] =
        &["NAME", "ID", "STATUS", "IMAGE", "CONTAINER"];

    /// Builds a record from the whitespace-split fields of one line.
    fn from_row(fields: &[&str]) -> Option<Self>;

    /// Builds a record from a JSON-ish line fragment (quoted key/value
    /// pairs on one line), for outputs that are neither valid JSON nor
    /// cleanly tabular. Default: not applicable.
    fn from_fragment(_line: &str) -> Option<Self> {
        None
    }

    /// A decoded record only counts when it carries an identity.
    fn is_well_formed(&self) -> bool;
}

/// Diagnostic for an output no strategy could interpret.
///
/// This is informational, never fatal: absence of any interpretable output is
/// a normal state for hosts that do not use the tool at all.
#[derive(Debug, Error)]
#[error("nenhuma estratégia interpretou a saída (array: {array}; objeto: {object}; tabela: {table})")]
pub struct InterpretError {
    pub array: String,
    pub object: String,
    pub table: String,
}

#[derive(Debug)]
pub struct Interpreted<T> {
    pub records: Vec<T>,
    pub strategy: Strategy,
}

/// Decode-attempt ladder over raw tool output.
///
/// Tries, in order: JSON array, single JSON object, tabular text. The first
/// strategy yielding at least one well-formed record wins; exhaustion returns
/// the per-strategy reasons for diagnostics.
pub fn interpret<T>(bytes: &[u8]) -> Result<Interpreted<T>, InterpretError>
where
    T: DeserializeOwned + TableRecord,
{
    let text = String::from_utf8_lossy(bytes);

    let array = match serde_json::from_str::<Vec<T>>(&text) {
        Ok(parsed) => {
            let records: Vec<T> = parsed.into_iter().filter(T::is_well_formed).collect();
            if records.is_empty() {
                "array sem registros bem-formados".to_string()
            } else {
                return Ok(Interpreted {
                    records,
                    strategy: Strategy::JsonArray,
                });
            }
        }
        Err(err) => err.to_string(),
    };

    let object = match serde_json::from_str::<T>(&text) {
        Ok(record) if record.is_well_formed() => {
            return Ok(Interpreted {
                records: vec![record],
                strategy: Strategy::JsonObject,
            });
        }
        Ok(_) => "objeto sem identidade".to_string(),
        Err(err) => err.to_string(),
    };

    let records = scan_table::<T>(&text);
    if !records.is_empty() {
        return Ok(Interpreted {
            records,
            strategy: Strategy::Table,
        });
    }

    Err(InterpretError {
        array,
        object,
        table: "nenhuma linha tabular reconhecida".to_string(),
    })
}

/// Manual tabular scanner.
///
/// The first line is treated as a header only when it contains a
/// recognizable column name; every other non-empty line is tokenized on
/// whitespace and handed to the record type.
fn scan_table<T: TableRecord>(text: &str) -> Vec<T> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if index == 0 && looks_like_header(trimmed, T::HEADER_TOKENS) {
            continue;
        }
        if let Some(record) = T::from_fragment(trimmed) {
            records.push(record);
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if let Some(record) = T::from_row(&fields) {
            records.push(record);
        }
    }
    records
}

fn looks_like_header(line: &str, tokens: &[&str]) -> bool {
    let upper = line.to_uppercase();
    tokens.iter().any(|token| upper.contains(token))
}

/// Extracts the value following `"key":` on a JSON-ish line, trimming
/// surrounding quotes, commas and braces.
fn extract_fragment_field(line: &str, key: &str) -> Option<String> {
    let marker = format!("\"{key}\":");
    let rest = &line[line.find(&marker)? + marker.len()..];
    let value = rest.split(',').next().unwrap_or_default();
    let value = value.trim().trim_matches(|c| "\"{} \t".contains(c));
    (!value.is_empty()).then(|| value.to_string())
}

/// Project entry as emitted by the tool's listing subcommand.
///
/// Aliases absorb the casing drift between tool versions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectRecord {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Path")]
    pub path: String,
    #[serde(alias = "Status")]
    pub status: String,
    #[serde(alias = "ConfigFiles", alias = "configFiles")]
    pub config_files: String,
}

impl TableRecord for ProjectRecord {
    fn from_row(fields: &[&str]) -> Option<Self> {
        if fields.len() < 2 {
            return None;
        }
        Some(Self {
            name: fields[0].to_string(),
            status: fields[1].to_string(),
            path: fields.get(2).map(|s| s.to_string()).unwrap_or_default(),
            config_files: String::new(),
        })
    }

    fn from_fragment(line: &str) -> Option<Self> {
        // Degenerate tool output: key/value pairs crammed onto one line.
        if !(line.contains("\"name\":") && line.contains("\"path\":")) {
            return None;
        }
        let name = extract_fragment_field(line, "name")?;
        Some(Self {
            name,
            path: extract_fragment_field(line, "path").unwrap_or_default(),
            status: extract_fragment_field(line, "status")
                .unwrap_or_else(|| "unknown".to_string()),
            config_files: String::new(),
        })
    }

    fn is_well_formed(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Container entry as emitted by the tool's per-project listing subcommand.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerRecord {
    #[serde(alias = "ID", alias = "Id")]
    pub id: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Image")]
    pub image: String,
    #[serde(alias = "State")]
    pub state: String,
    #[serde(alias = "Status")]
    pub status: String,
    #[serde(alias = "Service")]
    pub service: String,
}

impl ContainerRecord {
    /// Identifier truncated to the canonical short form.
    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }

    /// Display name combining container name and service, when known.
    pub fn display_name(&self) -> String {
        if self.service.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.service)
        }
    }

    pub fn state(&self) -> ContainerState {
        if self.state.is_empty() {
            ContainerState::from_status_text(&self.status)
        } else {
            ContainerState::parse(&self.state)
        }
    }
}

impl TableRecord for ContainerRecord {
    fn from_row(fields: &[&str]) -> Option<Self> {
        if fields.len() < 3 {
            return None;
        }
        let name = fields[1].to_string();
        // Old tooling names containers <project>_<service>_<index>.
        let service = name.split('_').nth(1).unwrap_or_default().to_string();
        let status = if fields.len() > 2 {
            fields[2..].join(" ")
        } else {
            "unknown".to_string()
        };
        Some(Self {
            id: fields[0].to_string(),
            name,
            image: String::new(),
            state: String::new(),
            status,
            service,
        })
    }

    fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
    }
}
