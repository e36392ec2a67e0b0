use crate::domain::StatsSample;
use serde::Deserialize;
use tracing::debug;

/// One-shot stats record as emitted by the runtime client's stats command.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStats {
    #[serde(alias = "CPUPerc")]
    pub cpu_perc: String,
    #[serde(alias = "MemUsage")]
    pub mem_usage: String,
    #[serde(alias = "MemPerc")]
    pub mem_perc: String,
    #[serde(alias = "NetIO")]
    pub net_io: String,
    #[serde(alias = "BlockIO")]
    pub block_io: String,
}

/// Decodes a raw stats line into a processed sample.
///
/// Every field is decoded explicitly; a field that cannot be decoded keeps
/// its default and flips the `partial` flag, so consumers can tell a missing
/// reading from a real zero.
pub fn decode_line(line: &str) -> StatsSample {
    match serde_json::from_str::<RawStats>(line.trim()) {
        Ok(raw) => decode(&raw),
        Err(err) => {
            debug!("linha de estatísticas não decodificada: {}", err);
            StatsSample {
                partial: true,
                ..StatsSample::default()
            }
        }
    }
}

pub fn decode(raw: &RawStats) -> StatsSample {
    let mut sample = StatsSample::default();

    match parse_percent(&raw.cpu_perc) {
        Some(value) => sample.cpu_percent = value,
        None => sample.partial = true,
    }
    match parse_percent(&raw.mem_perc) {
        Some(value) => sample.memory_percent = value,
        None => sample.partial = true,
    }
    match parse_byte_pair(&raw.mem_usage) {
        Some((usage, limit)) => {
            sample.memory_usage = usage;
            sample.memory_limit = limit;
        }
        None => sample.partial = true,
    }
    match parse_byte_pair(&raw.net_io) {
        Some((rx, tx)) => {
            sample.net_rx = rx;
            sample.net_tx = tx;
        }
        None => sample.partial = true,
    }
    match parse_byte_pair(&raw.block_io) {
        Some((read, write)) => {
            sample.block_read = read;
            sample.block_write = write;
        }
        None => sample.partial = true,
    }

    sample
}

/// "0.15%" -> 0.15
fn parse_percent(text: &str) -> Option<f64> {
    text.trim().strip_suffix('%')?.trim().parse().ok()
}

/// "12.4MiB / 1.563GiB" -> (usage bytes, limit bytes)
fn parse_byte_pair(text: &str) -> Option<(u64, u64)> {
    let (left, right) = text.split_once('/')?;
    Some((parse_bytes(left)?, parse_bytes(right)?))
}

/// Parses a human byte quantity ("656B", "12.4MiB", "1.2kB").
///
/// Binary suffixes (KiB, MiB, ...) scale by 1024; decimal ones (kB, MB, ...)
/// by 1000, matching how the runtime formats them.
fn parse_bytes(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text.find(|c: char| c.is_ascii_alphabetic())?;
    let (number, unit) = text.split_at(split);
    let value: f64 = number.trim().parse().ok()?;

    let factor: f64 = match unit.trim() {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0_f64.powi(4),
        "kB" | "KB" => 1000.0,
        "MB" => 1000.0 * 1000.0,
        "GB" => 1000.0 * 1000.0 * 1000.0,
        "TB" => 1000.0_f64.powi(4),
        _ => return None,
    };

    Some((value * factor) as u64)
}
