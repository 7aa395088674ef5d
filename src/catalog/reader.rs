use std::fs;
use std::path::Path;

use log::debug;

use crate::catalog::StaticRegionTable;
use crate::error::{Error, Result};
use crate::model::{RegionKind, StaticId, StaticRegion};

/// Encoding of region ids in a catalog file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogFormat {
    /// Decimal ids, line numbers mandatory
    Legacy,
    /// 16-hex-digit big-endian ids, unparseable line numbers read as 0
    Current,
    /// Per line: 16 hex digits selects `Current`, anything else `Legacy`
    #[default]
    Auto,
}

/// Reader for the text catalog (`id type module func startLine endLine`)
pub struct CatalogReader;

impl CatalogReader {
    /// Load a catalog file from disk
    pub fn load(path: &Path, format: CatalogFormat) -> Result<StaticRegionTable> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, format)
    }

    /// Parse catalog text into a table
    pub fn parse(text: &str, format: CatalogFormat) -> Result<StaticRegionTable> {
        let mut table = StaticRegionTable::new();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let region = Self::parse_line(line, index + 1, format)?;
            table.insert(region);
        }

        debug!(
            "catalog loaded: {} regions, {} call sites",
            table.len(),
            table.call_site_count()
        );
        Ok(table)
    }

    /// Parse one descriptor line
    pub fn parse_line(line: &str, line_no: usize, format: CatalogFormat) -> Result<StaticRegion> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let error = |message: String| Error::CatalogError {
            line: line_no,
            message,
        };

        let first = fields.first().copied().unwrap_or_default();
        let format = match format {
            CatalogFormat::Auto if is_hex_id(first) => CatalogFormat::Current,
            CatalogFormat::Auto => CatalogFormat::Legacy,
            explicit => explicit,
        };

        let min_fields = match format {
            CatalogFormat::Legacy => 6,
            _ => 4,
        };
        if fields.len() < min_fields {
            return Err(error(format!(
                "expected at least {} fields, found {}",
                min_fields,
                fields.len()
            )));
        }

        let id = parse_id(fields[0], format).ok_or_else(|| error(format!("invalid region id '{}'", fields[0])))?;
        let kind: RegionKind = fields[1]
            .parse()
            .map_err(|_| error(format!("unknown region type '{}'", fields[1])))?;

        let (start_line, end_line) = match format {
            CatalogFormat::Legacy => {
                let start = fields[4]
                    .parse()
                    .map_err(|_| error(format!("invalid start line '{}'", fields[4])))?;
                let end = fields[5]
                    .parse()
                    .map_err(|_| error(format!("invalid end line '{}'", fields[5])))?;
                (start, end)
            }
            _ => {
                let start = fields.get(4).and_then(|s| s.parse().ok());
                let end = fields.get(5).and_then(|s| s.parse().ok());
                match (start, end) {
                    (Some(start), Some(end)) => (start, end),
                    _ => (0, 0),
                }
            }
        };

        Ok(StaticRegion::new(id, kind, fields[2], fields[3], start_line, end_line))
    }
}

fn is_hex_id(token: &str) -> bool {
    token.len() == 16 && token.chars().all(|c| c.is_ascii_hexdigit())
}

fn parse_id(token: &str, format: CatalogFormat) -> Option<StaticId> {
    match format {
        CatalogFormat::Legacy => token.parse().ok(),
        _ => {
            if !is_hex_id(token) {
                return None;
            }
            u64::from_str_radix(token, 16).ok()
        }
    }
}
