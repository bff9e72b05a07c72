use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::result::ProcessResult;
use crate::{canonical, drizzle, postgres, prisma, schemarb, tbls};

/// Source formats understood by [`process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedFormat {
    Schemarb,
    Postgres,
    Prisma,
    Tbls,
    Drizzle,
    Json,
    Yaml,
}

impl SupportedFormat {
    pub const ALL: [SupportedFormat; 7] = [
        SupportedFormat::Schemarb,
        SupportedFormat::Postgres,
        SupportedFormat::Prisma,
        SupportedFormat::Tbls,
        SupportedFormat::Drizzle,
        SupportedFormat::Json,
        SupportedFormat::Yaml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedFormat::Schemarb => "schemarb",
            SupportedFormat::Postgres => "postgres",
            SupportedFormat::Prisma => "prisma",
            SupportedFormat::Tbls => "tbls",
            SupportedFormat::Drizzle => "drizzle",
            SupportedFormat::Json => "json",
            SupportedFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for SupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        SupportedFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .or(match normalized.as_str() {
                "rb" | "schema.rb" | "rails" => Some(SupportedFormat::Schemarb),
                "sql" | "pg" | "postgresql" => Some(SupportedFormat::Postgres),
                "yml" => Some(SupportedFormat::Yaml),
                _ => None,
            })
            .ok_or_else(|| format!("unsupported format: {raw}"))
    }
}

/// Parse `source` with the parser for `format`.
pub fn process(format: SupportedFormat, source: &str) -> ProcessResult {
    let result = match format {
        SupportedFormat::Schemarb => schemarb::process(source),
        SupportedFormat::Postgres => postgres::process(source),
        SupportedFormat::Prisma => prisma::process(source),
        SupportedFormat::Tbls => tbls::process(source),
        SupportedFormat::Drizzle => drizzle::process(source),
        SupportedFormat::Json => canonical::process_json(source),
        SupportedFormat::Yaml => canonical::process_yaml(source),
    };

    tracing::debug!(
        event = "parse_finished",
        format = format.as_str(),
        tables = result.value.tables.len(),
        enums = result.value.enums.len(),
        errors = result.errors.len()
    );

    result
}

/// Guess the format of a file from its name, peeking at the content only to
/// tell tbls output apart from a canonical JSON schema.
pub fn detect_format(path: &Path, content: &str) -> Option<SupportedFormat> {
    let file_name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if file_name == "schema.rb" {
        return Some(SupportedFormat::Schemarb);
    }

    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "rb" => Some(SupportedFormat::Schemarb),
        "sql" => Some(SupportedFormat::Postgres),
        "prisma" => Some(SupportedFormat::Prisma),
        "ts" => Some(SupportedFormat::Drizzle),
        "yaml" | "yml" => Some(SupportedFormat::Yaml),
        "json" => Some(if tbls::looks_like_tbls(content) {
            SupportedFormat::Tbls
        } else {
            SupportedFormat::Json
        }),
        _ => None,
    }
}
