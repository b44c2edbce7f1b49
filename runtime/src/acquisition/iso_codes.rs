//! Region name to ISO-3166 code resolution.
//!
//! The reference table is the ISO-3166 CSV published by lukes on GitHub,
//! keyed by lowercase common name. It is fetched on first use and kept for
//! the lifetime of the [`CodeLookup`].

use super::http_client::{FetchError, HttpClient};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Default location of the ISO-3166 reference list.
pub const DEFAULT_ISO_CSV_URL: &str =
    "https://raw.githubusercontent.com/lukes/ISO-3166-Countries-with-Regional-Codes/master/all/all.csv";

/// Spellings used by catalog authors that differ from the ISO common name.
const REGION_ALIASES: &[(&str, &str)] = &[
    ("vietnam", "viet nam"),
    ("laos", "lao people's democratic republic"),
    ("lao pdr", "lao people's democratic republic"),
    ("east-timor", "timor-leste"),
];

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryCode {
    /// Common name, e.g. `Viet Nam`.
    pub name: String,
    /// Two-letter code; blank cells (Namibia's `NA`) read as `None`.
    #[serde(rename = "alpha-2", default)]
    pub alpha2: Option<String>,
    /// Three-letter code, the one the boundary service expects.
    #[serde(rename = "alpha-3", default)]
    pub alpha3: Option<String>,
    /// Numeric code, kept as text to preserve leading zeros.
    #[serde(rename = "country-code", default)]
    pub numeric: Option<String>,
    /// Continent-level region.
    #[serde(default)]
    pub region: Option<String>,
    /// UN M49 sub-region.
    #[serde(rename = "sub-region", default)]
    pub sub_region: Option<String>,
}

/// Which code field to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodeKind {
    Alpha2,
    #[default]
    Alpha3,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Alpha2 => "alpha-2",
            CodeKind::Alpha3 => "alpha-3",
        }
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alpha-2" | "alpha2" | "iso2" => Ok(CodeKind::Alpha2),
            "alpha-3" | "alpha3" | "iso3" => Ok(CodeKind::Alpha3),
            other => Err(format!("unknown code kind '{other}' (expected alpha-2 or alpha-3)")),
        }
    }
}

impl CountryCode {
    /// The requested code, or `None` if the cell is empty.
    pub fn code(&self, kind: CodeKind) -> Option<&str> {
        let value = match kind {
            CodeKind::Alpha2 => self.alpha2.as_deref(),
            CodeKind::Alpha3 => self.alpha3.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Reference table keyed by lowercase common name.
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    entries: HashMap<String, CountryCode>,
}

impl CodeTable {
    /// Parse the ISO-3166 CSV. Rows without a name are dropped.
    pub fn from_csv(text: &str) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut entries = HashMap::new();
        for row in reader.deserialize::<CountryCode>() {
            let row = row?;
            if row.name.is_empty() {
                continue;
            }
            entries.insert(row.name.to_lowercase(), row);
        }
        Ok(Self { entries })
    }

    /// Exact lookup on an already-normalized (lowercase) name.
    pub fn get(&self, name: &str) -> Option<&CountryCode> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Lowercase, trim and map through the alias table.
pub fn normalize_region(region: &str) -> String {
    let lowered = region.trim().to_lowercase();
    REGION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(lowered)
}

/// Errors loading the reference table.
#[derive(Debug, thiserror::Error)]
pub enum CodeTableError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("malformed ISO-3166 CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Lazily-loaded code table plus lookup operations.
pub struct CodeLookup {
    http: HttpClient,
    csv_url: String,
    table: OnceCell<Arc<CodeTable>>,
}

impl CodeLookup {
    pub fn new(http: HttpClient, csv_url: impl Into<String>) -> Self {
        Self {
            http,
            csv_url: csv_url.into(),
            table: OnceCell::new(),
        }
    }

    /// Build a lookup around an already-loaded table. No remote call is made.
    pub fn with_table(table: CodeTable) -> Self {
        Self {
            http: HttpClient::default(),
            csv_url: String::new(),
            table: OnceCell::new_with(Some(Arc::new(table))),
        }
    }

    /// The reference table, fetched on first call. A failed fetch is not
    /// cached; the next call tries again.
    pub async fn iso_codes(&self) -> Result<Arc<CodeTable>, CodeTableError> {
        self.table
            .get_or_try_init(|| async {
                let text = self.http.get_text(&self.csv_url).await?;
                let table = CodeTable::from_csv(&text)?;
                debug!("loaded {} ISO-3166 entries from {}", table.len(), self.csv_url);
                Ok::<_, CodeTableError>(Arc::new(table))
            })
            .await
            .cloned()
    }

    /// Resolve `region` to the requested code, `None` if not found.
    pub async fn code(&self, region: &str, kind: CodeKind) -> Option<String> {
        let table = match self.iso_codes().await {
            Ok(table) => table,
            Err(e) => {
                warn!("ISO-3166 table unavailable: {e}");
                return None;
            }
        };
        let key = normalize_region(region);
        let code = table.get(&key).and_then(|entry| entry.code(kind));
        if code.is_none() {
            debug!("no {kind} code for region '{region}'");
        }
        code.map(str::to_string)
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CSV: &str = "\
name,alpha-2,alpha-3,country-code,iso_3166-2,region,sub-region,intermediate-region,region-code,sub-region-code,intermediate-region-code
Kenya,KE,KEN,404,ISO 3166-2:KE,Africa,Sub-Saharan Africa,Eastern Africa,002,202,014
Lao People's Democratic Republic,LA,LAO,418,ISO 3166-2:LA,Asia,South-eastern Asia,,142,035,
Namibia,,NAM,516,ISO 3166-2:NA,Africa,Sub-Saharan Africa,Southern Africa,002,202,018
Timor-Leste,TL,TLS,626,ISO 3166-2:TL,Asia,South-eastern Asia,,142,035,
Viet Nam,VN,VNM,704,ISO 3166-2:VN,Asia,South-eastern Asia,,142,035,
";
