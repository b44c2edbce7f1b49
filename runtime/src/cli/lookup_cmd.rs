//! `geothumb lookup <REGION>`: print a region's ISO-3166 code.

use crate::acquisition::http_client::HttpClient;
use crate::acquisition::iso_codes::{normalize_region, CodeKind, CodeLookup};
use crate::cli::output::{self, Styled};
use crate::config::Settings;
use anyhow::{Context, Result};

/// Returns whether the region resolved.
pub async fn run(settings: &Settings, region: &str, kind: CodeKind) -> Result<bool> {
    let s = Styled::new();
    let http = HttpClient::new(&settings.user_agent, settings.http_timeout)
        .context("failed to build HTTP client")?;
    let codes = CodeLookup::new(http, settings.iso_csv_url.clone());

    // Surface table load failures here instead of reporting "not found".
    let table = codes
        .iso_codes()
        .await
        .with_context(|| format!("failed to load ISO-3166 table from {}", settings.iso_csv_url))?;
    let entry = table.get(&normalize_region(region));
    let code = entry.and_then(|e| e.code(kind));

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "region": region,
            "kind": kind.as_str(),
            "code": code,
            "name": entry.map(|e| e.name.as_str()),
        }));
        return Ok(code.is_some());
    }

    match code {
        Some(code) => {
            if !output::is_quiet() {
                let name = entry.map(|e| e.name.as_str()).unwrap_or(region);
                eprintln!("  {} {region} {}", s.ok_sym(), s.dim(&format!("({name})")));
            }
            println!("{code}");
            Ok(true)
        }
        None => {
            if !output::is_quiet() {
                eprintln!("  {} No {kind} code for '{region}'.", s.fail_sym());
            }
            Ok(false)
        }
    }
}
