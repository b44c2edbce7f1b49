//! `geothumb boundary <REGION>`: print the boundary download URL.

use crate::acquisition::boundaries::{AdminLevel, BoundaryResolver};
use crate::acquisition::http_client::HttpClient;
use crate::acquisition::iso_codes::CodeLookup;
use crate::cli::output::{self, Styled};
use crate::config::Settings;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Returns whether a download URL was found.
pub async fn run(settings: &Settings, region: &str, level: Option<AdminLevel>) -> Result<bool> {
    let s = Styled::new();
    let level = level.unwrap_or_else(|| settings.admin_level.clone());
    let http = HttpClient::new(&settings.user_agent, settings.http_timeout)
        .context("failed to build HTTP client")?;
    let codes = Arc::new(CodeLookup::new(http.clone(), settings.iso_csv_url.clone()));
    let resolver = BoundaryResolver::new(http, codes, settings.boundary_url.clone());

    let url = resolver.boundary_url(region, &level).await;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "region": region,
            "admin_level": level.as_str(),
            "url": url,
        }));
        return Ok(url.is_some());
    }

    match url {
        Some(url) => {
            if !output::is_quiet() {
                eprintln!("  {} {region} {}", s.ok_sym(), s.dim(level.as_str()));
            }
            println!("{url}");
            Ok(true)
        }
        None => {
            if !output::is_quiet() {
                eprintln!("  {} No {level} boundary found for '{region}'.", s.fail_sym());
            }
            Ok(false)
        }
    }
}
