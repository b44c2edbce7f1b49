//! `geothumb generate <PATH>...`: render thumbnails for catalog files.

use crate::acquisition::boundaries::AdminLevel;
use crate::catalog::{load_catalog, run_batch, BatchReport, ThumbnailGenerator};
use crate::cli::output::{self, Styled};
use crate::config::Settings;
use crate::render::ImageArgs;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;

/// Options collected from the command line.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub paths: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub image: ImageArgs,
    pub admin_level: Option<AdminLevel>,
    pub no_basemap: bool,
}

/// Run the generate command. The caller turns failures in the report into
/// the exit status.
pub async fn run(mut settings: Settings, opts: GenerateOptions) -> Result<BatchReport> {
    let s = Styled::new();
    let start = Instant::now();

    if let Some(level) = opts.admin_level {
        settings.admin_level = level;
    }
    if opts.no_basemap {
        settings.tile_url = None;
    }

    let entries = load_catalog(&opts.paths).context("failed to read catalog paths")?;
    if !output::is_quiet() && !output::is_json() {
        output::print_header(&s);
        eprintln!(
            "  Generating {} thumbnail(s) into {}",
            entries.len(),
            opts.output_dir.display()
        );
        if output::is_verbose() {
            eprintln!("    size:       {}", opts.image.size);
            eprintln!("    dpi:        {}", opts.image.dpi);
            eprintln!("    precedence: {}", opts.image.crs_precedence);
            eprintln!("    admin:      {}", settings.admin_level);
            eprintln!(
                "    basemap:    {}",
                settings.tile_url.as_deref().unwrap_or("none")
            );
        }
        eprintln!();
    }

    let generator =
        ThumbnailGenerator::from_settings(&settings).context("failed to build HTTP client")?;
    let report = run_batch(&generator, entries, &opts.image, &opts.output_dir).await?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "generated": report.generated,
            "skipped": report.skipped,
            "failed": report.failed,
            "elapsed_ms": start.elapsed().as_millis() as u64,
        }));
        return Ok(report);
    }

    if !output::is_quiet() {
        print_report(&s, &report);
        let summary = format!(
            "{} generated, {} skipped, {} failed in {}",
            report.generated.len(),
            report.skipped.len(),
            report.failed.len(),
            output::format_elapsed(start.elapsed())
        );
        let status = if report.has_failures() {
            s.red("errors")
        } else {
            s.green("ok")
        };
        output::print_status(&s, &status, &summary);
    }

    Ok(report)
}

fn print_report(s: &Styled, report: &BatchReport) {
    for path in &report.generated {
        let size = std::fs::metadata(path)
            .map(|m| output::format_size(m.len()))
            .unwrap_or_default();
        eprintln!("    {} {} {}", s.ok_sym(), path.display(), s.dim(&size));
    }
    for id in &report.skipped {
        eprintln!("    {} {id} {}", s.skip_sym(), s.yellow("skipped"));
    }
    for failure in &report.failed {
        eprintln!("    {} {}: {}", s.fail_sym(), failure.source, failure.message);
    }
}
