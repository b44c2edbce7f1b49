use anyhow::Result;
use clap::{Parser, Subcommand};
use geothumb::acquisition::boundaries::AdminLevel;
use geothumb::acquisition::iso_codes::CodeKind;
use geothumb::cli::generate_cmd::GenerateOptions;
use geothumb::cli::{boundary_cmd, generate_cmd, lookup_cmd, output};
use geothumb::config::Settings;
use geothumb::render::{CanvasSize, CrsPrecedence, ImageArgs, StrokeColor};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "geothumb",
    about = "Render map thumbnails for data catalog entries",
    version
)]
struct Cli {
    /// Machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Only print results and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show settings and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log filter directive, e.g. `debug` or `geothumb=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate thumbnails for catalog files or directories of them
    Generate {
        /// Catalog `.yml`/`.yaml`/`.json` files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Directory the PNGs are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Canvas size in inches
        #[arg(long, default_value = "17x12")]
        size: CanvasSize,

        #[arg(long, default_value_t = 100)]
        dpi: u32,

        #[arg(long, default_value = "b")]
        boundary_color: StrokeColor,

        #[arg(long, default_value = "r")]
        overlay_color: StrokeColor,

        /// Administrative level such as ADM0 or ADM1
        #[arg(long)]
        admin_level: Option<AdminLevel>,

        /// Layer whose CRS drives the basemap: overlay or boundary
        #[arg(long, default_value = "overlay")]
        crs_precedence: CrsPrecedence,

        /// Draw on a plain background instead of map tiles
        #[arg(long)]
        no_basemap: bool,
    },

    /// Print the ISO-3166 code for a region name
    Lookup {
        region: String,

        /// alpha-2 or alpha-3
        #[arg(long, default_value = "alpha-3")]
        kind: CodeKind,
    },

    /// Print the geoBoundaries download URL for a region
    Boundary {
        region: String,

        #[arg(long)]
        admin_level: Option<AdminLevel>,
    },
}

fn init_tracing(cli: &Cli) {
    let filter = match &cli.log_level {
        Some(directive) => EnvFilter::new(directive),
        None if cli.verbose => EnvFilter::new("geothumb=debug"),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geothumb=info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Global flags are read back by the output helpers.
    if cli.json {
        std::env::set_var(output::ENV_JSON, "1");
    }
    if cli.quiet {
        std::env::set_var(output::ENV_QUIET, "1");
    }
    if cli.verbose {
        std::env::set_var(output::ENV_VERBOSE, "1");
    }
    init_tracing(&cli);

    let settings = Settings::from_env()?;

    let ok = match cli.command {
        Commands::Generate {
            paths,
            output_dir,
            size,
            dpi,
            boundary_color,
            overlay_color,
            admin_level,
            crs_precedence,
            no_basemap,
        } => {
            let opts = GenerateOptions {
                paths,
                output_dir,
                image: ImageArgs {
                    size,
                    dpi,
                    boundary_color,
                    overlay_color,
                    crs_precedence,
                },
                admin_level,
                no_basemap,
            };
            let report = generate_cmd::run(settings, opts).await?;
            !report.has_failures()
        }
        Commands::Lookup { region, kind } => lookup_cmd::run(&settings, &region, kind).await?,
        Commands::Boundary {
            region,
            admin_level,
        } => boundary_cmd::run(&settings, &region, admin_level).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
