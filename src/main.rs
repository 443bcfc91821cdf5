use anyhow::{Context, Result};
use clap::Parser;
use pdinorm::{
    cache::NormalizedCache,
    config::{ReportConfig, Role},
    report::PdiReport,
    NormalizeError,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pdinorm")]
#[command(about = "Locate the header of a PDI spreadsheet and print its mentor/mentee report")]
struct Args {
    /// Workbook (.xlsx, .xls, .ods) or delimited file (.csv, .tsv)
    file: PathBuf,

    /// Sheet to read (default from config: PDI_CONSOLIDADOS)
    #[arg(short, long)]
    sheet: Option<String>,

    /// YAML file overriding markers and keywords
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report by mentor or by mentee
    #[arg(short, long)]
    role: Option<Role>,

    /// Person to report on (default: first in the sorted list)
    #[arg(long)]
    select: Option<String>,

    /// Report every selectable person in turn
    #[arg(long, conflicts_with = "select")]
    all: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Only print the detected header row and columns
    #[arg(long)]
    list_columns: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging (stderr, stdout is for the report) ─────────
    let default_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) config ───────────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(role) = args.role {
        config.role = role;
    }
    if args.sheet.is_some() {
        config.sheet = args.sheet.clone();
    }
    info!(role = %config.role, markers = ?config.markers(), "config ready");

    // ─── 3) load + normalize ────────────────────────────────────────
    let cache = NormalizedCache::new();
    let normalized = cache.get_or_load(
        &args.file,
        config.sheet.as_deref(),
        &config.normalize_options(),
    )?;
    if let Some(warning) = normalized.warning() {
        warn!(%warning, "header row guessed; column lookups may fail");
    }
    let table = &normalized.table;
    info!(
        header_row = normalized.header.row(),
        columns = table.columns().len(),
        rows = table.len(),
        "normalized"
    );

    if args.list_columns {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&normalized.header)?);
        } else {
            println!("Fila de encabezado: {}", normalized.header.row());
        }
        for col in table.columns() {
            println!("{}", col);
        }
        return Ok(());
    }

    // ─── 4) report(s) ───────────────────────────────────────────────
    let selections: Vec<Option<String>> = if args.all {
        let first = PdiReport::build(table, &config, None).map_err(explain)?;
        first.options.into_iter().map(Some).collect()
    } else {
        vec![args.select.clone()]
    };

    let mut reports = Vec::with_capacity(selections.len());
    for selection in &selections {
        reports.push(PdiReport::build(table, &config, selection.as_deref()).map_err(explain)?);
    }

    if args.json {
        let json = match reports.as_slice() {
            [single] => serde_json::to_string_pretty(single),
            many => serde_json::to_string_pretty(many),
        };
        let json = json.context("serializing report")?;
        println!("{}", json);
    } else {
        for report in &reports {
            println!("{}", report.render_text());
        }
    }
    Ok(())
}

/// Show which columns were actually found before giving up on a lookup.
fn explain(err: NormalizeError) -> anyhow::Error {
    if let Some(cols) = err.available_columns() {
        eprintln!("Columnas detectadas: {}", cols.join(", "));
    }
    anyhow::Error::new(err).context("building report")
}
