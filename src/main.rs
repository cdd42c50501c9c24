use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use drawstruct::core::config::{ExtractionConfig, RowGrouping, RowOrder};
use drawstruct::ocr::TesseractBridge;
use drawstruct::pipeline::{process_batch, BatchSummary, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "drawstruct")]
#[command(version, about = "Split scanned engineering drawings into drawing images and title-block data", long_about = None)]
struct Cli {
    /// Directory of scanned drawing images
    #[arg(default_value = "Engineering Drawings")]
    input: PathBuf,

    /// Root of the `Drawings` and `Drawing Data` output directories
    #[arg(short, long, default_value = "Results")]
    output: PathBuf,

    /// JSON file overriding extraction settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of images processed in parallel
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Cell order within amendment rows (overrides the config file)
    #[arg(long, value_enum)]
    row_order: Option<RowOrder>,

    /// How a token is compared against the row it may join (overrides the config file)
    #[arg(long, value_enum)]
    row_grouping: Option<RowGrouping>,

    /// Tesseract executable
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// Tesseract language model
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut extraction = match &cli.config {
        Some(path) => ExtractionConfig::from_json_file(path)?,
        None => ExtractionConfig::default(),
    };
    if let Some(order) = cli.row_order {
        extraction.row_order = order;
    }
    if let Some(grouping) = cli.row_grouping {
        extraction.row_grouping = grouping;
    }

    let config = PipelineConfig {
        input_dir: cli.input.clone(),
        output_dir: cli.output.clone(),
        jobs: cli.jobs.max(1),
        extraction,
    };
    let bridge = TesseractBridge::new(config.output_dir.join(".ocr"))
        .with_binary(cli.tesseract.clone())
        .with_lang(cli.lang.clone());

    let reports = process_batch(&config, &bridge)
        .with_context(|| format!("failed to process {}", config.input_dir.display()))?;
    let summary = BatchSummary::from_reports(&reports);
    info!(
        succeeded = summary.succeeded,
        table_skipped = summary.table_skipped,
        failed = summary.failed,
        "batch finished"
    );

    if summary.failed > 0 {
        anyhow::bail!("{} image(s) failed to process", summary.failed);
    }
    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
