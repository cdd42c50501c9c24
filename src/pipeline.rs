use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::GrayImage;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::core::config::ExtractionConfig;
use crate::core::error::ExtractionError;
use crate::core::model::DrawingInfo;
use crate::export::{CsvExporter, DrawingWriter, Exporter};
use crate::ocr::filter::{filter_tokens, FilterPolicy};
use crate::ocr::{PageSegMode, TokenDetector};
use crate::segment::{morphology, RegionSegmenter, Segmentation};
use crate::table::TableExtractor;

pub const DRAWINGS_DIR: &str = "Drawings";
pub const DATA_DIR: &str = "Drawing Data";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Worker threads; 1 processes images in order on the calling thread.
    pub jobs: usize,
    pub extraction: ExtractionConfig,
}

impl PipelineConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            jobs: 1,
            extraction: ExtractionConfig::default(),
        }
    }

    pub fn drawings_dir(&self) -> PathBuf {
        self.output_dir.join(DRAWINGS_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.output_dir.join(DATA_DIR)
    }
}

/// Outcome of one image. The two outputs succeed or fail independently.
#[derive(Debug)]
pub struct ImageReport {
    pub source: PathBuf,
    pub drawing: Result<PathBuf>,
    pub table: Result<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub table_skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[ImageReport]) -> Self {
        reports.iter().fold(Self::default(), |mut summary, report| {
            match (&report.drawing, &report.table) {
                (Err(_), _) => summary.failed += 1,
                (Ok(_), Err(_)) => summary.table_skipped += 1,
                (Ok(_), Ok(_)) => summary.succeeded += 1,
            }
            summary
        })
    }
}

/// Creates the output directories. Failures are logged and processing goes on;
/// writes into a missing directory then fail per image.
pub fn prepare_output_dirs(config: &PipelineConfig) {
    for dir in [config.drawings_dir(), config.data_dir()] {
        match fs::create_dir_all(&dir) {
            Ok(()) => debug!(dir = %dir.display(), "output directory ready"),
            Err(err) => error!(dir = %dir.display(), error = %err, "failed to create output directory"),
        }
    }
}

/// PNG files directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read input directory {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_png(&path) {
            images.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-image entry");
        }
    }
    images.sort();
    Ok(images)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("png"))
}

/// Runs every image of the input directory through [`process_image`].
pub fn process_batch(config: &PipelineConfig, detector: &dyn TokenDetector) -> Result<Vec<ImageReport>> {
    prepare_output_dirs(config);
    let images = list_images(&config.input_dir)?;
    info!(count = images.len(), input = %config.input_dir.display(), "processing images");

    if config.jobs <= 1 {
        return Ok(images
            .iter()
            .map(|path| process_image(path, detector, config))
            .collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .context("failed to build worker pool")?;
    Ok(pool.install(|| {
        images
            .par_iter()
            .map(|path| process_image(path, detector, config))
            .collect()
    }))
}

/// Splits one image into its drawing PNG and its CSV record.
///
/// The drawing is written before table extraction starts, so a table failure
/// only costs the CSV.
pub fn process_image(path: &Path, detector: &dyn TokenDetector, config: &PipelineConfig) -> ImageReport {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let segmenter = RegionSegmenter::new(&config.extraction);

    let (gray, segmentation) = match split_image(path, detector, &segmenter, &config.extraction) {
        Ok(split) => split,
        Err(err) => {
            error!(image = %path.display(), error = %format!("{err:#}"), "image failed");
            return ImageReport {
                source: path.to_path_buf(),
                drawing: Err(err),
                table: Err(anyhow::anyhow!("not attempted: drawing stage failed")),
            };
        }
    };

    let drawing = DrawingWriter::new(config.drawings_dir()).write(&stem, &segmentation.drawing);
    if let Err(err) = &drawing {
        error!(image = %path.display(), error = %format!("{err:#}"), "failed to write drawing");
    }

    let table = read_table(&gray, &segmentation, detector, &segmenter, &config.extraction)
        .with_context(|| format!("table extraction failed for {}", path.display()))
        .and_then(|info| CsvExporter::new(config.data_dir()).export(&stem, &info));
    match &table {
        Ok(csv) => info!(image = %path.display(), csv = %csv.display(), "image extracted"),
        Err(err) => warn!(image = %path.display(), reason = %format!("{err:#}"), "skipping table export"),
    }

    ImageReport {
        source: path.to_path_buf(),
        drawing,
        table,
    }
}

fn split_image(
    path: &Path,
    detector: &dyn TokenDetector,
    segmenter: &RegionSegmenter<'_>,
    config: &ExtractionConfig,
) -> Result<(GrayImage, Segmentation)> {
    let gray = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_luma8();
    let binary = segmenter.binarize(&gray);

    let raw = detector
        .detect_tokens(&morphology::invert(&binary), PageSegMode::UniformBlock)
        .with_context(|| format!("full-page OCR failed for {}", path.display()))?;
    let raw_count = raw.len();
    let anchors = filter_tokens(raw, FilterPolicy::Drawing, config);
    debug!(raw = raw_count, anchors = anchors.len(), "full-page tokens filtered");

    let segmentation = segmenter.segment(&gray, &binary, &anchors);
    Ok((gray, segmentation))
}

fn read_table(
    gray: &GrayImage,
    segmentation: &Segmentation,
    detector: &dyn TokenDetector,
    segmenter: &RegionSegmenter<'_>,
    config: &ExtractionConfig,
) -> Result<DrawingInfo, ExtractionError> {
    let table = segmenter.table_image(gray, &segmentation.table_mask);
    let text = segmenter.strip_table_lines(&table);

    let raw = detector.detect_tokens(&text, PageSegMode::UniformBlock)?;
    let raw_count = raw.len();
    let tokens = filter_tokens(raw, FilterPolicy::Table, config);
    debug!(raw = raw_count, kept = tokens.len(), "table tokens filtered");

    TableExtractor::new(config).extract(&tokens)
}
