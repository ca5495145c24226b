use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::DynamicImage;

use crate::assign::{LabelAssigner, SimpleAssigner};
use crate::core::config::{check_file_component, validate_hints, DetectionConfig, PageConfigs};
use crate::core::model::{
    AssignmentResult, HintTable, LabelHint, Manifest, UnassignedLabel, UnassignedReason,
};
use crate::detect::overlay::draw_detection;
use crate::detect::{Detection, StrokeDetector};
use crate::export::{Exporter, JsonExporter, StrokeExporter, TextExporter};
use crate::raster::PageRenderer;

pub const EXTRACTION_METHOD: &str = "contour detection";
pub const DEBUG_DIR: &str = "debug";

/// Where page images come from.
#[derive(Debug, Clone)]
pub enum PageSource {
    /// Pre-rendered PNGs; page ids name files in the directory.
    Directory(PathBuf),
    /// A PDF rendered on the fly; page ids are 1-based page numbers.
    Pdf { path: PathBuf, dpi: u32 },
}

impl PageSource {
    fn describe(&self) -> String {
        match self {
            PageSource::Directory(dir) => format!("reference page images in {}", dir.display()),
            PageSource::Pdf { path, dpi } => format!("{} rendered at {dpi} DPI", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: PageSource,
    pub output: PathBuf,
    pub hints: HintTable,
    pub detection: DetectionConfig,
    /// Replaces `detection` on the pages it names.
    pub page_configs: PageConfigs,
    pub file_suffix: String,
    pub source_description: String,
    /// Also write a detection overlay per page under `<output>/debug`.
    pub debug: bool,
}

impl PipelineConfig {
    pub fn new(source: PageSource, output: PathBuf, hints: HintTable) -> Self {
        let source_description = source.describe();
        Self {
            source,
            output,
            hints,
            detection: DetectionConfig::default(),
            page_configs: PageConfigs::new(),
            file_suffix: String::new(),
            source_description,
            debug: false,
        }
    }

    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }

    pub fn with_page_configs(mut self, page_configs: PageConfigs) -> Self {
        self.page_configs = page_configs;
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn detection_for(&self, page_id: &str) -> &DetectionConfig {
        self.page_configs.get(page_id).unwrap_or(&self.detection)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    pub page_id: String,
    pub image: Option<PathBuf>,
    pub debug_image: Option<PathBuf>,
    pub detected: usize,
    pub kept: usize,
    pub assigned: usize,
    pub unassigned: Vec<UnassignedLabel>,
}

#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub manifest: Manifest,
    pub pages: Vec<PageOutcome>,
}

impl ExtractionReport {
    pub fn expected(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.assigned + p.unassigned.len())
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.manifest.is_complete()
    }
}

/// Detects regions on one page and matches them to its labels.
pub fn extract_page(
    page: &DynamicImage,
    hints: &[LabelHint],
    detector: &StrokeDetector,
) -> (Detection, AssignmentResult) {
    let detection = detector.detect(&page.to_luma8());
    let assignment = SimpleAssigner::new().assign(hints, &detection.regions);
    (detection, assignment)
}

/// Processes every page of the hint table in order. Page-level problems are
/// logged and recorded as unassigned labels; only setup errors are returned.
pub fn run_extraction(config: &PipelineConfig) -> Result<ExtractionReport> {
    config.detection.validate()?;
    for (page_id, detection) in &config.page_configs {
        detection
            .validate()
            .map_err(|err| anyhow::anyhow!("detection config for page {page_id}: {err}"))?;
    }
    validate_hints(&config.hints)?;
    check_file_component("file suffix", &config.file_suffix)?;
    fs::create_dir_all(&config.output)?;

    let mut manifest = Manifest::new(EXTRACTION_METHOD, config.source_description.clone());
    let mut pages = Vec::with_capacity(config.hints.len());

    for (page_id, hints) in &config.hints {
        let mut outcome = PageOutcome {
            page_id: page_id.clone(),
            ..Default::default()
        };

        let page = match load_page(&config.source, &config.output, page_id) {
            Ok((path, page)) => {
                outcome.image = Some(path);
                page
            }
            Err(reason) => {
                tracing::warn!(page = %page_id, reason = reason.describe(), "skipping page");
                mark_all(&mut manifest, &mut outcome, hints, reason);
                pages.push(outcome);
                continue;
            }
        };

        let detection_config = config.detection_for(page_id);
        let detector = StrokeDetector::new(detection_config.clone());
        let exporter = StrokeExporter::new(config.output.clone(), detection_config.padding)
            .with_suffix(config.file_suffix.clone());

        let (detection, assignment) = extract_page(&page, hints, &detector);
        outcome.detected = detection.detected;
        outcome.kept = detection.regions.len();

        if config.debug {
            let name = outcome
                .image
                .as_deref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{page_id}.png"));
            let path = config.output.join(DEBUG_DIR).join(format!("DEBUG_{name}"));
            match write_overlay(&page, &detection, &path) {
                Ok(()) => outcome.debug_image = Some(path),
                Err(err) => tracing::warn!(
                    page = %page_id,
                    error = %format!("{err:#}"),
                    "failed to write debug overlay"
                ),
            }
        }

        if detection.regions.is_empty() {
            tracing::warn!(
                page = %page_id,
                detected = detection.detected,
                "no regions survived filtering"
            );
            mark_all(&mut manifest, &mut outcome, hints, UnassignedReason::NoRegions);
            pages.push(outcome);
            continue;
        }

        for label in &assignment.unassigned {
            tracing::warn!(page = %page_id, label = %label, "not enough regions for label");
            mark(&mut manifest, &mut outcome, label, UnassignedReason::InsufficientRegions);
        }

        for assigned in &assignment.assigned {
            match exporter.export(&page, page_id, assigned) {
                Ok(entry) => {
                    tracing::debug!(
                        page = %page_id,
                        label = %entry.label,
                        bytes = entry.bytes,
                        "stroke written"
                    );
                    manifest.record(entry);
                    outcome.assigned += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        page = %page_id,
                        label = %assigned.label,
                        error = %format!("{err:#}"),
                        "failed to write stroke"
                    );
                    let reason = UnassignedReason::ExportFailed;
                    mark(&mut manifest, &mut outcome, &assigned.label, reason);
                }
            }
        }

        tracing::info!(
            page = %page_id,
            detected = outcome.detected,
            kept = outcome.kept,
            assigned = outcome.assigned,
            expected = hints.len(),
            "page processed"
        );
        pages.push(outcome);
    }

    Ok(ExtractionReport { manifest, pages })
}

/// Saves `page` with the detection boxes drawn on it.
pub fn write_overlay(page: &DynamicImage, detection: &Detection, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    draw_detection(&page.to_rgb8(), detection)
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn export_report(report: &ExtractionReport, output: &Path) -> Result<()> {
    let json_exporter = JsonExporter::new(output.to_path_buf());
    json_exporter.export(&report.manifest)?;

    let text_exporter = TextExporter::new(output.to_path_buf());
    text_exporter.export(&report.manifest)?;

    Ok(())
}

/// Finds the image for `page_id` in `dir`: the exact file name, then
/// `<page_id>.png`, then the first file ending in `page-<id>.png` or
/// `page_<id>.png`.
pub fn resolve_page(dir: &Path, page_id: &str) -> Option<PathBuf> {
    let exact = dir.join(page_id);
    if exact.is_file() {
        return Some(exact);
    }
    let with_ext = dir.join(format!("{page_id}.png"));
    if with_ext.is_file() {
        return Some(with_ext);
    }

    let suffixes = [format!("page-{page_id}.png"), format!("page_{page_id}.png")];
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| suffixes.iter().any(|s| name.ends_with(s.as_str())))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

fn load_page(
    source: &PageSource,
    output: &Path,
    page_id: &str,
) -> Result<(PathBuf, DynamicImage), UnassignedReason> {
    let path = match source {
        PageSource::Directory(dir) => {
            resolve_page(dir, page_id).ok_or(UnassignedReason::PageMissing)?
        }
        PageSource::Pdf { path, dpi } => {
            let page_number: usize = page_id
                .trim()
                .parse()
                .map_err(|_| UnassignedReason::PageMissing)?;
            let renderer = PageRenderer::new(output.join("pages"), *dpi);
            renderer
                .render_page(path, page_number)
                .map_err(|err| {
                    tracing::warn!(page = %page_id, error = %format!("{err:#}"), "render failed");
                    UnassignedReason::PageUnreadable
                })?
                .path
        }
    };

    match image::open(&path) {
        Ok(page) => Ok((path, page)),
        Err(err) => {
            tracing::warn!(
                page = %page_id,
                file = %path.display(),
                error = %err,
                "page unreadable"
            );
            Err(UnassignedReason::PageUnreadable)
        }
    }
}

fn mark(manifest: &mut Manifest, outcome: &mut PageOutcome, label: &str, reason: UnassignedReason) {
    manifest.mark_unassigned(label, outcome.page_id.clone(), reason);
    outcome.unassigned.push(UnassignedLabel {
        label: label.to_string(),
        page_id: outcome.page_id.clone(),
        reason,
    });
}

fn mark_all(
    manifest: &mut Manifest,
    outcome: &mut PageOutcome,
    hints: &[LabelHint],
    reason: UnassignedReason,
) {
    for hint in hints {
        mark(manifest, outcome, &hint.label, reason);
    }
}
