pub mod bitmap;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::core::config::{read_json, ConfigError};
use crate::core::tool::run_tool;

/// potrace tuning; defaults favour smooth curves on clean scans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TraceOptions {
    pub threshold: u8,
    pub turn_policy: String,
    pub turd_size: u32,
    pub alpha_max: f32,
    pub opt_tolerance: f32,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            threshold: 128,
            turn_policy: "majority".to_string(),
            turd_size: 2,
            alpha_max: 0.8,
            opt_tolerance: 0.2,
        }
    }
}

const TURN_POLICIES: [&str; 7] = [
    "black", "white", "left", "right", "minority", "majority", "random",
];

impl TraceOptions {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let options: Self = read_json(path)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TURN_POLICIES.contains(&self.turn_policy.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "turn_policy must be one of {}, got {:?}",
                    TURN_POLICIES.join(", "),
                    self.turn_policy
                ),
            });
        }
        if self.alpha_max < 0.0 || self.opt_tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                message: "alpha_max and opt_tolerance must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TracedSvg {
    pub path: PathBuf,
    pub bytes: u64,
    pub has_paths: bool,
}

#[derive(Debug, Default)]
pub struct TraceSummary {
    pub traced: Vec<TracedSvg>,
    pub failed: Vec<(PathBuf, String)>,
}

#[derive(Debug, Clone)]
pub struct SvgTracer {
    work_dir: PathBuf,
    out_dir: PathBuf,
    options: TraceOptions,
}

impl SvgTracer {
    pub fn new(work_dir: PathBuf, out_dir: PathBuf) -> Self {
        Self {
            work_dir,
            out_dir,
            options: TraceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TraceOptions) -> Self {
        self.options = options;
        self
    }

    fn potrace_command(&self, bitmap: &Path, svg: &Path) -> Command {
        let mut command = Command::new("potrace");
        command
            .arg(bitmap)
            .arg("-s")
            .arg("-o")
            .arg(svg)
            .arg("--tight")
            .arg("--turnpolicy")
            .arg(&self.options.turn_policy)
            .arg("--turdsize")
            .arg(self.options.turd_size.to_string())
            .arg("--alphamax")
            .arg(self.options.alpha_max.to_string())
            .arg("--opttolerance")
            .arg(self.options.opt_tolerance.to_string());
        command
    }

    pub fn trace_file(&self, png: &Path) -> Result<TracedSvg> {
        let name = png
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow::anyhow!("unusable file name: {}", png.display()))?;

        let img = image::open(png).with_context(|| format!("failed to read {}", png.display()))?;
        let bitmap = bitmap::prepare_bitmap(&img, self.options.threshold);

        fs::create_dir_all(&self.work_dir)?;
        fs::create_dir_all(&self.out_dir)?;
        let bmp_path = self.work_dir.join(format!("{name}.bmp"));
        DynamicImage::ImageLuma8(bitmap)
            .to_rgb8()
            .save(&bmp_path)
            .with_context(|| format!("failed to write {}", bmp_path.display()))?;

        let svg_path = self.out_dir.join(format!("{name}.svg"));
        run_tool("potrace", &mut self.potrace_command(&bmp_path, &svg_path))?;

        let svg = fs::read_to_string(&svg_path)
            .with_context(|| format!("potrace produced no readable {}", svg_path.display()))?;
        let has_paths = svg.contains("<path");
        if !has_paths {
            tracing::warn!(stroke = name, "traced SVG has no paths; keeping it anyway");
        }

        Ok(TracedSvg {
            bytes: fs::metadata(&svg_path)?.len(),
            path: svg_path,
            has_paths,
        })
    }

    /// Traces every stroke PNG in `input_dir`. Per-file failures are logged
    /// and collected, not returned.
    pub fn trace_dir(&self, input_dir: &Path) -> Result<TraceSummary> {
        let mut summary = TraceSummary::default();
        for png in stroke_pngs(input_dir)? {
            match self.trace_file(&png) {
                Ok(traced) => {
                    tracing::info!(file = %png.display(), bytes = traced.bytes, "traced");
                    summary.traced.push(traced);
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    tracing::warn!(file = %png.display(), error = %message, "trace failed");
                    summary.failed.push((png, message));
                }
            }
        }
        let _ = fs::remove_dir_all(&self.work_dir);
        Ok(summary)
    }
}

/// Stroke PNGs in `dir`, sorted, without backups or full-page renders.
pub fn stroke_pngs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".png") || name.ends_with("_original.png") || name.starts_with("page_")
        {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}
