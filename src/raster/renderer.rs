use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::tool::run_tool;

pub const DEFAULT_DPI: u32 = 300;

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_number: usize,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct PageRenderer {
    out_dir: PathBuf,
    dpi: u32,
}

impl PageRenderer {
    pub fn new(out_dir: PathBuf, dpi: u32) -> Self {
        Self { out_dir, dpi }
    }

    /// File a rendered page lands in; `page_number` is 1-based.
    pub fn page_path(&self, page_number: usize) -> PathBuf {
        self.out_dir.join(format!("{}.png", page_stem(page_number)))
    }

    pub fn render_page(&self, pdf_path: &Path, page_number: usize) -> Result<RenderedPage> {
        if page_number == 0 {
            anyhow::bail!("page numbers start at 1");
        }
        fs::create_dir_all(&self.out_dir)?;

        let prefix = self.out_dir.join(page_stem(page_number));
        run_tool(
            "pdftoppm",
            Command::new("pdftoppm")
                .arg("-png")
                .arg("-r")
                .arg(self.dpi.to_string())
                .arg("-f")
                .arg(page_number.to_string())
                .arg("-l")
                .arg(page_number.to_string())
                .arg("-singlefile")
                .arg(pdf_path)
                .arg(&prefix),
        )
        .with_context(|| format!("failed to render page {page_number} of {}", pdf_path.display()))?;

        let path = self.page_path(page_number);
        let (width, height) = image::image_dimensions(&path)
            .with_context(|| format!("rendered page not readable: {}", path.display()))?;

        tracing::info!(page = page_number, width, height, dpi = self.dpi, "rendered page");
        Ok(RenderedPage {
            page_number,
            path,
            width,
            height,
        })
    }

    /// Renders each page, logging and skipping the ones that fail.
    pub fn render_pages(&self, pdf_path: &Path, pages: &[usize]) -> Vec<Result<RenderedPage>> {
        pages
            .iter()
            .map(|&page| {
                let rendered = self.render_page(pdf_path, page);
                if let Err(err) = &rendered {
                    tracing::warn!(page, error = %format!("{err:#}"), "page render failed");
                }
                rendered
            })
            .collect()
    }
}

fn page_stem(page_number: usize) -> String {
    format!("page_{page_number:03}")
}
