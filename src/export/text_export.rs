use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::Manifest;
use crate::export::Exporter;

pub const REPORT_FILE: &str = "extraction_report.txt";

/// Plain-text listing of what was extracted and what was not.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.out_dir.join(REPORT_FILE)
    }

    pub fn render(manifest: &Manifest) -> String {
        let expected = manifest.extracted_count + manifest.unassigned.len();
        let mut text = String::new();
        let _ = writeln!(
            text,
            "Extracted {}/{} strokes",
            manifest.extracted_count, expected
        );
        let _ = writeln!(text, "Method: {}", manifest.extraction_method);
        let _ = writeln!(text, "Source: {}", manifest.source);
        text.push('\n');

        let mut entries: Vec<_> = manifest.entries.iter().collect();
        entries.sort_by(|a, b| a.label.cmp(&b.label));
        for entry in entries {
            let file = entry
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let _ = writeln!(
                text,
                "  {:8} page {:<8} {} ({:.1} KB, {}x{})",
                entry.label,
                entry.page_id,
                file,
                entry.bytes as f64 / 1024.0,
                entry.width,
                entry.height
            );
        }

        if !manifest.unassigned.is_empty() {
            text.push_str("\nUnassigned:\n");
            for missing in &manifest.unassigned {
                let _ = writeln!(
                    text,
                    "  {:8} page {:<8} {}",
                    missing.label,
                    missing.page_id,
                    missing.reason.describe()
                );
            }
        }
        text
    }
}

impl Exporter for TextExporter {
    fn export(&self, manifest: &Manifest) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        fs::write(self.path(), Self::render(manifest))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ManifestEntry, UnassignedReason};

    #[test]
    fn lists_extracted_and_missing_labels() {
        let mut manifest = Manifest::new("contours", "book");
        manifest.record(ManifestEntry {
            label: "T".to_string(),
            path: PathBuf::from("out/T.png"),
            page_id: "010".to_string(),
            width: 40,
            height: 90,
            bytes: 2048,
        });
        manifest.mark_unassigned("D", "010", UnassignedReason::NoRegions);

        let text = TextExporter::render(&manifest);
        assert!(text.starts_with("Extracted 1/2 strokes"));
        assert!(text.contains("T.png (2.0 KB, 40x90)"));
        assert!(text.contains("Unassigned:"));
        assert!(text.contains("no regions detected"));
    }
}
