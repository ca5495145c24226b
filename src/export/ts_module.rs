use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

static XML_DECL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\?xml[^>]+\?>\s*").unwrap());
static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!DOCTYPE[^>]+>\s*").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Inlines traced SVGs into a TypeScript module for the app bundle.
#[derive(Debug, Clone)]
pub struct TsModuleExporter {
    output: PathBuf,
}

impl TsModuleExporter {
    pub fn new(output: PathBuf) -> Self {
        Self { output }
    }

    /// Bundles every `*.svg` in `svg_dir` except full-page tracings.
    /// Returns the number of strokes written.
    pub fn bundle(&self, svg_dir: &Path) -> Result<usize> {
        let mut strokes = BTreeMap::new();
        for entry in fs::read_dir(svg_dir)
            .with_context(|| format!("failed to list {}", svg_dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("svg") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with("page_") {
                continue;
            }
            let svg = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            tracing::debug!(stroke = name, "bundling svg");
            strokes.insert(name.to_string(), clean_svg(&svg));
        }

        if let Some(parent) = self.output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.output, render_module(&strokes))
            .with_context(|| format!("failed to write {}", self.output.display()))?;
        Ok(strokes.len())
    }
}

/// Drops the XML declaration and DOCTYPE and collapses whitespace.
pub fn clean_svg(svg: &str) -> String {
    let svg = XML_DECL.replace_all(svg, "");
    let svg = DOCTYPE.replace_all(&svg, "");
    WHITESPACE.replace_all(&svg, " ").trim().to_string()
}

/// Escapes text for use inside a JavaScript template literal.
pub fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

pub fn render_module(strokes: &BTreeMap<String, String>) -> String {
    let mut ts = String::from(
        "// Auto-generated SVG stroke data\n\
         // Generated from traced stroke SVG files\n\
         \n\
         export const svgStrokeData: Record<string, string> = {\n",
    );
    for (name, svg) in strokes {
        let _ = writeln!(ts, "  '{}': `{}`,", name.replace('\'', "\\'"), escape_template(svg));
    }
    ts.push_str(
        "};\n\
         \n\
         // Get SVG for a specific stroke\n\
         export function getSvgStroke(strokeName: string): string {\n\
         \x20 return svgStrokeData[strokeName] || '';\n\
         }\n\
         \n\
         // Get all available stroke names\n\
         export function getAvailableStrokes(): string[] {\n\
         \x20 return Object.keys(svgStrokeData);\n\
         }\n\
         \n\
         // Total number of strokes\n\
         export const TOTAL_SVG_STROKES = Object.keys(svgStrokeData).length;\n",
    );
    ts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    use pretty_assertions::assert_eq;

    #[test]
    fn strips_prolog_and_minifies() {
        let svg = "<?xml version=\"1.0\" standalone=\"no\"?>\n\
                   <!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 20010904//EN\" \"x.dtd\">\n\
                   <svg  width=\"10\">\n   <path d=\"M0 0\"/>\n</svg>\n";
        assert_eq!(clean_svg(svg), "<svg width=\"10\"> <path d=\"M0 0\"/> </svg>");
    }

    #[test]
    fn escapes_template_metacharacters() {
        assert_eq!(escape_template(r"a`b${c}\d"), r"a\`b\${c}\\d");
    }

    #[test]
    fn bundles_svgs_in_name_order() -> Result<()> {
        let mut dir = std::env::temp_dir();
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        dir.push(format!("strokeharvest-ts-{}-{now}", std::process::id()));
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("T.svg"), "<svg><path d=\"M1 1\"/></svg>")?;
        fs::write(dir.join("B.svg"), "<svg><path d=\"M2 2\"/></svg>")?;
        fs::write(dir.join("page_009.svg"), "<svg/>")?;
        fs::write(dir.join("notes.txt"), "ignored")?;

        let output = dir.join("data/svg-stroke-data.ts");
        let count = TsModuleExporter::new(output.clone()).bundle(&dir)?;
        let ts = fs::read_to_string(&output)?;

        assert_eq!(count, 2);
        let b = ts.find("'B':").unwrap();
        let t = ts.find("'T':").unwrap();
        assert!(b < t);
        assert!(!ts.contains("page_009"));
        assert!(ts.contains("export function getSvgStroke"));

        let _ = fs::remove_dir_all(&dir);
        Ok(())
    }
}
