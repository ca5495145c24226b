use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;

use crate::core::tool::run_tool;

#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("PDF does not exist: {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn page_count(&self) -> Result<usize> {
        let output = run_tool("pdfinfo", Command::new("pdfinfo").arg(&self.path))
            .with_context(|| format!("failed to inspect {}", self.path.display()))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout).with_context(|| {
            format!(
                "pdfinfo output did not contain a page count for {}",
                self.path.display()
            )
        })
    }
}

fn parse_page_count(pdfinfo_stdout: &str) -> Result<usize> {
    for line in pdfinfo_stdout.lines() {
        if let Some(rest) = line.strip_prefix("Pages:") {
            let num_str = rest.trim();
            let pages: usize = num_str.parse().with_context(|| {
                format!("failed to parse page count from 'Pages:' line: {num_str}")
            })?;
            return Ok(pages);
        }
    }
    anyhow::bail!("no 'Pages:' line")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_pages_line() {
        let stdout = "Title:          Shorthand\nProducer:       x\nPages:          142\nEncrypted:      no\n";
        assert_eq!(parse_page_count(stdout).unwrap(), 142);
    }

    #[test]
    fn missing_pages_line_is_an_error() {
        assert!(parse_page_count("Title: nothing\n").is_err());
        assert!(parse_page_count("Pages: many\n").is_err());
    }

    #[test]
    fn rejects_missing_file() {
        assert!(PdfReader::new(PathBuf::from("/definitely/not/here.pdf")).is_err());
    }
}
