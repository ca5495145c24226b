use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::Manifest;
use crate::export::Exporter;

pub const MANIFEST_FILE: &str = "extraction_metadata.json";

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.out_dir.join(MANIFEST_FILE)
    }
}

impl Exporter for JsonExporter {
    fn export(&self, manifest: &Manifest) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let data = serde_json::to_string_pretty(manifest)?;
        fs::write(self.path(), data)?;
        Ok(())
    }
}
