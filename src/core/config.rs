//! Detection parameters and hint tables loaded from JSON.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::model::HintTable;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Gaussian-weighted local mean over a `block_size` window, minus `c`.
    Adaptive { block_size: u32, c: f32 },
    /// Fixed gray level; anything at or below it is ink.
    Global { level: u8 },
}

impl Default for ThresholdMode {
    fn default() -> Self {
        ThresholdMode::Adaptive {
            block_size: 11,
            c: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AreaPass {
    pub min_area: f32,
    pub max_area: f32,
}

impl AreaPass {
    pub fn new(min_area: f32, max_area: f32) -> Self {
        Self { min_area, max_area }
    }

    pub fn contains(&self, area: f32) -> bool {
        self.min_area < area && area < self.max_area
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    pub threshold: ThresholdMode,
    /// Radius of the square structuring element; 1 is a 3x3 kernel, 0 skips morphology.
    pub morph_radius: u8,
    pub passes: Vec<AreaPass>,
    pub min_aspect_ratio: Option<f32>,
    pub overlap_ratio: f32,
    pub row_bucket: u32,
    pub padding: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdMode::default(),
            morph_radius: 1,
            passes: vec![AreaPass::new(1000.0, 50000.0)],
            min_aspect_ratio: None,
            overlap_ratio: 0.5,
            row_bucket: 100,
            padding: 10,
        }
    }
}

impl DetectionConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.threshold {
            ThresholdMode::Adaptive { block_size, .. } if block_size < 3 || block_size % 2 == 0 => {
                return Err(ConfigError::invalid(format!(
                    "block_size must be odd and at least 3, got {block_size}"
                )));
            }
            _ => {}
        }

        if self.passes.is_empty() {
            return Err(ConfigError::invalid("at least one area pass is required"));
        }
        for pass in &self.passes {
            if pass.min_area < 0.0 || pass.min_area >= pass.max_area {
                return Err(ConfigError::invalid(format!(
                    "area pass ({}, {}) is empty",
                    pass.min_area, pass.max_area
                )));
            }
        }

        if !(self.overlap_ratio > 0.0 && self.overlap_ratio <= 1.0) {
            return Err(ConfigError::invalid(format!(
                "overlap_ratio must be in (0, 1], got {}",
                self.overlap_ratio
            )));
        }
        if self.row_bucket == 0 {
            return Err(ConfigError::invalid("row_bucket must be greater than 0"));
        }
        if let Some(ratio) = self.min_aspect_ratio {
            if ratio < 1.0 {
                return Err(ConfigError::invalid(format!(
                    "min_aspect_ratio below 1.0 filters nothing, got {ratio}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-page detection settings keyed by page id; pages not listed use the
/// run's base configuration.
pub type PageConfigs = BTreeMap<String, DetectionConfig>;

pub fn load_hints(path: &Path) -> Result<HintTable, ConfigError> {
    let table: HintTable = read_json(path)?;
    validate_hints(&table)?;
    Ok(table)
}

/// Every label must be non-empty, unique within its page and usable as a
/// plain file name inside the output directory.
pub fn validate_hints(table: &HintTable) -> Result<(), ConfigError> {
    for (page_id, hints) in table {
        let mut seen = HashSet::with_capacity(hints.len());
        for hint in hints {
            if hint.label.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "page {page_id} has a hint with an empty label ({hint:?})"
                )));
            }
            check_file_component("label", &hint.label)?;
            if !seen.insert(hint.label.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "page {page_id} lists label {:?} more than once",
                    hint.label
                )));
            }
        }
    }
    Ok(())
}

/// Rejects values that would leave the directory they are joined onto.
pub fn check_file_component(kind: &str, value: &str) -> Result<(), ConfigError> {
    let escapes = value.contains('/')
        || value.contains('\\')
        || value.contains("..")
        || Path::new(value).is_absolute()
        || Path::new(value).has_root();
    if escapes {
        return Err(ConfigError::invalid(format!(
            "{kind} {value:?} must not contain path separators or '..'"
        )));
    }
    Ok(())
}

pub fn load_page_configs(path: &Path) -> Result<PageConfigs, ConfigError> {
    let configs: PageConfigs = read_json(path)?;
    for (page_id, config) in &configs {
        config
            .validate()
            .map_err(|err| ConfigError::invalid(format!("page {page_id}: {err}")))?;
    }
    Ok(configs)
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::LabelHint;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        DetectionConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: DetectionConfig = serde_json::from_str(
            r#"{"threshold":{"mode":"global","level":200},"min_aspect_ratio":2.0,"padding":5}"#,
        )
        .unwrap();
        assert_eq!(config.threshold, ThresholdMode::Global { level: 200 });
        assert_eq!(config.padding, 5);
        assert_eq!(config.min_aspect_ratio, Some(2.0));
        assert_eq!(config.passes, vec![AreaPass::new(1000.0, 50000.0)]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed = serde_json::from_str::<DetectionConfig>(r#"{"pading":5}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_even_block_size() {
        let config = DetectionConfig {
            threshold: ThresholdMode::Adaptive {
                block_size: 10,
                c: 2.0,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_empty_area_pass() {
        let config = DetectionConfig {
            passes: vec![AreaPass::new(500.0, 500.0)],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn area_pass_bounds_are_strict() {
        let pass = AreaPass::new(1000.0, 50000.0);
        assert!(!pass.contains(1000.0));
        assert!(pass.contains(1000.5));
        assert!(!pass.contains(50000.0));
    }

    fn table(page_id: &str, labels: &[&str]) -> HintTable {
        let mut table = HintTable::new();
        table.insert(
            page_id.to_string(),
            labels.iter().map(|l| LabelHint::new(*l)).collect(),
        );
        table
    }

    #[test]
    fn labels_must_stay_inside_output_dir() {
        for label in ["../escaped", "a/b", "a\\b", "/abs", "..", "x..y"] {
            let result = validate_hints(&table("001", &[label]));
            assert!(
                matches!(result, Err(ConfigError::Invalid { .. })),
                "label {label:?} was accepted"
            );
        }
        validate_hints(&table("001", &["TH", "CH", "NG_heavy"])).unwrap();
    }

    #[test]
    fn rejects_duplicate_label_on_one_page() {
        let result = validate_hints(&table("009", &["B", "P", "B"]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let mut across_pages = table("009", &["B"]);
        across_pages.extend(table("010", &["B"]));
        validate_hints(&across_pages).unwrap();
    }

    #[test]
    fn load_hints_rejects_escaping_label() {
        let mut path = std::env::temp_dir();
        path.push(format!("strokeharvest-hints-{}.json", std::process::id()));
        fs::write(&path, r#"{"001":[{"label":"../escaped"}]}"#).unwrap();

        let result = load_hints(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn page_configs_are_validated_per_page() {
        let mut path = std::env::temp_dir();
        path.push(format!("strokeharvest-pages-{}.json", std::process::id()));

        fs::write(&path, r#"{"017":{"passes":[{"min_area":300,"max_area":5000}]}}"#).unwrap();
        let configs = load_page_configs(&path).unwrap();
        assert_eq!(configs["017"].passes, vec![AreaPass::new(300.0, 5000.0)]);
        assert_eq!(configs["017"].padding, 10);

        fs::write(&path, r#"{"017":{"row_bucket":0}}"#).unwrap();
        let result = load_page_configs(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
