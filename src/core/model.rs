use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::geometry::BBox;

/// A candidate stroke found on one page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub bbox: BBox,
    pub area: f32,
    pub aspect_ratio: f32,
}

impl Region {
    pub fn new(bbox: BBox, area: f32) -> Self {
        Self {
            bbox,
            area,
            aspect_ratio: bbox.aspect_ratio(),
        }
    }
}

/// Expected symbol on a page, optionally with where it should appear.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelHint {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
}

impl LabelHint {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            x: None,
            y: None,
        }
    }

    pub fn at(label: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            label: label.into(),
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn position(&self) -> Option<(f32, f32)> {
        Some((self.x?, self.y?))
    }
}

/// Page id -> expected labels, in the order they should be assigned.
pub type HintTable = BTreeMap<String, Vec<LabelHint>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub label: String,
    pub region: Region,
    /// Hint-to-center distance when the pairing was made by position.
    pub distance: Option<f32>,
}

/// Every label of a page ends up in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentResult {
    pub assigned: Vec<Assignment>,
    pub unassigned: Vec<String>,
}

impl AssignmentResult {
    pub fn get(&self, label: &str) -> Option<&Region> {
        self.assigned
            .iter()
            .find(|a| a.label == label)
            .map(|a| &a.region)
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    PageMissing,
    PageUnreadable,
    NoRegions,
    InsufficientRegions,
    ExportFailed,
}

impl UnassignedReason {
    pub fn describe(&self) -> &'static str {
        match self {
            UnassignedReason::PageMissing => "page not found",
            UnassignedReason::PageUnreadable => "page unreadable",
            UnassignedReason::NoRegions => "no regions detected",
            UnassignedReason::InsufficientRegions => "not enough regions",
            UnassignedReason::ExportFailed => "crop could not be written",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnassignedLabel {
    pub label: String,
    pub page_id: String,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub label: String,
    pub path: PathBuf,
    pub page_id: String,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub extracted_count: usize,
    pub strokes: BTreeMap<String, String>,
    pub extraction_method: String,
    pub source: String,
    pub entries: Vec<ManifestEntry>,
    pub unassigned: Vec<UnassignedLabel>,
}

impl Manifest {
    pub fn new(extraction_method: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            extracted_count: 0,
            strokes: BTreeMap::new(),
            extraction_method: extraction_method.into(),
            source: source.into(),
            entries: Vec::new(),
            unassigned: Vec::new(),
        }
    }

    /// Records a written crop. A label seen before replaces its older entry,
    /// since the file on disk was overwritten as well.
    pub fn record(&mut self, entry: ManifestEntry) {
        if let Some(pos) = self.entries.iter().position(|e| e.label == entry.label) {
            tracing::warn!(
                label = %entry.label,
                previous_page = %self.entries[pos].page_id,
                page = %entry.page_id,
                "label extracted twice; keeping the latest crop"
            );
            self.entries.remove(pos);
        }
        self.strokes
            .insert(entry.label.clone(), entry.path.display().to_string());
        self.entries.push(entry);
        self.extracted_count = self.entries.len();
    }

    pub fn mark_unassigned(
        &mut self,
        label: impl Into<String>,
        page_id: impl Into<String>,
        reason: UnassignedReason,
    ) {
        self.unassigned.push(UnassignedLabel {
            label: label.into(),
            page_id: page_id.into(),
            reason,
        });
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty()
    }
}
