pub mod crop;
pub mod json_export;
pub mod text_export;
pub mod ts_module;

use anyhow::Result;

use crate::core::model::Manifest;

pub use crop::StrokeExporter;
pub use json_export::JsonExporter;
pub use text_export::TextExporter;
pub use ts_module::TsModuleExporter;

pub trait Exporter {
    fn export(&self, manifest: &Manifest) -> Result<()>;
}
