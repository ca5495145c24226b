pub mod pdf_reader;
pub mod renderer;

pub use pdf_reader::PdfReader;
pub use renderer::{PageRenderer, RenderedPage, DEFAULT_DPI};
