pub mod core;
pub mod export;
pub mod ocr;
pub mod pipeline;
pub mod segment;
pub mod table;

pub use crate::core::config::ExtractionConfig;
pub use crate::core::model::{DrawingInfo, Token};
pub use crate::pipeline::{process_batch, process_image, PipelineConfig};
