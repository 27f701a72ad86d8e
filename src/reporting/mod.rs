// src/reporting/mod.rs
mod builder;
mod generator;
mod model;
mod parser;
pub mod formats;

pub use builder::{Narrative, ReportBuilder, DEFAULT_TITLE};
pub use formats::{renderer_for, ReportFormat, ReportRenderer};
pub use generator::{ReportManager, WrittenArtifact};
pub use model::{Block, DocumentOutline, ReportDocument, Section, Table};
pub use parser::{parse_blocks, BlockParser};
