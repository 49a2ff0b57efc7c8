//! Source analysis

pub mod source_analyzer;

pub use source_analyzer::{SourceAnalysis, SourceAnalyzer};
