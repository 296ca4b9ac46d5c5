//! CV screening: extraction, match analysis and the submission pipeline.

pub mod analyzer;
pub mod extractor;
pub mod handlers;
pub mod model_output;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod schema;
