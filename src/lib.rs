pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod posts;

pub use models::{Metadata, RawResponse, Summary};
pub use parser::normalize;
