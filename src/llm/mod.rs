pub mod client;
pub mod context;
pub mod parser;

pub use client::{ApiFormat, LlmClient};
pub use context::ImpressionContext;
pub use parser::{analyze_impression, decode_reply, fallback_analysis};
