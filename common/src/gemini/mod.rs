mod client;
mod error;
mod types;

pub use client::{GeminiClient, GenerativeModel, GEMINI_2_0_FLASH};
pub use error::GeminiError;
pub use types::{
    Blob, Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GoogleSearch, GroundingChunk, GroundingMetadata, Part, Schema, SchemaType, Tool, WebSource,
};
