pub mod client;
pub mod generator;

// Public API exports
pub use client::{DEFAULT_MODEL, ModelConfig, OpenRouterGenerator};
pub use generator::{
    ContentGenerator, PdfTextExtractor, clean_json_response, generate_flashcards_from_pdf,
    generate_questions_from_pdf,
};
