use crate::error::{Error, Result};
use crate::import::{parse_flashcards_json, parse_questions_json};
use crate::logger;
use crate::models::{Flashcard, Question};
use async_trait::async_trait;
use std::path::Path;

/// Remote generation of study content. Implementations return the model's
/// raw text, which should contain a JSON array in the content schema.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_questions(
        &self,
        source_text: &str,
        count: usize,
    ) -> std::result::Result<String, String>;

    async fn generate_flashcards(
        &self,
        source_text: &str,
        count: usize,
    ) -> std::result::Result<String, String>;
}

/// Plain-text extraction from a PDF on disk. Returns an empty string when
/// nothing could be extracted.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> String;
}

/// Strips markdown fences and any prose around the outermost JSON array.
pub fn clean_json_response(response: &str) -> String {
    let mut cleaned = response.trim().to_string();

    if cleaned.starts_with("```") {
        let lines: Vec<&str> = cleaned.lines().collect();
        if lines.len() > 2 {
            cleaned = lines[1..lines.len() - 1].join("\n");
        }
    }

    if let Some(start) = cleaned.find('[')
        && let Some(end) = cleaned.rfind(']')
        && start < end
    {
        cleaned = cleaned[start..=end].to_string();
    }

    cleaned.trim().to_string()
}

async fn source_text(extractor: &dyn PdfTextExtractor, pdf: &Path, count: usize) -> Result<String> {
    if count == 0 {
        return Err(Error::Validation("requested item count must be positive".to_string()));
    }

    let text = extractor.extract_text(pdf).await;
    if text.trim().is_empty() {
        return Err(Error::Validation(format!(
            "No text could be extracted from {}",
            pdf.display()
        )));
    }
    Ok(text)
}

fn generation_failed(what: &str, error: String) -> Error {
    logger::log(&format!("{} generation failed: {}", what, error));
    Error::Generation(error)
}

pub async fn generate_questions_from_pdf(
    extractor: &dyn PdfTextExtractor,
    generator: &dyn ContentGenerator,
    pdf: &Path,
    count: usize,
) -> Result<Vec<Question>> {
    let text = source_text(extractor, pdf, count).await?;
    let raw = generator
        .generate_questions(&text, count)
        .await
        .map_err(|e| generation_failed("Question", e))?;

    let questions = parse_questions_json(&clean_json_response(&raw))?;
    if questions.is_empty() {
        return Err(Error::Generation("No questions were generated".to_string()));
    }
    Ok(questions)
}

pub async fn generate_flashcards_from_pdf(
    extractor: &dyn PdfTextExtractor,
    generator: &dyn ContentGenerator,
    pdf: &Path,
    count: usize,
) -> Result<Vec<Flashcard>> {
    let text = source_text(extractor, pdf, count).await?;
    let raw = generator
        .generate_flashcards(&text, count)
        .await
        .map_err(|e| generation_failed("Flashcard", e))?;

    let cards = parse_flashcards_json(&clean_json_response(&raw))?;
    if cards.is_empty() {
        return Err(Error::Generation("No flashcards were generated".to_string()));
    }
    Ok(cards)
}
