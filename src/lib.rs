pub mod ai;
pub mod ai_worker;
pub mod config;
pub mod csv;
pub mod db;
pub mod error;
pub mod import;
pub mod logger;
pub mod models;
pub mod session;
pub mod store;


// Re-exports for convenience
pub use ai::{ContentGenerator, ModelConfig, OpenRouterGenerator, PdfTextExtractor};
pub use config::{AiConfig, AppConfig};
pub use db::{FileStore, KeyValueStore, LocalFileStore, MemoryStore, SqliteStore};
pub use error::{Error, Result};
pub use import::{parse_flashcards, parse_questions};
pub use models::{CollectionKind, Course, Flashcard, Question, QuizResult, SortingPreference};
pub use session::{FlashcardSession, QuizSession, QuizStep};
pub use store::{ContentStore, CourseCatalog};

/// Opens the SQLite-backed store described by `config` and starts logging
/// to its log file.
pub fn open_store(config: &AppConfig) -> Result<ContentStore<SqliteStore, LocalFileStore>> {
    let kv = db::init_db(&config.db_path())?;
    logger::init_at(&config.log_file);
    Ok(ContentStore::new(kv, LocalFileStore, config.pdf_dir()))
}
