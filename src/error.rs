use crate::models::CollectionKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Malformed content: {0}")]
    MalformedContent(String),

    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: CollectionKind,
        index: usize,
        len: usize,
    },

    #[error("option {index} out of range ({len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    /// Import failure; the message is meant to be shown to the user as-is.
    #[error("{0}")]
    Format(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Generation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::MalformedContent(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::CourseNotFound(_)
                | Error::IndexOutOfRange { .. }
                | Error::OptionOutOfRange { .. }
        )
    }

    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Sqlite(_) | Error::Io(_) | Error::Corrupt(_) | Error::Storage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::Validation("empty".into()).is_validation());
        assert!(Error::MalformedContent("options".into()).is_validation());
        assert!(Error::CourseNotFound("x".into()).is_not_found());
        assert!(
            Error::IndexOutOfRange {
                kind: CollectionKind::Quiz,
                index: 3,
                len: 2
            }
            .is_not_found()
        );
        assert!(Error::Storage("disk full".into()).is_persistence());
        assert!(!Error::Format("nothing parsed".into()).is_persistence());
    }

    #[test]
    fn test_format_message_is_verbatim() {
        let err = Error::Format("No questions found".to_string());
        assert_eq!(err.to_string(), "No questions found");
    }

    #[test]
    fn test_index_error_message() {
        let err = Error::IndexOutOfRange {
            kind: CollectionKind::FlashcardSet,
            index: 99,
            len: 2,
        };
        assert_eq!(err.to_string(), "flashcard set index 99 out of range (len 2)");
    }
}
