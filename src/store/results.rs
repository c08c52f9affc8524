use super::ContentStore;
use crate::db::{FileStore, KeyValueStore};
use crate::error::{Error, Result};
use crate::logger;
use crate::models::QuizResult;

pub fn results_key(course_id: &str) -> String {
    format!("quiz_results/{}", course_id)
}

impl<S: KeyValueStore, F: FileStore> ContentStore<S, F> {
    /// Attempts for one course, oldest first.
    pub async fn quiz_results(&self, course_id: &str) -> Result<Vec<QuizResult>> {
        match self.kv.get_string(&results_key(course_id)).await? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| Error::Corrupt(format!("quiz results for {}: {}", course_id, e))),
            None => Ok(Vec::new()),
        }
    }

    pub async fn record_quiz_result(&self, result: &QuizResult) -> Result<()> {
        let mut history = self.quiz_results(&result.course_id).await?;
        history.push(result.clone());

        let json = serde_json::to_string(&history)
            .map_err(|e| Error::Storage(format!("failed to encode quiz results: {}", e)))?;
        self.kv
            .set_string(&results_key(&result.course_id), &json)
            .await?;

        logger::log(&format!(
            "Recorded result for {} quiz {}: {}/{}",
            result.course_id, result.quiz_index, result.score, result.total_questions
        ));
        Ok(())
    }

    pub async fn clear_quiz_results(&self, course_id: &str) -> Result<()> {
        self.kv.remove(&results_key(course_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{LocalFileStore, MemoryStore};
    use std::path::PathBuf;

    fn store() -> ContentStore<MemoryStore, LocalFileStore> {
        ContentStore::new(MemoryStore::new(), LocalFileStore, PathBuf::from("pdfs"))
    }

    #[tokio::test]
    async fn test_history_is_append_only_and_per_course() {
        let store = store();
        store
            .record_quiz_result(&QuizResult::new("a", 0, "Quiz 1", 1, 2))
            .await
            .unwrap();
        store
            .record_quiz_result(&QuizResult::new("a", 1, "Finals", 2, 2))
            .await
            .unwrap();
        store
            .record_quiz_result(&QuizResult::new("b", 0, "Quiz 1", 0, 1))
            .await
            .unwrap();

        let history = store.quiz_results("a").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].quiz_name, "Quiz 1");
        assert_eq!(history[1].quiz_name, "Finals");
        assert_eq!(history[1].percentage, 100.0);
        assert_eq!(store.quiz_results("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_results() {
        let store = store();
        store
            .record_quiz_result(&QuizResult::new("a", 0, "Quiz 1", 1, 2))
            .await
            .unwrap();
        store.clear_quiz_results("a").await.unwrap();
        assert!(store.quiz_results("a").await.unwrap().is_empty());
    }
}
