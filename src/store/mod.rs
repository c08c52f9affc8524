//! Course persistence.
//!
//! All courses live in one JSON array under [`COURSES_KEY`]. Every mutation
//! reads the whole array, edits one course and writes the whole array
//! back, so callers must await one mutation before issuing the next.

use crate::db::{FileStore, KeyValueStore};
use crate::error::{Error, Result};
use crate::logger;
use crate::models::{CollectionKind, Course, Flashcard, Question, SortingPreference};
use std::path::{Path, PathBuf};

pub mod catalog;
pub mod collections;
pub mod results;

pub use catalog::CourseCatalog;

pub const COURSES_KEY: &str = "courses";

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct ContentStore<S, F> {
    kv: S,
    files: F,
    pdf_root: PathBuf,
}

impl<S: KeyValueStore, F: FileStore> ContentStore<S, F> {
    pub fn new(kv: S, files: F, pdf_root: PathBuf) -> Self {
        Self {
            kv,
            files,
            pdf_root,
        }
    }

    pub fn pdf_dir_for(&self, course_id: &str) -> PathBuf {
        self.pdf_root.join(course_id)
    }

    pub async fn load_courses(&self) -> Result<Vec<Course>> {
        let Some(json) = self.kv.get_string(COURSES_KEY).await? else {
            return Ok(Vec::new());
        };

        let mut courses: Vec<Course> = serde_json::from_str(&json)
            .map_err(|e| Error::Corrupt(format!("course list: {}", e)))?;

        for course in &mut courses {
            let pruned = course.prune_stale_names();
            if pruned > 0 {
                logger::log(&format!(
                    "Pruned {} stale name entries from course {}",
                    pruned, course.id
                ));
            }
        }

        Ok(courses)
    }

    async fn save_courses(&self, courses: &[Course]) -> Result<()> {
        let json = serde_json::to_string(courses)
            .map_err(|e| Error::Storage(format!("failed to encode courses: {}", e)))?;
        self.kv.set_string(COURSES_KEY, &json).await
    }

    pub async fn get_course(&self, course_id: &str) -> Result<Course> {
        self.load_courses()
            .await?
            .into_iter()
            .find(|c| c.id == course_id)
            .ok_or_else(|| Error::CourseNotFound(course_id.to_string()))
    }

    /// Applies `edit` to a copy of one course and writes the full list back.
    /// Nothing is written when `edit` fails.
    async fn mutate_course<T, E>(&self, course_id: &str, edit: E) -> Result<(Course, T)>
    where
        T: Send,
        E: FnOnce(&mut Course) -> Result<T> + Send,
    {
        let mut courses = self.load_courses().await?;
        let position = courses
            .iter()
            .position(|c| c.id == course_id)
            .ok_or_else(|| Error::CourseNotFound(course_id.to_string()))?;

        let mut course = courses[position].clone();
        let value = edit(&mut course)?;
        course.updated_at = now_millis();
        courses[position] = course.clone();

        self.save_courses(&courses).await?;
        Ok((course, value))
    }

    pub async fn create_course(&self, name: &str) -> Result<Course> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("course name cannot be empty".to_string()));
        }

        let mut courses = self.load_courses().await?;
        let mut now = now_millis();
        let mut course = Course::new(name, now);
        while courses.iter().any(|c| c.id == course.id) {
            now += 1;
            course = Course::new(name, now);
        }
        courses.push(course.clone());
        self.save_courses(&courses).await?;

        logger::log(&format!("Created course {} ({})", course.id, course.name));
        Ok(course)
    }

    pub async fn rename_course(&self, course_id: &str, name: &str) -> Result<Course> {
        let (course, _) = self.mutate_course(course_id, |c| c.rename(name)).await?;
        logger::log(&format!("Renamed course {} to {}", course.id, course.name));
        Ok(course)
    }

    pub async fn delete_course(&self, course_id: &str) -> Result<()> {
        let mut courses = self.load_courses().await?;
        let position = courses
            .iter()
            .position(|c| c.id == course_id)
            .ok_or_else(|| Error::CourseNotFound(course_id.to_string()))?;

        let course = courses.remove(position);
        self.save_courses(&courses).await?;
        if let Err(e) = self.clear_quiz_results(course_id).await {
            logger::log(&format!("Failed to clear results for course {}: {}", course_id, e));
        }

        for pdf in &course.pdfs {
            if let Err(e) = self.files.delete_file(Path::new(pdf)).await {
                logger::log(&format!("Failed to delete {} for course {}: {}", pdf, course_id, e));
            }
        }

        logger::log(&format!("Deleted course {}", course_id));
        Ok(())
    }

    pub async fn add_quiz(
        &self,
        course_id: &str,
        questions: Vec<Question>,
        name: Option<&str>,
    ) -> Result<Course> {
        let (course, index) = self
            .mutate_course(course_id, |c| c.add_quiz(questions, name))
            .await?;
        logger::log(&format!("Added quiz {} to course {}", index, course_id));
        Ok(course)
    }

    pub async fn add_flashcard_set(
        &self,
        course_id: &str,
        cards: Vec<Flashcard>,
        name: Option<&str>,
    ) -> Result<Course> {
        let (course, index) = self
            .mutate_course(course_id, |c| c.add_flashcard_set(cards, name))
            .await?;
        logger::log(&format!("Added flashcard set {} to course {}", index, course_id));
        Ok(course)
    }

    /// Copies `source` into the course's PDF directory and appends the copy.
    pub async fn add_pdf(&self, course_id: &str, source: &Path) -> Result<Course> {
        self.get_course(course_id).await?;

        let stored = self
            .files
            .copy_file(source, &self.pdf_dir_for(course_id))
            .await?;
        let stored_str = stored.to_string_lossy().to_string();

        match self
            .mutate_course(course_id, |c| Ok(c.add_pdf(stored_str)))
            .await
        {
            Ok((course, index)) => {
                logger::log(&format!("Added PDF {} to course {}", index, course_id));
                Ok(course)
            }
            Err(e) => {
                if let Err(cleanup) = self.files.delete_file(&stored).await {
                    logger::log(&format!(
                        "Failed to remove {} after failed save: {}",
                        stored.display(),
                        cleanup
                    ));
                }
                Err(e)
            }
        }
    }

    pub async fn replace_quiz(
        &self,
        course_id: &str,
        index: usize,
        questions: Vec<Question>,
    ) -> Result<Course> {
        let (course, _) = self
            .mutate_course(course_id, |c| {
                c.check_index(CollectionKind::Quiz, index)?;
                if questions.is_empty() {
                    return Err(Error::Validation(
                        "a quiz needs at least one question".to_string(),
                    ));
                }
                c.quizzes[index] = questions;
                Ok(())
            })
            .await?;
        Ok(course)
    }

    pub async fn replace_flashcard_set(
        &self,
        course_id: &str,
        index: usize,
        cards: Vec<Flashcard>,
    ) -> Result<Course> {
        let (course, _) = self
            .mutate_course(course_id, |c| {
                c.check_index(CollectionKind::FlashcardSet, index)?;
                if cards.is_empty() {
                    return Err(Error::Validation(
                        "a flashcard set needs at least one card".to_string(),
                    ));
                }
                c.flashcards[index] = cards;
                Ok(())
            })
            .await?;
        Ok(course)
    }

    pub async fn delete_item(
        &self,
        course_id: &str,
        kind: CollectionKind,
        index: usize,
    ) -> Result<Course> {
        let (course, removed_path) = self
            .mutate_course(course_id, |c| c.remove_at(kind, index))
            .await?;

        if let Some(path) = removed_path
            && let Err(e) = self.files.delete_file(Path::new(&path)).await
        {
            logger::log(&format!("Failed to delete {} for course {}: {}", path, course_id, e));
        }

        logger::log(&format!("Deleted {} {} from course {}", kind, index, course_id));
        Ok(course)
    }

    pub async fn delete_quiz(&self, course_id: &str, index: usize) -> Result<Course> {
        self.delete_item(course_id, CollectionKind::Quiz, index).await
    }

    pub async fn delete_flashcard_set(&self, course_id: &str, index: usize) -> Result<Course> {
        self.delete_item(course_id, CollectionKind::FlashcardSet, index)
            .await
    }

    pub async fn delete_pdf(&self, course_id: &str, index: usize) -> Result<Course> {
        self.delete_item(course_id, CollectionKind::Pdf, index).await
    }

    pub async fn reorder(
        &self,
        course_id: &str,
        kind: CollectionKind,
        old_index: usize,
        new_index: usize,
    ) -> Result<Course> {
        let (course, _) = self
            .mutate_course(course_id, |c| c.reorder(kind, old_index, new_index))
            .await?;
        logger::log(&format!(
            "Moved {} {} -> {} in course {}",
            kind, old_index, new_index, course_id
        ));
        Ok(course)
    }

    pub async fn reorder_quiz(&self, course_id: &str, old_index: usize, new_index: usize) -> Result<Course> {
        self.reorder(course_id, CollectionKind::Quiz, old_index, new_index)
            .await
    }

    pub async fn reorder_flashcard_set(
        &self,
        course_id: &str,
        old_index: usize,
        new_index: usize,
    ) -> Result<Course> {
        self.reorder(course_id, CollectionKind::FlashcardSet, old_index, new_index)
            .await
    }

    pub async fn reorder_pdf(&self, course_id: &str, old_index: usize, new_index: usize) -> Result<Course> {
        self.reorder(course_id, CollectionKind::Pdf, old_index, new_index)
            .await
    }

    pub async fn rename(
        &self,
        course_id: &str,
        kind: CollectionKind,
        index: usize,
        name: &str,
    ) -> Result<Course> {
        let (course, _) = self
            .mutate_course(course_id, |c| c.rename_item(kind, index, name))
            .await?;
        logger::log(&format!("Renamed {} {} in course {}", kind, index, course_id));
        Ok(course)
    }

    pub async fn toggle_quiz_sorting_preference(&self, course_id: &str) -> Result<SortingPreference> {
        let (_, preference) = self
            .mutate_course(course_id, |c| {
                c.quiz_sorting_preference = c.quiz_sorting_preference.toggled();
                Ok(c.quiz_sorting_preference)
            })
            .await?;
        logger::log(&format!(
            "Quiz ordering for course {} is now {:?}",
            course_id, preference
        ));
        Ok(preference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{LocalFileStore, MemoryStore};
    use crate::models::QuizResult;

    fn store() -> (ContentStore<MemoryStore, LocalFileStore>, MemoryStore, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let kv = MemoryStore::new();
        let store = ContentStore::new(kv.clone(), LocalFileStore, temp_dir.path().join("pdfs"));
        (store, kv, temp_dir)
    }

    fn quiz(tag: &str) -> Vec<Question> {
        vec![Question::new(0, tag, vec!["yes".into(), "no".into()], vec![0]).unwrap()]
    }

    #[tokio::test]
    async fn test_create_course_rejects_blank_name() {
        let (store, _, _dir) = store();
        let err = store.create_course("   ").await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.load_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_reload() {
        let (store, _, _dir) = store();
        let course = store.create_course("  Chemistry ").await.unwrap();
        assert_eq!(course.name, "Chemistry");
        assert!(course.quizzes.is_empty());

        let loaded = store.get_course(&course.id).await.unwrap();
        assert_eq!(loaded, course);
    }

    #[tokio::test]
    async fn test_unknown_course_is_not_found() {
        let (store, _, _dir) = store();
        let err = store.add_quiz("missing", quiz("A"), None).await.unwrap_err();
        assert!(matches!(err, Error::CourseNotFound(_)));
    }

    #[tokio::test]
    async fn test_reorder_quiz_preserves_names() {
        let (store, _, _dir) = store();
        let course = store.create_course("Math").await.unwrap();
        for tag in ["A", "B", "C"] {
            store.add_quiz(&course.id, quiz(tag), Some(tag)).await.unwrap();
        }

        let updated = store.reorder_quiz(&course.id, 0, 2).await.unwrap();
        let order: Vec<&str> = updated.quizzes.iter().map(|q| q[0].text()).collect();
        assert_eq!(order, vec!["B", "C", "A"]);

        let persisted = store.get_course(&course.id).await.unwrap();
        let names: Vec<(usize, &str)> = persisted
            .quiz_names
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        assert_eq!(names, vec![(0, "B"), (1, "C"), (2, "A")]);
    }

    #[tokio::test]
    async fn test_delete_out_of_range_leaves_course() {
        let (store, _, _dir) = store();
        let course = store.create_course("Math").await.unwrap();
        store.add_quiz(&course.id, quiz("A"), None).await.unwrap();
        let before = store.add_quiz(&course.id, quiz("B"), None).await.unwrap();

        let err = store.delete_quiz(&course.id, 99).await.unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 99, len: 2, .. }));
        assert_eq!(store.get_course(&course.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_rename_bumps_updated_at() {
        let (store, _, _dir) = store();
        let course = store.create_course("Math").await.unwrap();
        let with_quiz = store.add_quiz(&course.id, quiz("A"), None).await.unwrap();

        let err = store
            .rename(&course.id, CollectionKind::Quiz, 0, " ")
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let renamed = store
            .rename(&course.id, CollectionKind::Quiz, 0, " Algebra ")
            .await
            .unwrap();
        assert_eq!(renamed.quiz_name(0), "Algebra");
        assert!(renamed.updated_at >= with_quiz.updated_at);
    }

    #[tokio::test]
    async fn test_toggle_sorting_preference() {
        let (store, _, _dir) = store();
        let course = store.create_course("Math").await.unwrap();
        assert_eq!(course.quiz_sorting_preference, SortingPreference::Random);

        let pref = store.toggle_quiz_sorting_preference(&course.id).await.unwrap();
        assert_eq!(pref, SortingPreference::Sequential);
        let pref = store.toggle_quiz_sorting_preference(&course.id).await.unwrap();
        assert_eq!(pref, SortingPreference::Random);
    }

    #[tokio::test]
    async fn test_add_and_delete_pdf_manages_file() {
        let (store, _, dir) = store();
        let course = store.create_course("Physics").await.unwrap();
        let src = dir.path().join("optics.pdf");
        std::fs::write(&src, b"%PDF").unwrap();

        let updated = store.add_pdf(&course.id, &src).await.unwrap();
        let stored = PathBuf::from(&updated.pdfs[0]);
        assert!(stored.exists());
        assert!(stored.starts_with(store.pdf_dir_for(&course.id)));
        assert_eq!(updated.pdf_name(0), "optics.pdf");

        let updated = store.delete_pdf(&course.id, 0).await.unwrap();
        assert!(updated.pdfs.is_empty());
        assert!(!stored.exists());
        assert!(src.exists());
    }

    #[tokio::test]
    async fn test_add_pdf_to_missing_course_copies_nothing() {
        let (store, _, dir) = store();
        let src = dir.path().join("optics.pdf");
        std::fs::write(&src, b"%PDF").unwrap();

        assert!(store.add_pdf("missing", &src).await.unwrap_err().is_not_found());
        assert!(!store.pdf_dir_for("missing").exists());
    }

    #[tokio::test]
    async fn test_replace_quiz() {
        let (store, _, _dir) = store();
        let course = store.create_course("Math").await.unwrap();
        store.add_quiz(&course.id, quiz("old"), Some("Keep")).await.unwrap();

        let updated = store.replace_quiz(&course.id, 0, quiz("new")).await.unwrap();
        assert_eq!(updated.quizzes[0][0].text(), "new");
        assert_eq!(updated.quiz_name(0), "Keep");
        assert!(store.replace_quiz(&course.id, 1, quiz("x")).await.is_err());
        assert!(store.replace_quiz(&course.id, 0, vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_course_removes_results_and_files() {
        let (store, _, dir) = store();
        let keep = store.create_course("Keep").await.unwrap();
        let course = store.create_course("Drop").await.unwrap();
        let src = dir.path().join("notes.pdf");
        std::fs::write(&src, b"%PDF").unwrap();
        let with_pdf = store.add_pdf(&course.id, &src).await.unwrap();
        store
            .record_quiz_result(&QuizResult::new(&course.id, 0, "Quiz 1", 1, 2))
            .await
            .unwrap();

        store.delete_course(&course.id).await.unwrap();

        let remaining = store.load_courses().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
        assert!(store.quiz_results(&course.id).await.unwrap().is_empty());
        assert!(!Path::new(&with_pdf.pdfs[0]).exists());
        assert!(store.delete_course(&course.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_same_name_courses_get_distinct_ids() {
        let (store, _, _dir) = store();
        for _ in 0..20 {
            store.create_course("Math").await.unwrap();
        }

        let courses = store.load_courses().await.unwrap();
        let ids: std::collections::HashSet<_> = courses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), courses.len());

        let last = courses[courses.len() - 1].id.clone();
        store.rename_course(&last, "Algebra").await.unwrap();
        let renamed: Vec<_> = store
            .load_courses()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.name == "Algebra")
            .collect();
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].id, last);
    }

    #[tokio::test]
    async fn test_failed_pdf_save_removes_copy() {
        let (store, kv, dir) = store();
        let course = store.create_course("Physics").await.unwrap();
        let src = dir.path().join("notes.pdf");
        std::fs::write(&src, b"%PDF").unwrap();
        kv.set_fail_writes(true);

        assert!(store.add_pdf(&course.id, &src).await.unwrap_err().is_persistence());
        let copies = std::fs::read_dir(store.pdf_dir_for(&course.id)).unwrap().count();
        assert_eq!(copies, 0);
    }

    #[tokio::test]
    async fn test_delete_course_survives_failed_history_clear() {
        let (store, kv, dir) = store();
        let course = store.create_course("Drop").await.unwrap();
        let src = dir.path().join("notes.pdf");
        std::fs::write(&src, b"%PDF").unwrap();
        let with_pdf = store.add_pdf(&course.id, &src).await.unwrap();
        kv.set_fail_removes(true);

        store.delete_course(&course.id).await.unwrap();

        assert!(store.load_courses().await.unwrap().is_empty());
        assert!(!Path::new(&with_pdf.pdfs[0]).exists());
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_persistence_error() {
        let (store, kv, _dir) = store();
        let course = store.create_course("Math").await.unwrap();
        kv.set_fail_writes(true);

        let err = store.add_quiz(&course.id, quiz("A"), None).await.unwrap_err();
        assert!(err.is_persistence());
        kv.set_fail_writes(false);
        assert!(store.get_course(&course.id).await.unwrap().quizzes.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_course_list() {
        let (store, kv, _dir) = store();
        kv.set_string(COURSES_KEY, "{not json").await.unwrap();
        assert!(matches!(
            store.load_courses().await.unwrap_err(),
            Error::Corrupt(_)
        ));
    }

    #[tokio::test]
    async fn test_stale_names_pruned_on_load() {
        let (store, kv, _dir) = store();
        let mut course = Course::new("Math", 1);
        course.quiz_names.insert(3, "Ghost".to_string());
        kv.set_string(COURSES_KEY, &serde_json::to_string(&vec![course.clone()]).unwrap())
            .await
            .unwrap();

        let loaded = store.get_course(&course.id).await.unwrap();
        assert!(loaded.quiz_names.is_empty());
    }
}
