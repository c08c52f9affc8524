use super::ContentStore;
use crate::db::{FileStore, KeyValueStore};
use crate::error::{Error, Result};
use crate::logger;
use crate::models::{CollectionKind, Course};

/// In-memory view of the course list for a UI layer.
///
/// Reorders are applied locally first, then persisted. On success the
/// persisted course replaces the local copy; on failure the whole list is
/// reloaded from the store so the view cannot drift from storage.
pub struct CourseCatalog<S, F> {
    store: ContentStore<S, F>,
    courses: Vec<Course>,
}

impl<S: KeyValueStore, F: FileStore> CourseCatalog<S, F> {
    pub fn new(store: ContentStore<S, F>) -> Self {
        Self {
            store,
            courses: Vec::new(),
        }
    }

    pub fn store(&self) -> &ContentStore<S, F> {
        &self.store
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    pub async fn load(&mut self) -> Result<()> {
        self.courses = self.store.load_courses().await?;
        Ok(())
    }

    pub async fn reorder(
        &mut self,
        course_id: &str,
        kind: CollectionKind,
        old_index: usize,
        new_index: usize,
    ) -> Result<()> {
        let position = self
            .courses
            .iter()
            .position(|c| c.id == course_id)
            .ok_or_else(|| Error::CourseNotFound(course_id.to_string()))?;

        self.courses[position].reorder(kind, old_index, new_index)?;

        match self
            .store
            .reorder(course_id, kind, old_index, new_index)
            .await
        {
            Ok(persisted) => {
                self.courses[position] = persisted;
                Ok(())
            }
            Err(e) => {
                logger::log(&format!(
                    "Reorder of {} in course {} failed, reloading: {}",
                    kind, course_id, e
                ));
                if let Err(reload_err) = self.load().await {
                    logger::log(&format!("Reload after failed reorder failed: {}", reload_err));
                }
                Err(e)
            }
        }
    }
}
