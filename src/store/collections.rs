//! Structural edits on a course's ordered collections.
//!
//! Every edit that moves or removes items re-keys the matching name map
//! through [`Course::rekey_names`], so a name (custom or default) always
//! stays with the item it was given to.

use crate::db::files::strip_timestamp_prefix;
use crate::error::{Error, Result};
use crate::models::{CollectionKind, Course, Flashcard, NameMap, Question};
use std::path::Path;

fn move_item<T>(items: &mut Vec<T>, old_index: usize, new_index: usize) {
    let item = items.remove(old_index);
    items.insert(new_index, item);
}

/// `result[new_slot] == old_index` after moving `old_index` to `new_index`.
pub(crate) fn reorder_permutation(len: usize, old_index: usize, new_index: usize) -> Vec<usize> {
    let mut permutation: Vec<usize> = (0..len).collect();
    move_item(&mut permutation, old_index, new_index);
    permutation
}

pub(crate) fn removal_permutation(len: usize, removed: usize) -> Vec<usize> {
    (0..len).filter(|&i| i != removed).collect()
}

fn clean_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

impl Course {
    pub fn default_name(&self, kind: CollectionKind, index: usize) -> String {
        match kind {
            CollectionKind::Quiz => format!("Quiz {}", index + 1),
            CollectionKind::FlashcardSet => format!("Flashcard Set {}", index + 1),
            CollectionKind::Pdf => self
                .pdfs
                .get(index)
                .and_then(|p| Path::new(p).file_name())
                .map(|n| strip_timestamp_prefix(&n.to_string_lossy()).to_string())
                .unwrap_or_else(|| format!("PDF {}", index + 1)),
        }
    }

    /// The stored name for the item, or its default when none is stored.
    pub fn display_name(&self, kind: CollectionKind, index: usize) -> String {
        self.names(kind)
            .get(&index)
            .cloned()
            .unwrap_or_else(|| self.default_name(kind, index))
    }

    pub fn quiz_name(&self, index: usize) -> String {
        self.display_name(CollectionKind::Quiz, index)
    }

    pub fn flashcard_set_name(&self, index: usize) -> String {
        self.display_name(CollectionKind::FlashcardSet, index)
    }

    pub fn pdf_name(&self, index: usize) -> String {
        self.display_name(CollectionKind::Pdf, index)
    }

    pub fn check_index(&self, kind: CollectionKind, index: usize) -> Result<()> {
        let len = self.len_of(kind);
        if index >= len {
            return Err(Error::IndexOutOfRange { kind, index, len });
        }
        Ok(())
    }

    /// Rebuilds the name map for `kind` from a permutation of old indices.
    /// Must run before the data list itself is changed.
    fn rekey_names(&mut self, kind: CollectionKind, permutation: &[usize]) {
        let names: NameMap = permutation
            .iter()
            .enumerate()
            .map(|(new_index, &old_index)| (new_index, self.display_name(kind, old_index)))
            .collect();
        *self.names_mut(kind) = names;
    }

    pub fn add_quiz(&mut self, questions: Vec<Question>, name: Option<&str>) -> Result<usize> {
        if questions.is_empty() {
            return Err(Error::Validation("a quiz needs at least one question".to_string()));
        }
        self.quizzes.push(questions);
        Ok(self.attach_name(CollectionKind::Quiz, name))
    }

    pub fn add_flashcard_set(&mut self, cards: Vec<Flashcard>, name: Option<&str>) -> Result<usize> {
        if cards.is_empty() {
            return Err(Error::Validation(
                "a flashcard set needs at least one card".to_string(),
            ));
        }
        self.flashcards.push(cards);
        Ok(self.attach_name(CollectionKind::FlashcardSet, name))
    }

    pub fn add_pdf(&mut self, path: String) -> usize {
        self.pdfs.push(path);
        self.pdfs.len() - 1
    }

    fn attach_name(&mut self, kind: CollectionKind, name: Option<&str>) -> usize {
        let index = self.len_of(kind) - 1;
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.names_mut(kind).insert(index, name.to_string());
        }
        index
    }

    pub fn reorder(&mut self, kind: CollectionKind, old_index: usize, new_index: usize) -> Result<()> {
        self.check_index(kind, old_index)?;
        self.check_index(kind, new_index)?;
        if old_index == new_index {
            return Ok(());
        }

        let permutation = reorder_permutation(self.len_of(kind), old_index, new_index);
        self.rekey_names(kind, &permutation);
        match kind {
            CollectionKind::Quiz => move_item(&mut self.quizzes, old_index, new_index),
            CollectionKind::FlashcardSet => move_item(&mut self.flashcards, old_index, new_index),
            CollectionKind::Pdf => move_item(&mut self.pdfs, old_index, new_index),
        }
        Ok(())
    }

    /// Removes the item at `index`. For PDFs the stored path is returned so
    /// the caller can delete the backing file.
    pub fn remove_at(&mut self, kind: CollectionKind, index: usize) -> Result<Option<String>> {
        self.check_index(kind, index)?;

        let permutation = removal_permutation(self.len_of(kind), index);
        self.rekey_names(kind, &permutation);
        let removed = match kind {
            CollectionKind::Quiz => {
                self.quizzes.remove(index);
                None
            }
            CollectionKind::FlashcardSet => {
                self.flashcards.remove(index);
                None
            }
            CollectionKind::Pdf => Some(self.pdfs.remove(index)),
        };
        Ok(removed)
    }

    pub fn rename_item(&mut self, kind: CollectionKind, index: usize, name: &str) -> Result<()> {
        let name = clean_name(name)?;
        self.check_index(kind, index)?;
        self.names_mut(kind).insert(index, name);
        Ok(())
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        self.name = clean_name(name)?;
        Ok(())
    }

    /// Drops name entries whose key no longer addresses an item.
    pub fn prune_stale_names(&mut self) -> usize {
        let mut pruned = 0;
        for kind in [
            CollectionKind::Quiz,
            CollectionKind::FlashcardSet,
            CollectionKind::Pdf,
        ] {
            let len = self.len_of(kind);
            let names = self.names_mut(kind);
            let before = names.len();
            names.retain(|&index, _| index < len);
            pruned += before - names.len();
        }
        pruned
    }
}
