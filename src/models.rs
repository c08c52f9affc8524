use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Position-keyed display names for one of a course's ordered collections.
pub type NameMap = BTreeMap<usize, String>;

fn decode<T: DeserializeOwned>(json: &str, what: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| Error::MalformedContent(format!("{}: {}", what, e)))
}

fn encode<T: Serialize>(value: &T) -> String {
    // Plain data with string map keys; serialization cannot fail.
    serde_json::to_string(value).unwrap_or_default()
}

/// A multiple-choice question. Construction validates that there are at
/// least two options and that every answer index is distinct and in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawQuestion")]
pub struct Question {
    id: i64,
    text: String,
    options: Vec<String>,
    answer_indices: Vec<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: i64,
    text: String,
    options: Vec<String>,
    answer_indices: Vec<usize>,
}

impl TryFrom<RawQuestion> for Question {
    type Error = Error;

    fn try_from(raw: RawQuestion) -> Result<Self> {
        Question::new(raw.id, raw.text, raw.options, raw.answer_indices)
    }
}

impl Question {
    pub fn new(
        id: i64,
        text: impl Into<String>,
        options: Vec<String>,
        answer_indices: Vec<usize>,
    ) -> Result<Self> {
        if options.len() < 2 {
            return Err(Error::MalformedContent(format!(
                "question {} needs at least 2 options, got {}",
                id,
                options.len()
            )));
        }
        if answer_indices.is_empty() {
            return Err(Error::MalformedContent(format!(
                "question {} has no correct answer",
                id
            )));
        }
        let mut seen = HashSet::new();
        for &index in &answer_indices {
            if index >= options.len() {
                return Err(Error::MalformedContent(format!(
                    "question {} answer index {} out of range for {} options",
                    id,
                    index,
                    options.len()
                )));
            }
            if !seen.insert(index) {
                return Err(Error::MalformedContent(format!(
                    "question {} lists answer index {} twice",
                    id, index
                )));
            }
        }

        Ok(Self {
            id,
            text: text.into(),
            options,
            answer_indices,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer_indices(&self) -> &[usize] {
        &self.answer_indices
    }

    pub fn is_multi_select(&self) -> bool {
        self.answer_indices.len() > 1
    }

    /// Exact set match: no partial credit.
    pub fn is_correct<'a>(&self, selected: impl IntoIterator<Item = &'a usize>) -> bool {
        let selected: Vec<&usize> = selected.into_iter().collect();
        selected.len() == self.answer_indices.len()
            && selected.iter().all(|i| self.answer_indices.contains(i))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        decode(json, "question")
    }

    pub fn to_json(&self) -> String {
        encode(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Flashcard {
    pub fn new(id: i64, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id,
            front: front.into(),
            back: back.into(),
            explanation: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        decode(json, "flashcard")
    }

    pub fn to_json(&self) -> String {
        encode(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortingPreference {
    #[default]
    Random,
    Sequential,
}

impl SortingPreference {
    pub fn toggled(self) -> Self {
        match self {
            SortingPreference::Random => SortingPreference::Sequential,
            SortingPreference::Sequential => SortingPreference::Random,
        }
    }
}

/// The three ordered collections a course owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Quiz,
    FlashcardSet,
    Pdf,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Quiz => write!(f, "quiz"),
            CollectionKind::FlashcardSet => write!(f, "flashcard set"),
            CollectionKind::Pdf => write!(f, "PDF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub quizzes: Vec<Vec<Question>>,
    pub flashcards: Vec<Vec<Flashcard>>,
    pub pdfs: Vec<String>,
    #[serde(default)]
    pub quiz_names: NameMap,
    #[serde(default)]
    pub flashcard_set_names: NameMap,
    #[serde(default)]
    pub pdf_names: NameMap,
    #[serde(default)]
    pub quiz_sorting_preference: SortingPreference,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Course {
    pub fn new(name: &str, now_millis: i64) -> Self {
        Self {
            id: generate_course_id(name, now_millis),
            name: name.to_string(),
            quizzes: Vec::new(),
            flashcards: Vec::new(),
            pdfs: Vec::new(),
            quiz_names: NameMap::new(),
            flashcard_set_names: NameMap::new(),
            pdf_names: NameMap::new(),
            quiz_sorting_preference: SortingPreference::default(),
            created_at: now_millis,
            updated_at: now_millis,
        }
    }

    pub fn len_of(&self, kind: CollectionKind) -> usize {
        match kind {
            CollectionKind::Quiz => self.quizzes.len(),
            CollectionKind::FlashcardSet => self.flashcards.len(),
            CollectionKind::Pdf => self.pdfs.len(),
        }
    }

    pub fn names(&self, kind: CollectionKind) -> &NameMap {
        match kind {
            CollectionKind::Quiz => &self.quiz_names,
            CollectionKind::FlashcardSet => &self.flashcard_set_names,
            CollectionKind::Pdf => &self.pdf_names,
        }
    }

    pub fn names_mut(&mut self, kind: CollectionKind) -> &mut NameMap {
        match kind {
            CollectionKind::Quiz => &mut self.quiz_names,
            CollectionKind::FlashcardSet => &mut self.flashcard_set_names,
            CollectionKind::Pdf => &mut self.pdf_names,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        decode(json, "course")
    }

    pub fn to_json(&self) -> String {
        encode(self)
    }
}

/// Creation timestamp plus a hash of the name, e.g. `1718000000000-3f2a9c...`.
pub fn generate_course_id(name: &str, now_millis: i64) -> String {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    format!("{}-{:x}", now_millis, hasher.finish())
}

/// A finished quiz attempt. The quiz name is a snapshot taken when the
/// attempt ended, so later renames or reorders do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub course_id: String,
    pub quiz_index: usize,
    pub quiz_name: String,
    pub score: usize,
    pub total_questions: usize,
    pub percentage: f64,
    pub timestamp: i64,
}

impl QuizResult {
    pub fn new(
        course_id: &str,
        quiz_index: usize,
        quiz_name: &str,
        score: usize,
        total_questions: usize,
    ) -> Self {
        let percentage = if total_questions == 0 {
            0.0
        } else {
            score as f64 / total_questions as f64 * 100.0
        };

        Self {
            course_id: course_id.to_string(),
            quiz_index,
            quiz_name: quiz_name.to_string(),
            score,
            total_questions,
            percentage,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
