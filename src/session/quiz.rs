//! Quiz state machine.
//!
//! Each question is either unanswered or revealed. Revealing is final for
//! the question: navigation restores the saved selection and reveal flag,
//! and the score only changes the first time a question is revealed.

use super::arrange;
use crate::error::{Error, Result};
use crate::models::{Question, QuizResult, SortingPreference};
use rand::Rng;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Saved state of one question, kept across navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionAnswer {
    pub selected: BTreeSet<usize>,
    pub revealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub current_index: usize,
    pub total: usize,
    pub score: usize,
    pub answered: usize,
    pub revealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    Advanced(QuizProgress),
    /// Already on the last question; nothing moved.
    Complete(QuizProgress),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncorrectAnswer {
    pub question_index: usize,
    pub question_id: i64,
    pub selected: Vec<usize>,
    pub correct: Vec<usize>,
}

#[derive(Debug)]
pub struct QuizSession {
    questions: Vec<Question>,
    current_index: usize,
    score: usize,
    current: QuestionAnswer,
    answers: HashMap<usize, QuestionAnswer>,
    scored: HashSet<usize>,
    incorrect: Vec<IncorrectAnswer>,
    transitioning: bool,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>, ordering: SortingPreference) -> Result<Self> {
        Self::with_rng(questions, ordering, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        mut questions: Vec<Question>,
        ordering: SortingPreference,
        rng: &mut R,
    ) -> Result<Self> {
        if questions.is_empty() {
            return Err(Error::Validation("quiz has no questions".to_string()));
        }
        arrange(&mut questions, ordering, rng);

        Ok(Self {
            questions,
            current_index: 0,
            score: 0,
            current: QuestionAnswer::default(),
            answers: HashMap::new(),
            scored: HashSet::new(),
            incorrect: Vec::new(),
            transitioning: false,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn selected_indices(&self) -> &BTreeSet<usize> {
        &self.current.selected
    }

    pub fn is_revealed(&self) -> bool {
        self.current.revealed
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    pub fn answer_for(&self, index: usize) -> Option<&QuestionAnswer> {
        self.answers.get(&index)
    }

    pub fn incorrect_answers(&self) -> &[IncorrectAnswer] {
        &self.incorrect
    }

    /// While set, option selection is ignored (e.g. during a UI animation).
    pub fn set_transitioning(&mut self, transitioning: bool) {
        self.transitioning = transitioning;
    }

    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            current_index: self.current_index,
            total: self.questions.len(),
            score: self.score,
            answered: self.scored.len(),
            revealed: self.current.revealed,
        }
    }

    pub fn select_option(&mut self, option: usize) -> Result<QuizProgress> {
        if self.current.revealed || self.transitioning {
            return Ok(self.progress());
        }

        let question = &self.questions[self.current_index];
        let len = question.options().len();
        if option >= len {
            return Err(Error::OptionOutOfRange { index: option, len });
        }

        if question.is_multi_select() {
            if !self.current.selected.remove(&option) {
                self.current.selected.insert(option);
            }
            self.save_current();
        } else {
            self.current.selected = BTreeSet::from([option]);
            self.reveal();
        }

        Ok(self.progress())
    }

    /// Confirms a multi-select answer. Ignored for single-select questions,
    /// empty selections and questions that are already revealed.
    pub fn check_answer(&mut self) -> QuizProgress {
        if self.current_question().is_multi_select()
            && !self.current.selected.is_empty()
            && !self.current.revealed
        {
            self.reveal();
        }
        self.progress()
    }

    fn reveal(&mut self) {
        self.current.revealed = true;

        if self.scored.insert(self.current_index) {
            let question = &self.questions[self.current_index];
            if question.is_correct(&self.current.selected) {
                self.score += 1;
            } else {
                self.incorrect.push(IncorrectAnswer {
                    question_index: self.current_index,
                    question_id: question.id(),
                    selected: self.current.selected.iter().copied().collect(),
                    correct: question.answer_indices().to_vec(),
                });
            }
        }

        self.save_current();
    }

    fn save_current(&mut self) {
        self.answers.insert(self.current_index, self.current.clone());
    }

    fn go_to(&mut self, index: usize) {
        self.save_current();
        self.current_index = index;
        self.current = self.answers.get(&index).cloned().unwrap_or_default();
    }

    pub fn move_to_next_question(&mut self) -> QuizStep {
        if self.is_last_question() {
            return QuizStep::Complete(self.progress());
        }
        self.go_to(self.current_index + 1);
        QuizStep::Advanced(self.progress())
    }

    pub fn move_to_previous_question(&mut self) -> QuizProgress {
        if self.current_index > 0 {
            self.go_to(self.current_index - 1);
        }
        self.progress()
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.score = 0;
        self.current = QuestionAnswer::default();
        self.answers.clear();
        self.scored.clear();
        self.incorrect.clear();
        self.transitioning = false;
    }

    pub fn finish(&self, course_id: &str, quiz_index: usize, quiz_name: &str) -> QuizResult {
        QuizResult::new(
            course_id,
            quiz_index,
            quiz_name,
            self.score,
            self.questions.len(),
        )
    }
}
