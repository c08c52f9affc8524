pub mod flashcards;
pub mod quiz;

pub use flashcards::FlashcardSession;
pub use quiz::{IncorrectAnswer, QuestionAnswer, QuizProgress, QuizSession, QuizStep};

use crate::models::SortingPreference;
use rand::Rng;
use rand::seq::SliceRandom;

fn arrange<T, R: Rng + ?Sized>(items: &mut [T], ordering: SortingPreference, rng: &mut R) {
    if ordering == SortingPreference::Random {
        items.shuffle(rng);
    }
}
