use super::arrange;
use crate::error::{Error, Result};
use crate::models::{Flashcard, SortingPreference};
use rand::Rng;
use std::collections::HashMap;

/// Flashcard review: a cursor over the deck plus a flip flag per card that
/// survives moving back and forth.
#[derive(Debug)]
pub struct FlashcardSession {
    cards: Vec<Flashcard>,
    current_index: usize,
    flipped: HashMap<usize, bool>,
}

impl FlashcardSession {
    pub fn new(cards: Vec<Flashcard>, ordering: SortingPreference) -> Result<Self> {
        Self::with_rng(cards, ordering, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        mut cards: Vec<Flashcard>,
        ordering: SortingPreference,
        rng: &mut R,
    ) -> Result<Self> {
        if cards.is_empty() {
            return Err(Error::Validation("flashcard set has no cards".to_string()));
        }
        arrange(&mut cards, ordering, rng);

        Ok(Self {
            cards,
            current_index: 0,
            flipped: HashMap::new(),
        })
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_card(&self) -> &Flashcard {
        &self.cards[self.current_index]
    }

    pub fn is_flipped(&self, index: usize) -> bool {
        self.flipped.get(&index).copied().unwrap_or(false)
    }

    pub fn is_current_flipped(&self) -> bool {
        self.is_flipped(self.current_index)
    }

    pub fn flipped_count(&self) -> usize {
        self.flipped.values().filter(|&&f| f).count()
    }

    /// Returns the new flip state of the current card.
    pub fn flip_current_card(&mut self) -> bool {
        let flipped = !self.is_current_flipped();
        self.flipped.insert(self.current_index, flipped);
        flipped
    }

    pub fn next_card(&mut self) -> bool {
        self.go_to_card(self.current_index + 1)
    }

    pub fn previous_card(&mut self) -> bool {
        match self.current_index.checked_sub(1) {
            Some(index) => self.go_to_card(index),
            None => false,
        }
    }

    /// Moves to `index`; returns false and stays put when it is past the end.
    pub fn go_to_card(&mut self, index: usize) -> bool {
        if index >= self.cards.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.flipped.clear();
    }
}
