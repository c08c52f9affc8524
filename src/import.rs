//! Pasted-text import for quizzes and flashcard sets.
//!
//! Input is first decoded as a JSON array of the content model. Anything
//! that is not JSON goes through a line-oriented reader where blank lines
//! separate items and line prefixes are matched literally.

use crate::error::{Error, Result};
use crate::models::{Flashcard, Question};
use serde_json::Value;

const NO_QUESTIONS: &str = "Could not find any questions. Paste a JSON array, or use blocks like:\n\
Q: What is 2+2?\nA) 3\nB) 4 (correct)\nC) 5";

const NO_FLASHCARDS: &str = "Could not find any flashcards. Paste a JSON array, or use \
Front:/Back: lines, Q:/A: lines, or one term<TAB>definition per line.";

const CORRECT_MARKERS: [&str; 5] = ["(correct)", "(CORRECT)", "(Correct)", "✓", "✔"];

fn json_array(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value @ Value::Array(_)) => Some(value),
        _ => None,
    }
}

/// Strict decode of a JSON array of questions; every element is validated.
pub fn parse_questions_json(json: &str) -> Result<Vec<Question>> {
    serde_json::from_str(json.trim()).map_err(|e| Error::MalformedContent(format!("questions: {}", e)))
}

pub fn parse_flashcards_json(json: &str) -> Result<Vec<Flashcard>> {
    serde_json::from_str(json.trim()).map_err(|e| Error::MalformedContent(format!("flashcards: {}", e)))
}

pub fn parse_questions(text: &str) -> Result<Vec<Question>> {
    let questions = match json_array(text) {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| Error::MalformedContent(format!("questions: {}", e)))?,
        None => parse_question_lines(text),
    };

    if questions.is_empty() {
        return Err(Error::Format(NO_QUESTIONS.to_string()));
    }
    Ok(questions)
}

pub fn parse_flashcards(text: &str) -> Result<Vec<Flashcard>> {
    let cards = match json_array(text) {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| Error::MalformedContent(format!("flashcards: {}", e)))?,
        None => parse_flashcard_lines(text),
    };

    if cards.is_empty() {
        return Err(Error::Format(NO_FLASHCARDS.to_string()));
    }
    Ok(cards)
}

fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn strip_any_prefix<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|p| line.strip_prefix(p))
        .map(str::trim)
}

/// `A) text`..`D) text` (either case) or `1. text`.
fn option_body(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    if let (Some(letter), Some(')')) = (chars.next(), chars.next())
        && matches!(letter, 'A'..='D' | 'a'..='d')
    {
        return Some(line[2..].trim());
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = line[digits..].strip_prefix('.')?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Some(rest.trim());
        }
    }
    None
}

fn strip_correct_marker(body: &str) -> (String, bool) {
    let body = body.trim_end();
    for marker in CORRECT_MARKERS {
        if let Some(stripped) = body.strip_suffix(marker) {
            return (stripped.trim().to_string(), true);
        }
    }
    (body.to_string(), false)
}

/// `B`, `b)`, `B, D` or `2` (1-based) to option indices.
fn answer_indices(answer: &str) -> Vec<usize> {
    answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|token| token.trim().trim_end_matches(')').trim_end_matches('.'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => {
                    Some(c.to_ascii_uppercase() as usize - 'A' as usize)
                }
                _ => token.parse::<usize>().ok().and_then(|n| n.checked_sub(1)),
            }
        })
        .collect()
}

#[derive(Default)]
struct QuestionDraft {
    text: Option<String>,
    options: Vec<String>,
    marked: Vec<usize>,
    answer_line: Vec<usize>,
}

impl QuestionDraft {
    fn is_started(&self) -> bool {
        self.text.is_some() || !self.options.is_empty()
    }

    fn finish(self, id: i64) -> Option<Question> {
        let text = self.text.filter(|t| !t.is_empty())?;
        if self.options.len() < 2 {
            return None;
        }

        let mut answers = if !self.marked.is_empty() {
            self.marked
        } else {
            self.answer_line
                .into_iter()
                .filter(|&i| i < self.options.len())
                .collect()
        };
        answers.sort_unstable();
        answers.dedup();
        if answers.is_empty() {
            answers.push(0);
        }

        Question::new(id, text, self.options, answers).ok()
    }
}

fn parse_question_lines(text: &str) -> Vec<Question> {
    let mut questions = Vec::new();

    for block in blocks(text) {
        let mut draft = QuestionDraft::default();

        for line in block {
            if let Some(rest) = strip_any_prefix(line, &["Question:", "Q:"]) {
                if draft.is_started() {
                    let done = std::mem::take(&mut draft);
                    questions.extend(done.finish(questions.len() as i64));
                }
                draft.text = Some(rest.to_string());
            } else if let Some(rest) = strip_any_prefix(line, &["Answer:", "Correct:"]) {
                draft.answer_line.extend(answer_indices(rest));
            } else if let Some(body) = option_body(line) {
                let (body, correct) = strip_correct_marker(body);
                if correct && !draft.marked.contains(&draft.options.len()) {
                    draft.marked.push(draft.options.len());
                }
                draft.options.push(body);
            } else if draft.options.is_empty()
                && let Some(text) = draft.text.as_mut()
            {
                text.push(' ');
                text.push_str(line);
            }
        }

        questions.extend(draft.finish(questions.len() as i64));
    }

    questions
}

#[derive(Clone, Copy, PartialEq)]
enum CardField {
    Front,
    Back,
    Explanation,
}

fn card_prefix(line: &str) -> Option<(CardField, &str)> {
    const PREFIXES: [(&str, CardField); 7] = [
        ("Front:", CardField::Front),
        ("Back:", CardField::Back),
        ("Explanation:", CardField::Explanation),
        ("Question:", CardField::Front),
        ("Answer:", CardField::Back),
        ("Q:", CardField::Front),
        ("A:", CardField::Back),
    ];
    PREFIXES
        .iter()
        .find_map(|(prefix, field)| line.strip_prefix(prefix).map(|rest| (*field, rest.trim())))
}

#[derive(Default)]
struct CardDraft {
    front: String,
    back: String,
    explanation: String,
}

impl CardDraft {
    fn push(&mut self, field: CardField, text: &str) {
        let target = match field {
            CardField::Front => &mut self.front,
            CardField::Back => &mut self.back,
            CardField::Explanation => &mut self.explanation,
        };
        if !target.is_empty() {
            target.push('\n');
        }
        target.push_str(text);
    }

    fn finish(self, id: i64) -> Option<Flashcard> {
        if self.front.is_empty() || self.back.is_empty() {
            return None;
        }
        Some(Flashcard {
            id,
            front: self.front,
            back: self.back,
            explanation: (!self.explanation.is_empty()).then_some(self.explanation),
        })
    }
}

/// Labelled cards in one block. A front label after a filled back starts
/// the next card.
fn parse_labelled_cards(block: &[&str], first_id: i64) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    let mut draft = CardDraft::default();
    let mut current: Option<CardField> = None;

    for line in block {
        let (field, text) = match card_prefix(line) {
            Some((field, text)) => (field, text),
            None => match current {
                Some(field) => (field, *line),
                None => continue,
            },
        };
        if field == CardField::Front && !draft.front.is_empty() && !draft.back.is_empty() {
            let done = std::mem::take(&mut draft);
            cards.extend(done.finish(first_id + cards.len() as i64));
        }
        draft.push(field, text);
        current = Some(field);
    }

    cards.extend(draft.finish(first_id + cards.len() as i64));
    cards
}

fn parse_flashcard_lines(text: &str) -> Vec<Flashcard> {
    let mut cards = Vec::new();

    for block in blocks(text) {
        let labelled = parse_labelled_cards(&block, cards.len() as i64);
        if !labelled.is_empty() {
            cards.extend(labelled);
            continue;
        }

        for line in block {
            if let Some((term, definition)) = line.split_once('\t') {
                let (term, definition) = (term.trim(), definition.trim());
                if !term.is_empty() && !definition.is_empty() {
                    cards.push(Flashcard::new(cards.len() as i64, term, definition));
                }
            }
        }
    }

    cards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_single_question() {
        let questions = parse_questions("Q: 2+2?\nA) 3\nB) 4 (correct)\nC) 5").unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text(), "2+2?");
        assert_eq!(questions[0].options(), &["3", "4", "5"]);
        assert_eq!(questions[0].answer_indices(), &[1]);
    }

    #[test]
    fn test_garbage_is_format_error() {
        let err = parse_questions("hello there\nthis is not a quiz").unwrap_err();
        assert!(matches!(err, Error::Format(ref msg) if msg.contains("Q:")));
        assert!(matches!(parse_questions(""), Err(Error::Format(_))));
    }

    #[test]
    fn test_unmarked_defaults_to_first_option() {
        let questions = parse_questions("Question: Capital of France?\n1. Paris\n2. Rome").unwrap();
        assert_eq!(questions[0].answer_indices(), &[0]);
        assert_eq!(questions[0].options(), &["Paris", "Rome"]);
    }

    #[test]
    fn test_multiple_marks_make_multi_select() {
        let text = "Q: Prime numbers?\nA) 2 ✓\nB) 4\nC) 5 (CORRECT)\nD) 9";
        let questions = parse_questions(text).unwrap();
        assert_eq!(questions[0].answer_indices(), &[0, 2]);
        assert!(questions[0].is_multi_select());
    }

    #[test]
    fn test_answer_line() {
        let text = "Q: Even numbers?\na) 1\nb) 2\nc) 3\nd) 4\nAnswer: B, D";
        let questions = parse_questions(text).unwrap();
        assert_eq!(questions[0].answer_indices(), &[1, 3]);
    }

    #[test]
    fn test_malformed_blocks_are_skipped() {
        let text = "Q: Only one option\nA) lonely\n\n\
                    just some notes\n\n\
                    Q: Valid?\nA) yes (correct)\nB) no";
        let questions = parse_questions(text).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text(), "Valid?");
        assert_eq!(questions[0].id(), 0);
    }

    #[test]
    fn test_consecutive_questions_without_blank_line() {
        let text = "Q: One?\nA) a (correct)\nB) b\nQ: Two?\nA) c\nB) d (correct)";
        let questions = parse_questions(text).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].answer_indices(), &[1]);
        assert_eq!(questions[1].id(), 1);
    }

    #[test]
    fn test_numeric_text_is_not_an_option() {
        assert_eq!(option_body("1.5 litres"), None);
        assert_eq!(option_body("3. Three"), Some("Three"));
        assert_eq!(option_body("E) nope"), None);
    }

    #[test]
    fn test_json_questions() {
        let json = r#"[{"id": 5, "text": "Q", "options": ["a", "b", "c"], "answerIndices": [0, 2]}]"#;
        let questions = parse_questions(json).unwrap();
        assert_eq!(questions[0].id(), 5);
        assert!(questions[0].is_multi_select());
    }

    #[test]
    fn test_invalid_json_questions_fail_fast() {
        let json = r#"[{"id": 1, "text": "Q", "options": ["a"], "answerIndices": [0]}]"#;
        assert!(matches!(
            parse_questions(json),
            Err(Error::MalformedContent(_))
        ));
        assert!(matches!(parse_questions("[]"), Err(Error::Format(_))));
    }

    #[test]
    fn test_flashcards_front_back_with_explanation() {
        let text = "Front: Mitochondria\nBack: Powerhouse\nof the cell\nExplanation: Makes ATP\n\n\
                    Q: H2O\nA: Water";
        let cards = parse_flashcards(text).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].back, "Powerhouse\nof the cell");
        assert_eq!(cards[0].explanation.as_deref(), Some("Makes ATP"));
        assert_eq!(cards[1].front, "H2O");
        assert_eq!(cards[1].explanation, None);
        assert_eq!(cards[1].id, 1);
    }

    #[test]
    fn test_consecutive_cards_without_blank_line() {
        let text = "Front: a\nBack: b\nFront: c\nBack: d\nExplanation: why\nQ: e\nA: f";
        let cards = parse_flashcards(text).unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!((cards[0].front.as_str(), cards[0].back.as_str()), ("a", "b"));
        assert_eq!((cards[1].front.as_str(), cards[1].back.as_str()), ("c", "d"));
        assert_eq!(cards[1].explanation.as_deref(), Some("why"));
        assert_eq!(cards[2].front, "e");
        assert_eq!(cards.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_flashcards_tab_separated() {
        let cards = parse_flashcards("perro\tdog\ngato\tcat\nbroken line").unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].front, "gato");
        assert_eq!(cards[1].back, "cat");
    }

    #[test]
    fn test_flashcards_missing_back_skipped() {
        let err = parse_flashcards("Front: alone").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_flashcards_json() {
        let json = r#"[{"id": 1, "front": "F", "back": "B", "explanation": null}]"#;
        let cards = parse_flashcards(json).unwrap();
        assert_eq!(cards, vec![Flashcard::new(1, "F", "B")]);
        assert!(parse_flashcards(r#"[{"id": 1, "front": "F"}]"#).is_err());
    }
}
