use crate::error::Result;
use crate::models::Flashcard;
use std::fs;
use std::path::Path;

/// Reads a `question,answer` CSV deck. Rows with an empty side are skipped.
pub fn load_csv(path: &Path) -> Result<Vec<Flashcard>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_csv(&content))
}

pub fn parse_csv(content: &str) -> Vec<Flashcard> {
    let mut flashcards = Vec::new();

    for line in content.lines() {
        if let Some((front, back)) = parse_csv_line(line)
            && !front.trim().is_empty()
            && !back.trim().is_empty()
        {
            flashcards.push(Flashcard::new(flashcards.len() as i64, front, back));
        }
    }

    flashcards
}

/// Splits one CSV row into two fields. Quoted fields may contain commas
/// and doubled quotes; anything after the second field stays in it.
pub fn parse_csv_line(line: &str) -> Option<(String, String)> {
    let mut chars = line.chars().peekable();
    let mut front = String::new();
    let mut back = String::new();
    let mut current_field = &mut front;
    let mut in_quotes = false;
    let mut field_index = 0;

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => {
                in_quotes = true;
            }
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current_field.push('"');
                } else {
                    in_quotes = false;
                    if chars.peek() == Some(&',') && field_index == 0 {
                        chars.next();
                    }
                    if field_index == 0 {
                        current_field = &mut back;
                        field_index = 1;
                    }
                }
            }
            ',' if !in_quotes && field_index == 0 => {
                field_index = 1;
                current_field = &mut back;
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    Some((front, back))
}
