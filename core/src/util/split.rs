//! POSIX shell-style word splitting for command strings.
//!
//! Space, tab, newline and carriage return separate words; other Unicode
//! whitespace is an ordinary character. Single quotes are literal, double quotes honor
//! `\"` and `\\`, and a backslash outside quotes escapes the next character.
//! Quoted and unquoted runs that touch are joined into one word.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("no closing quotation for {0}")]
    UnterminatedQuote(char),
    #[error("no escaped character after trailing backslash")]
    TrailingEscape,
}

#[derive(Clone, Copy)]
enum State {
    Between,
    Word,
    Single,
    Double,
}

pub fn split(input: &str) -> Result<Vec<String>, SplitError> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut state = State::Between;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        state = match state {
            State::Between | State::Word => match c {
                ' ' | '\t' | '\n' | '\r' => {
                    if matches!(state, State::Word) {
                        words.push(std::mem::take(&mut word));
                    }
                    State::Between
                }
                '\'' => State::Single,
                '"' => State::Double,
                '\\' => {
                    word.push(chars.next().ok_or(SplitError::TrailingEscape)?);
                    State::Word
                }
                c => {
                    word.push(c);
                    State::Word
                }
            },
            State::Single => match c {
                '\'' => State::Word,
                c => {
                    word.push(c);
                    State::Single
                }
            },
            State::Double => match c {
                '"' => State::Word,
                '\\' => {
                    let next = chars.next().ok_or(SplitError::UnterminatedQuote('"'))?;
                    if next != '"' && next != '\\' {
                        word.push('\\');
                    }
                    word.push(next);
                    State::Double
                }
                c => {
                    word.push(c);
                    State::Double
                }
            },
        };
    }

    match state {
        State::Single => Err(SplitError::UnterminatedQuote('\'')),
        State::Double => Err(SplitError::UnterminatedQuote('"')),
        State::Word => {
            words.push(word);
            Ok(words)
        }
        State::Between => Ok(words),
    }
}
