//! Shell-style argument splitting for logged command lines.
//!
//! Build logs print commands with POSIX shell quoting: backslash escapes
//! (`\ ` for spaces in paths), single quotes and double quotes.

use thiserror::Error;

/// A command line that can't be split into words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("unterminated {quote} quote")]
    UnterminatedQuote { quote: char },

    #[error("dangling escape at end of line")]
    DanglingEscape,
}

/// Split a command line into words.
pub fn split(line: &str) -> Result<Vec<String>, SplitError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or(SplitError::DanglingEscape)?;
                current.push(escaped);
                in_word = true;
            }
            '\'' => {
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(SplitError::UnterminatedQuote { quote: '\'' }),
                    }
                }
                in_word = true;
            }
            '"' => {
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(SplitError::UnterminatedQuote { quote: '"' }),
                        },
                        Some(c) => current.push(c),
                        None => return Err(SplitError::UnterminatedQuote { quote: '"' }),
                    }
                }
                in_word = true;
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}

/// Whether `line` ends with an unescaped backslash (a line continuation).
pub fn is_continued(line: &str) -> bool {
    let trailing = line
        .trim_end()
        .chars()
        .rev()
        .take_while(|&c| c == '\\')
        .count();
    trailing % 2 == 1
}

/// Strip the continuation backslash from the end of `line`.
pub fn strip_continuation(line: &str) -> &str {
    let trimmed = line.trim_end();
    if is_continued(trimmed) {
        &trimmed[..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Quote a word for display in a shell-ready command line.
pub fn quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c))
    {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
