//! Shell-style tokenizer for argument files.
//!
//! Words are separated by unquoted whitespace. Single quotes keep everything
//! literal; double quotes honor `\"`, `\\`, `\$`, `` \` `` and line
//! continuation; an unquoted backslash escapes the next character. A comment
//! character at the start of a word discards the rest of the line.

/// Tokenizer failure with the 1-based line where the construct started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShellError {
    pub line: usize,
    pub reason: &'static str,
}

pub(crate) fn split(text: &str, comment: Option<char>) -> Result<Vec<String>, ShellError> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut line = 1;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                let start = line;
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => {
                            line += usize::from(ch == '\n');
                            word.push(ch);
                        }
                        None => {
                            return Err(ShellError {
                                line: start,
                                reason: "unterminated single quote",
                            });
                        }
                    }
                }
            }
            '"' => {
                let start = line;
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('\n') => line += 1,
                            Some(ch @ ('"' | '\\' | '$' | '`')) => word.push(ch),
                            Some(ch) => {
                                line += usize::from(ch == '\n');
                                word.push('\\');
                                word.push(ch);
                            }
                            None => {
                                return Err(ShellError {
                                    line: start,
                                    reason: "unterminated double quote",
                                });
                            }
                        },
                        Some(ch) => {
                            line += usize::from(ch == '\n');
                            word.push(ch);
                        }
                        None => {
                            return Err(ShellError {
                                line: start,
                                reason: "unterminated double quote",
                            });
                        }
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') => line += 1,
                Some(ch) => {
                    in_word = true;
                    word.push(ch);
                }
                None => {
                    return Err(ShellError {
                        line,
                        reason: "dangling escape at end of file",
                    });
                }
            },
            c if !in_word && Some(c) == comment => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {
                line += usize::from(c == '\n');
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }

    if in_word {
        words.push(word);
    }
    Ok(words)
}
