use crate::error::PlayerError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Between,
    Word,
    Single,
    Double,
}

/// Splits a command line into words the way a POSIX shell would.
///
/// Single quotes are literal. Inside double quotes a backslash only escapes
/// `"`, `\`, `$` and `` ` ``. Outside quotes a backslash escapes any character.
/// Adjacent quoted and unquoted parts join into one word, and `""` yields an
/// empty word.
pub fn split_command_line(line: &str) -> Result<Vec<String>, PlayerError> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut state = State::Between;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match state {
            State::Between | State::Word => match c {
                '\'' => state = State::Single,
                '"' => state = State::Double,
                '\\' => {
                    let escaped = chars.next().ok_or(PlayerError::TrailingEscape)?;
                    // A backslash-newline is a line continuation.
                    if escaped != '\n' {
                        word.push(escaped);
                        state = State::Word;
                    }
                }
                c if c.is_whitespace() => {
                    if state == State::Word {
                        words.push(std::mem::take(&mut word));
                        state = State::Between;
                    }
                }
                c => {
                    word.push(c);
                    state = State::Word;
                }
            },
            State::Single => match c {
                '\'' => state = State::Word,
                c => word.push(c),
            },
            State::Double => match c {
                '"' => state = State::Word,
                '\\' => match chars.next() {
                    Some(escaped @ ('"' | '\\' | '$' | '`')) => word.push(escaped),
                    Some('\n') => {}
                    Some(other) => {
                        word.push('\\');
                        word.push(other);
                    }
                    None => return Err(PlayerError::UnterminatedQuote('"')),
                },
                c => word.push(c),
            },
        }
    }

    match state {
        State::Single => Err(PlayerError::UnterminatedQuote('\'')),
        State::Double => Err(PlayerError::UnterminatedQuote('"')),
        State::Word => {
            words.push(word);
            Ok(words)
        }
        State::Between => Ok(words),
    }
}
