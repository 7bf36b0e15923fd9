use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("player command is empty")]
    EmptyCommand,
    #[error("unterminated {0} quote in player command")]
    UnterminatedQuote(char),
    #[error("player command ends with an escape character")]
    TrailingEscape,
    #[error("failed to start player `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("player input is not piped or was already taken")]
    StdinUnavailable,
    #[error("failed to wait for player: {0}")]
    Wait(#[source] io::Error),
}

impl PlayerError {
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
