use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Extractor(#[from] ct_platforms::ExtractorError),

    #[error("{0}")]
    Live(#[from] live_engine::LiveError),

    #[error("player error: {0}")]
    Player(#[from] process_utils::PlayerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
