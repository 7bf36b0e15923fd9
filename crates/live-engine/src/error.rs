use std::io;

use hls::ManifestError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("stream already ended, no further manifest can be merged")]
    StreamAlreadyEnded,

    #[error("manifest error: {source}")]
    Manifest {
        #[from]
        source: ManifestError,
    },

    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} during {operation} for {url}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        operation: &'static str,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("player closed its input")]
    SinkClosed,
}

impl LiveError {
    pub fn http_status(
        status: StatusCode,
        url: impl Into<String>,
        operation: &'static str,
    ) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            operation,
        }
    }

    /// Maps a write failure on a player pipe, treating a broken pipe as the player going away.
    pub fn from_sink_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::BrokenPipe {
            Self::SinkClosed
        } else {
            Self::Io { source: err }
        }
    }

    /// Conditions that end a run cleanly rather than as a failure.
    pub fn is_interruption(&self) -> bool {
        match self {
            Self::SinkClosed => true,
            Self::Io { source } => source.kind() == io::ErrorKind::BrokenPipe,
            Self::StreamAlreadyEnded
            | Self::Manifest { .. }
            | Self::Network { .. }
            | Self::HttpStatus { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_pipe_is_interruption() {
        let err = LiveError::from_sink_io(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(matches!(err, LiveError::SinkClosed));
        assert!(err.is_interruption());

        let err = LiveError::from_sink_io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, LiveError::Io { .. }));
        assert!(!err.is_interruption());
    }

    #[test]
    fn manifest_errors_are_fatal() {
        let err: LiveError = ManifestError::malformed("bad").into();
        assert!(!err.is_interruption());
        assert!(err.to_string().contains("bad"));
        assert!(!LiveError::StreamAlreadyEnded.is_interruption());
    }
}
