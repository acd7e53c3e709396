use std::path::PathBuf;
use std::process::ExitCode;

use crate::net::NetError;

/// Distinguished failure kinds, one per way a run can stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Lookup,
    Profile,
    TextureNotFound,
    Download,
    MalformedResponse,
    Transport,
    Io,
}

/// Every terminal failure of a run. `Display` is the short message shown to
/// the user; `verbose_detail` is what debug mode adds underneath.
#[derive(Debug, thiserror::Error)]
pub enum SkinError {
    #[error("Please provide a username")]
    Usage,
    #[error("Invalid username {name:?}")]
    InvalidName { name: String },
    #[error("Could not retrieve user ID for {name}")]
    Lookup { name: String, status: u16, url: String },
    #[error("Failed to download user info for {name}")]
    Profile { name: String, status: u16, url: String },
    #[error("Failed to find texture info for {name}")]
    TextureNotFound { name: String, payload: String },
    #[error("Could not download skin for {name}")]
    Download { name: String, status: u16, url: String },
    #[error("Unexpected response for {name}: {reason}")]
    MalformedResponse {
        name: String,
        url: String,
        reason: String,
        payload: Option<String>,
    },
    #[error("Request for {name} failed")]
    Transport {
        name: String,
        url: String,
        #[source]
        source: NetError,
    },
    #[error("Could not save skin for {name} to {}", .path.display())]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SkinError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SkinError::Usage | SkinError::InvalidName { .. } => ErrorKind::Usage,
            SkinError::Lookup { .. } => ErrorKind::Lookup,
            SkinError::Profile { .. } => ErrorKind::Profile,
            SkinError::TextureNotFound { .. } => ErrorKind::TextureNotFound,
            SkinError::Download { .. } => ErrorKind::Download,
            SkinError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            SkinError::Transport { .. } => ErrorKind::Transport,
            SkinError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Diagnostic text printed under the short message in debug mode.
    pub fn verbose_detail(&self) -> Option<String> {
        match self {
            SkinError::Usage | SkinError::InvalidName { .. } => None,
            SkinError::Lookup { status, url, .. }
            | SkinError::Profile { status, url, .. }
            | SkinError::Download { status, url, .. } => Some(format!("{} {}", status, url)),
            SkinError::TextureNotFound { payload, .. } => Some(payload.clone()),
            SkinError::MalformedResponse { url, payload, .. } => Some(match payload {
                Some(body) => format!("{}\n{}", url, body),
                None => url.clone(),
            }),
            SkinError::Transport { url, source, .. } => Some(format!("{}: {}", url, source)),
            SkinError::Io { source, .. } => Some(source.to_string()),
        }
    }

    // All handled failures share one code, like the historical tool.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}
