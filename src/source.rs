//! Where the diff text comes from
//!
//! A diff is read from a file or stdin, either as raw unified-diff text or
//! wrapped in the JSON payload a git backend returns:
//! `{ "success": true, "diff": "..." }` / `{ "success": false, "error": "..." }`.

use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Diff input is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid diff payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Backend failed to produce a diff: {0}")]
    Backend(String),
}

/// How the input bytes are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Plain,
    JsonPayload,
}

/// Diff response body of the git backend
#[derive(Debug, Deserialize)]
struct DiffPayload {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    diff: Option<String>,
    #[serde(default, alias = "detail")]
    error: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Extract the diff text from a backend payload
pub fn decode_payload(body: &str) -> Result<String, SourceError> {
    let payload: DiffPayload = serde_json::from_str(body)?;
    if !payload.success {
        return Err(SourceError::Backend(
            payload.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(payload.diff.unwrap_or_default())
}

/// Input location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSource {
    Stdin,
    File(PathBuf),
}

impl DiffSource {
    /// `-` means stdin
    pub fn from_arg(arg: &Path) -> Self {
        if arg.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(arg.to_path_buf())
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Stdin => "<stdin>".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Path to watch for changes; stdin cannot be re-read
    pub fn watch_path(&self) -> Option<&Path> {
        match self {
            Self::Stdin => None,
            Self::File(path) => Some(path),
        }
    }

    pub fn is_reloadable(&self) -> bool {
        self.watch_path().is_some()
    }

    fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
        let result = match self {
            Self::Stdin => {
                let mut bytes = Vec::new();
                std::io::stdin().lock().read_to_end(&mut bytes).map(|_| bytes)
            }
            Self::File(path) => std::fs::read(path),
        };
        result.map_err(|source| SourceError::Io {
            path: self.label(),
            source,
        })
    }

    /// Read and decode the diff text
    pub fn load(&self, format: InputFormat) -> Result<String, SourceError> {
        let text = String::from_utf8(self.read_bytes()?)?;
        log::debug!("Loaded {} bytes from {}", text.len(), self.label());
        match format {
            InputFormat::Plain => Ok(text),
            InputFormat::JsonPayload => decode_payload(&text),
        }
    }
}
