//! Saving and loading listener sheets
//!
//! Only the persistent listeners of an event are written. Loading yields an
//! event with no runtime listeners and the default [`DispatchConfig`].
//!
//! [`DispatchConfig`]: crate::DispatchConfig

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatcher::BoltsEvent;

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Binary encoding or decoding error
    #[error("Binary error: {0}")]
    Binary(#[from] bincode::Error),
}

/// Listener sheet format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistFormat {
    /// JSON (human readable)
    #[default]
    Json,
    /// Binary (compact)
    Binary,
}

impl PersistFormat {
    /// Guess the format from a file extension, defaulting to JSON
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("bin") | Some("bolts") => Self::Binary,
            _ => Self::Json,
        }
    }
}

/// Encode as pretty-printed JSON
pub fn to_json(event: &BoltsEvent) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(event)?)
}

/// Decode from JSON
pub fn from_json(json: &str) -> Result<BoltsEvent, PersistError> {
    Ok(serde_json::from_str(json)?)
}

/// Encode with bincode
pub fn to_bytes(event: &BoltsEvent) -> Result<Vec<u8>, PersistError> {
    Ok(bincode::serialize(event)?)
}

/// Decode from bincode
pub fn from_bytes(bytes: &[u8]) -> Result<BoltsEvent, PersistError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Encode in the given format
pub fn encode(event: &BoltsEvent, format: PersistFormat) -> Result<Vec<u8>, PersistError> {
    match format {
        PersistFormat::Json => Ok(serde_json::to_vec_pretty(event)?),
        PersistFormat::Binary => to_bytes(event),
    }
}

/// Decode from the given format
pub fn decode(bytes: &[u8], format: PersistFormat) -> Result<BoltsEvent, PersistError> {
    match format {
        PersistFormat::Json => Ok(serde_json::from_slice(bytes)?),
        PersistFormat::Binary => from_bytes(bytes),
    }
}

/// Write an event's listener sheet to disk
pub fn save(path: impl AsRef<Path>, event: &BoltsEvent, format: PersistFormat) -> Result<(), PersistError> {
    let path = path.as_ref();
    let bytes = encode(event, format)?;
    fs::write(path, bytes)?;
    log::debug!(
        "Saved {} persistent listeners to {}",
        event.persistent_count(),
        path.display()
    );
    Ok(())
}

/// Read a listener sheet from disk
pub fn load(path: impl AsRef<Path>, format: PersistFormat) -> Result<BoltsEvent, PersistError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let event = decode(&bytes, format)?;
    log::debug!(
        "Loaded {} persistent listeners from {}",
        event.persistent_count(),
        path.display()
    );
    Ok(event)
}
