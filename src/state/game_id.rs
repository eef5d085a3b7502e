//! Validated game identifiers taken from query strings and paths.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a handoff URL carries no usable game identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameIdError {
    /// The query parameter is absent or only whitespace.
    #[error("missing game identifier")]
    Missing,
}

/// Opaque game identifier taken from a handoff URL.
///
/// Always non-empty after trimming. The value is interpolated verbatim into the
/// app scheme URL and the preview endpoint path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    /// Parse an optional raw query value.
    pub fn parse(raw: Option<&str>) -> Result<Self, GameIdError> {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Err(GameIdError::Missing);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
