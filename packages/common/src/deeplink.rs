use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// A link encoded into a printed scan point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeepLink {
    /// `/hunt/{hunt_id}`
    Editor { hunt_id: Uuid },
    /// `/hunt/{hunt_id}/clue/{clue_id}`
    Clue { hunt_id: Uuid, clue_id: Uuid },
    /// `/hunt/{hunt_id}/complete`
    Complete { hunt_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeepLinkError {
    #[error("'{0}' is not a treasure hunt link")]
    Unrecognized(String),

    #[error("invalid id '{0}' in link")]
    InvalidId(String),
}

impl DeepLink {
    pub fn hunt_id(&self) -> Uuid {
        match self {
            Self::Editor { hunt_id } | Self::Clue { hunt_id, .. } | Self::Complete { hunt_id } => {
                *hunt_id
            }
        }
    }

    /// Path component of the link, e.g. `/hunt/{id}/complete`.
    pub fn path(&self) -> String {
        match self {
            Self::Editor { hunt_id } => format!("/hunt/{hunt_id}"),
            Self::Clue { hunt_id, clue_id } => format!("/hunt/{hunt_id}/clue/{clue_id}"),
            Self::Complete { hunt_id } => format!("/hunt/{hunt_id}/complete"),
        }
    }

    /// Absolute link against an origin such as `https://hunts.example.com`.
    pub fn url(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.path())
    }

    /// Parse a scanned payload: either a full URL on any origin or a bare path.
    pub fn parse(text: &str) -> Result<Self, DeepLinkError> {
        let trimmed = text.trim();
        let unrecognized = || DeepLinkError::Unrecognized(trimmed.to_string());

        let path = match trimmed.split_once("://") {
            Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).ok_or_else(unrecognized)?,
            None => trimmed,
        };
        let path = path.split(['?', '#']).next().unwrap_or_default();

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let parse_id =
            |raw: &str| Uuid::parse_str(raw).map_err(|_| DeepLinkError::InvalidId(raw.to_string()));

        match segments.as_slice() {
            ["hunt", hunt] => Ok(Self::Editor {
                hunt_id: parse_id(hunt)?,
            }),
            ["hunt", hunt, "complete"] => Ok(Self::Complete {
                hunt_id: parse_id(hunt)?,
            }),
            ["hunt", hunt, "clue", clue] => Ok(Self::Clue {
                hunt_id: parse_id(hunt)?,
                clue_id: parse_id(clue)?,
            }),
            _ => Err(unrecognized()),
        }
    }
}

impl fmt::Display for DeepLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
