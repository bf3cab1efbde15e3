//! Router - maps sources to playlists and appends tracks without duplicates.
//!
//! The [`RoutingTable`] is built once by [`prepare_routing_table`] before the
//! pipeline starts and is read-only afterwards, so it is shared between item
//! tasks without a lock.

mod append;
mod table;

pub use append::Router;
pub use table::{prepare_routing_table, RoutingTable};

use thiserror::Error;

use crate::external_catalog::CatalogError;

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The track was added; carries the new playlist snapshot ID.
    Appended { snapshot_id: String },
    /// The track was already in the playlist, nothing was changed.
    AlreadyExists,
}

impl AppendOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            AppendOutcome::Appended { .. } => "appended",
            AppendOutcome::AlreadyExists => "already_exists",
        }
    }
}

/// Errors that can occur while routing or appending.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no playlist configured for source '{origin}'")]
    NoDestination { origin: String },

    #[error("failed to append to playlist {playlist_id}: {source}")]
    Append {
        playlist_id: String,
        #[source]
        source: CatalogError,
    },

    #[error("playlist number {index} is missing ID or name")]
    AmbiguousCollectionSpec { index: usize },

    #[error("collection service error: {0}")]
    Collection(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(
            AppendOutcome::Appended {
                snapshot_id: "s".to_string()
            }
            .label(),
            "appended"
        );
        assert_eq!(AppendOutcome::AlreadyExists.label(), "already_exists");
    }

    #[test]
    fn test_error_display() {
        let err = RouterError::NoDestination {
            origin: "music".to_string(),
        };
        assert_eq!(err.to_string(), "no playlist configured for source 'music'");

        let err = RouterError::AmbiguousCollectionSpec { index: 2 };
        assert_eq!(err.to_string(), "playlist number 2 is missing ID or name");
    }
}
