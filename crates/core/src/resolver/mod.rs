//! Resolver - turns noisy post titles into catalog tracks.
//!
//! Resolution order for one item:
//!
//! 1. If the post links straight to a track (`https://open.spotify.com/track/<id>`),
//!    look the track up by ID.
//! 2. Otherwise (or if that lookup fails) walk the candidate titles in priority
//!    order, and for each title walk [`SEPARATORS`] in priority order:
//!    build a query, search the catalog, and accept the first result whose name
//!    and at least one artist both appear in the title.
//!
//! The first accepted track wins; results are never ranked against each other.

mod engine;
mod matcher;
mod query_builder;
mod track_url;

pub use engine::{Resolution, ResolvedBy, Resolver};
pub use matcher::{find_match, is_match};
pub use query_builder::{build_query, strip_annotations, SEPARATORS};
pub use track_url::track_id_from_url;

use thiserror::Error;

use crate::external_catalog::CatalogError;

/// Errors from building a search query out of a title.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("not able to find title and/or artist in \"{title}\" using separator '{separator}'")]
    NoSeparatorMatch { title: String, separator: String },

    #[error("query for \"{0}\" is empty after cleanup")]
    EmptyQuery(String),
}

/// Errors that can occur while resolving an item.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unsupported track url: {0}")]
    UnsupportedUrl(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("no track found")]
    NotFound,
}
