use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PlaylistSpec;
use crate::external_catalog::{CollectionService, NewPlaylist, Playlist};
use crate::item::normalize_source_name;

use super::RouterError;

/// Source name to playlist ID mapping.
///
/// Keys are normalized (lower-case, no `r/` prefix), so lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    routes: HashMap<String, String>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `origin` to `playlist_id`, returning the previous assignment.
    pub fn insert(&mut self, origin: &str, playlist_id: impl Into<String>) -> Option<String> {
        self.routes
            .insert(normalize_source_name(origin), playlist_id.into())
    }

    /// Playlist ID for `origin`.
    pub fn route(&self, origin: &str) -> Result<&str, RouterError> {
        self.routes
            .get(&normalize_source_name(origin))
            .map(String::as_str)
            .ok_or_else(|| RouterError::NoDestination {
                origin: origin.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every routed source, sorted.
    pub fn origins(&self) -> Vec<&str> {
        let mut origins: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        origins.sort_unstable();
        origins
    }
}

/// Resolve every playlist spec to a playlist ID and build the routing table.
///
/// Specs with an ID are fetched by ID. Name-only specs are matched against
/// the owner's playlists (listed once) and created when missing. All specs
/// are checked for an ID or name before any API call is made.
pub async fn prepare_routing_table(
    collections: &dyn CollectionService,
    owner: &str,
    specs: &[PlaylistSpec],
    description: &str,
    pause: Duration,
) -> Result<RoutingTable, RouterError> {
    if let Some(index) = specs
        .iter()
        .position(|spec| spec.playlist_id().is_none() && spec.playlist_name().is_none())
    {
        return Err(RouterError::AmbiguousCollectionSpec { index });
    }

    let mut table = RoutingTable::new();
    let mut owned: Option<Vec<Playlist>> = None;

    for (i, spec) in specs.iter().enumerate() {
        if i > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let playlist = match (spec.playlist_id(), spec.playlist_name()) {
            (Some(id), _) => collections.get_playlist(id).await?,
            (None, Some(name)) => {
                if owned.is_none() {
                    owned = Some(collections.list_playlists(owner).await?);
                }
                let listing = owned.get_or_insert_with(Vec::new);

                match listing.iter().find(|p| p.name == name) {
                    Some(existing) => existing.clone(),
                    None => {
                        let created = collections
                            .create_playlist(
                                owner,
                                &NewPlaylist {
                                    name: name.to_string(),
                                    description: description.to_string(),
                                    public: false,
                                },
                            )
                            .await?;
                        info!(playlist_id = %created.id, name = %created.name, "Created playlist");
                        listing.push(created.clone());
                        created
                    }
                }
            }
            (None, None) => return Err(RouterError::AmbiguousCollectionSpec { index: i }),
        };

        for subreddit in &spec.subreddits {
            if let Some(previous) = table.insert(subreddit, playlist.id.clone()) {
                if previous != playlist.id {
                    warn!(
                        origin = %subreddit,
                        previous = %previous,
                        playlist_id = %playlist.id,
                        "Source assigned to more than one playlist, keeping the last"
                    );
                }
            }
        }

        debug!(
            playlist_id = %playlist.id,
            name = %playlist.name,
            sources = spec.subreddits.len(),
            "Playlist ready"
        );
    }

    info!(routes = table.len(), playlists = specs.len(), "Routing table prepared");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_catalog::CatalogError;
    use crate::testing::{fixtures, MockCollections};

    fn spec(name: Option<&str>, id: Option<&str>, subreddits: &[&str]) -> PlaylistSpec {
        PlaylistSpec {
            name: name.map(String::from),
            id: id.map(String::from),
            subreddits: subreddits.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_route_is_case_insensitive() {
        let mut table = RoutingTable::new();
        table.insert("r/Music", "p1");

        assert_eq!(table.route("music").unwrap(), "p1");
        assert_eq!(table.route("MUSIC").unwrap(), "p1");
        assert_eq!(table.route("r/music").unwrap(), "p1");
    }

    #[test]
    fn test_route_unmapped_origin() {
        let mut table = RoutingTable::new();
        table.insert("music", "p1");

        for origin in ["jazz", "Jazz", "JAZZ"] {
            assert!(matches!(
                table.route(origin),
                Err(RouterError::NoDestination { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_prepare_by_id() {
        let collections = MockCollections::new();
        collections.add_playlist(fixtures::playlist("p1", "Existing")).await;

        let table = prepare_routing_table(
            &collections,
            "mock-user",
            &[spec(None, Some("p1"), &["Music", "r/Jazz"])],
            "desc",
            Duration::ZERO,
        )
        .await
        .unwrap();

        assert_eq!(table.route("music").unwrap(), "p1");
        assert_eq!(table.route("jazz").unwrap(), "p1");
        assert!(collections.created_playlists().await.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_by_name_reuses_existing() {
        let collections = MockCollections::new();
        collections.add_playlist(fixtures::playlist("p1", "Indie")).await;

        let table = prepare_routing_table(
            &collections,
            "mock-user",
            &[spec(Some("Indie"), None, &["indieheads"])],
            "desc",
            Duration::ZERO,
        )
        .await
        .unwrap();

        assert_eq!(table.route("indieheads").unwrap(), "p1");
        assert!(collections.created_playlists().await.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_creates_missing_playlist_once() {
        let collections = MockCollections::new();

        let table = prepare_routing_table(
            &collections,
            "mock-user",
            &[
                spec(Some("New"), None, &["a"]),
                spec(Some("New"), None, &["b"]),
            ],
            "Auto-generated",
            Duration::ZERO,
        )
        .await
        .unwrap();

        let created = collections.created_playlists().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "New");
        assert_eq!(created[0].description, "Auto-generated");
        assert!(!created[0].public);
        assert_eq!(table.route("a").unwrap(), table.route("b").unwrap());
        assert_eq!(collections.list_playlists_calls().await, 1);
    }

    #[tokio::test]
    async fn test_prepare_rejects_spec_without_id_or_name() {
        let collections = MockCollections::new();

        let result = prepare_routing_table(
            &collections,
            "mock-user",
            &[spec(Some("Ok"), None, &["a"]), spec(Some(""), None, &["b"])],
            "desc",
            Duration::ZERO,
        )
        .await;

        assert!(matches!(
            result,
            Err(RouterError::AmbiguousCollectionSpec { index: 1 })
        ));
        assert!(collections.created_playlists().await.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_unknown_id_fails() {
        let collections = MockCollections::new();

        let result = prepare_routing_table(
            &collections,
            "mock-user",
            &[spec(None, Some("missing"), &["a"])],
            "desc",
            Duration::ZERO,
        )
        .await;

        assert!(matches!(
            result,
            Err(RouterError::Collection(CatalogError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_source_keeps_last_assignment() {
        let collections = MockCollections::new();
        collections.add_playlist(fixtures::playlist("p1", "One")).await;
        collections.add_playlist(fixtures::playlist("p2", "Two")).await;

        let table = prepare_routing_table(
            &collections,
            "mock-user",
            &[
                spec(None, Some("p1"), &["shared"]),
                spec(None, Some("p2"), &["Shared"]),
            ],
            "desc",
            Duration::ZERO,
        )
        .await
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.route("shared").unwrap(), "p2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_specs() {
        let collections = MockCollections::new();
        collections.add_playlist(fixtures::playlist("p1", "One")).await;
        collections.add_playlist(fixtures::playlist("p2", "Two")).await;

        let start = tokio::time::Instant::now();
        prepare_routing_table(
            &collections,
            "mock-user",
            &[spec(None, Some("p1"), &["a"]), spec(None, Some("p2"), &["b"])],
            "desc",
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
