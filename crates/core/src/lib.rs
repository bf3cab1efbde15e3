pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod external_catalog;
pub mod item;
pub mod metrics;
pub mod resolver;
pub mod router;
pub mod scanner;
pub mod testing;

pub use auth::{AccessTokenSource, AuthError, AuthSession, PendingAuth, SpotifyAuthenticator};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use dispatcher::{create_dispatcher, DispatchError, Dispatcher, DispatcherHandle};
pub use external_catalog::{Catalog, CatalogError, CollectionService, SpotifyClient, Track};
pub use item::RawItem;
pub use resolver::{build_query, ResolveError, Resolver};
pub use router::{prepare_routing_table, AppendOutcome, Router, RouterError, RoutingTable};
pub use scanner::{
    RedditScanner, ScanError, Scanner, ScannerSupervisor, SupervisorConfig, SupervisorError,
    SupervisorState,
};
