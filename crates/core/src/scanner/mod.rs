//! Scanner - the ingestion feed and the supervisor that keeps it alive.

mod reddit;
mod supervisor;
mod traits;
mod types;

pub use reddit::RedditScanner;
pub use supervisor::{ScannerSupervisor, SupervisorConfig};
pub use traits::{ItemSink, ScanSession, Scanner};
pub use types::{RetryDecision, RetryState, ScanError, SupervisorError, SupervisorState};
