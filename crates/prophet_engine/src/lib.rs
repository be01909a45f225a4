//! Prophet trade-candidate generation & scoring engine.
//!
//! Pipeline per ticker: snapshot synthesis (with optional live overrides) →
//! candidate enumeration over the {DTE × delta × width} grid → nine-factor
//! scoring → ranking → stability lock. The leaderboard aggregator runs the
//! pipeline across the configured universe and merges local top-3 sets into
//! a global top-10.

pub mod enumerate;
pub mod leaderboard;
pub mod lock;
pub mod score;
pub mod scan;
pub mod snapshot;

pub use enumerate::generate_all_candidates;
pub use leaderboard::{build_leaderboard, merge_local_tops};
pub use lock::{
    reconcile, FileLockStore, LockManager, LockOutcome, LockParams, LockStore, MemoryLockStore,
};
pub use scan::{ScanOutcome, ScanReport, Scanner};
pub use score::score_candidate;
pub use snapshot::{apply_live_overrides, synthesize_flow, synthesize_snapshot};
