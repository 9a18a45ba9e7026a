//! Learning progress persistence.
//!
//! `ProgressTracker` keeps one `NodeProgress` per learning node inside a
//! single `ProgressStore` blob stamped with a schema version. A blob with
//! any other version is discarded in full the next time the store is
//! written.

pub mod store;
pub mod tracker;

pub use store::{calculate_progress, ProgressStore, PROGRESS_SCHEMA_VERSION};
pub use tracker::{ProgressTracker, PROGRESS_STORE_KEY};
