// Application layer - use cases and orchestration over the store.
// Aggregations live in `domain` as pure folds; this layer fetches the
// snapshots, validates caller input and maps failures to `AppError`.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
