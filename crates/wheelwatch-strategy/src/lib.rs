pub mod error;
pub mod export;
pub mod matcher;
pub mod record;
pub mod registry;
pub mod session;
pub mod store;
pub mod traits;

pub use error::TrackerError;
pub use export::{ExportDocument, ImportError, EXPORT_VERSION};
pub use matcher::{Advance, Matcher};
pub use record::{HistoryEntry, Outcome, PendingCheck, StrategyId, StrategyRecord, TrackState};
pub use registry::{PriorityAlert, QuickBacktest, StrategyRegistry, StreamDelta};
pub use session::Session;
pub use store::{JsonFileStore, MemoryStore, StoreError};
pub use traits::{SpinSource, StrategyStore};
