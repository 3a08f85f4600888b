pub mod cleaner;
pub mod engine;
pub mod settings;
pub mod store;
pub mod transaction;

pub use engine::{EngineError, QueueDescriptor, QueueEngine, QueuedItem};
pub use settings::QueueSettings;
pub use store::redis::RedisStore;
pub use store::{QueueStore, StoreError, TxOutcome, WatchSession, WriteOp};
