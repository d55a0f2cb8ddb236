pub mod config;
pub mod record;
pub mod tally;

pub use config::{ApiConfig, GachaConfig, LocatorConfig, StoreConfig};
pub use record::{DecodeError, DrawRecord, FieldPolicy, PoolDescriptor, merge_history};
pub use tally::{PoolSummary, TallyRow, summarize, tally};
