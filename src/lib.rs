pub mod config;
pub mod error;
pub mod loader;
pub mod plan;
pub mod shared;
pub mod store;
pub mod validation;

pub use error::{ConfigError, LoadError, StoreError};
pub use loader::{Loader, Source, load, load_directory};
pub use plan::{Change, plan_change};
pub use shared::SharedRecordStore;
pub use store::{Record, RecordStore, RecordType};
