pub mod database;
pub(crate) mod node;
pub mod record;

pub use database::RecordStore;
pub use record::{Record, RecordType};

