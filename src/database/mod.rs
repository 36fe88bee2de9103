pub mod manager;
pub mod record;
pub mod repository;

pub use manager::{Database, DatabaseError};
pub use record::{NewRecord, RecordError};
pub use repository::Repository;
