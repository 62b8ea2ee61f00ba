pub mod memory;
pub mod models;
pub mod mongo;
pub mod store;

pub use memory::{Collections, MemoryStore};
pub use mongo::MongoStore;
pub use store::{Page, PageQuery, Session, Store, StoreError};
