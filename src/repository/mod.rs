//! Repository Layer
//!
//! Document store abstraction and its backends.

mod traits;
mod memory;
mod sqlite;
mod firestore;


pub use traits::{DocumentStore, StoreError, StoreResult, PROJECTS_COLLECTION};
pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use firestore::FirestoreDocumentStore;
