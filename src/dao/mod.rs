/// Persistence abstraction for debates, users, topics, and the queue.
pub mod debate_store;
/// Bundled in-memory storage backend.
pub mod memory;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
