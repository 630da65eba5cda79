pub mod error;
pub mod item;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use item::{Item, ItemId, NewItem};
