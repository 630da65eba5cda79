use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Primary key of the `items` table (`SERIAL`).
pub type ItemId = i32;

/// A single row of the `items` table, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Item {
    /// Assigned by the database on insert and never changed afterwards.
    pub id: ItemId,
    pub name: String,
    pub price: i32,
}

/// The caller-supplied part of an item: the body of `POST /items` and `PUT /items/:id`.
///
/// Both fields are required. Any `id` sent by the client is ignored; the id
/// always comes from the database (create) or the path (update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: i32,
}

impl NewItem {
    pub fn new(name: impl Into<String>, price: i32) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }

    /// Rejects payloads that deserialize but still carry no usable name.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "name".to_string(),
                "must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Attaches an id, producing the full record.
    pub fn with_id(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            price: self.price,
        }
    }
}
