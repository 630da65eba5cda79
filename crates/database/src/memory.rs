use crate::{DbError, ItemRepository};
use async_trait::async_trait;
use core_types::{Item, ItemId, NewItem};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// An [`ItemRepository`] kept entirely in process memory.
///
/// Ids start at 1 and are never reused, matching a `SERIAL` column. Listing
/// yields items in ascending id order. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: RwLock<Table>,
}

#[derive(Debug, Default)]
struct Table {
    last_id: ItemId,
    rows: BTreeMap<ItemId, Item>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn list_items(&self) -> Result<Vec<Item>, DbError> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Item, DbError> {
        self.inner
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, DbError> {
        let mut table = self.inner.write().await;
        table.last_id = table.last_id.checked_add(1).ok_or(DbError::IdsExhausted)?;
        let item = item.with_id(table.last_id);
        table.rows.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: ItemId, item: NewItem) -> Result<Item, DbError> {
        let mut table = self.inner.write().await;
        let row = table.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        *row = item.with_id(id);
        Ok(row.clone())
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), DbError> {
        self.inner
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(DbError::NotFound)
    }
}
