use crate::DbError;
use async_trait::async_trait;
use core_types::{Item, ItemId, NewItem};
use sqlx::postgres::PgPool;

/// The CRUD contract over the `items` table.
///
/// Every method is one round-trip to the store. Implementations must report a
/// missing id as [`DbError::NotFound`] and anything else as a store error.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// All items, in whatever order the store yields them.
    async fn list_items(&self) -> Result<Vec<Item>, DbError>;

    async fn get_item(&self, id: ItemId) -> Result<Item, DbError>;

    /// Inserts a row and returns it with the id the store assigned.
    async fn create_item(&self, item: NewItem) -> Result<Item, DbError>;

    /// Overwrites `name` and `price` of an existing row.
    ///
    /// The returned item echoes the input; the row is not read back.
    async fn update_item(&self, id: ItemId, item: NewItem) -> Result<Item, DbError>;

    async fn delete_item(&self, id: ItemId) -> Result<(), DbError>;
}

/// The `DbRepository` is the PostgreSQL-backed [`ItemRepository`]. It holds
/// the shared connection pool and encapsulates all SQL.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for DbRepository {
    async fn list_items(&self) -> Result<Vec<Item>, DbError> {
        let items = sqlx::query_as::<_, Item>("SELECT id, name, price FROM items")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn get_item(&self, id: ItemId) -> Result<Item, DbError> {
        sqlx::query_as::<_, Item>("SELECT id, name, price FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, DbError> {
        let id: ItemId =
            sqlx::query_scalar("INSERT INTO items (name, price) VALUES ($1, $2) RETURNING id")
                .bind(&item.name)
                .bind(item.price)
                .fetch_one(&self.pool)
                .await?;
        tracing::debug!(id, "Item inserted.");
        Ok(item.with_id(id))
    }

    async fn update_item(&self, id: ItemId, item: NewItem) -> Result<Item, DbError> {
        let result = sqlx::query("UPDATE items SET name = $1, price = $2 WHERE id = $3")
            .bind(&item.name)
            .bind(item.price)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(item.with_id(id))
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
