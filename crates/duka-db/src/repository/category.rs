//! Category labels offered when saving a product.

use sqlx::SqlitePool;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories, alphabetical.
    pub async fn list(&self) -> DbResult<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM categories ORDER BY name COLLATE NOCASE")
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }

    /// Adds a category. Returns `false` if it already existed (any case).
    pub async fn add(&self, name: &str) -> DbResult<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO categories (name) VALUES (?1)")
            .bind(name.trim())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_add_ignores_duplicates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let categories = db.categories();

        assert!(categories.add("Stationery").await.unwrap());
        assert!(!categories.add(" stationery ").await.unwrap());
        assert!(!categories.add("GROCERY").await.unwrap());

        let all = categories.list().await.unwrap();
        assert!(all.contains(&"Stationery".to_string()));
        assert_eq!(all.iter().filter(|c| c.eq_ignore_ascii_case("grocery")).count(), 1);
    }
}
