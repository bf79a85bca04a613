//! # User Repository
//!
//! Operator accounts and the shop identity printed on receipts.
//!
//! ## Credentials
//! Passwords are stored as Argon2 PHC strings with a random salt. Hashes
//! never leave this module: [`User`] has no credential field.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use duka_core::{Role, ShopInfo, User};

use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, username, role, created_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account. Usernames are unique, case-insensitively.
    pub async fn create(&self, username: &str, password: &str, role: Role) -> DbResult<User> {
        let username = username.trim();
        let hash = hash_password(password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(username)
        .bind(hash)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        info!(username = %username, role = %role, "User created");

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| DbError::not_found("User", username))
    }

    /// Returns the user if the credentials match.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE username = ?1")
                .bind(username.trim())
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, hash)) = row else {
            return Ok(None);
        };

        if !verify_password(password, &hash) {
            warn!(username = %username.trim(), "Failed sign-in attempt");
            return Ok(None);
        }

        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list_by_role(&self, role: Role) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY username");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Deletes an employee account. Admin accounts cannot be removed here.
    pub async fn delete_employee(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1 AND role = ?2")
            .bind(id)
            .bind(Role::Employee)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id.to_string()));
        }

        info!(user_id = id, "Employee deleted");
        Ok(())
    }

    /// Replaces a user's password.
    pub async fn set_password(&self, id: i64, new_password: &str) -> DbResult<()> {
        let hash = hash_password(new_password)?;
        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id.to_string()));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Shop Info
    // =========================================================================

    /// Shop identity stored on `user_id`'s profile. Missing fields default.
    pub async fn shop_info(&self, user_id: i64) -> DbResult<ShopInfo> {
        let info = sqlx::query_as::<_, ShopInfo>(
            r#"
            SELECT
                COALESCE(NULLIF(TRIM(shop_name), ''), 'Unknown Shop') AS shop_name,
                COALESCE(tagline, '') AS tagline,
                COALESCE(address, '') AS address,
                COALESCE(contact, '') AS contact
            FROM users WHERE id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(info.unwrap_or_default())
    }

    pub async fn update_shop_info(&self, user_id: i64, info: &ShopInfo) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET shop_name = ?2, tagline = ?3, address = ?4, contact = ?5
            WHERE id = ?1
            "#,
        )
        .bind(user_id)
        .bind(info.shop_name.trim())
        .bind(info.tagline.trim())
        .bind(info.address.trim())
        .bind(info.contact.trim())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Hashing
// =============================================================================

/// Hashes a password with Argon2 and a fresh salt.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Credential(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Checks a password against a stored PHC string. Malformed hashes never match.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let db = db().await;
        let users = db.users();

        let owner = users.create("owner", "secret1", Role::Admin).await.unwrap();
        assert_eq!(owner.role, Role::Admin);

        let signed_in = users.authenticate("owner", "secret1").await.unwrap().unwrap();
        assert_eq!(signed_in.id, owner.id);
        assert!(users.authenticate("owner", "wrong").await.unwrap().is_none());
        assert!(users.authenticate("nobody", "secret1").await.unwrap().is_none());

        let err = users.create("OWNER", "another1", Role::Employee).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_roles_and_deletion() {
        let db = db().await;
        let users = db.users();

        let owner = users.create("owner", "secret1", Role::Admin).await.unwrap();
        let amina = users.create("amina", "secret1", Role::Employee).await.unwrap();
        users.create("juma", "secret1", Role::Employee).await.unwrap();

        let staff = users.list_by_role(Role::Employee).await.unwrap();
        let names: Vec<_> = staff.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["amina", "juma"]);

        users.delete_employee(amina.id).await.unwrap();
        assert!(matches!(
            users.delete_employee(owner.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert_eq!(users.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_password_change_and_shop_info() {
        let db = db().await;
        let users = db.users();
        let owner = users.create("owner", "secret1", Role::Admin).await.unwrap();

        users.set_password(owner.id, "better-secret").await.unwrap();
        assert!(users.authenticate("owner", "secret1").await.unwrap().is_none());
        assert!(users
            .authenticate("owner", "better-secret")
            .await
            .unwrap()
            .is_some());

        assert_eq!(users.shop_info(owner.id).await.unwrap(), ShopInfo::default());

        let info = ShopInfo {
            shop_name: "Mama Duka".to_string(),
            tagline: "Fresh every day".to_string(),
            address: "Moshi Road".to_string(),
            contact: "0712 000 000".to_string(),
        };
        users.update_shop_info(owner.id, &info).await.unwrap();
        assert_eq!(users.shop_info(owner.id).await.unwrap(), info);
    }
}
