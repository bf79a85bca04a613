//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! The `Database` from `duka-db` owns a `SqlitePool`, which is already
//! shareable, so commands run queries concurrently without extra locking.
//! The one write that must not interleave (checkout) is serialised by the
//! SQL transaction and the register's checkout guard.

use duka_core::{Role, ShopInfo};
use duka_db::{Database, DbResult};

#[derive(Debug)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// The account whose profile holds the shop identity: the first admin.
    pub async fn shop_owner(&self) -> DbResult<Option<i64>> {
        let admins = self.db.users().list_by_role(Role::Admin).await?;
        Ok(admins.iter().map(|u| u.id).min())
    }

    /// Shop identity printed on receipts. A register with no admin yet prints
    /// the default shop.
    pub async fn receipt_shop(&self) -> DbResult<ShopInfo> {
        match self.shop_owner().await? {
            Some(owner) => self.db.users().shop_info(owner).await,
            None => Ok(ShopInfo::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duka_db::DbConfig;

    #[tokio::test]
    async fn test_receipt_shop_uses_first_admin() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = DbState::new(db);

        assert_eq!(state.receipt_shop().await.unwrap(), ShopInfo::default());

        let users = state.inner().users();
        let owner = users.create("owner", "secret1", Role::Admin).await.unwrap();
        users.create("amina", "secret1", Role::Employee).await.unwrap();

        let info = ShopInfo {
            shop_name: "Mama Duka".into(),
            ..ShopInfo::default()
        };
        users.update_shop_info(owner.id, &info).await.unwrap();

        assert_eq!(state.receipt_shop().await.unwrap().shop_name, "Mama Duka");
    }
}
