//! Operator context.
//!
//! The signed-in operator is passed explicitly into every operation that
//! records who did it. There is no process-wide "current user".

use serde::{Deserialize, Serialize};

use crate::types::{Role, User};

/// The operator on whose behalf a sale is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorContext {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl OperatorContext {
    pub fn new(user_id: i64, username: impl Into<String>, role: Role) -> Self {
        OperatorContext {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for OperatorContext {
    fn from(user: &User) -> Self {
        OperatorContext::new(user.id, user.username.clone(), user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_from_user() {
        let user = User {
            id: 7,
            username: "amina".to_string(),
            role: Role::Employee,
            created_at: Utc::now(),
        };
        let op = OperatorContext::from(&user);
        assert_eq!(op.user_id, 7);
        assert_eq!(op.username, "amina");
        assert!(!op.is_admin());
        assert!(OperatorContext::new(1, "owner", Role::Admin).is_admin());
    }
}
