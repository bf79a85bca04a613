//! # User Commands
//!
//! Sign-in, staff accounts and the shop profile.
//!
//! ```text
//! Role      │ sell │ catalog │ staff │ shop info │ backup
//! ──────────┼──────┼─────────┼───────┼───────────┼───────
//! Admin     │  ✓   │    ✓    │   ✓   │     ✓     │   ✓
//! Employee  │  ✓   │    -    │   -   │     -     │   -
//! ```

use tracing::info;

use duka_core::session::OperatorContext;
use duka_core::validation::{validate_password, validate_username};
use duka_core::{Role, ShopInfo, User};

use crate::error::{ApiError, ErrorCode};
use crate::state::{CartState, DbState, SessionState, SettingsState};

/// Signs an operator in. With `remember`, the username is kept in settings.
pub async fn login(
    db: &DbState,
    session: &SessionState,
    settings: &SettingsState,
    username: &str,
    password: &str,
    remember: bool,
) -> Result<OperatorContext, ApiError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let user = db
        .inner()
        .users()
        .authenticate(username, password)
        .await?
        .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "Invalid username or password"))?;

    let operator = OperatorContext::from(&user);
    session.sign_in(operator.clone());
    info!(username = %operator.username, role = %operator.role, "Signed in");

    if remember {
        settings.update(|s| s.remembered_username = Some(user.username.clone()))?;
    }

    Ok(operator)
}

/// Signs out and discards the pending cart.
pub fn logout(session: &SessionState, cart: &CartState) -> Result<Option<OperatorContext>, ApiError> {
    cart.with_cart_mut(|c| c.clear())?;
    let previous = session.sign_out();
    if let Some(operator) = &previous {
        info!(username = %operator.username, "Signed out");
    }
    Ok(previous)
}

/// Creates the first admin on an empty register.
pub async fn setup_admin(db: &DbState, username: &str, password: &str) -> Result<User, ApiError> {
    if db.inner().users().count().await? > 0 {
        return Err(ApiError::new(
            ErrorCode::Forbidden,
            "An account already exists; sign in as an admin to add users",
        ));
    }

    validate_username(username)?;
    validate_password(password)?;
    Ok(db.inner().users().create(username, password, Role::Admin).await?)
}

pub async fn create_user(
    db: &DbState,
    session: &SessionState,
    username: &str,
    password: &str,
    role: Role,
) -> Result<User, ApiError> {
    session.require_admin("create accounts")?;
    validate_username(username)?;
    validate_password(password)?;
    Ok(db.inner().users().create(username, password, role).await?)
}

pub async fn list_employees(db: &DbState, session: &SessionState) -> Result<Vec<User>, ApiError> {
    session.require_admin("list staff")?;
    Ok(db.inner().users().list_by_role(Role::Employee).await?)
}

pub async fn delete_employee(
    db: &DbState,
    session: &SessionState,
    user_id: i64,
) -> Result<(), ApiError> {
    session.require_admin("remove staff")?;
    db.inner().users().delete_employee(user_id).await?;
    Ok(())
}

/// Changes the signed-in operator's own password.
pub async fn change_password(
    db: &DbState,
    session: &SessionState,
    current_password: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let operator = session.current()?;
    validate_password(new_password)?;

    let users = db.inner().users();
    if users
        .authenticate(&operator.username, current_password)
        .await?
        .is_none()
    {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "Current password is incorrect",
        ));
    }

    users.set_password(operator.user_id, new_password).await?;
    info!(username = %operator.username, "Password changed");
    Ok(())
}

pub async fn get_shop_info(db: &DbState) -> Result<ShopInfo, ApiError> {
    Ok(db.receipt_shop().await?)
}

pub async fn update_shop_info(
    db: &DbState,
    session: &SessionState,
    info: ShopInfo,
) -> Result<ShopInfo, ApiError> {
    session.require_admin("edit shop details")?;
    let owner = db
        .shop_owner()
        .await?
        .ok_or_else(|| ApiError::not_found("Admin", "shop owner"))?;

    db.inner().users().update_shop_info(owner, &info).await?;
    Ok(db.receipt_shop().await?)
}
