//! # Session State
//!
//! The operator currently signed in at this register. Commands read it to
//! stamp sales and to check the role; nothing else in the process holds an
//! identity.

use std::sync::{Mutex, MutexGuard};

use duka_core::session::OperatorContext;

use crate::error::ApiError;

#[derive(Debug, Default)]
pub struct SessionState {
    operator: Mutex<Option<OperatorContext>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<OperatorContext>> {
        self.operator.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn sign_in(&self, operator: OperatorContext) {
        *self.lock() = Some(operator);
    }

    /// Returns the operator that was signed in, if any.
    pub fn sign_out(&self) -> Option<OperatorContext> {
        self.lock().take()
    }

    /// The signed-in operator, or `UNAUTHORIZED`.
    pub fn current(&self) -> Result<OperatorContext, ApiError> {
        self.lock().clone().ok_or_else(ApiError::unauthorized)
    }

    /// The signed-in operator if they are an admin, or `FORBIDDEN`.
    pub fn require_admin(&self, action: &str) -> Result<OperatorContext, ApiError> {
        let operator = self.current()?;
        if !operator.is_admin() {
            return Err(ApiError::forbidden(action));
        }
        Ok(operator)
    }
}
