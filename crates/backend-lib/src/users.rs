// ============================
// mdwiki-backend-lib/src/users.rs
// ============================
//! Account directory over the generic document store.
use crate::auth::password::hash_if_plain;
use crate::error::AppError;
use crate::store::{Collection, Filter, Storage};
use mdwiki_common::{AccessLevel, User};
use std::sync::Arc;

pub struct UserDirectory {
    col: Arc<dyn Collection>,
}

impl UserDirectory {
    pub fn new<S: Storage>(storage: &S) -> Self {
        Self {
            col: storage.users(),
        }
    }

    /// Provision an account. Returns false when the id is already taken.
    /// The password may be supplied pre-hashed; plaintext is hashed here.
    pub async fn add(
        &self,
        uid: &str,
        name: &str,
        password: &str,
        level: AccessLevel,
    ) -> Result<bool, AppError> {
        if self.col.count(&Filter::id(uid)).await? > 0 {
            return Ok(false);
        }

        let user = User {
            id: uid.to_string(),
            name: name.to_string(),
            password: hash_if_plain(password),
            level,
        };
        self.col.insert_one(serde_json::to_value(user)?).await?;
        tracing::info!(uid, "account provisioned");
        Ok(true)
    }

    pub async fn remove(&self, uid: &str) -> Result<(), AppError> {
        self.col.delete_one(&Filter::id(uid)).await
    }

    pub async fn get(&self, uid: &str) -> Result<Option<User>, AppError> {
        match self.col.find_one(&Filter::id(uid)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Update password and/or access level; a call with neither is a no-op.
    pub async fn update(
        &self,
        uid: &str,
        password: Option<&str>,
        level: Option<AccessLevel>,
    ) -> Result<(), AppError> {
        if password.is_none() && level.is_none() {
            return Ok(());
        }

        let Some(mut user) = self.get(uid).await? else {
            return Ok(());
        };
        if let Some(password) = password {
            user.password = hash_if_plain(password);
        }
        if let Some(level) = level {
            user.level = level;
        }
        self.col
            .update_one(&Filter::id(uid), serde_json::to_value(user)?, false)
            .await
    }

    /// Check a password (plaintext or pre-hashed) against the stored hash
    pub async fn check(&self, uid: &str, password: &str) -> Result<bool, AppError> {
        let candidate = hash_if_plain(password);
        Ok(match self.get(uid).await? {
            Some(user) => user.password == candidate,
            None => false,
        })
    }

    /// Display name for an account, falling back to the id itself
    pub async fn to_name(&self, uid: &str) -> Result<String, AppError> {
        Ok(self
            .get(uid)
            .await?
            .map(|user| user.name)
            .unwrap_or_else(|| uid.to_string()))
    }
}
