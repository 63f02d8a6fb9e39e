use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::Store;
use crate::error::StoreError;
use crate::models::{Role, SessionId, User, UserId};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+[\._]?[a-z0-9]+[@]\w+[.]\w{2,3}$").unwrap());

pub(crate) fn valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// First name + last name, cut to the 20 character handle limit.
fn base_handle(name_first: &str, name_last: &str) -> String {
    format!("{name_first}{name_last}").chars().take(20).collect()
}

/// Fold a collision counter into a handle without exceeding 20 chars:
/// append when it fits, otherwise overwrite the tail.
fn fold_counter(handle: &str, count: usize) -> String {
    let digits = count.to_string();
    let keep = 20usize.saturating_sub(digits.len());
    let mut out: String = handle.chars().take(keep).collect();
    out.push_str(&digits);
    out
}

fn valid_name(name: &str) -> bool {
    (1..=50).contains(&name.chars().count())
}

impl Store {
    /// Create an account and open its first session. The first account
    /// registered becomes the platform owner. Expects an already-hashed
    /// password; the caller validates the plaintext.
    pub async fn register(
        &self,
        email: &str,
        password_hash: String,
        name_first: &str,
        name_last: &str,
    ) -> Result<(UserId, SessionId), StoreError> {
        let mut state = self.inner.write().await;

        if !valid_email(email) {
            return Err(StoreError::InvalidEmail);
        }
        if state.users.values().any(|u| u.email == email) {
            return Err(StoreError::EmailTaken);
        }
        if !valid_name(name_first) || !valid_name(name_last) {
            return Err(StoreError::BadNameLength);
        }

        // Users sharing a first+last name pair get a numeric suffix.
        let collisions = state
            .users
            .values()
            .filter(|u| u.name_first == name_first && u.name_last == name_last)
            .count();
        let mut handle = base_handle(name_first, name_last);
        if collisions != 0 {
            handle = fold_counter(&handle, collisions);
        }

        let role = if state.users.is_empty() {
            Role::Owner
        } else {
            Role::Member
        };

        let id = UserId::generate();
        let seq = state.seq();
        state.users.insert(
            id,
            User {
                id,
                seq,
                email: email.to_string(),
                password_hash,
                name_first: name_first.to_string(),
                name_last: name_last.to_string(),
                handle,
                role,
                photo_file: None,
            },
        );

        let session = SessionId::generate();
        state.sessions.insert(session, id);

        info!("registered user {id}");
        Ok((id, session))
    }

    pub async fn user(&self, id: UserId) -> Result<User, StoreError> {
        let state = self.inner.read().await;
        state.user(id).cloned()
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        let state = self.inner.read().await;
        state.users.values().find(|u| u.email == email).cloned()
    }

    /// Every account, registration-ordered.
    pub async fn users_all(&self) -> Vec<User> {
        let state = self.inner.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| u.seq);
        users
    }

    pub async fn set_name(
        &self,
        caller: UserId,
        name_first: &str,
        name_last: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        if !valid_name(name_first) || !valid_name(name_last) {
            return Err(StoreError::BadNameLength);
        }
        let user = state.user_mut(caller)?;
        user.name_first = name_first.to_string();
        user.name_last = name_last.to_string();
        Ok(())
    }

    pub async fn set_email(&self, caller: UserId, email: &str) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        if !valid_email(email) {
            return Err(StoreError::InvalidEmail);
        }
        if state.users.values().any(|u| u.email == email && u.id != caller) {
            return Err(StoreError::EmailTaken);
        }
        state.user_mut(caller)?.email = email.to_string();
        Ok(())
    }

    pub async fn set_handle(&self, caller: UserId, handle: &str) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        if !(3..=20).contains(&handle.chars().count()) {
            return Err(StoreError::BadHandleLength);
        }
        if state.users.values().any(|u| u.handle == handle && u.id != caller) {
            return Err(StoreError::HandleTaken);
        }
        state.user_mut(caller)?.handle = handle.to_string();
        Ok(())
    }

    /// Record the stored filename of the caller's cropped profile photo.
    pub async fn set_photo(&self, caller: UserId, file: String) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        state.user_mut(caller)?.photo_file = Some(file);
        Ok(())
    }

    pub async fn change_permission(
        &self,
        caller: UserId,
        target: UserId,
        permission_id: u32,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        if !state.is_platform_owner(caller) {
            return Err(StoreError::NotPlatformOwner);
        }
        let role = Role::from_permission_id(permission_id).ok_or(StoreError::InvalidPermission)?;
        state.user_mut(target)?.role = role;
        info!("user {caller} set permission of {target} to {permission_id}");
        Ok(())
    }
}
