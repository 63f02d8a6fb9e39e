//! Shared fixtures for the store unit tests.

use crate::Store;
use crate::models::{ChannelId, UserId};

pub async fn register(store: &Store, email: &str, first: &str, last: &str) -> UserId {
    store
        .register(email, "hash".into(), first, last)
        .await
        .unwrap()
        .0
}

pub async fn channel(store: &Store, owner: UserId, name: &str, is_public: bool) -> ChannelId {
    store.create_channel(owner, name, is_public).await.unwrap()
}
