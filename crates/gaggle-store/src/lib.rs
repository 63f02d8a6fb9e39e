pub mod error;
pub mod models;

mod channels;
mod messages;
mod sessions;
mod standup;
mod users;

#[cfg(test)]
pub(crate) mod testutil;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{Channel, ChannelId, MessageId, Role, SessionId, User, UserId};

/// All platform state behind one async lock. The handle is cheap to
/// clone and share; every operation takes the lock exactly once and
/// runs its checks and mutation atomically, so the membership
/// invariants (owners are always members, ledgers only grow) hold
/// under concurrent request handling.
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    channels: HashMap<ChannelId, Channel>,
    /// Active sessions: session id (the token's `jti`) -> user.
    sessions: HashMap<SessionId, UserId>,
    /// Outstanding single-use password reset codes.
    reset_codes: HashMap<String, UserId>,
    /// Which channel each ledgered message lives in.
    message_channels: HashMap<MessageId, ChannelId>,
    /// Insertion counter so user and channel listings keep a stable order.
    next_seq: u64,
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(State::default())),
        }
    }
}

impl State {
    fn seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn user(&self, id: UserId) -> Result<&User, StoreError> {
        self.users.get(&id).ok_or(StoreError::UnknownUser)
    }

    fn user_mut(&mut self, id: UserId) -> Result<&mut User, StoreError> {
        self.users.get_mut(&id).ok_or(StoreError::UnknownUser)
    }

    fn channel(&self, id: ChannelId) -> Result<&Channel, StoreError> {
        self.channels.get(&id).ok_or(StoreError::UnknownChannel)
    }

    fn channel_mut(&mut self, id: ChannelId) -> Result<&mut Channel, StoreError> {
        self.channels.get_mut(&id).ok_or(StoreError::UnknownChannel)
    }

    fn is_platform_owner(&self, user: UserId) -> bool {
        self.users.get(&user).is_some_and(|u| u.role == Role::Owner)
    }

    /// The one capability check behind every owner-gated channel
    /// operation: channel owners qualify, and so does a platform owner
    /// who is a member of the channel.
    fn has_owner_authority(&self, channel: &Channel, user: UserId) -> bool {
        channel.owners.contains(&user)
            || (self.is_platform_owner(user) && channel.members.contains(&user))
    }
}
