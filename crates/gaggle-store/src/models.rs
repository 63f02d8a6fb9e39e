use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Domain state held by the store. Distinct from the gaggle-types API
/// models so the store layer stays independent of the wire format.

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(UserId);
id_type!(ChannelId);
id_type!(MessageId);
id_type!(SessionId);

/// Reaction ids clients may use. Only the thumbs-up reaction exists.
pub const VALID_REACT_IDS: &[u32] = &[1];

/// Platform-wide permission level. The first registered user is an
/// `Owner`; everyone after starts as a `Member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Member,
}

impl Role {
    pub fn from_permission_id(id: u32) -> Option<Role> {
        match id {
            1 => Some(Role::Owner),
            2 => Some(Role::Member),
            _ => None,
        }
    }

    pub fn permission_id(self) -> u32 {
        match self {
            Role::Owner => 1,
            Role::Member => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub seq: u64,
    pub email: String,
    pub password_hash: String,
    pub name_first: String,
    pub name_last: String,
    pub handle: String,
    pub role: Role,
    pub photo_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub author: UserId,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub is_pinned: bool,
    /// Removed messages stay in the ledger as tombstones so positions of
    /// surviving messages never shift; every read path skips them.
    pub removed: bool,
    /// react_id -> users who reacted, in reaction order.
    pub reacts: BTreeMap<u32, Vec<UserId>>,
}

#[derive(Debug, Clone)]
pub struct Standup {
    pub starter: UserId,
    pub finish_at: DateTime<Utc>,
    pub notes: Vec<(UserId, String)>,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub seq: u64,
    pub name: String,
    pub is_public: bool,
    pub members: HashSet<UserId>,
    pub owners: HashSet<UserId>,
    pub messages: Vec<Message>,
    pub standup: Option<Standup>,
}

/// Member and owner profiles for a channel, registration-ordered.
#[derive(Debug, Clone)]
pub struct ChannelDetails {
    pub name: String,
    pub owners: Vec<User>,
    pub members: Vec<User>,
}

/// One page of a channel's live messages, newest first.
#[derive(Debug, Clone)]
pub struct MessagesPage {
    pub messages: Vec<Message>,
    pub start: i64,
    pub end: i64,
}
