use thiserror::Error;

/// Every way a store operation can fail. Each variant classifies as
/// either bad input or missing authority through [`StoreError::kind`];
/// the HTTP layer turns that split into status codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    // Accounts
    #[error("email is not a valid email address")]
    InvalidEmail,
    #[error("email address is already in use")]
    EmailTaken,
    #[error("names must be between 1 and 50 characters")]
    BadNameLength,
    #[error("handle must be between 3 and 20 characters")]
    BadHandleLength,
    #[error("handle is already in use")]
    HandleTaken,
    #[error("user does not exist")]
    UnknownUser,
    #[error("permission id is not valid")]
    InvalidPermission,
    #[error("reset code is not valid")]
    UnknownResetCode,

    // Channels
    #[error("channel does not exist")]
    UnknownChannel,
    #[error("channel name must be between 1 and 20 characters")]
    BadChannelName,
    #[error("user is already a member of the channel")]
    AlreadyMember,
    #[error("user is not a member of the channel")]
    TargetNotMember,
    #[error("user is already an owner of the channel")]
    AlreadyOwner,
    #[error("user is not an owner of the channel")]
    TargetNotOwner,

    // Messages
    #[error("message does not exist")]
    UnknownMessage,
    #[error("message is not in a channel you have joined")]
    MessageNotJoined,
    #[error("message must be between 1 and 1000 characters")]
    BadMessageLength,
    #[error("message must be at most 1000 characters")]
    MessageTooLong,
    #[error("start is outside the channel's message history")]
    BadStart,
    #[error("react id is not valid")]
    InvalidReactId,
    #[error("message already has your reaction")]
    AlreadyReacted,
    #[error("message does not have your reaction")]
    NotReacted,
    #[error("message is already pinned")]
    AlreadyPinned,
    #[error("message is not pinned")]
    NotPinned,
    #[error("scheduled send time is in the past")]
    TimeInPast,

    // Standups
    #[error("a standup is already active in the channel")]
    StandupRunning,
    #[error("no standup is active in the channel")]
    NoStandup,
    #[error("standup length must be positive")]
    BadStandupLength,

    // Authority
    #[error("you are not a member of the channel")]
    NotMember,
    #[error("the channel is private")]
    PrivateChannel,
    #[error("you do not have owner rights in the channel")]
    NotChannelOwner,
    #[error("the channel must keep at least one owner")]
    LastOwner,
    #[error("only the author or a channel owner may modify the message")]
    NotMessageAuthor,
    #[error("you are not an owner of the platform")]
    NotPlatformOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed or names a bad target.
    Input,
    /// The caller lacks the authority for the operation.
    Access,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotMember
            | StoreError::PrivateChannel
            | StoreError::NotChannelOwner
            | StoreError::LastOwner
            | StoreError::NotMessageAuthor
            | StoreError::NotPlatformOwner => ErrorKind::Access,
            _ => ErrorKind::Input,
        }
    }
}
