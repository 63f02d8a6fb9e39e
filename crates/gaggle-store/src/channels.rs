use std::collections::HashSet;

use tracing::info;

use crate::Store;
use crate::error::StoreError;
use crate::models::{Channel, ChannelDetails, ChannelId, User, UserId};

impl Store {
    /// Create a channel with the caller as its first member and owner.
    pub async fn create_channel(
        &self,
        caller: UserId,
        name: &str,
        is_public: bool,
    ) -> Result<ChannelId, StoreError> {
        let mut state = self.inner.write().await;
        if !(1..=20).contains(&name.chars().count()) {
            return Err(StoreError::BadChannelName);
        }

        let id = ChannelId::generate();
        let seq = state.seq();
        state.channels.insert(
            id,
            Channel {
                id,
                seq,
                name: name.to_string(),
                is_public,
                members: HashSet::from([caller]),
                owners: HashSet::from([caller]),
                messages: Vec::new(),
                standup: None,
            },
        );

        info!("user {caller} created channel {id} ({name})");
        Ok(id)
    }

    /// A member may invite any user; the invitee joins immediately as a
    /// plain member.
    pub async fn invite(
        &self,
        caller: UserId,
        channel: ChannelId,
        target: UserId,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let ch = state.channel(channel)?;
        if !state.users.contains_key(&target) {
            return Err(StoreError::UnknownUser);
        }
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }
        if ch.members.contains(&target) {
            return Err(StoreError::AlreadyMember);
        }
        state.channel_mut(channel)?.members.insert(target);
        Ok(())
    }

    /// Anyone may join a public channel; private channels admit only
    /// platform owners without an invite.
    pub async fn join(&self, caller: UserId, channel: ChannelId) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let ch = state.channel(channel)?;
        if ch.members.contains(&caller) {
            return Err(StoreError::AlreadyMember);
        }
        if !ch.is_public && !state.is_platform_owner(caller) {
            return Err(StoreError::PrivateChannel);
        }
        state.channel_mut(channel)?.members.insert(caller);
        Ok(())
    }

    /// Leaving drops the caller from the member set and, if they held
    /// it, ownership as well.
    pub async fn leave(&self, caller: UserId, channel: ChannelId) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let ch = state.channel(channel)?;
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }
        let ch = state.channel_mut(channel)?;
        ch.members.remove(&caller);
        ch.owners.remove(&caller);
        Ok(())
    }

    pub async fn add_owner(
        &self,
        caller: UserId,
        channel: ChannelId,
        target: UserId,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let ch = state.channel(channel)?;
        if !state.users.contains_key(&target) {
            return Err(StoreError::UnknownUser);
        }
        if !state.has_owner_authority(ch, caller) {
            return Err(StoreError::NotChannelOwner);
        }
        if !ch.members.contains(&target) {
            return Err(StoreError::TargetNotMember);
        }
        if ch.owners.contains(&target) {
            return Err(StoreError::AlreadyOwner);
        }
        state.channel_mut(channel)?.owners.insert(target);
        Ok(())
    }

    /// Demote an owner. The sole remaining owner can only be removed by
    /// a platform owner, which may leave the channel ownerless.
    pub async fn remove_owner(
        &self,
        caller: UserId,
        channel: ChannelId,
        target: UserId,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let ch = state.channel(channel)?;
        if !state.users.contains_key(&target) {
            return Err(StoreError::UnknownUser);
        }
        if !state.has_owner_authority(ch, caller) {
            return Err(StoreError::NotChannelOwner);
        }
        if !ch.owners.contains(&target) {
            return Err(StoreError::TargetNotOwner);
        }
        if ch.owners.len() == 1 && !state.is_platform_owner(caller) {
            return Err(StoreError::LastOwner);
        }
        state.channel_mut(channel)?.owners.remove(&target);
        Ok(())
    }

    /// Name plus registration-ordered owner and member profiles, for
    /// members only.
    pub async fn details(
        &self,
        caller: UserId,
        channel: ChannelId,
    ) -> Result<ChannelDetails, StoreError> {
        let state = self.inner.read().await;
        let ch = state.channel(channel)?;
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }

        let collect = |ids: &HashSet<UserId>| {
            let mut users: Vec<User> = ids
                .iter()
                .filter_map(|id| state.users.get(id))
                .cloned()
                .collect();
            users.sort_by_key(|u| u.seq);
            users
        };

        Ok(ChannelDetails {
            name: ch.name.clone(),
            owners: collect(&ch.owners),
            members: collect(&ch.members),
        })
    }

    /// Channels the caller belongs to, creation-ordered.
    pub async fn my_channels(&self, caller: UserId) -> Vec<(ChannelId, String)> {
        let state = self.inner.read().await;
        let mut channels: Vec<&Channel> = state
            .channels
            .values()
            .filter(|c| c.members.contains(&caller))
            .collect();
        channels.sort_by_key(|c| c.seq);
        channels.into_iter().map(|c| (c.id, c.name.clone())).collect()
    }

    /// Every channel on the platform, public and private alike.
    pub async fn all_channels(&self) -> Vec<(ChannelId, String)> {
        let state = self.inner.read().await;
        let mut channels: Vec<&Channel> = state.channels.values().collect();
        channels.sort_by_key(|c| c.seq);
        channels.into_iter().map(|c| (c.id, c.name.clone())).collect()
    }
}
