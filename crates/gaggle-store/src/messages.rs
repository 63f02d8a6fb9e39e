use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::StoreError;
use crate::models::{Channel, ChannelId, Message, MessageId, MessagesPage, UserId, VALID_REACT_IDS};
use crate::{State, Store};

/// How many messages a single page returns.
const PAGE_SIZE: i64 = 50;

impl State {
    /// Find a message that is still live, returning its channel and
    /// ledger position. Tombstoned messages are invisible here.
    fn live_message(&self, id: MessageId) -> Option<(ChannelId, usize)> {
        let channel = *self.message_channels.get(&id)?;
        let ch = self.channels.get(&channel)?;
        let idx = ch
            .messages
            .iter()
            .position(|m| m.id == id && !m.removed)?;
        Some((channel, idx))
    }

    pub(crate) fn append_message(
        &mut self,
        channel: ChannelId,
        id: MessageId,
        author: UserId,
        text: String,
        sent_at: DateTime<Utc>,
    ) {
        if let Some(ch) = self.channels.get_mut(&channel) {
            ch.messages.push(Message {
                id,
                author,
                text,
                sent_at,
                is_pinned: false,
                removed: false,
                reacts: BTreeMap::new(),
            });
            self.message_channels.insert(id, channel);
        }
    }
}

impl Store {
    pub async fn send(
        &self,
        caller: UserId,
        channel: ChannelId,
        text: &str,
    ) -> Result<MessageId, StoreError> {
        let mut state = self.inner.write().await;
        let ch = state.channel(channel)?;
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }
        if !(1..=1000).contains(&text.chars().count()) {
            return Err(StoreError::BadMessageLength);
        }
        let id = MessageId::generate();
        state.append_message(channel, id, caller, text.to_string(), Utc::now());
        Ok(id)
    }

    /// Validate a scheduled send and allocate its message id. The
    /// message joins the ledger only when [`Store::deliver_scheduled`]
    /// fires; until then the id resolves to nothing.
    pub async fn prepare_send_later(
        &self,
        caller: UserId,
        channel: ChannelId,
        text: &str,
        time_sent: DateTime<Utc>,
    ) -> Result<MessageId, StoreError> {
        let state = self.inner.read().await;
        let ch = state.channel(channel)?;
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }
        if !(1..=1000).contains(&text.chars().count()) {
            return Err(StoreError::BadMessageLength);
        }
        if time_sent < Utc::now() {
            return Err(StoreError::TimeInPast);
        }
        Ok(MessageId::generate())
    }

    pub async fn deliver_scheduled(
        &self,
        channel: ChannelId,
        author: UserId,
        id: MessageId,
        text: String,
        sent_at: DateTime<Utc>,
    ) {
        let mut state = self.inner.write().await;
        debug!("delivering scheduled message {id} to channel {channel}");
        state.append_message(channel, id, author, text, sent_at);
    }

    /// Replace a message's text. Empty text removes the message
    /// instead. Allowed for the author and for owner authority in the
    /// message's channel.
    pub async fn edit(
        &self,
        caller: UserId,
        message: MessageId,
        text: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let (channel, idx) = state
            .live_message(message)
            .ok_or(StoreError::UnknownMessage)?;
        let ch = state.channel(channel)?;
        if caller != ch.messages[idx].author && !state.has_owner_authority(ch, caller) {
            return Err(StoreError::NotMessageAuthor);
        }
        if text.chars().count() > 1000 {
            return Err(StoreError::MessageTooLong);
        }
        let msg = &mut state.channel_mut(channel)?.messages[idx];
        if text.is_empty() {
            msg.removed = true;
        } else {
            msg.text = text.to_string();
        }
        Ok(())
    }

    /// Tombstone a message in place so surviving ledger positions never
    /// shift. Same authority rule as [`Store::edit`].
    pub async fn remove(&self, caller: UserId, message: MessageId) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let (channel, idx) = state
            .live_message(message)
            .ok_or(StoreError::UnknownMessage)?;
        let ch = state.channel(channel)?;
        if caller != ch.messages[idx].author && !state.has_owner_authority(ch, caller) {
            return Err(StoreError::NotMessageAuthor);
        }
        state.channel_mut(channel)?.messages[idx].removed = true;
        Ok(())
    }

    pub async fn react(
        &self,
        caller: UserId,
        message: MessageId,
        react_id: u32,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let (channel, idx) = state
            .live_message(message)
            .filter(|(channel, _)| {
                state
                    .channels
                    .get(channel)
                    .is_some_and(|c| c.members.contains(&caller))
            })
            .ok_or(StoreError::MessageNotJoined)?;
        if !VALID_REACT_IDS.contains(&react_id) {
            return Err(StoreError::InvalidReactId);
        }
        let msg = &mut state.channel_mut(channel)?.messages[idx];
        if msg.reacts.get(&react_id).is_some_and(|u| u.contains(&caller)) {
            return Err(StoreError::AlreadyReacted);
        }
        msg.reacts.entry(react_id).or_default().push(caller);
        Ok(())
    }

    pub async fn unreact(
        &self,
        caller: UserId,
        message: MessageId,
        react_id: u32,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let (channel, idx) = state
            .live_message(message)
            .filter(|(channel, _)| {
                state
                    .channels
                    .get(channel)
                    .is_some_and(|c| c.members.contains(&caller))
            })
            .ok_or(StoreError::MessageNotJoined)?;
        if !VALID_REACT_IDS.contains(&react_id) {
            return Err(StoreError::InvalidReactId);
        }
        let msg = &mut state.channel_mut(channel)?.messages[idx];
        let users = msg
            .reacts
            .get_mut(&react_id)
            .ok_or(StoreError::NotReacted)?;
        let pos = users
            .iter()
            .position(|u| *u == caller)
            .ok_or(StoreError::NotReacted)?;
        users.remove(pos);
        Ok(())
    }

    pub async fn pin(&self, caller: UserId, message: MessageId) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let (channel, idx) = state
            .live_message(message)
            .ok_or(StoreError::UnknownMessage)?;
        let ch = state.channel(channel)?;
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }
        if !state.has_owner_authority(ch, caller) {
            return Err(StoreError::NotChannelOwner);
        }
        if ch.messages[idx].is_pinned {
            return Err(StoreError::AlreadyPinned);
        }
        state.channel_mut(channel)?.messages[idx].is_pinned = true;
        Ok(())
    }

    pub async fn unpin(&self, caller: UserId, message: MessageId) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let (channel, idx) = state
            .live_message(message)
            .ok_or(StoreError::UnknownMessage)?;
        let ch = state.channel(channel)?;
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }
        if !state.has_owner_authority(ch, caller) {
            return Err(StoreError::NotChannelOwner);
        }
        if !ch.messages[idx].is_pinned {
            return Err(StoreError::NotPinned);
        }
        state.channel_mut(channel)?.messages[idx].is_pinned = false;
        Ok(())
    }

    /// One page of live messages, newest first. `start` counts back
    /// from the newest message; the page reports `end = start + 50`
    /// while older messages remain and `-1` once the history is
    /// exhausted.
    pub async fn messages_page(
        &self,
        caller: UserId,
        channel: ChannelId,
        start: i64,
    ) -> Result<MessagesPage, StoreError> {
        let state = self.inner.read().await;
        let ch = state.channel(channel)?;
        if !ch.is_public && !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }

        let live: Vec<&Message> = ch.messages.iter().filter(|m| !m.removed).collect();
        let total = live.len() as i64;
        if start < 0 || start > total {
            return Err(StoreError::BadStart);
        }

        let messages: Vec<Message> = live
            .into_iter()
            .rev()
            .skip(start as usize)
            .take(PAGE_SIZE as usize)
            .cloned()
            .collect();
        let end = if start + PAGE_SIZE < total {
            start + PAGE_SIZE
        } else {
            -1
        };

        Ok(MessagesPage { messages, start, end })
    }

    /// Case-sensitive substring search across every channel the caller
    /// has joined, in channel-creation then ledger order.
    pub async fn search(&self, caller: UserId, query: &str) -> Vec<Message> {
        let state = self.inner.read().await;
        let mut channels: Vec<&Channel> = state
            .channels
            .values()
            .filter(|c| c.members.contains(&caller))
            .collect();
        channels.sort_by_key(|c| c.seq);
        channels
            .into_iter()
            .flat_map(|c| {
                c.messages
                    .iter()
                    .filter(|m| !m.removed && m.text.contains(query))
                    .cloned()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{channel, register};
    use chrono::Duration;

    #[tokio::test]
    async fn pages_run_newest_first_with_an_end_marker() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ch = channel(&store, ana, "general", true).await;

        for n in 0..80 {
            store.send(ana, ch, &format!("m{n}")).await.unwrap();
        }

        let page = store.messages_page(ana, ch, 0).await.unwrap();
        assert_eq!(page.messages.len(), 50);
        assert_eq!(page.messages[0].text, "m79");
        assert_eq!(page.end, 50);

        let page = store.messages_page(ana, ch, 20).await.unwrap();
        assert_eq!(page.messages.len(), 50);
        assert_eq!(page.messages[0].text, "m59");
        assert_eq!(page.messages[49].text, "m10");
        assert_eq!(page.end, 70);

        let page = store.messages_page(ana, ch, 70).await.unwrap();
        assert_eq!(page.messages.len(), 10);
        assert_eq!(page.end, -1);

        // start may sit exactly at the history's edge, not beyond it.
        let page = store.messages_page(ana, ch, 80).await.unwrap();
        assert!(page.messages.is_empty());
        assert_eq!(page.end, -1);
        assert_eq!(
            store.messages_page(ana, ch, 81).await.unwrap_err(),
            StoreError::BadStart
        );
        assert_eq!(
            store.messages_page(ana, ch, -1).await.unwrap_err(),
            StoreError::BadStart
        );
    }

    #[tokio::test]
    async fn empty_history_pages_cleanly() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ch = channel(&store, ana, "general", true).await;

        let page = store.messages_page(ana, ch, 0).await.unwrap();
        assert!(page.messages.is_empty());
        assert_eq!(page.start, 0);
        assert_eq!(page.end, -1);
    }

    #[tokio::test]
    async fn private_histories_are_member_only() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let open = channel(&store, ana, "open", true).await;
        let secret = channel(&store, ana, "secret", false).await;
        store.send(ana, open, "hello").await.unwrap();
        store.send(ana, secret, "psst").await.unwrap();

        // Public history is readable by any valid session.
        let page = store.messages_page(ben, open, 0).await.unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(
            store.messages_page(ben, secret, 0).await.unwrap_err(),
            StoreError::NotMember
        );
    }

    #[tokio::test]
    async fn send_checks_membership_and_length() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let ch = channel(&store, ana, "general", true).await;

        assert_eq!(
            store.send(ana, ChannelId::generate(), "hi").await.unwrap_err(),
            StoreError::UnknownChannel
        );
        assert_eq!(
            store.send(ben, ch, "hi").await.unwrap_err(),
            StoreError::NotMember
        );
        assert_eq!(
            store.send(ana, ch, "").await.unwrap_err(),
            StoreError::BadMessageLength
        );
        assert_eq!(
            store.send(ana, ch, &"x".repeat(1001)).await.unwrap_err(),
            StoreError::BadMessageLength
        );
        store.send(ana, ch, &"x".repeat(1000)).await.unwrap();
    }

    #[tokio::test]
    async fn removal_tombstones_without_shifting_positions() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ch = channel(&store, ana, "general", true).await;
        store.send(ana, ch, "first").await.unwrap();
        let middle = store.send(ana, ch, "middle").await.unwrap();
        store.send(ana, ch, "last").await.unwrap();

        store.remove(ana, middle).await.unwrap();

        let page = store.messages_page(ana, ch, 0).await.unwrap();
        let texts: Vec<&str> = page.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["last", "first"]);

        // The live count, not the ledger length, bounds `start`.
        assert!(store.messages_page(ana, ch, 2).await.is_ok());
        assert_eq!(
            store.messages_page(ana, ch, 3).await.unwrap_err(),
            StoreError::BadStart
        );

        // A tombstone is gone for every other operation too.
        assert_eq!(
            store.remove(ana, middle).await.unwrap_err(),
            StoreError::UnknownMessage
        );
        assert_eq!(
            store.edit(ana, middle, "back").await.unwrap_err(),
            StoreError::UnknownMessage
        );
        assert_eq!(
            store.react(ana, middle, 1).await.unwrap_err(),
            StoreError::MessageNotJoined
        );
    }

    #[tokio::test]
    async fn edit_rewrites_or_removes_with_the_right_authority() {
        let store = Store::new();
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let cat = register(&store, "cat@mail.com", "Cat", "Cu").await;
        let ch = channel(&store, ben, "general", true).await;
        store.join(cat, ch).await.unwrap();

        let msg = store.send(cat, ch, "draft").await.unwrap();

        assert_eq!(
            store.edit(ben, MessageId::generate(), "x").await.unwrap_err(),
            StoreError::UnknownMessage
        );
        // A plain member cannot touch someone else's message.
        let other = store.send(ben, ch, "note").await.unwrap();
        assert_eq!(
            store.edit(cat, other, "hijack").await.unwrap_err(),
            StoreError::NotMessageAuthor
        );
        assert_eq!(
            store.edit(cat, msg, &"x".repeat(1001)).await.unwrap_err(),
            StoreError::MessageTooLong
        );

        store.edit(cat, msg, "final").await.unwrap();
        // The channel owner may moderate any message.
        store.edit(ben, msg, "moderated").await.unwrap();

        // Empty text removes instead of rewriting.
        store.edit(cat, msg, "").await.unwrap();
        assert_eq!(
            store.edit(cat, msg, "back").await.unwrap_err(),
            StoreError::UnknownMessage
        );
    }

    #[tokio::test]
    async fn owners_and_authors_may_remove() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let cat = register(&store, "cat@mail.com", "Cat", "Cu").await;
        let ch = channel(&store, ben, "general", true).await;
        store.join(cat, ch).await.unwrap();
        store.join(ana, ch).await.unwrap();

        let first = store.send(ben, ch, "one").await.unwrap();
        let second = store.send(ben, ch, "two").await.unwrap();
        let third = store.send(ben, ch, "three").await.unwrap();

        assert_eq!(
            store.remove(cat, first).await.unwrap_err(),
            StoreError::NotMessageAuthor
        );
        store.remove(ben, first).await.unwrap();
        // A platform owner who is a member holds owner authority.
        store.remove(ana, second).await.unwrap();

        store.add_owner(ben, ch, cat).await.unwrap();
        store.remove(cat, third).await.unwrap();

        let page = store.messages_page(ben, ch, 0).await.unwrap();
        assert!(page.messages.is_empty());
    }

    #[tokio::test]
    async fn reactions_validate_membership_and_state() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let ch = channel(&store, ana, "general", true).await;
        let msg = store.send(ana, ch, "hello").await.unwrap();

        // Not being a member reads as the message not existing.
        assert_eq!(
            store.react(ben, msg, 1).await.unwrap_err(),
            StoreError::MessageNotJoined
        );
        assert_eq!(
            store.react(ana, MessageId::generate(), 1).await.unwrap_err(),
            StoreError::MessageNotJoined
        );
        assert_eq!(
            store.react(ana, msg, 2).await.unwrap_err(),
            StoreError::InvalidReactId
        );

        store.react(ana, msg, 1).await.unwrap();
        assert_eq!(
            store.react(ana, msg, 1).await.unwrap_err(),
            StoreError::AlreadyReacted
        );

        store.join(ben, ch).await.unwrap();
        store.react(ben, msg, 1).await.unwrap();

        store.unreact(ana, msg, 1).await.unwrap();
        assert_eq!(
            store.unreact(ana, msg, 1).await.unwrap_err(),
            StoreError::NotReacted
        );

        let page = store.messages_page(ana, ch, 0).await.unwrap();
        assert_eq!(page.messages[0].reacts.get(&1), Some(&vec![ben]));
    }

    #[tokio::test]
    async fn pins_require_owner_authority_inside_the_channel() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let cat = register(&store, "cat@mail.com", "Cat", "Cu").await;
        let ch = channel(&store, ben, "general", true).await;
        store.join(cat, ch).await.unwrap();
        let msg = store.send(ben, ch, "notice").await.unwrap();

        assert_eq!(
            store.pin(ben, MessageId::generate()).await.unwrap_err(),
            StoreError::UnknownMessage
        );
        assert_eq!(
            store.pin(ana, msg).await.unwrap_err(),
            StoreError::NotMember
        );
        assert_eq!(
            store.pin(cat, msg).await.unwrap_err(),
            StoreError::NotChannelOwner
        );

        store.pin(ben, msg).await.unwrap();
        assert_eq!(
            store.pin(ben, msg).await.unwrap_err(),
            StoreError::AlreadyPinned
        );
        assert!(store.messages_page(ben, ch, 0).await.unwrap().messages[0].is_pinned);

        store.unpin(ben, msg).await.unwrap();
        assert_eq!(
            store.unpin(ben, msg).await.unwrap_err(),
            StoreError::NotPinned
        );
    }

    #[tokio::test]
    async fn search_is_scoped_to_joined_channels() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let first = channel(&store, ana, "first", true).await;
        let second = channel(&store, ana, "second", true).await;
        store.join(ben, second).await.unwrap();

        store.send(ana, first, "hello world").await.unwrap();
        let gone = store.send(ana, first, "hello again").await.unwrap();
        store.send(ana, second, "hello there").await.unwrap();
        store.send(ana, second, "unrelated").await.unwrap();
        store.remove(ana, gone).await.unwrap();

        let mine = store.search(ana, "hello").await;
        let texts: Vec<&str> = mine.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hello world", "hello there"]);

        let theirs = store.search(ben, "hello").await;
        assert_eq!(theirs.len(), 1);

        // Substring match is case-sensitive.
        assert!(store.search(ana, "Hello").await.is_empty());
    }

    #[tokio::test]
    async fn scheduled_sends_validate_now_and_deliver_later() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let ch = channel(&store, ana, "general", true).await;

        let future = Utc::now() + Duration::seconds(30);
        assert_eq!(
            store
                .prepare_send_later(ana, ch, "hi", Utc::now() - Duration::seconds(5))
                .await
                .unwrap_err(),
            StoreError::TimeInPast
        );
        assert_eq!(
            store
                .prepare_send_later(ben, ch, "hi", future)
                .await
                .unwrap_err(),
            StoreError::NotMember
        );

        let id = store.prepare_send_later(ana, ch, "later", future).await.unwrap();
        // Until delivery the id points at nothing.
        assert_eq!(
            store.edit(ana, id, "early").await.unwrap_err(),
            StoreError::UnknownMessage
        );
        assert!(store.messages_page(ana, ch, 0).await.unwrap().messages.is_empty());

        store
            .deliver_scheduled(ch, ana, id, "later".into(), future)
            .await;
        let page = store.messages_page(ana, ch, 0).await.unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].sent_at, future);
        store.react(ana, id, 1).await.unwrap();
    }
}
