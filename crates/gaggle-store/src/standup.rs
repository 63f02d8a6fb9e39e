use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::StoreError;
use crate::models::{ChannelId, MessageId, Standup, UserId};
use crate::{State, Store};

impl State {
    /// Take the channel's standup and post its summary as one message
    /// from the starter. An empty buffer flushes to nothing.
    fn collect_standup(&mut self, channel: ChannelId) -> Option<MessageId> {
        let standup = self.channels.get_mut(&channel)?.standup.take()?;
        if standup.notes.is_empty() {
            return None;
        }
        let summary = standup
            .notes
            .iter()
            .map(|(user, text)| {
                let handle = self
                    .users
                    .get(user)
                    .map(|u| u.handle.as_str())
                    .unwrap_or("?");
                format!("{handle}: {text}")
            })
            .collect::<Vec<_>>()
            .join("\n");
        let id = MessageId::generate();
        self.append_message(channel, id, standup.starter, summary, Utc::now());
        Some(id)
    }
}

impl Store {
    /// Open a standup window `length_secs` long. Returns when it ends;
    /// the caller is responsible for scheduling the flush.
    pub async fn standup_start(
        &self,
        caller: UserId,
        channel: ChannelId,
        length_secs: i64,
    ) -> Result<DateTime<Utc>, StoreError> {
        let mut state = self.inner.write().await;
        let ch = state.channel(channel)?;
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }
        if length_secs <= 0 {
            return Err(StoreError::BadStandupLength);
        }
        let now = Utc::now();
        if ch.standup.as_ref().is_some_and(|s| s.finish_at > now) {
            return Err(StoreError::StandupRunning);
        }
        if ch.standup.is_some() {
            // Expired but not yet collected by its flush task; post its
            // notes before they get overwritten.
            state.collect_standup(channel);
        }

        let finish_at = Duration::try_seconds(length_secs)
            .and_then(|len| now.checked_add_signed(len))
            .ok_or(StoreError::BadStandupLength)?;
        state.channel_mut(channel)?.standup = Some(Standup {
            starter: caller,
            finish_at,
            notes: Vec::new(),
        });
        info!("standup started in channel {channel}, finishes {finish_at}");
        Ok(finish_at)
    }

    /// The finish time of the running standup, if one is active right
    /// now.
    pub async fn standup_active(
        &self,
        channel: ChannelId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let state = self.inner.read().await;
        let ch = state.channel(channel)?;
        let now = Utc::now();
        Ok(ch
            .standup
            .as_ref()
            .filter(|s| s.finish_at > now)
            .map(|s| s.finish_at))
    }

    /// Buffer a note into the running standup.
    pub async fn standup_send(
        &self,
        caller: UserId,
        channel: ChannelId,
        text: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let ch = state.channel(channel)?;
        if !ch.members.contains(&caller) {
            return Err(StoreError::NotMember);
        }
        if !ch.standup.as_ref().is_some_and(|s| s.finish_at > Utc::now()) {
            return Err(StoreError::NoStandup);
        }
        if text.chars().count() > 1000 {
            return Err(StoreError::MessageTooLong);
        }
        if let Some(standup) = state.channel_mut(channel)?.standup.as_mut() {
            standup.notes.push((caller, text.to_string()));
        }
        Ok(())
    }

    /// Flush the standup that ends at `finish_at`. A mismatch means the
    /// standup was already replaced and this flush is stale.
    pub async fn flush_standup(
        &self,
        channel: ChannelId,
        finish_at: DateTime<Utc>,
    ) -> Option<MessageId> {
        let mut state = self.inner.write().await;
        let current = state
            .channels
            .get(&channel)
            .and_then(|c| c.standup.as_ref())
            .is_some_and(|s| s.finish_at == finish_at);
        if !current {
            return None;
        }
        state.collect_standup(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{channel, register};

    #[tokio::test]
    async fn standup_start_validates_and_reports_finish() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let ch = channel(&store, ana, "general", true).await;

        assert_eq!(
            store
                .standup_start(ana, ChannelId::generate(), 60)
                .await
                .unwrap_err(),
            StoreError::UnknownChannel
        );
        assert_eq!(
            store.standup_start(ben, ch, 60).await.unwrap_err(),
            StoreError::NotMember
        );
        assert_eq!(
            store.standup_start(ana, ch, 0).await.unwrap_err(),
            StoreError::BadStandupLength
        );
        // Lengths too large for the clock to represent are bad input,
        // not a crash.
        assert_eq!(
            store.standup_start(ana, ch, i64::MAX).await.unwrap_err(),
            StoreError::BadStandupLength
        );

        let finish = store.standup_start(ana, ch, 60).await.unwrap();
        assert_eq!(store.standup_active(ch).await.unwrap(), Some(finish));
        assert_eq!(
            store.standup_start(ana, ch, 60).await.unwrap_err(),
            StoreError::StandupRunning
        );
    }

    #[tokio::test]
    async fn notes_flush_as_one_summary_from_the_starter() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let ch = channel(&store, ana, "general", true).await;
        store.join(ben, ch).await.unwrap();

        let finish = store.standup_start(ana, ch, 60).await.unwrap();
        store.standup_send(ana, ch, "shipped the list view").await.unwrap();
        store.standup_send(ben, ch, "reviewing").await.unwrap();

        let posted = store.flush_standup(ch, finish).await.unwrap();
        assert_eq!(store.standup_active(ch).await.unwrap(), None);

        let page = store.messages_page(ana, ch, 0).await.unwrap();
        assert_eq!(page.messages.len(), 1);
        let summary = &page.messages[0];
        assert_eq!(summary.id, posted);
        assert_eq!(summary.author, ana);
        assert_eq!(summary.text, "AnaAu: shipped the list view\nBenBu: reviewing");
    }

    #[tokio::test]
    async fn standup_send_needs_a_running_standup() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ben = register(&store, "ben@mail.com", "Ben", "Bu").await;
        let ch = channel(&store, ana, "general", true).await;

        assert_eq!(
            store.standup_send(ana, ch, "early").await.unwrap_err(),
            StoreError::NoStandup
        );

        store.standup_start(ana, ch, 60).await.unwrap();
        assert_eq!(
            store.standup_send(ben, ch, "hi").await.unwrap_err(),
            StoreError::NotMember
        );
        assert_eq!(
            store
                .standup_send(ana, ch, &"x".repeat(1001))
                .await
                .unwrap_err(),
            StoreError::MessageTooLong
        );
        store.standup_send(ana, ch, "fine").await.unwrap();
    }

    #[tokio::test]
    async fn empty_standups_flush_to_nothing() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ch = channel(&store, ana, "general", true).await;

        let finish = store.standup_start(ana, ch, 60).await.unwrap();
        assert!(store.flush_standup(ch, finish).await.is_none());
        assert!(store.messages_page(ana, ch, 0).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn stale_flushes_leave_the_standup_alone() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ch = channel(&store, ana, "general", true).await;

        let finish = store.standup_start(ana, ch, 60).await.unwrap();
        let stale = finish + Duration::seconds(1);
        assert!(store.flush_standup(ch, stale).await.is_none());
        assert_eq!(store.standup_active(ch).await.unwrap(), Some(finish));
    }

    #[tokio::test]
    async fn expired_standups_go_inactive_and_flush_on_replacement() {
        let store = Store::new();
        let ana = register(&store, "ana@mail.com", "Ana", "Au").await;
        let ch = channel(&store, ana, "general", true).await;

        store.standup_start(ana, ch, 1).await.unwrap();
        store.standup_send(ana, ch, "quick note").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert_eq!(store.standup_active(ch).await.unwrap(), None);

        // Starting the next standup posts the uncollected notes first.
        store.standup_start(ana, ch, 60).await.unwrap();
        let page = store.messages_page(ana, ch, 0).await.unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].text, "AnaAu: quick note");
    }
}
