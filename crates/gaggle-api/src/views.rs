//! Mapping from store models to wire shapes, shared by the handlers.

use gaggle_store::models::{Message, User, UserId, VALID_REACT_IDS};
use gaggle_types::api::{MemberProfile, MessageView, ReactView, UserProfile};

use crate::auth::AppStateInner;

pub(crate) fn photo_url(state: &AppStateInner, user: &User) -> Option<String> {
    user.photo_file
        .as_ref()
        .map(|file| format!("{}/static/{}", state.base_url, file))
}

pub(crate) fn member_view(state: &AppStateInner, user: &User) -> MemberProfile {
    MemberProfile {
        u_id: user.id.0,
        name_first: user.name_first.clone(),
        name_last: user.name_last.clone(),
        profile_img_url: photo_url(state, user),
    }
}

pub(crate) fn profile_view(state: &AppStateInner, user: &User) -> UserProfile {
    UserProfile {
        u_id: user.id.0,
        email: user.email.clone(),
        name_first: user.name_first.clone(),
        name_last: user.name_last.clone(),
        handle_str: user.handle.clone(),
        profile_img_url: photo_url(state, user),
    }
}

/// Every valid react id appears in the view, with or without reactors,
/// and `is_this_user_reacted` is relative to the caller.
pub(crate) fn message_view(message: &Message, caller: UserId) -> MessageView {
    let reacts = VALID_REACT_IDS
        .iter()
        .map(|&react_id| {
            let users = message.reacts.get(&react_id).cloned().unwrap_or_default();
            ReactView {
                react_id,
                is_this_user_reacted: users.contains(&caller),
                u_ids: users.into_iter().map(|u| u.0).collect(),
            }
        })
        .collect();

    MessageView {
        message_id: message.id.0,
        u_id: message.author.0,
        message: message.text.clone(),
        time_created: message.sent_at.timestamp(),
        reacts,
        is_pinned: message.is_pinned,
    }
}
