//! Message service: user sends and the reply they trigger.
//!
//! DESIGN
//! ======
//! `send_message` appends the user message, marks the store as generating,
//! and spawns the reply task, all under one write lock, so a second send can
//! never slip in before the flag is raised. `add_message` is the awaiting
//! form: it sends and then waits for the reply to finish.
//!
//! In staged "new chat" mode the first message creates the chat. Its title is
//! the first `chat_title_max_chars` characters of the message, with `...`
//! appended when truncated, and it gets a single thread named
//! `Conversation`.

use tracing::info;

use crate::model::Message;
use crate::services::chat::{ChatError, insert_chat, insert_thread};
use crate::services::notify::{self, json, payload};
use crate::services::reply::{ReplyHandle, ReplyOutcome, spawn_reply};
use crate::state::AppState;

/// Thread title used for chats created by their first message.
pub const STAGED_THREAD_TITLE: &str = "Conversation";

/// Chat title derived from a first message.
#[must_use]
pub fn staged_chat_title(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}

/// Append a user message to the selected thread and start the reply.
///
/// Returns `Ok(None)` when no thread is selected outside staged mode.
///
/// # Errors
///
/// Returns `EmptyMessage` for blank content and `ReplyInProgress` while a
/// previous reply is still streaming.
pub async fn send_message(state: &AppState, content: &str) -> Result<Option<ReplyHandle>, ChatError> {
    if content.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }

    let mut guard = state.chats.write().await;
    let chats = &mut *guard;
    if chats.is_generating_response() {
        return Err(ChatError::ReplyInProgress);
    }

    if chats.is_new_chat {
        let title = staged_chat_title(content, state.config.chat_title_max_chars);
        let chat_id = insert_chat(chats, title);
        let thread_id = insert_thread(chats, chat_id, STAGED_THREAD_TITLE.to_string())?;
        chats.current_chat_id = Some(chat_id);
        chats.current_thread_id = Some(thread_id);
        chats.is_new_chat = false;

        let chat = chats.chat(chat_id).ok_or(ChatError::ChatNotFound(chat_id))?;
        notify::emit(state, "chat:create", payload([("chat", json(&chat))]));
        info!(%chat_id, %thread_id, title = %chat.title, "staged chat created");
    }

    let (Some(chat_id), Some(thread_id)) = (chats.current_chat_id, chats.current_thread_id) else {
        return Ok(None);
    };
    let thread = chats
        .threads
        .get_mut(&thread_id)
        .ok_or(ChatError::ThreadNotFound(thread_id))?;

    let message = Message::user(content);
    let user_message_id = message.id;
    thread.messages.push(message.clone());
    notify::emit(
        state,
        "message:create",
        payload([("chatId", json(&chat_id)), ("threadId", json(&thread_id)), ("message", json(&message))]),
    );
    info!(%chat_id, %thread_id, %user_message_id, "user message sent");

    Ok(Some(spawn_reply(state, chats, chat_id, thread_id, user_message_id, content)))
}

/// Send a message and wait for its reply to finish.
///
/// Returns `Ok(None)` when the send was a no-op.
///
/// # Errors
///
/// Same as [`send_message`].
pub async fn add_message(state: &AppState, content: &str) -> Result<Option<ReplyOutcome>, ChatError> {
    let Some(handle) = send_message(state, content).await? else {
        return Ok(None);
    };
    Ok(Some(handle.wait().await))
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
