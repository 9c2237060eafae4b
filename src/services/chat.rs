//! Chat service: chat and thread CRUD, selection, and snapshots.
//!
//! DESIGN
//! ======
//! Every operation takes the chat write lock once, mutates the normalized
//! records, publishes its notification, and then re-checks the in-flight
//! reply. Anything that moves the selection off the reply's thread cancels
//! the reply (see `reply::cancel_if_detached`).
//!
//! Chats and threads are prepended, so the newest shows first. Operations
//! naming a missing chat or thread fail with a not-found error and change
//! nothing.

use tracing::info;
use uuid::Uuid;

use crate::frame::now_ms;
use crate::model::{Chat, ChatSnapshot, Thread};
use crate::services::notify::{self, json, payload};
use crate::services::reply::cancel_if_detached;
use crate::state::{AppState, ChatRecord, ChatState, ThreadRecord};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat not found: {0}")]
    ChatNotFound(Uuid),
    #[error("thread not found: {0}")]
    ThreadNotFound(Uuid),
    #[error("title must not be blank")]
    EmptyTitle,
    #[error("message must not be blank")]
    EmptyMessage,
    #[error("a reply is still being generated")]
    ReplyInProgress,
}

impl crate::frame::ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ChatNotFound(_) => "E_CHAT_NOT_FOUND",
            Self::ThreadNotFound(_) => "E_THREAD_NOT_FOUND",
            Self::EmptyTitle => "E_EMPTY_TITLE",
            Self::EmptyMessage => "E_EMPTY_MESSAGE",
            Self::ReplyInProgress => "E_REPLY_IN_PROGRESS",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ReplyInProgress)
    }
}

pub(crate) fn validate_title(title: &str) -> Result<String, ChatError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ChatError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// CREATE
// =============================================================================

/// Insert a new expanded chat at the front. Does not publish.
pub(crate) fn insert_chat(chats: &mut ChatState, title: String) -> Uuid {
    let chat_id = Uuid::new_v4();
    chats.chats.insert(
        chat_id,
        ChatRecord { id: chat_id, title, created_at: now_ms(), is_expanded: true, thread_ids: Vec::new() },
    );
    chats.chat_order.insert(0, chat_id);
    chat_id
}

/// Insert a new thread at the front of an existing chat. Does not publish.
pub(crate) fn insert_thread(chats: &mut ChatState, chat_id: Uuid, title: String) -> Result<Uuid, ChatError> {
    let chat = chats
        .chats
        .get_mut(&chat_id)
        .ok_or(ChatError::ChatNotFound(chat_id))?;
    let thread_id = Uuid::new_v4();
    chat.thread_ids.insert(0, thread_id);
    chat.is_expanded = true;
    chats.threads.insert(
        thread_id,
        ThreadRecord { id: thread_id, chat_id, title, created_at: now_ms(), messages: Vec::new() },
    );
    Ok(thread_id)
}

/// Create a chat and select it. No thread is selected until one is created.
///
/// # Errors
///
/// Returns `EmptyTitle` for a blank title.
pub async fn create_chat(state: &AppState, title: &str) -> Result<Chat, ChatError> {
    let title = validate_title(title)?;
    let mut chats = state.chats.write().await;

    let chat_id = insert_chat(&mut chats, title);
    chats.current_chat_id = Some(chat_id);
    chats.current_thread_id = None;
    chats.is_new_chat = false;

    let chat = chats.chat(chat_id).ok_or(ChatError::ChatNotFound(chat_id))?;
    notify::emit(state, "chat:create", payload([("chat", json(&chat))]));
    cancel_if_detached(state, &mut chats);
    info!(%chat_id, title = %chat.title, "chat created");
    Ok(chat)
}

/// Create a thread at the front of a chat, expand the chat, and select both.
///
/// # Errors
///
/// Returns `EmptyTitle` for a blank title and `ChatNotFound` for an unknown chat.
pub async fn create_thread(state: &AppState, chat_id: Uuid, title: &str) -> Result<Thread, ChatError> {
    let title = validate_title(title)?;
    let mut chats = state.chats.write().await;

    let thread_id = insert_thread(&mut chats, chat_id, title)?;
    chats.current_chat_id = Some(chat_id);
    chats.current_thread_id = Some(thread_id);
    chats.is_new_chat = false;

    let thread = chats.thread(thread_id).ok_or(ChatError::ThreadNotFound(thread_id))?;
    notify::emit(state, "thread:create", payload([("chatId", json(&chat_id)), ("thread", json(&thread))]));
    cancel_if_detached(state, &mut chats);
    info!(%chat_id, %thread_id, "thread created");
    Ok(thread)
}

// =============================================================================
// DELETE
// =============================================================================

/// Delete a chat and its threads. Deleting the selected chat selects the
/// first remaining chat, or nothing, and always clears the thread selection.
///
/// # Errors
///
/// Returns `ChatNotFound` for an unknown chat.
pub async fn delete_chat(state: &AppState, chat_id: Uuid) -> Result<(), ChatError> {
    let mut chats = state.chats.write().await;
    let record = chats
        .chats
        .remove(&chat_id)
        .ok_or(ChatError::ChatNotFound(chat_id))?;
    for thread_id in &record.thread_ids {
        chats.threads.remove(thread_id);
    }
    chats.chat_order.retain(|id| *id != chat_id);

    if chats.current_chat_id == Some(chat_id) {
        let next_chat = chats.chat_order.first().copied();
        chats.current_chat_id = next_chat;
        chats.current_thread_id = None;
    }

    notify::emit(
        state,
        "chat:delete",
        payload([
            ("chatId", json(&chat_id)),
            ("currentChatId", json(&chats.current_chat_id)),
            ("currentThreadId", json(&chats.current_thread_id)),
        ]),
    );
    cancel_if_detached(state, &mut chats);
    info!(%chat_id, threads = record.thread_ids.len(), "chat deleted");
    Ok(())
}

/// Delete a thread. Deleting the selected thread selects the first remaining
/// thread of the same chat, or nothing.
///
/// # Errors
///
/// Returns `ChatNotFound` for an unknown chat and `ThreadNotFound` when the
/// thread does not belong to it.
pub async fn delete_thread(state: &AppState, chat_id: Uuid, thread_id: Uuid) -> Result<(), ChatError> {
    let mut chats = state.chats.write().await;
    let chat = chats
        .chats
        .get_mut(&chat_id)
        .ok_or(ChatError::ChatNotFound(chat_id))?;
    let Some(position) = chat.thread_ids.iter().position(|id| *id == thread_id) else {
        return Err(ChatError::ThreadNotFound(thread_id));
    };
    chat.thread_ids.remove(position);
    chats.threads.remove(&thread_id);

    if chats.current_thread_id == Some(thread_id) {
        let next_thread = chats.first_thread_of(chat_id);
        chats.current_thread_id = next_thread;
    }

    notify::emit(
        state,
        "thread:delete",
        payload([
            ("chatId", json(&chat_id)),
            ("threadId", json(&thread_id)),
            ("currentThreadId", json(&chats.current_thread_id)),
        ]),
    );
    cancel_if_detached(state, &mut chats);
    info!(%chat_id, %thread_id, "thread deleted");
    Ok(())
}

// =============================================================================
// RENAME
// =============================================================================

/// Rename a chat. Threads are untouched.
///
/// # Errors
///
/// Returns `EmptyTitle` for a blank title and `ChatNotFound` for an unknown chat.
pub async fn update_chat_title(state: &AppState, chat_id: Uuid, title: &str) -> Result<(), ChatError> {
    let title = validate_title(title)?;
    let mut chats = state.chats.write().await;
    let chat = chats
        .chats
        .get_mut(&chat_id)
        .ok_or(ChatError::ChatNotFound(chat_id))?;
    chat.title = title;
    notify::emit(state, "chat:rename", payload([("chatId", json(&chat_id)), ("title", json(&chat.title))]));
    Ok(())
}

/// Rename a thread. Messages are untouched.
///
/// # Errors
///
/// Returns `EmptyTitle` for a blank title, `ChatNotFound` for an unknown chat,
/// and `ThreadNotFound` when the thread does not belong to it.
pub async fn update_thread_title(state: &AppState, chat_id: Uuid, thread_id: Uuid, title: &str) -> Result<(), ChatError> {
    let title = validate_title(title)?;
    let mut chats = state.chats.write().await;
    if !chats.chats.contains_key(&chat_id) {
        return Err(ChatError::ChatNotFound(chat_id));
    }
    let thread = chats
        .threads
        .get_mut(&thread_id)
        .filter(|t| t.chat_id == chat_id)
        .ok_or(ChatError::ThreadNotFound(thread_id))?;
    thread.title = title;
    notify::emit(
        state,
        "thread:rename",
        payload([("chatId", json(&chat_id)), ("threadId", json(&thread_id)), ("title", json(&thread.title))]),
    );
    Ok(())
}

// =============================================================================
// SELECTION
// =============================================================================

/// Select a chat and its first thread, leaving staged mode.
///
/// # Errors
///
/// Returns `ChatNotFound` for an unknown chat.
pub async fn set_current_chat(state: &AppState, chat_id: Uuid) -> Result<(), ChatError> {
    let mut chats = state.chats.write().await;
    let first_thread = chats
        .chats
        .get(&chat_id)
        .ok_or(ChatError::ChatNotFound(chat_id))?
        .thread_ids
        .first()
        .copied();
    chats.current_chat_id = Some(chat_id);
    chats.current_thread_id = first_thread;
    chats.is_new_chat = false;

    notify::emit(
        state,
        "chat:select",
        payload([("chatId", json(&chat_id)), ("currentThreadId", json(&first_thread))]),
    );
    cancel_if_detached(state, &mut chats);
    Ok(())
}

/// Select a thread and the chat that owns it, leaving staged mode.
///
/// # Errors
///
/// Returns `ChatNotFound` for an unknown chat and `ThreadNotFound` when the
/// thread does not belong to it.
pub async fn set_current_thread(state: &AppState, chat_id: Uuid, thread_id: Uuid) -> Result<(), ChatError> {
    let mut chats = state.chats.write().await;
    if !chats.chats.contains_key(&chat_id) {
        return Err(ChatError::ChatNotFound(chat_id));
    }
    if chats.threads.get(&thread_id).is_none_or(|t| t.chat_id != chat_id) {
        return Err(ChatError::ThreadNotFound(thread_id));
    }
    chats.current_chat_id = Some(chat_id);
    chats.current_thread_id = Some(thread_id);
    chats.is_new_chat = false;

    notify::emit(state, "thread:select", payload([("chatId", json(&chat_id)), ("threadId", json(&thread_id))]));
    cancel_if_detached(state, &mut chats);
    Ok(())
}

/// Enter staged mode: nothing is selected and the next message creates the
/// chat.
pub async fn start_new_chat(state: &AppState) {
    let mut chats = state.chats.write().await;
    chats.is_new_chat = true;
    chats.current_chat_id = None;
    chats.current_thread_id = None;
    notify::emit(state, "chat:new", payload([]));
    cancel_if_detached(state, &mut chats);
}

/// Flip a chat's expanded flag. Returns the new value.
///
/// # Errors
///
/// Returns `ChatNotFound` for an unknown chat.
pub async fn toggle_chat_expansion(state: &AppState, chat_id: Uuid) -> Result<bool, ChatError> {
    let mut chats = state.chats.write().await;
    let chat = chats
        .chats
        .get_mut(&chat_id)
        .ok_or(ChatError::ChatNotFound(chat_id))?;
    chat.is_expanded = !chat.is_expanded;
    let expanded = chat.is_expanded;
    notify::emit(state, "chat:toggle", payload([("chatId", json(&chat_id)), ("isExpanded", json(&expanded))]));
    Ok(expanded)
}

// =============================================================================
// READ
// =============================================================================

/// Materialize the whole chat tree with selection and flags.
pub async fn snapshot(state: &AppState) -> ChatSnapshot {
    let chats = state.chats.read().await;
    ChatSnapshot {
        chats: chats.ordered_chats(),
        current_chat_id: chats.current_chat_id,
        current_thread_id: chats.current_thread_id,
        is_generating_response: chats.is_generating_response(),
        is_new_chat: chats.is_new_chat,
    }
}

/// The selected thread, if any.
pub async fn current_thread(state: &AppState) -> Option<Thread> {
    let chats = state.chats.read().await;
    chats.current_thread_id.and_then(|id| chats.thread(id))
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
