//! Streaming reply task.
//!
//! DESIGN
//! ======
//! A reply is a tokio task owned by the chat store. It waits the configured
//! start delay, appends an empty assistant placeholder, then reveals one
//! more word of the canned response every tick. Each step takes the chat
//! write lock once and holds no await inside, so a tick is an atomic state
//! replacement.
//!
//! The task's `JoinHandle` lives in `ChatState::reply`. Whoever takes the
//! reply out of the state under the lock is the single finisher: the task
//! itself on completion, or `cancel_reply_locked` when the selection moves
//! away, the target thread disappears, or the state shuts down. Every step
//! re-checks that its reply id still owns `ChatState::reply` before writing,
//! so a cancelled task never touches the thread again.
//!
//! Waiters observe the outcome through a `watch` channel.

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::Message;
use crate::services::notify::{self, json, payload};
use crate::state::{AppState, ChatState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyOutcome {
    /// Every word was revealed.
    Completed,
    /// Stopped early. Revealed content stays in the thread.
    Cancelled,
}

/// The in-flight reply as stored in `ChatState`.
#[derive(Debug)]
pub struct ReplyTask {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub thread_id: Uuid,
    /// Set once the assistant placeholder exists.
    pub message_id: Option<Uuid>,
    handle: Option<JoinHandle<()>>,
    outcome_tx: watch::Sender<Option<ReplyOutcome>>,
}

/// Returned to the sender of a message. Resolves when the reply finishes.
#[derive(Debug)]
pub struct ReplyHandle {
    pub chat_id: Uuid,
    pub thread_id: Uuid,
    pub user_message_id: Uuid,
    outcome_rx: watch::Receiver<Option<ReplyOutcome>>,
}

impl ReplyHandle {
    /// Wait for the reply to finish. A reply dropped without an outcome
    /// counts as cancelled.
    pub async fn wait(mut self) -> ReplyOutcome {
        let outcome = match self.outcome_rx.wait_for(Option::is_some).await {
            Ok(seen) => *seen,
            Err(_) => None,
        };
        outcome.unwrap_or(ReplyOutcome::Cancelled)
    }

    /// The outcome if the reply already finished.
    #[must_use]
    pub fn outcome(&self) -> Option<ReplyOutcome> {
        *self.outcome_rx.borrow()
    }
}

/// The canned assistant text for a prompt.
#[must_use]
pub fn canned_response(prompt: &str) -> String {
    format!(
        "This is a simulated response to: \"{prompt}\". In a real app, this would come from an AI API. Here are some thoughts:\n\n1. Consider implementing this feature\n2. Think about user experience\n3. Test thoroughly before deployment"
    )
}

// =============================================================================
// START
// =============================================================================

/// Spawn the reply task for a freshly appended user message. The caller
/// holds the chat write lock, so the task cannot observe the state before
/// `chats.reply` is installed.
pub(crate) fn spawn_reply(
    state: &AppState,
    chats: &mut ChatState,
    chat_id: Uuid,
    thread_id: Uuid,
    user_message_id: Uuid,
    prompt: &str,
) -> ReplyHandle {
    let reply_id = Uuid::new_v4();
    let (outcome_tx, outcome_rx) = watch::channel(None);
    let handle = tokio::spawn(run_reply(state.clone(), reply_id, thread_id, canned_response(prompt)));

    chats.reply = Some(ReplyTask { id: reply_id, chat_id, thread_id, message_id: None, handle: Some(handle), outcome_tx });
    info!(%reply_id, %chat_id, %thread_id, "reply started");

    ReplyHandle { chat_id, thread_id, user_message_id, outcome_rx }
}

fn owns_reply(chats: &ChatState, reply_id: Uuid) -> bool {
    chats.reply.as_ref().is_some_and(|r| r.id == reply_id)
}

async fn run_reply(state: AppState, reply_id: Uuid, thread_id: Uuid, response: String) {
    tokio::time::sleep(state.config.reply_start_delay).await;

    let message_id = {
        let mut guard = state.chats.write().await;
        let chats = &mut *guard;
        if !owns_reply(chats, reply_id) {
            return;
        }
        let Some(thread) = chats.threads.get_mut(&thread_id) else {
            warn!(%reply_id, %thread_id, "reply target vanished before start");
            finish_locked(&state, chats, ReplyOutcome::Cancelled);
            return;
        };

        let placeholder = Message::assistant("");
        let message_id = placeholder.id;
        let chat_id = thread.chat_id;
        thread.messages.push(placeholder.clone());
        if let Some(reply) = chats.reply.as_mut() {
            reply.message_id = Some(message_id);
        }
        notify::emit(
            &state,
            "message:create",
            payload([
                ("chatId", json(&chat_id)),
                ("threadId", json(&thread_id)),
                ("message", json(&placeholder)),
            ]),
        );
        message_id
    };

    let words: Vec<&str> = response.split(' ').collect();
    for revealed in 1..=words.len() {
        tokio::time::sleep(state.config.reply_tick).await;

        let mut guard = state.chats.write().await;
        let chats = &mut *guard;
        if !owns_reply(chats, reply_id) {
            return;
        }
        let message = chats
            .threads
            .get_mut(&thread_id)
            .and_then(|t| t.messages.iter_mut().find(|m| m.id == message_id));
        let Some(message) = message else {
            warn!(%reply_id, %thread_id, "reply target vanished mid-stream");
            finish_locked(&state, chats, ReplyOutcome::Cancelled);
            return;
        };

        message.content = words[..revealed].join(" ");
        notify::emit(
            &state,
            "message:delta",
            payload([
                ("threadId", json(&thread_id)),
                ("messageId", json(&message_id)),
                ("content", json(&message.content)),
            ]),
        );

        if revealed == words.len() {
            finish_locked(&state, chats, ReplyOutcome::Completed);
        }
    }
}

// =============================================================================
// FINISH
// =============================================================================

/// Take the reply out of the state, resolve waiters, and publish the
/// terminal notification. Returns false when no reply was in flight.
fn finish_locked(state: &AppState, chats: &mut ChatState, outcome: ReplyOutcome) -> bool {
    let Some(mut reply) = chats.reply.take() else {
        return false;
    };
    if outcome == ReplyOutcome::Cancelled {
        if let Some(handle) = reply.handle.take() {
            handle.abort();
        }
    }
    reply.outcome_tx.send_replace(Some(outcome));

    let syscall = match outcome {
        ReplyOutcome::Completed => "message:done",
        ReplyOutcome::Cancelled => "message:cancel",
    };
    notify::emit(
        state,
        syscall,
        payload([
            ("chatId", json(&reply.chat_id)),
            ("threadId", json(&reply.thread_id)),
            ("messageId", json(&reply.message_id)),
        ]),
    );
    info!(reply_id = %reply.id, thread_id = %reply.thread_id, ?outcome, "reply finished");
    true
}

/// Cancel the in-flight reply while already holding the chat lock.
pub(crate) fn cancel_reply_locked(state: &AppState, chats: &mut ChatState) -> bool {
    finish_locked(state, chats, ReplyOutcome::Cancelled)
}

/// Cancel the reply when its thread is no longer selected or no longer
/// exists. Called after every selection change.
pub(crate) fn cancel_if_detached(state: &AppState, chats: &mut ChatState) -> bool {
    let Some(reply) = chats.reply.as_ref() else {
        return false;
    };
    let detached = chats.current_thread_id != Some(reply.thread_id) || !chats.threads.contains_key(&reply.thread_id);
    detached && cancel_reply_locked(state, chats)
}

/// Cancel the in-flight reply, if any. Partially revealed content stays.
pub async fn cancel_reply(state: &AppState) -> bool {
    let mut chats = state.chats.write().await;
    cancel_reply_locked(state, &mut chats)
}

#[cfg(test)]
#[path = "reply_test.rs"]
mod tests;
