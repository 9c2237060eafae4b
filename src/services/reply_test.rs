use std::time::Duration;

use super::*;
use crate::config::StoreConfig;
use crate::model::Role;
use crate::services::{chat, message, notify};
use crate::state::test_helpers;

const WAIT: Duration = Duration::from_secs(5);

/// Ticks slow enough that a test can act between two of them.
fn slow_state() -> AppState {
    AppState::new(StoreConfig {
        reply_start_delay: Duration::from_millis(5),
        reply_tick: Duration::from_millis(20),
        ..StoreConfig::for_tests()
    })
}

/// Block until the first word has been revealed.
async fn wait_for_first_delta(rx: &mut tokio::sync::mpsc::Receiver<crate::frame::Frame>) {
    tokio::time::timeout(WAIT, async {
        while let Some(frame) = rx.recv().await {
            if frame.syscall == "message:delta" {
                return;
            }
        }
    })
    .await
    .unwrap();
}

async fn assistant_content(state: &AppState, thread_id: Uuid) -> Option<String> {
    let chats = state.chats.read().await;
    chats
        .thread(thread_id)?
        .messages
        .into_iter()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.content)
}

#[test]
fn canned_response_quotes_prompt() {
    let text = canned_response("Hi");
    assert!(text.starts_with("This is a simulated response to: \"Hi\"."));
    assert!(text.ends_with("3. Test thoroughly before deployment"));
    assert!(text.contains("\n\n1. Consider implementing this feature\n2."));
}

#[tokio::test]
async fn switching_threads_cancels_and_keeps_partial_content() {
    let state = slow_state();
    let (chat_id, thread_id) = test_helpers::seed_chat_with_thread(&state).await;
    let (_, mut rx) = notify::subscribe(&state);

    let handle = message::send_message(&state, "Hi").await.unwrap().unwrap();
    wait_for_first_delta(&mut rx).await;

    let other = chat::create_thread(&state, chat_id, "Other").await.unwrap();
    assert_eq!(handle.outcome(), Some(ReplyOutcome::Cancelled));
    assert_eq!(tokio::time::timeout(WAIT, handle.wait()).await.unwrap(), ReplyOutcome::Cancelled);

    let partial = assistant_content(&state, thread_id).await.unwrap();
    assert!(!partial.is_empty());
    assert_ne!(partial, canned_response("Hi"));
    assert!(!chat::snapshot(&state).await.is_generating_response);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(assistant_content(&state, thread_id).await.unwrap(), partial, "no writes after cancel");
    assert!(state.chats.read().await.thread(other.id).unwrap().messages.is_empty());

    let mut trailing = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        trailing.push(frame.syscall);
    }
    assert!(trailing.contains(&"message:cancel".to_string()));
    assert!(!trailing.contains(&"message:done".to_string()));
}

#[tokio::test]
async fn cancel_before_placeholder_leaves_only_user_message() {
    let state = AppState::new(StoreConfig {
        reply_start_delay: Duration::from_millis(30),
        ..StoreConfig::for_tests()
    });
    let (_, thread_id) = test_helpers::seed_chat_with_thread(&state).await;

    let handle = message::send_message(&state, "Hi").await.unwrap().unwrap();
    chat::start_new_chat(&state).await;
    assert_eq!(handle.outcome(), Some(ReplyOutcome::Cancelled));

    tokio::time::sleep(Duration::from_millis(80)).await;
    let thread = state.chats.read().await.thread(thread_id).unwrap();
    assert_eq!(thread.messages.len(), 1);
    assert_eq!(thread.messages[0].role, Role::User);
}

#[tokio::test]
async fn deleting_target_thread_cancels_reply() {
    let state = slow_state();
    let (chat_id, thread_id) = test_helpers::seed_chat_with_thread(&state).await;
    let (_, mut rx) = notify::subscribe(&state);

    let handle = message::send_message(&state, "Hi").await.unwrap().unwrap();
    wait_for_first_delta(&mut rx).await;
    chat::delete_thread(&state, chat_id, thread_id).await.unwrap();

    assert_eq!(tokio::time::timeout(WAIT, handle.wait()).await.unwrap(), ReplyOutcome::Cancelled);
    assert!(state.chats.read().await.reply.is_none());
}

#[tokio::test]
async fn deleting_reply_chat_cancels_reply() {
    let state = slow_state();
    let other = chat::create_chat(&state, "Other").await.unwrap();
    let (chat_id, _) = test_helpers::seed_chat_with_thread(&state).await;
    let (_, mut rx) = notify::subscribe(&state);

    let handle = message::send_message(&state, "Hi").await.unwrap().unwrap();
    wait_for_first_delta(&mut rx).await;
    chat::delete_chat(&state, chat_id).await.unwrap();

    assert_eq!(tokio::time::timeout(WAIT, handle.wait()).await.unwrap(), ReplyOutcome::Cancelled);
    let snap = chat::snapshot(&state).await;
    assert_eq!(snap.current_chat_id, Some(other.id));
    assert_eq!(snap.current_thread_id, None);
    assert!(!snap.is_generating_response);
}

#[tokio::test]
async fn generating_flag_stays_raised_while_streaming() {
    let state = slow_state();
    let (_, thread_id) = test_helpers::seed_chat_with_thread(&state).await;
    let (_, mut rx) = notify::subscribe(&state);

    let handle = message::send_message(&state, "Hi").await.unwrap().unwrap();
    wait_for_first_delta(&mut rx).await;

    assert!(chat::snapshot(&state).await.is_generating_response);
    let partial = assistant_content(&state, thread_id).await.unwrap();
    assert!(!partial.is_empty());
    assert_ne!(partial, canned_response("Hi"));

    assert_eq!(tokio::time::timeout(WAIT, handle.wait()).await.unwrap(), ReplyOutcome::Completed);
    assert!(!chat::snapshot(&state).await.is_generating_response);
}

#[tokio::test]
async fn reselecting_same_thread_keeps_streaming() {
    let state = test_helpers::test_app_state();
    let (chat_id, thread_id) = test_helpers::seed_chat_with_thread(&state).await;

    let handle = message::send_message(&state, "Hi").await.unwrap().unwrap();
    chat::set_current_thread(&state, chat_id, thread_id).await.unwrap();
    chat::update_chat_title(&state, chat_id, "Renamed").await.unwrap();

    assert_eq!(tokio::time::timeout(WAIT, handle.wait()).await.unwrap(), ReplyOutcome::Completed);
}

#[tokio::test]
async fn cancel_reply_without_reply_is_noop() {
    let state = test_helpers::test_app_state();
    assert!(!cancel_reply(&state).await);
}

#[tokio::test]
async fn explicit_cancel_then_new_send() {
    let state = slow_state();
    test_helpers::seed_chat_with_thread(&state).await;

    let handle = message::send_message(&state, "first").await.unwrap().unwrap();
    assert!(cancel_reply(&state).await);
    assert!(!cancel_reply(&state).await, "only one finisher");
    assert_eq!(handle.wait().await, ReplyOutcome::Cancelled);

    let outcome = tokio::time::timeout(WAIT, message::add_message(&state, "second")).await.unwrap().unwrap();
    assert_eq!(outcome, Some(ReplyOutcome::Completed));
}

#[tokio::test]
async fn shutdown_cancels_in_flight_reply() {
    let state = slow_state();
    test_helpers::seed_chat_with_thread(&state).await;

    let handle = message::send_message(&state, "Hi").await.unwrap().unwrap();
    state.shutdown().await;

    assert_eq!(tokio::time::timeout(WAIT, handle.wait()).await.unwrap(), ReplyOutcome::Cancelled);
    assert!(!chat::snapshot(&state).await.is_generating_response);
}
