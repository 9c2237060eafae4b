use std::time::Duration;

use super::*;
use crate::frame::ErrorCode;
use crate::model::Role;
use crate::services::{chat, notify, reply::canned_response};
use crate::state::test_helpers;

const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// staged_chat_title
// =============================================================================

#[test]
fn staged_title_truncates_by_characters() {
    assert_eq!(staged_chat_title("Short question", 30), "Short question");
    assert_eq!(staged_chat_title("abcdef", 3), "abc...");
    assert_eq!(staged_chat_title("abc", 3), "abc", "exact fit is not truncated");
    assert_eq!(staged_chat_title("héllo wörld", 5), "héllo...");
}

// =============================================================================
// send_message
// =============================================================================

#[tokio::test]
async fn send_appends_user_message_and_raises_flag_immediately() {
    let state = test_helpers::test_app_state();
    let (chat_id, thread_id) = test_helpers::seed_chat_with_thread(&state).await;

    let handle = send_message(&state, "hello").await.unwrap().unwrap();
    assert_eq!(handle.chat_id, chat_id);
    assert_eq!(handle.thread_id, thread_id);

    let snap = chat::snapshot(&state).await;
    assert!(snap.is_generating_response);
    let thread = chat::current_thread(&state).await.unwrap();
    assert_eq!(thread.messages.len(), 1);
    assert_eq!(thread.messages[0].id, handle.user_message_id);
    assert_eq!(thread.messages[0].content, "hello");
    assert_eq!(thread.messages[0].role, Role::User);

    let outcome = tokio::time::timeout(WAIT, handle.wait()).await.unwrap();
    assert_eq!(outcome, ReplyOutcome::Completed);

    let thread = chat::current_thread(&state).await.unwrap();
    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[1].role, Role::Assistant);
    assert_eq!(thread.messages[1].content, canned_response("hello"));
    assert!(!chat::snapshot(&state).await.is_generating_response);
}

#[tokio::test]
async fn hi_gets_an_answer_within_bounded_time() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_chat_with_thread(&state).await;

    let outcome = tokio::time::timeout(WAIT, add_message(&state, "Hi")).await.unwrap().unwrap();
    assert_eq!(outcome, Some(ReplyOutcome::Completed));

    let thread = chat::current_thread(&state).await.unwrap();
    let contents: Vec<(&str, Role)> = thread.messages.iter().map(|m| (m.content.as_str(), m.role)).collect();
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0], ("Hi", Role::User));
    assert_eq!(contents[1].1, Role::Assistant);
    assert!(!contents[1].0.is_empty());
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_chat_with_thread(&state).await;

    let err = send_message(&state, " \n\t ").await.unwrap_err();
    assert!(matches!(err, ChatError::EmptyMessage));
    assert!(chat::current_thread(&state).await.unwrap().messages.is_empty());
}

#[tokio::test]
async fn second_send_while_generating_is_rejected() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_chat_with_thread(&state).await;

    let handle = send_message(&state, "first").await.unwrap().unwrap();
    let err = send_message(&state, "second").await.unwrap_err();
    assert!(matches!(err, ChatError::ReplyInProgress));
    assert!(err.retryable());

    tokio::time::timeout(WAIT, handle.wait()).await.unwrap();
    assert!(send_message(&state, "third").await.unwrap().is_some(), "accepted once the reply finished");
}

#[tokio::test]
async fn send_without_selection_is_noop() {
    let state = test_helpers::test_app_state();
    chat::create_chat(&state, "No threads yet").await.unwrap();

    assert!(send_message(&state, "hello").await.unwrap().is_none());
    assert_eq!(add_message(&state, "hello").await.unwrap(), None);
    assert!(!chat::snapshot(&state).await.is_generating_response);
}

// =============================================================================
// staged mode
// =============================================================================

#[tokio::test]
async fn staged_send_creates_chat_from_content() {
    let state = test_helpers::test_app_state();
    let existing = chat::create_chat(&state, "Existing").await.unwrap();
    chat::start_new_chat(&state).await;

    let content = "How do we plan the next quarter roadmap?";
    let handle = send_message(&state, content).await.unwrap().unwrap();

    let snap = chat::snapshot(&state).await;
    assert!(!snap.is_new_chat);
    let created = &snap.chats[0];
    assert_ne!(created.id, existing.id, "new chat is prepended");
    assert_eq!(created.title, "How do we plan the next quarte...");
    assert!(created.is_expanded);
    assert_eq!(created.threads.len(), 1);
    assert_eq!(created.threads[0].title, STAGED_THREAD_TITLE);
    assert_eq!(snap.current_chat_id, Some(created.id));
    assert_eq!(snap.current_thread_id, Some(created.threads[0].id));
    assert_eq!(handle.thread_id, created.threads[0].id);

    tokio::time::timeout(WAIT, handle.wait()).await.unwrap();
}

#[tokio::test]
async fn staged_send_keeps_short_titles() {
    let state = test_helpers::test_app_state();
    chat::start_new_chat(&state).await;

    tokio::time::timeout(WAIT, add_message(&state, "Quick one")).await.unwrap().unwrap();

    assert_eq!(chat::snapshot(&state).await.chats[0].title, "Quick one");
}

#[tokio::test]
async fn blank_staged_send_creates_nothing() {
    let state = test_helpers::test_app_state();
    chat::start_new_chat(&state).await;

    assert!(send_message(&state, "   ").await.is_err());

    let snap = chat::snapshot(&state).await;
    assert!(snap.chats.is_empty());
    assert!(snap.is_new_chat);
}

// =============================================================================
// notifications
// =============================================================================

#[tokio::test]
async fn streaming_publishes_create_deltas_and_done() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_chat_with_thread(&state).await;
    let (_, mut rx) = notify::subscribe(&state);

    tokio::time::timeout(WAIT, add_message(&state, "Hi")).await.unwrap().unwrap();

    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    let syscalls: Vec<&str> = frames.iter().map(|f| f.syscall.as_str()).collect();
    let words = canned_response("Hi").split(' ').count();

    assert_eq!(syscalls[0], "message:create");
    assert_eq!(syscalls[1], "message:create");
    assert_eq!(syscalls[2..2 + words].iter().filter(|s| **s == "message:delta").count(), words);
    assert_eq!(syscalls.last(), Some(&"message:done"));
    assert_eq!(syscalls.len(), words + 3);

    let last_delta = &frames[frames.len() - 2];
    assert_eq!(last_delta.str_field("content"), Some(canned_response("Hi").as_str()));
}
