use chatdeck::config::StoreConfig;
use chatdeck::dispatch::dispatch;
use chatdeck::frame::{Data, Frame, Status};
use chatdeck::services::{chat, notify};
use chatdeck::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = StoreConfig::from_env();
    let state = AppState::seeded(config);
    tracing::info!(?config, "chatdeck starting");

    let (_subscriber_id, mut notifications) = notify::subscribe(&state);
    let listener = tokio::spawn(async move {
        let mut deltas = 0_usize;
        while let Some(frame) = notifications.recv().await {
            if frame.syscall == "message:delta" {
                deltas += 1;
                continue;
            }
            tracing::info!(syscall = %frame.syscall, "notification");
        }
        tracing::info!(deltas, "notification stream closed");
    });

    let created = dispatch(&state, &Frame::request("chat:create", Data::new()).with_data("title", "Demo")).await;
    let chat_id = created
        .data
        .get("chat")
        .and_then(|chat| chat.get("id"))
        .cloned()
        .unwrap_or_default();

    let thread_req = Frame::request("thread:create", Data::new())
        .with_data("chatId", chat_id)
        .with_data("title", "First steps");
    let thread = dispatch(&state, &thread_req).await;
    if thread.status == Status::Error {
        tracing::error!(reply = ?thread.data, "thread:create failed");
    }

    let send_req = Frame::request("message:send", Data::new())
        .with_data("content", "Hi")
        .with_data("wait", true);
    let reply = dispatch(&state, &send_req).await;
    let outcome = reply.data.get("outcome").cloned().unwrap_or_default();
    tracing::info!(%outcome, "reply finished");

    if let Some(thread) = chat::current_thread(&state).await {
        for message in &thread.messages {
            tracing::info!(role = ?message.role, content = %message.content, "message");
        }
    }

    state.shutdown().await;
    let _ = listener.await;
}
