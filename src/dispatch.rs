//! Frame dispatcher: the intent boundary for presentation layers.
//!
//! DESIGN
//! ======
//! Views submit request frames (`chat:create`, `message:send`,
//! `widget:reorder`, ...). `dispatch` routes them by syscall prefix to a
//! handler, the handler calls the store services and returns an `Outcome`,
//! and the dispatcher turns that into exactly one terminal reply frame.
//! Store changes reach views separately, as notifications from `notify`.
//!
//! Request fields use the same camelCase keys as the notifications
//! (`chatId`, `threadId`, `dashboardId`, `widgetId`, `widgetIds`).
//!
//! ERROR HANDLING
//! ==============
//! Typed service errors become error frames through `Frame::error_from`,
//! which carries `code`, `message`, and `retryable`. Missing or malformed
//! request fields become plain error frames.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::model::{ChartData, NewWidget, WidgetKind};
use crate::seed;
use crate::services::notify::{json, payload};
use crate::services::{chat, dashboard, message, reply};
use crate::state::AppState;

/// What a handler produced. The dispatcher converts it into the reply frame.
enum Outcome {
    /// Terminal reply carrying a payload.
    Reply(Data),
    /// Terminal reply without a payload.
    Done,
}

/// Route one request frame and return its terminal reply.
pub async fn dispatch(state: &AppState, req: &Frame) -> Frame {
    if req.status.is_terminal() {
        return req.error(format!("expected a request frame, got {:?}", req.status));
    }
    debug!(id = %req.id, syscall = %req.syscall, "dispatch");

    let result = match req.prefix() {
        "chat" => handle_chat(state, req).await,
        "thread" => handle_thread(state, req).await,
        "message" => handle_message(state, req).await,
        "dashboard" => handle_dashboard(state, req).await,
        "widget" => handle_widget(state, req).await,
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::Reply(data)) => req.done_with(data),
        Ok(Outcome::Done) => req.done(),
        Err(err_frame) => {
            warn!(syscall = %req.syscall, error = ?err_frame.data, "request failed");
            err_frame
        }
    }
}

// =============================================================================
// FIELD HELPERS
// =============================================================================

fn require_str<'a>(req: &'a Frame, key: &str) -> Result<&'a str, Frame> {
    req.str_field(key)
        .ok_or_else(|| req.error(format!("missing or invalid field: {key}")))
}

fn require_uuid(req: &Frame, key: &str) -> Result<Uuid, Frame> {
    req.uuid_field(key)
        .ok_or_else(|| req.error(format!("missing or invalid field: {key}")))
}

fn require_uuid_list(req: &Frame, key: &str) -> Result<Vec<Uuid>, Frame> {
    let invalid = || req.error(format!("missing or invalid field: {key}"));
    let items = req.data.get(key).and_then(|v| v.as_array()).ok_or_else(invalid)?;
    items
        .iter()
        .map(|item| item.as_str().and_then(|s| s.parse().ok()).ok_or_else(invalid))
        .collect()
}

// =============================================================================
// CHAT HANDLERS
// =============================================================================

async fn handle_chat(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "list" => {
            let snapshot = chat::snapshot(state).await;
            Ok(Outcome::Reply(payload([("snapshot", json(&snapshot))])))
        }
        "create" => {
            let title = require_str(req, "title")?;
            match chat::create_chat(state, title).await {
                Ok(created) => Ok(Outcome::Reply(payload([("chat", json(&created))]))),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "delete" => {
            let chat_id = require_uuid(req, "chatId")?;
            match chat::delete_chat(state, chat_id).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "rename" => {
            let chat_id = require_uuid(req, "chatId")?;
            let title = require_str(req, "title")?;
            match chat::update_chat_title(state, chat_id, title).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "select" => {
            let chat_id = require_uuid(req, "chatId")?;
            match chat::set_current_chat(state, chat_id).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "toggle" => {
            let chat_id = require_uuid(req, "chatId")?;
            match chat::toggle_chat_expansion(state, chat_id).await {
                Ok(expanded) => Ok(Outcome::Reply(payload([("isExpanded", json(&expanded))]))),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "new" => {
            chat::start_new_chat(state).await;
            Ok(Outcome::Done)
        }
        op => Err(req.error(format!("unknown chat op: {op}"))),
    }
}

async fn handle_thread(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "current" => {
            let thread = chat::current_thread(state).await;
            Ok(Outcome::Reply(payload([("thread", json(&thread))])))
        }
        "create" => {
            let chat_id = require_uuid(req, "chatId")?;
            let title = require_str(req, "title")?;
            match chat::create_thread(state, chat_id, title).await {
                Ok(thread) => Ok(Outcome::Reply(payload([("thread", json(&thread))]))),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "delete" => {
            let chat_id = require_uuid(req, "chatId")?;
            let thread_id = require_uuid(req, "threadId")?;
            match chat::delete_thread(state, chat_id, thread_id).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "rename" => {
            let chat_id = require_uuid(req, "chatId")?;
            let thread_id = require_uuid(req, "threadId")?;
            let title = require_str(req, "title")?;
            match chat::update_thread_title(state, chat_id, thread_id, title).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "select" => {
            let chat_id = require_uuid(req, "chatId")?;
            let thread_id = require_uuid(req, "threadId")?;
            match chat::set_current_thread(state, chat_id, thread_id).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        op => Err(req.error(format!("unknown thread op: {op}"))),
    }
}

// =============================================================================
// MESSAGE HANDLERS
// =============================================================================

async fn handle_message(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "send" => {
            let content = require_str(req, "content")?;
            let wait = req
                .data
                .get("wait")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false);

            let handle = match message::send_message(state, content).await {
                Ok(Some(handle)) => handle,
                Ok(None) => return Ok(Outcome::Reply(payload([("sent", json(&false))]))),
                Err(e) => return Err(req.error_from(&e)),
            };

            let mut data = payload([
                ("sent", json(&true)),
                ("chatId", json(&handle.chat_id)),
                ("threadId", json(&handle.thread_id)),
                ("userMessageId", json(&handle.user_message_id)),
            ]);
            if wait {
                let outcome = handle.wait().await;
                data.insert("outcome".into(), json(&outcome));
            }
            Ok(Outcome::Reply(data))
        }
        "cancel" => {
            let cancelled = reply::cancel_reply(state).await;
            Ok(Outcome::Reply(payload([("cancelled", json(&cancelled))])))
        }
        op => Err(req.error(format!("unknown message op: {op}"))),
    }
}

// =============================================================================
// DASHBOARD HANDLERS
// =============================================================================

async fn handle_dashboard(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "list" => {
            let snapshot = dashboard::snapshot(state).await;
            Ok(Outcome::Reply(payload([("snapshot", json(&snapshot))])))
        }
        "current" => {
            let current = dashboard::current_dashboard(state).await;
            Ok(Outcome::Reply(payload([("dashboard", json(&current))])))
        }
        "create" => {
            let title = require_str(req, "title")?;
            match dashboard::create_dashboard(state, title).await {
                Ok(created) => Ok(Outcome::Reply(payload([("dashboard", json(&created))]))),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "delete" => {
            let dashboard_id = require_uuid(req, "dashboardId")?;
            match dashboard::delete_dashboard(state, dashboard_id).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "rename" => {
            let dashboard_id = require_uuid(req, "dashboardId")?;
            let title = require_str(req, "title")?;
            match dashboard::update_dashboard_title(state, dashboard_id, title).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "select" => {
            let dashboard_id = require_uuid(req, "dashboardId")?;
            match dashboard::set_current_dashboard(state, dashboard_id).await {
                Ok(()) => Ok(Outcome::Done),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        op => Err(req.error(format!("unknown dashboard op: {op}"))),
    }
}

async fn handle_widget(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "templates" => Ok(Outcome::Reply(payload([("templates", json(&seed::widget_templates()))]))),
        "create" => {
            let kind_name = require_str(req, "kind")?;
            let kind = WidgetKind::parse(kind_name).ok_or_else(|| req.error(format!("unknown widget kind: {kind_name}")))?;
            let title = require_str(req, "title")?.to_string();
            let data = match req.data.get("data") {
                Some(raw) => serde_json::from_value::<ChartData>(raw.clone())
                    .map_err(|e| req.error(format!("invalid chart data: {e}")))?,
                None => seed::random_chart_data(kind),
            };

            match dashboard::add_widget(state, NewWidget { kind, title, data }).await {
                Ok(Some(widget)) => Ok(Outcome::Reply(payload([("created", json(&true)), ("widget", json(&widget))]))),
                Ok(None) => Ok(Outcome::Reply(payload([("created", json(&false))]))),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "delete" => {
            let widget_id = require_uuid(req, "widgetId")?;
            match dashboard::delete_widget(state, widget_id).await {
                Ok(deleted) => Ok(Outcome::Reply(payload([("deleted", json(&deleted))]))),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "reorder" => {
            let widget_ids = require_uuid_list(req, "widgetIds")?;
            match dashboard::reorder_widgets(state, &widget_ids).await {
                Ok(reordered) => Ok(Outcome::Reply(payload([("reordered", json(&reordered))]))),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        op => Err(req.error(format!("unknown widget op: {op}"))),
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
