//! Notification fan-out to presentation subscribers.
//!
//! DESIGN
//! ======
//! Every store mutation publishes one notification frame (`chat:create`,
//! `message:delta`, `widget:reorder`, ...) carrying the affected ids and
//! values. Subscribers hold a bounded `mpsc` receiver. Delivery is best
//! effort: a full channel drops the frame for that subscriber only, a closed
//! channel is pruned on the next publish.
//!
//! Publishing is synchronous so store services can call it while holding
//! their write lock, which keeps notification order equal to mutation order.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::state::AppState;

/// Sender name stamped on every notification.
pub const NOTIFY_SOURCE: &str = "store";

/// Register a subscriber. The receiver closes when the subscriber is removed
/// or the state shuts down.
#[must_use]
pub fn subscribe(state: &AppState) -> (Uuid, mpsc::Receiver<Frame>) {
    let (tx, rx) = mpsc::channel(state.config.notify_channel_capacity);
    let subscriber_id = Uuid::new_v4();
    state
        .subscribers
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .insert(subscriber_id, tx);
    info!(%subscriber_id, "subscriber registered");
    (subscriber_id, rx)
}

/// Remove a subscriber. Returns whether it was registered.
pub fn unsubscribe(state: &AppState, subscriber_id: Uuid) -> bool {
    let removed = state
        .subscribers
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .remove(&subscriber_id)
        .is_some();
    if removed {
        info!(%subscriber_id, "subscriber removed");
    }
    removed
}

/// Deliver a frame to every subscriber.
pub fn publish(state: &AppState, frame: &Frame) {
    let mut subscribers = state
        .subscribers
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    subscribers.retain(|subscriber_id, tx| match tx.try_send(frame.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!(%subscriber_id, syscall = %frame.syscall, "subscriber channel full; frame dropped");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(%subscriber_id, "subscriber channel closed; pruned");
            false
        }
    });
}

/// Build and publish a notification frame.
pub fn emit(state: &AppState, syscall: &str, data: Data) {
    let frame = Frame::request(syscall, data).with_from(NOTIFY_SOURCE);
    publish(state, &frame);
}

/// Serialize a model value for a payload. Model types always serialize, so
/// the `Null` fallback is unreachable in practice.
#[must_use]
pub fn json(value: &impl Serialize) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// Build a notification payload from `(key, value)` pairs.
#[must_use]
pub fn payload<const N: usize>(fields: [(&str, serde_json::Value); N]) -> Data {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
