//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is the explicit container handed to every store operation and
//! to the dispatcher. It holds one lock per store plus the subscriber map.
//! Each store keeps normalized records keyed by id with explicit ordering
//! vectors, so a streaming tick rewrites a single message instead of copying
//! the whole chat tree. Views receive materialized snapshots.
//!
//! LOCKING
//! =======
//! Lock order is store → subscribers. Notifications are published while the
//! store lock is held so subscribers observe changes in mutation order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{RwLock, mpsc};
use tracing::info;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::frame::Frame;
use crate::model::{Chat, Dashboard, Message, Thread, Widget};
use crate::services::reply::ReplyTask;

// =============================================================================
// CHAT STATE
// =============================================================================

/// Chat metadata plus the ordered ids of its threads.
#[derive(Debug, Clone)]
pub struct ChatRecord {
    pub id: Uuid,
    pub title: String,
    pub created_at: i64,
    pub is_expanded: bool,
    /// Newest first.
    pub thread_ids: Vec<Uuid>,
}

/// Thread metadata plus its messages, oldest first.
#[derive(Debug, Clone)]
pub struct ThreadRecord {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub title: String,
    pub created_at: i64,
    pub messages: Vec<Message>,
}

#[derive(Debug, Default)]
pub struct ChatState {
    pub chats: HashMap<Uuid, ChatRecord>,
    /// Chat ids, newest first.
    pub chat_order: Vec<Uuid>,
    pub threads: HashMap<Uuid, ThreadRecord>,
    pub current_chat_id: Option<Uuid>,
    /// When set, belongs to `current_chat_id`.
    pub current_thread_id: Option<Uuid>,
    /// Staged "new chat" mode: the chat is created by the first message.
    pub is_new_chat: bool,
    /// The in-flight streaming reply, if any.
    pub reply: Option<ReplyTask>,
}

impl ChatState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a chat tree. Order is preserved; nothing is selected.
    #[must_use]
    pub fn from_chats(chats: Vec<Chat>) -> Self {
        let mut state = Self::new();
        for chat in chats {
            let thread_ids = chat.threads.iter().map(|t| t.id).collect();
            for thread in chat.threads {
                state.threads.insert(
                    thread.id,
                    ThreadRecord {
                        id: thread.id,
                        chat_id: chat.id,
                        title: thread.title,
                        created_at: thread.created_at,
                        messages: thread.messages,
                    },
                );
            }
            state.chat_order.push(chat.id);
            state.chats.insert(
                chat.id,
                ChatRecord {
                    id: chat.id,
                    title: chat.title,
                    created_at: chat.created_at,
                    is_expanded: chat.is_expanded,
                    thread_ids,
                },
            );
        }
        state
    }

    /// True while a reply is streaming. New sends are rejected meanwhile.
    #[must_use]
    pub fn is_generating_response(&self) -> bool {
        self.reply.is_some()
    }

    #[must_use]
    pub fn thread(&self, thread_id: Uuid) -> Option<Thread> {
        self.threads.get(&thread_id).map(|t| Thread {
            id: t.id,
            title: t.title.clone(),
            messages: t.messages.clone(),
            created_at: t.created_at,
        })
    }

    #[must_use]
    pub fn chat(&self, chat_id: Uuid) -> Option<Chat> {
        let record = self.chats.get(&chat_id)?;
        Some(Chat {
            id: record.id,
            title: record.title.clone(),
            threads: record
                .thread_ids
                .iter()
                .filter_map(|id| self.thread(*id))
                .collect(),
            created_at: record.created_at,
            is_expanded: record.is_expanded,
        })
    }

    /// All chats in display order.
    #[must_use]
    pub fn ordered_chats(&self) -> Vec<Chat> {
        self.chat_order.iter().filter_map(|id| self.chat(*id)).collect()
    }

    /// First thread of a chat in display order.
    #[must_use]
    pub fn first_thread_of(&self, chat_id: Uuid) -> Option<Uuid> {
        self.chats
            .get(&chat_id)
            .and_then(|c| c.thread_ids.first().copied())
    }
}

// =============================================================================
// DASHBOARD STATE
// =============================================================================

/// Dashboard metadata plus the ordered ids of its widgets.
#[derive(Debug, Clone)]
pub struct DashboardRecord {
    pub id: Uuid,
    pub title: String,
    pub created_at: i64,
    /// Display order, first to last.
    pub widget_ids: Vec<Uuid>,
}

#[derive(Debug, Default)]
pub struct DashboardState {
    pub dashboards: HashMap<Uuid, DashboardRecord>,
    /// Dashboard ids, newest first.
    pub dashboard_order: Vec<Uuid>,
    pub widgets: HashMap<Uuid, Widget>,
    pub current_dashboard_id: Option<Uuid>,
}

impl DashboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a dashboard tree and select the first dashboard.
    #[must_use]
    pub fn from_dashboards(dashboards: Vec<Dashboard>) -> Self {
        let mut state = Self::new();
        for dashboard in dashboards {
            let widget_ids = dashboard.widgets.iter().map(|w| w.id).collect();
            for widget in dashboard.widgets {
                state.widgets.insert(widget.id, widget);
            }
            state.dashboard_order.push(dashboard.id);
            state.dashboards.insert(
                dashboard.id,
                DashboardRecord {
                    id: dashboard.id,
                    title: dashboard.title,
                    created_at: dashboard.created_at,
                    widget_ids,
                },
            );
        }
        state.current_dashboard_id = state.dashboard_order.first().copied();
        state
    }

    #[must_use]
    pub fn dashboard(&self, dashboard_id: Uuid) -> Option<Dashboard> {
        let record = self.dashboards.get(&dashboard_id)?;
        Some(Dashboard {
            id: record.id,
            title: record.title.clone(),
            widgets: record
                .widget_ids
                .iter()
                .filter_map(|id| self.widgets.get(id).cloned())
                .collect(),
            created_at: record.created_at,
        })
    }

    /// All dashboards in display order.
    #[must_use]
    pub fn ordered_dashboards(&self) -> Vec<Dashboard> {
        self.dashboard_order
            .iter()
            .filter_map(|id| self.dashboard(*id))
            .collect()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Subscriber id → sender for outgoing notification frames.
pub type Subscribers = HashMap<Uuid, mpsc::Sender<Frame>>;

/// Shared application state. Clone is cheap: all inner fields are Arc-wrapped
/// or Copy.
#[derive(Clone)]
pub struct AppState {
    pub chats: Arc<RwLock<ChatState>>,
    pub dashboards: Arc<RwLock<DashboardState>>,
    pub subscribers: Arc<Mutex<Subscribers>>,
    pub config: StoreConfig,
}

impl AppState {
    /// Empty stores.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self::with_stores(config, ChatState::new(), DashboardState::new())
    }

    /// Stores pre-populated with the demo chats and dashboards when
    /// `config.seed_demo_data` is set, empty otherwise.
    #[must_use]
    pub fn seeded(config: StoreConfig) -> Self {
        if !config.seed_demo_data {
            return Self::new(config);
        }
        let chats = ChatState::from_chats(crate::seed::demo_chats());
        let dashboards = DashboardState::from_dashboards(crate::seed::demo_dashboards());
        info!(chats = chats.chats.len(), dashboards = dashboards.dashboards.len(), "seeded demo data");
        Self::with_stores(config, chats, dashboards)
    }

    #[must_use]
    pub fn with_stores(config: StoreConfig, chats: ChatState, dashboards: DashboardState) -> Self {
        Self {
            chats: Arc::new(RwLock::new(chats)),
            dashboards: Arc::new(RwLock::new(dashboards)),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Tear down: cancel the in-flight reply and drop every subscriber so
    /// their receivers close.
    pub async fn shutdown(&self) {
        let cancelled = crate::services::reply::cancel_reply(self).await;
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        info!(cancelled_reply = cancelled, "state shut down");
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
