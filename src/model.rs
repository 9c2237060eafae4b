//! Domain model shared by both stores and the presentation boundary.
//!
//! DESIGN
//! ======
//! These are the tree-shaped values handed to views. The stores keep
//! normalized records internally (see `state`) and materialize these on
//! demand. Wire names are camelCase to match what existing clients render.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::frame::now_ms;

// =============================================================================
// CHAT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One chat message. Only an assistant message's `content` changes after
/// creation, while its reply is streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub role: Role,
    /// Milliseconds since Unix epoch.
    pub timestamp: i64,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), content: content.into(), role, timestamp: now_ms() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub title: String,
    pub threads: Vec<Thread>,
    pub created_at: i64,
    pub is_expanded: bool,
}

/// Everything a chat view renders: the tree plus selection and flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub chats: Vec<Chat>,
    pub current_chat_id: Option<Uuid>,
    pub current_thread_id: Option<Uuid>,
    pub is_generating_response: bool,
    pub is_new_chat: bool,
}

// =============================================================================
// DASHBOARD
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    LineChart,
    BarChart,
    PieChart,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 3] = [WidgetKind::LineChart, WidgetKind::BarChart, WidgetKind::PieChart];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LineChart => "lineChart",
            Self::BarChart => "barChart",
            Self::PieChart => "pieChart",
        }
    }

    /// Parse the wire name. Unknown kinds yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }
}

/// Base series color. Charts render it at varying opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS `rgba(...)` string at the given opacity.
    #[must_use]
    pub fn rgba(self, opacity: f64) -> String {
        format!("rgba({}, {}, {}, {opacity})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// One pie slice: label, value, and CSS color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub color: String,
}

/// Base color of every pie slice.
pub const DEFAULT_SERIES_COLOR: Rgb = Rgb::new(0, 122, 255);

impl ChartData {
    /// One pie slice per value of the first dataset, named by the label at
    /// the same index (empty when there is none). Slices ignore the dataset
    /// color: all are drawn in the series blue, with opacity stepping up by
    /// 0.1 per slice starting at 0.7.
    #[must_use]
    pub fn pie_slices(&self) -> Vec<PieSlice> {
        let Some(dataset) = self.datasets.first() else {
            return Vec::new();
        };
        dataset
            .data
            .iter()
            .enumerate()
            .map(|(index, value)| {
                #[allow(clippy::cast_precision_loss)]
                let opacity = (7 + index) as f64 / 10.0;
                PieSlice {
                    name: self.labels.get(index).cloned().unwrap_or_default(),
                    value: *value,
                    color: DEFAULT_SERIES_COLOR.rgba(opacity),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub title: String,
    pub data: ChartData,
}

/// A widget before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWidget {
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub title: String,
    pub data: ChartData,
}

impl NewWidget {
    #[must_use]
    pub fn with_id(self, id: Uuid) -> Widget {
        Widget { id, kind: self.kind, title: self.title, data: self.data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: Uuid,
    pub title: String,
    pub widgets: Vec<Widget>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub dashboards: Vec<Dashboard>,
    pub current_dashboard_id: Option<Uuid>,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
