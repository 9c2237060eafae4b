//! Dashboard service: dashboard CRUD, widgets, and snapshots.
//!
//! DESIGN
//! ======
//! Dashboards are prepended and selected on creation. Widgets live in one
//! id-keyed map; each dashboard holds the display order of its widget ids, so
//! reordering rewrites only that vector and every widget value is untouched.
//!
//! Widget operations act on the current dashboard. With nothing selected they
//! are silent no-ops (`Ok(None)` / `Ok(false)`).

use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use crate::frame::now_ms;
use crate::model::{Dashboard, DashboardSnapshot, NewWidget, Widget};
use crate::services::notify::{self, json, payload};
use crate::state::{AppState, DashboardRecord};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("dashboard not found: {0}")]
    NotFound(Uuid),
    #[error("widget not found: {0}")]
    WidgetNotFound(Uuid),
    #[error("title must not be blank")]
    EmptyTitle,
    #[error("new order must list each current widget exactly once")]
    InvalidOrder,
}

impl crate::frame::ErrorCode for DashboardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_DASHBOARD_NOT_FOUND",
            Self::WidgetNotFound(_) => "E_WIDGET_NOT_FOUND",
            Self::EmptyTitle => "E_EMPTY_TITLE",
            Self::InvalidOrder => "E_INVALID_ORDER",
        }
    }
}

fn validate_title(title: &str) -> Result<String, DashboardError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// DASHBOARDS
// =============================================================================

/// Create an empty dashboard at the front and select it.
///
/// # Errors
///
/// Returns `EmptyTitle` for a blank title.
pub async fn create_dashboard(state: &AppState, title: &str) -> Result<Dashboard, DashboardError> {
    let title = validate_title(title)?;
    let mut dashboards = state.dashboards.write().await;

    let dashboard_id = Uuid::new_v4();
    dashboards.dashboards.insert(
        dashboard_id,
        DashboardRecord { id: dashboard_id, title, created_at: now_ms(), widget_ids: Vec::new() },
    );
    dashboards.dashboard_order.insert(0, dashboard_id);
    dashboards.current_dashboard_id = Some(dashboard_id);

    let dashboard = dashboards
        .dashboard(dashboard_id)
        .ok_or(DashboardError::NotFound(dashboard_id))?;
    notify::emit(state, "dashboard:create", payload([("dashboard", json(&dashboard))]));
    info!(%dashboard_id, title = %dashboard.title, "dashboard created");
    Ok(dashboard)
}

/// Delete a dashboard and its widgets. Deleting the selected dashboard
/// selects the first remaining one, or nothing.
///
/// # Errors
///
/// Returns `NotFound` for an unknown dashboard.
pub async fn delete_dashboard(state: &AppState, dashboard_id: Uuid) -> Result<(), DashboardError> {
    let mut dashboards = state.dashboards.write().await;
    let record = dashboards
        .dashboards
        .remove(&dashboard_id)
        .ok_or(DashboardError::NotFound(dashboard_id))?;
    for widget_id in &record.widget_ids {
        dashboards.widgets.remove(widget_id);
    }
    dashboards.dashboard_order.retain(|id| *id != dashboard_id);

    if dashboards.current_dashboard_id == Some(dashboard_id) {
        let next = dashboards.dashboard_order.first().copied();
        dashboards.current_dashboard_id = next;
    }

    notify::emit(
        state,
        "dashboard:delete",
        payload([
            ("dashboardId", json(&dashboard_id)),
            ("currentDashboardId", json(&dashboards.current_dashboard_id)),
        ]),
    );
    info!(%dashboard_id, widgets = record.widget_ids.len(), "dashboard deleted");
    Ok(())
}

/// Rename a dashboard. Widgets are untouched.
///
/// # Errors
///
/// Returns `EmptyTitle` for a blank title and `NotFound` for an unknown
/// dashboard.
pub async fn update_dashboard_title(state: &AppState, dashboard_id: Uuid, title: &str) -> Result<(), DashboardError> {
    let title = validate_title(title)?;
    let mut dashboards = state.dashboards.write().await;
    let record = dashboards
        .dashboards
        .get_mut(&dashboard_id)
        .ok_or(DashboardError::NotFound(dashboard_id))?;
    record.title = title;
    notify::emit(
        state,
        "dashboard:rename",
        payload([("dashboardId", json(&dashboard_id)), ("title", json(&record.title))]),
    );
    Ok(())
}

/// Select a dashboard.
///
/// # Errors
///
/// Returns `NotFound` for an unknown dashboard.
pub async fn set_current_dashboard(state: &AppState, dashboard_id: Uuid) -> Result<(), DashboardError> {
    let mut dashboards = state.dashboards.write().await;
    if !dashboards.dashboards.contains_key(&dashboard_id) {
        return Err(DashboardError::NotFound(dashboard_id));
    }
    dashboards.current_dashboard_id = Some(dashboard_id);
    notify::emit(state, "dashboard:select", payload([("dashboardId", json(&dashboard_id))]));
    Ok(())
}

// =============================================================================
// WIDGETS
// =============================================================================

/// Give a widget an id and append it to the current dashboard.
///
/// Returns `Ok(None)` when no dashboard is selected.
///
/// # Errors
///
/// Returns `EmptyTitle` for a blank widget title.
pub async fn add_widget(state: &AppState, widget: NewWidget) -> Result<Option<Widget>, DashboardError> {
    if widget.title.trim().is_empty() {
        return Err(DashboardError::EmptyTitle);
    }
    let mut guard = state.dashboards.write().await;
    let dashboards = &mut *guard;
    let Some(dashboard_id) = dashboards.current_dashboard_id else {
        return Ok(None);
    };
    let record = dashboards
        .dashboards
        .get_mut(&dashboard_id)
        .ok_or(DashboardError::NotFound(dashboard_id))?;

    let widget = widget.with_id(Uuid::new_v4());
    record.widget_ids.push(widget.id);
    dashboards.widgets.insert(widget.id, widget.clone());

    notify::emit(
        state,
        "widget:create",
        payload([("dashboardId", json(&dashboard_id)), ("widget", json(&widget))]),
    );
    info!(%dashboard_id, widget_id = %widget.id, kind = widget.kind.as_str(), "widget added");
    Ok(Some(widget))
}

/// Remove a widget from the current dashboard.
///
/// Returns `Ok(false)` when no dashboard is selected.
///
/// # Errors
///
/// Returns `WidgetNotFound` when the widget is not on the current dashboard.
pub async fn delete_widget(state: &AppState, widget_id: Uuid) -> Result<bool, DashboardError> {
    let mut guard = state.dashboards.write().await;
    let dashboards = &mut *guard;
    let Some(dashboard_id) = dashboards.current_dashboard_id else {
        return Ok(false);
    };
    let record = dashboards
        .dashboards
        .get_mut(&dashboard_id)
        .ok_or(DashboardError::NotFound(dashboard_id))?;
    let Some(position) = record.widget_ids.iter().position(|id| *id == widget_id) else {
        return Err(DashboardError::WidgetNotFound(widget_id));
    };
    record.widget_ids.remove(position);
    dashboards.widgets.remove(&widget_id);

    notify::emit(
        state,
        "widget:delete",
        payload([("dashboardId", json(&dashboard_id)), ("widgetId", json(&widget_id))]),
    );
    info!(%dashboard_id, %widget_id, "widget deleted");
    Ok(true)
}

/// Replace the widget order of the current dashboard. `new_order` must list
/// every current widget id exactly once.
///
/// Returns `Ok(false)` when no dashboard is selected.
///
/// # Errors
///
/// Returns `InvalidOrder` when `new_order` is not a permutation of the
/// current widget ids.
pub async fn reorder_widgets(state: &AppState, new_order: &[Uuid]) -> Result<bool, DashboardError> {
    let mut dashboards = state.dashboards.write().await;
    let Some(dashboard_id) = dashboards.current_dashboard_id else {
        return Ok(false);
    };
    let record = dashboards
        .dashboards
        .get_mut(&dashboard_id)
        .ok_or(DashboardError::NotFound(dashboard_id))?;

    let current: HashSet<Uuid> = record.widget_ids.iter().copied().collect();
    let proposed: HashSet<Uuid> = new_order.iter().copied().collect();
    if new_order.len() != record.widget_ids.len() || proposed != current {
        return Err(DashboardError::InvalidOrder);
    }
    record.widget_ids = new_order.to_vec();

    notify::emit(
        state,
        "widget:reorder",
        payload([("dashboardId", json(&dashboard_id)), ("widgetIds", json(&record.widget_ids))]),
    );
    Ok(true)
}

// =============================================================================
// READ
// =============================================================================

/// Materialize every dashboard with the current selection.
pub async fn snapshot(state: &AppState) -> DashboardSnapshot {
    let dashboards = state.dashboards.read().await;
    DashboardSnapshot {
        dashboards: dashboards.ordered_dashboards(),
        current_dashboard_id: dashboards.current_dashboard_id,
    }
}

/// The selected dashboard, if any.
pub async fn current_dashboard(state: &AppState) -> Option<Dashboard> {
    let dashboards = state.dashboards.read().await;
    dashboards.current_dashboard_id.and_then(|id| dashboards.dashboard(id))
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
