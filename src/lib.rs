//! In-process stores for a chat and dashboard app.
//!
//! ARCHITECTURE
//! ============
//! `state::AppState` holds the chat store, the dashboard store, and the
//! notification subscribers. `services` implements every store operation,
//! including the simulated streaming reply. `dispatch` exposes the same
//! operations as request frames for presentation layers, which observe
//! changes through `services::notify`.

pub mod config;
pub mod dispatch;
pub mod frame;
pub mod model;
pub mod seed;
pub mod services;
pub mod state;
