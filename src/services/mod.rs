//! Store services called by the dispatcher and by embedding hosts.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the store semantics. Each takes the shared `AppState`,
//! mutates one store under its write lock, and publishes a notification
//! through `notify`. The dispatcher only translates frames to these calls.

pub mod chat;
pub mod dashboard;
pub mod message;
pub mod notify;
pub mod reply;
