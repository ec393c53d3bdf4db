//! Warden Server
//!
//! Time-bounded grants (banned, blessed, moderator, admin) for chat
//! communities, the moderation policy built on them, and the HTTP bridge a
//! bot front-end drives.

pub mod api;
pub mod commands;
pub mod config;
pub mod permissions;
pub mod service;
pub mod settings;
