//! Warden Common Library
//!
//! Identity types shared by the server and the bot front-end that resolves
//! mentions into members and roles.

pub mod types;

pub use types::*;
