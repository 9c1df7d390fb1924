//! Reload Module
//!
//! WebSocket-based live reload for development.
//!
//! # Modules
//!
//! - `message` - The reload message sent to browsers
//! - `server` - WebSocket listener feeding the Reload Hub

pub mod message;
pub mod server;
