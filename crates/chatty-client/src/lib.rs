//! chatty Client - Interactive line client for the chat server
//!
//! This crate provides:
//! - `client` - Connection handling and the relay loop
//! - `config` - Connection and display settings
//! - `error` - Client error types
//!
//! The relay loop is generic over its input and output so the binary can
//! use stdin/stdout while tests use in-memory buffers.

pub mod client;
pub mod config;
pub mod error;

pub use client::{ChatClient, Exit, CONNECTED_BANNER, DISCONNECTED_NOTICE};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
