//! chatty Daemon - Nickname registry and chat relay server
//!
//! This crate provides the server side of the chat relay:
//! - `registry` - Nickname registry actor that owns all shared state and fans lines out
//! - `server` - TCP listener and the per-client `Session`
//! - `config` - Runtime settings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        chattyd                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │   ChatServer    │     │     RegistryActor           │    │
//! │  │  (TcpListener)  │     │  (nickname state owner)     │    │
//! │  └────────┬────────┘     └──────────────┬──────────────┘    │
//! │           │ accept                      │ try_send          │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐   commands  ┌─────────────────────┐    │
//! │  │    Session      │────────────▶│  per-session outbox │    │
//! │  │  (per client)   │             │  → writer task      │    │
//! │  └─────────────────┘             └─────────────────────┘    │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod registry;
pub mod server;
