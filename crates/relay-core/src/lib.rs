//! Core of the support relay bot: routing between end users and the staff
//! group, conversation flow, session state and chat history.
//!
//! This crate is transport-agnostic. Telegram lives behind the messaging port
//! implemented in `relay-telegram`.

pub mod config;
pub mod domain;
pub mod envelope;
pub mod errors;
pub mod flow;
pub mod history;
pub mod identity;
pub mod logging;
pub mod messaging;
pub mod relay;
pub mod session;

pub use errors::{Error, Result};
