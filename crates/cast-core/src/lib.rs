//! # cast-core
//!
//! Reply correlation for `cast` notifications sent by email.
//!
//! This crate provides:
//! - Email configuration (`email` section of the config file)
//! - Message-ID generation for outbound notifications
//! - A poll loop that waits for the reply to a sent message
//! - Correlation by `In-Reply-To`, `References`, then validated subject match
//! - MIME body extraction with quoted-original stripping
//! - Terminal rendering of the reply

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod message_id;
pub mod reply;

pub use config::EmailConfig;
pub use error::{ConfigError, Result, WaitError};
pub use message_id::{extract_domain, generate_message_id, message_id_for_sender};
pub use reply::{
    EmailResponse, ReplyWaiter, WaitRequest, format_duration, render, sanitize, wait_for_reply,
};
