//! SMS relay — classify incoming text messages and forward bank
//! transaction notifications to a webhook.

pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod store;
