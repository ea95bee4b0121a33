//! Langbase Pipes API transport.

mod client;
mod types;

pub use client::LangbaseClient;
pub use types::*;
