//! Hosted backend client: auth, row storage and blob storage over HTTP.

mod client;
mod error;
mod wire;

pub use client::SupabaseClient;
