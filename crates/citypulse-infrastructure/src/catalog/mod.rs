//! Location catalog client over HTTP.

mod client;
mod wire;

pub use client::OxilorCatalog;
