//! Shared HTTP transport
//!
//! This module provides the connection-pooled client used by both the scraper and
//! the downloader, plus the user-agent sources it draws request headers from.

mod agent;
mod client;

pub use agent::{RotatingAgent, StaticAgent, UserAgentSource, BROWSER_AGENTS};
pub use client::{HttpClient, HttpClientBuilder};
