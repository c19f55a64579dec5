//! Polymarket CLOB integration for the backtester
//!
//! Read-only client for the public `/prices-history` endpoint. Returns
//! chronologically sorted price observations for a single outcome token.

pub mod client;
pub mod types;

pub use client::PolymarketClient;
pub use types::{PriceHistoryPoint, PricesHistoryResponse, CLOB_API_BASE};
