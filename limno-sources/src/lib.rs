//! Clients and parsers for the Alplakes and Datalakes web services.
//!
//! Network access goes through the [`fetch::HttpFetch`] trait; the
//! reqwest-backed implementation is only built with the `api` feature.

pub mod alplakes;
pub mod datalakes;
pub mod fetch;
pub mod json_store;
pub mod kind;
pub mod payload;
