//! HTTP boundary of the MediDiagnose client.
//!
//! Two endpoints are spoken to: the diagnosis backend (`POST /symptom-check`,
//! multipart) and a generic JSON API layer rooted at the configured base URL.
//! Both carry the session's bearer token when one is present, and a 401 from
//! either tears the session down.

pub mod client;
pub mod error;
pub mod wire;

pub use client::*;
pub use error::*;
pub use wire::*;
