#![deny(missing_docs)]

//! # ReportLink Models
//!
//! Domain and wire types shared by the ReportLink proxy and its mock
//! upstream.
//!
//! ## Token flow
//!
//! ```text
//! Credentials ──client_credentials──▶ access token
//!                                        │
//! EmbedTokenRequest ──GenerateToken──────┴──▶ EmbedToken
//!                                                │
//!                              EmbedResponse ◀───┘ (+ embed URL)
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ids`] | Report, dataset and workspace identifiers |
//! | [`embed`] | Identity policy, `GenerateToken` request/response bodies |
//! | [`api`] | Payloads served by the HTTP facade |
//! | [`error`] | [`ModelError`] |

pub mod api;
pub mod embed;
pub mod error;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use api::*;
pub use embed::*;
pub use error::*;
pub use ids::*;
