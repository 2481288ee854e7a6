#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

pub mod auth;
pub mod drive;
mod error;
pub mod pkce;

pub use auth::{AuthorizedUser, ClientSecrets, LoginFlow, Redirect, StaticToken, TokenProvider, TokenSource};
pub use drive::{Endpoints, GoogleDrive};
pub use error::ProviderError;
