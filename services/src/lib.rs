//! Clients for the managed services the backend delegates to.
//!
//! Nothing in here owns data: the Credential Service holds the accounts and
//! tokens, the Document Store holds the user profiles and form submissions.
//! Both are reached over their HTTP APIs with one shared [`reqwest::Client`].

pub mod credential;
pub mod models;
pub mod store;

pub use credential::{CredentialClient, CredentialError};
pub use store::{Document, StoreClient, StoreError};
