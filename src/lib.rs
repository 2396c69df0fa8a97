//! # quickbooks-rs
//!
//! A Rust client library for the QuickBooks Online API.
//!
//! The crate covers the OAuth2 authorization-code + refresh-token lifecycle
//! ([`AuthProvider`]) and filtered, paginated searches over the QuickBooks
//! resource query language ([`query::QueryBuilder`]).
//!
//! ```ignore
//! use quickbooks_rs::{AuthProvider, Client, Environment, KeyPair, Scope};
//!
//! let auth = AuthProvider::new(
//!     KeyPair::from_env(),
//!     "https://example.com/callback".parse()?,
//!     vec![Scope::Accounting],
//!     Environment::Sandbox,
//! );
//!
//! // Direct the user to `auth.generate_auth_url()`, then on the callback:
//! auth.exchange_code(&code, &realm_id).await?;
//!
//! let client = Client::new(auth);
//! let page = client
//!     .invoices()
//!     .updated_since(since, &Default::default())
//!     .await?;
//! for invoice in &page.results {
//!     println!("{:?} {:?}", invoice.doc_number, invoice.total_amt);
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod endpoints;
pub mod entities;
pub mod environment;
pub mod error;
pub mod oauth;
pub mod query;
pub mod scope;
pub mod utils;

pub use client::Client;
pub use endpoints::Resource;
pub use environment::{AuthEndpoints, Environment};
pub use error::{Error, Result};
pub use oauth::{AuthProvider, KeyPair, Token};
pub use query::{Page, Query, QueryBuilder, SearchOptions, SortDirection};
pub use scope::Scope;

// Re-export entity types for convenience
pub use entities::account::Account;
pub use entities::bill::Bill;
pub use entities::company_info::CompanyInfo;
pub use entities::credit_memo::CreditMemo;
pub use entities::customer::Customer;
pub use entities::estimate::Estimate;
pub use entities::invoice::Invoice;
pub use entities::payment::Payment;
