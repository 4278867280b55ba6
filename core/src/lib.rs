//! Client library for the Cobbler provisioning server's XML-RPC API.
//!
//! # Overview
//! Creates, modifies and deletes system records and writes kickstart files
//! and snippets. Every operation is one blocking HTTP POST carrying an
//! XML-RPC `methodCall`, answered by a `methodResponse` holding a single
//! boolean or string.
//!
//! # Design
//! - `xmlrpc` is the typed envelope: values are built as trees and escaped on
//!   serialization, never spliced into text.
//! - `request` has one pure builder per remote method.
//! - `CobblerClient` owns the endpoint and a `Transport`; the token lives in
//!   the `Session` returned by `login` and is passed explicitly.
//! - `UreqTransport` is the default transport; any other HTTP stack can be
//!   plugged in through the `Transport` trait.
//!
//! ```no_run
//! use cobbler_core::{ClientConfig, CobblerClient, KickstartFile};
//!
//! # fn main() -> Result<(), cobbler_core::ApiError> {
//! let config = ClientConfig::from_env()?;
//! let client = CobblerClient::from_config(&config);
//! let session = client.login_with(&config)?;
//! let file = KickstartFile {
//!     name: "base".to_string(),
//!     body: "install\ntext\n".to_string(),
//! };
//! client.create_kickstart_file(&file, &session)?;
//! client.sync(&session)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod types;
pub mod xmlrpc;

pub use client::CobblerClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use types::{KickstartFile, NetworkConfig, Session, Snippet, System};
pub use xmlrpc::{MethodCall, MethodResponse, Value};
