//! # Accord Transport
//!
//! The HTTP side of an Accord client.
//!
//! - [`build_url`]: interpolates path parameters and encodes the query
//! - [`Fetch`]: the network primitive, with [`ReqwestFetch`] as the
//!   production implementation
//! - [`HttpTransport`]: the terminal handler of the API-level chain. It
//!   builds the wire request, runs the wire-level chain and interprets the
//!   raw response.
//!
//! ```text
//! RequestContext ─▶ HttpTransport ─▶ wire stages ─▶ Fetch ─▶ network
//!                        ◀── Response ◀── interpret ◀── WireResponse
//! ```

#![doc(html_root_url = "https://docs.rs/accord-transport/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fetch;
pub mod transport;
pub mod url;

pub use error::{TransportError, TransportResult};
pub use fetch::{Fetch, FetchHandler, ReqwestFetch};
pub use transport::{interpret, validate_base_url, HttpTransport, HttpTransportBuilder};
pub use url::{build_url, encode_query};
