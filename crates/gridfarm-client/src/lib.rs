//! Signed client for the grid explorer directory service.
//!
//! This crate provides:
//!
//! - Phonebook (users) and Directory (farms, nodes) endpoints over HTTP
//! - http-signature request signing with an ed25519 identity
//! - Typed classification of every response
//! - Lazy page-by-page iteration over list endpoints
//! - Canonical payload signing independent of HTTP
//!
//! # Quick Start
//!
//! ```no_run
//! use gridfarm_client::{Client, ClientConfig, FarmFilter};
//!
//! # fn example() -> gridfarm_client::ClientResult<()> {
//! let client = Client::new(&ClientConfig::from_env(), None)?;
//!
//! for farm in client.directory().farms(FarmFilter::default(), 20) {
//!     let farm = farm?;
//!     println!("{} {}", farm.id, farm.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Authentication
//!
//! Pass an [`Identity`] to sign every request. [`UserIdentity`] is the
//! ed25519 implementation; [`Session`] binds one to a client and adds the
//! registration flows.
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `GRIDFARM_EXPLORER_URL` | Explorer base URL (default: `https://explorer.grid.tf`) |
//! | `GRIDFARM_TIMEOUT` | Request timeout in seconds (default: 30) |

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod pager;
pub mod pages;
pub mod payload;
pub mod phonebook;
pub mod session;
pub mod signing;
pub mod transport;
pub mod types;

// Re-export main types
pub use client::Client;
pub use config::{ClientConfig, Endpoint, Network, API_ROOT};
pub use directory::{Directory, HttpDirectory};
pub use error::{ClientError, ClientResult};
pub use identity::{signing_key_from_bytes, Identity, UserIdentity};
pub use pager::{FarmFilter, NodeFilter, Pager, UserFilter, DEFAULT_PAGE_SIZE};
pub use pages::Pages;
pub use payload::{canonical_message, Arg, Canonical, PayloadSigner, SignedPayload};
pub use phonebook::{HttpPhonebook, Phonebook};
pub use session::{register_identity, Registration, Session};
pub use signing::{signing_string, RequestSigner, SIGNED_HEADERS, THREEBOT_ID_HEADER};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use types::{
    Farm, Iface, IfaceType, Location, Node, NodeCloudUnitPrice, NodeResourcePrice, PriceCurrency,
    Proof, PublicIface, PublicIp, ResourceAmount, User, WalletAddress, WorkloadAmount,
};
