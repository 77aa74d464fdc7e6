//! MISPForge
//!
//! Client for the MISP REST search API. Event and attribute searches go
//! through one [`Connection::search`] call and come back as a [`Response`]
//! that iterates over [`MispObject`]s, whatever the resource kind.
//!
//! ```no_run
//! use mispforge::{AttributeQuery, Connection};
//!
//! # async fn example() -> mispforge::Result<()> {
//! let con = Connection::new("https", "misp.example", "API-KEY");
//! let query = AttributeQuery { last: Some("1d".into()), ..Default::default() };
//! for object in con.search(&query.into()).await? {
//!     if let Some(attribute) = object.into_attribute() {
//!         println!("{} {}", attribute.timestamp(), attribute.value);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod response;

pub use client::{Connection, ConnectionOptions, Scheme, Searcher};
pub use config::{ConfigOverrides, MispConfig};
pub use error::{MispError, Result};
pub use models::{Attribute, Event, Org, RelatedEvent};
pub use query::{AttributeQuery, EventQuery, Query};
pub use response::{AttributeResponse, EventResponse, MispObject, Response, ResponseIter};
