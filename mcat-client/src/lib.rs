//! # Music Catalogue Client
//!
//! View-model over the catalogue HTTP API. The transport is injected, so
//! the same view-model runs against the real service ([`HttpTransport`])
//! or a test double.

pub mod error;
pub mod transport;
pub mod view_model;

pub use error::{ClientError, ClientResult};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use view_model::{GenreList, GenreSource, SongViewModel};
