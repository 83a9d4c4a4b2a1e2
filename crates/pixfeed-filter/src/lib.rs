//! Pixfeed transform service
//!
//! `GET /filteredimage?image_url=<url>` downloads the image at `url` and
//! returns it as a 256x256 grayscale JPEG. The relay calls this with a signed
//! read URL for the object it is about to replace.

pub mod error;
pub mod fetch;
mod handlers;
pub mod resolve;
pub mod routes;
pub mod state;
pub mod url_policy;

pub use error::FilterError;
pub use fetch::SourceFetcher;
pub use handlers::USAGE_HINT;
pub use resolve::{HostLookup, PublicOnlyResolver, SystemLookup};
pub use routes::{build_router, serve};
pub use state::FilterState;
pub use url_policy::UrlPolicy;
