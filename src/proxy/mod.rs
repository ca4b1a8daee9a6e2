//! Metadata proxy module
//!
//! Maps inbound `/metadata/` paths onto the upstream host and resolves
//! `?direct` requests for `.json` documents into archive download redirects.

mod classify;
mod client;
mod diagnostic;
mod direct_match;
mod resolve;
mod upstream;

pub use classify::is_direct_request;
pub use client::{BoxError, UpstreamClient};
pub use diagnostic::DiagnosticContext;
pub use resolve::{resolve_direct, ResolveError};
pub use upstream::{build_upstream_url, strip_direct_param};
