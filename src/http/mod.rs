//! HTTP protocol layer module
//!
//! Response builders shared by the request handler, decoupled from routing.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_502_response, build_diagnostic_response, build_direct_redirect_response,
    build_health_response, from_upstream, ProxyBody,
};
