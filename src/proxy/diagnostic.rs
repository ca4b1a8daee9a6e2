//! Diagnostic context attached to 404 responses

use serde::Serialize;
use serde_json::{Map, Value};

/// Heading of every diagnostic body
pub const DIAGNOSTIC_BANNER: &str = "404 Not Found (metadata proxy)";

/// Ordered key/value data explaining why a request could not be served
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticContext(Map<String, Value>);

impl DiagnosticContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; values that fail to serialize are recorded as `null`
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.0.insert(key.to_string(), value);
        self
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Render the plain-text body: banner, message, then the context as
    /// 2-space indented JSON
    pub fn render(&self, message: &str) -> String {
        let json = serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string());
        format!("{DIAGNOSTIC_BANNER}\n\n{message}\n\nContext:\n{json}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let ctx = DiagnosticContext::new()
            .with("requestUrl", "http://proxy/x")
            .with("upstreamStatus", 500);
        let body = ctx.render("Something failed.");
        assert_eq!(
            body,
            "404 Not Found (metadata proxy)\n\nSomething failed.\n\nContext:\n{\n  \"requestUrl\": \"http://proxy/x\",\n  \"upstreamStatus\": 500\n}\n"
        );
    }

    #[test]
    fn test_insertion_order_kept() {
        let ctx = DiagnosticContext::new().with("zeta", 1).with("alpha", 2);
        let body = ctx.render("m");
        assert!(body.find("zeta").unwrap() < body.find("alpha").unwrap());
    }

    #[test]
    fn test_optional_values() {
        let ctx = DiagnosticContext::new().with("upstreamContentType", None::<String>);
        assert_eq!(ctx.get("upstreamContentType"), Some(&Value::Null));
        assert!(ctx.render("m").contains("\"upstreamContentType\": null"));
    }
}
