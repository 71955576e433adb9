use axum::http::HeaderMap;

use crate::controller::RouteAcl;

/// The three client identification headers every non-public route requires:
/// `x-<prefix>-client`, `x-<prefix>-client-version` and
/// `x-<prefix>-client-api-version`.
#[derive(Debug, Clone)]
pub struct RequiredHeaders {
    client: String,
    version: String,
    api_version: String,
}

impl RequiredHeaders {
    pub fn new(prefix: &str) -> Self {
        let client = format!("x-{}-client", prefix.to_lowercase());
        Self {
            version: format!("{client}-version"),
            api_version: format!("{client}-api-version"),
            client,
        }
    }

    pub fn names(&self) -> [&str; 3] {
        [&self.client, &self.version, &self.api_version]
    }

    /// Check `headers` against the route's ACL. Only a route explicitly marked
    /// unprotected may omit them; a missing ACL counts as protected.
    pub fn check(&self, headers: &HeaderMap, acl: Option<&RouteAcl>) -> Result<(), String> {
        let complete = self.names().iter().all(|name| headers.contains_key(*name));
        let exempt = matches!(acl, Some(acl) if !acl.protected);

        if complete || exempt {
            return Ok(());
        }

        Err(format!(
            "Client did not send required {} / {} / {} headers.",
            self.client, self.version, self.api_version
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn all_headers() -> HeaderMap {
        let required = RequiredHeaders::new("paperframe");
        let mut headers = HeaderMap::new();
        for name in required.names() {
            headers.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_static("1"),
            );
        }
        headers
    }

    #[test]
    fn test_header_names() {
        let required = RequiredHeaders::new("Acme");
        assert_eq!(
            required.names(),
            ["x-acme-client", "x-acme-client-version", "x-acme-client-api-version"]
        );
    }

    #[test]
    fn test_complete_headers_pass_everywhere() {
        let required = RequiredHeaders::new("paperframe");
        let headers = all_headers();
        assert!(required.check(&headers, Some(&RouteAcl::PROTECTED)).is_ok());
        assert!(required.check(&headers, Some(&RouteAcl::PUBLIC)).is_ok());
        assert!(required.check(&headers, None).is_ok());
    }

    #[test]
    fn test_missing_headers() {
        let required = RequiredHeaders::new("paperframe");
        let mut headers = all_headers();
        headers.remove("x-paperframe-client-api-version");

        assert!(required.check(&headers, Some(&RouteAcl::PUBLIC)).is_ok());
        assert!(required.check(&headers, None).is_err());
        let message = required
            .check(&headers, Some(&RouteAcl::PROTECTED))
            .unwrap_err();
        assert_eq!(
            message,
            "Client did not send required x-paperframe-client / x-paperframe-client-version / \
             x-paperframe-client-api-version headers."
        );
    }
}
