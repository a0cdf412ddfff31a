//! Security headers for the admin panel.
//!
//! Stricter than the storefront: forms only post back to the admin, and
//! images may come from the media host or from local `blob:` previews of a
//! file about to be uploaded.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Precomputed CSP for [`security_headers_middleware`].
#[derive(Debug, Clone)]
pub struct AdminSecurityPolicy {
    csp: HeaderValue,
}

impl AdminSecurityPolicy {
    /// Build the policy for a media CDN origin.
    ///
    /// Falls back to same-origin images if the origin is not a valid header value.
    #[must_use]
    pub fn new(media_origin: &str) -> Self {
        let csp = HeaderValue::from_str(&content_security_policy(media_origin)).unwrap_or_else(|_| {
            tracing::warn!(media_origin, "Invalid media origin, images limited to self");
            HeaderValue::from_static(
                "default-src 'none'; script-src 'self'; style-src 'self'; img-src 'self' blob:; \
                 connect-src 'self'; form-action 'self'; base-uri 'none'; frame-ancestors 'none'",
            )
        });
        Self { csp }
    }
}

fn content_security_policy(media_origin: &str) -> String {
    format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         img-src 'self' blob: {media_origin}; \
         connect-src 'self'; \
         form-action 'self'; \
         base-uri 'none'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all admin responses.
///
/// Admin pages are never cached (`Cache-Control: no-store`).
pub async fn security_headers_middleware(
    State(policy): State<AdminSecurityPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, policy.csp);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_media_and_blob_previews() {
        let policy = AdminSecurityPolicy::new("https://res.cloudinary.com");
        let csp = policy.csp.to_str().unwrap();
        assert!(csp.contains("img-src 'self' blob: https://res.cloudinary.com;"));
        assert!(csp.contains("form-action 'self';"));
    }
}
