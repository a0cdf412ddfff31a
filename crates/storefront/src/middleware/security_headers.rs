//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! The CSP is built once at startup from configuration: product images come
//! from the media CDN, and the checkout form redirects to the hosted payment
//! page, so both origins are allowed explicitly.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Origins of the hosted payment pages (live and sandbox).
pub const PAYMENT_ORIGINS: &str = "https://*.mercadopago.com.ar https://*.mercadopago.com";

/// Precomputed header values for [`security_headers_middleware`].
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    csp: HeaderValue,
}

impl SecurityPolicy {
    /// Build the policy for a media CDN origin.
    ///
    /// Falls back to a policy without the CDN if the origin is not a valid
    /// header value.
    #[must_use]
    pub fn new(media_origin: &str) -> Self {
        let csp = HeaderValue::from_str(&content_security_policy(media_origin)).unwrap_or_else(|_| {
            tracing::warn!(media_origin, "Invalid media origin, images limited to self");
            HeaderValue::from_static(
                "default-src 'none'; script-src 'self'; style-src 'self'; font-src 'self'; \
                 img-src 'self'; connect-src 'self'; object-src 'none'; base-uri 'self'; \
                 form-action 'self'; frame-ancestors 'none'",
            )
        });
        Self { csp }
    }
}

/// CSP string:
///
/// ```text
/// default-src 'none';
/// script-src 'self';
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' data: {media_origin};
/// connect-src 'self';
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self' {payment origins};
/// frame-ancestors 'none'
/// ```
fn content_security_policy(media_origin: &str) -> String {
    format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data: {media_origin}; \
         connect-src 'self'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self' {PAYMENT_ORIGINS}; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Content-Security-Policy` - see [`SecurityPolicy`]
/// - `Permissions-Policy` - Deny sensors, camera, microphone, geolocation
/// - `Cross-Origin-Opener-Policy: same-origin`
pub async fn security_headers_middleware(
    State(policy): State<SecurityPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(CONTENT_SECURITY_POLICY, policy.csp);
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), camera=(), geolocation=(), gyroscope=(), \
             magnetometer=(), microphone=(), usb=()",
        ),
    );
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
    fn test_csp_allows_media_and_payment_origins() {
        let policy = SecurityPolicy::new("https://res.cloudinary.com");
        let csp = policy.csp.to_str().unwrap();
        assert!(csp.contains("img-src 'self' data: https://res.cloudinary.com;"));
        assert!(csp.contains("form-action 'self' https://*.mercadopago.com.ar"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_invalid_origin_falls_back() {
        let policy = SecurityPolicy::new("https://cdn.test\n");
        let csp = policy.csp.to_str().unwrap();
        assert!(csp.contains("img-src 'self';"));
    }
}
