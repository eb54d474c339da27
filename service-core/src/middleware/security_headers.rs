use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::IntoResponse,
};

/// Prefix under which uploaded files are served.
pub const UPLOADS_PREFIX: &str = "/uploads/";

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
// Scans and receipts open inline in the SPA, so same-origin framing is allowed.
const UPLOAD_CSP: &str = "default-src 'none'; img-src 'self'; object-src 'self'";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let is_upload = req.uri().path().starts_with(UPLOADS_PREFIX);

    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut(), is_upload);
    response
}

fn apply_security_headers(headers: &mut HeaderMap, is_upload: bool) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    let (csp, framing) = if is_upload {
        (UPLOAD_CSP, "SAMEORIGIN")
    } else {
        // Buyer details must not linger in shared caches.
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        (API_CSP, "DENY")
    };
    headers.insert(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(csp));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static(framing));
}
