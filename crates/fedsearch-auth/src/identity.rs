//! Request-scoped identity extraction helpers.

use fedsearch_core::{ActingIdentity, RequestContext};

/// Extract the `ActingIdentity` bound to a request, if present.
pub fn identity_from_parts(parts: &http::request::Parts) -> Option<&ActingIdentity> {
    parts.extensions.get::<ActingIdentity>()
}

/// Build a fresh [`RequestContext`] from the identity bound to a request.
///
/// Returns `None` when the request never passed through the auth layer.
pub fn context_from_parts(parts: &http::request::Parts) -> Option<RequestContext> {
    identity_from_parts(parts).cloned().map(RequestContext::new)
}
