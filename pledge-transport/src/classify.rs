//! HTTP response classification for the voucher-request exchange.
//!
//! Condenses one registrar response into the core's [`AttemptOutcome`].
//! Pure functions only; the HTTP client lives in [`crate::https`].

use pledge_voucher::{AttemptOutcome, TransportErrorKind};

/// Classify an HTTP status plus the raw `Retry-After` header value.
///
/// - `200` is an issued voucher; the body travels through opaquely.
/// - `202` is a deferral.  The delay must be an explicit whole-seconds value:
///   a missing or non-numeric `Retry-After` (the HTTP-date form included) is
///   a policy violation and classifies as `MalformedResponse` — the pledge
///   never guesses a delay in place of a required one.
/// - `401`/`403` are authentication failures; other 4xx responses are not
///   interpretable for this exchange and classify as `MalformedResponse`.
/// - 5xx is a server-side application error.
pub fn classify_response(
    status: u16,
    retry_after: Option<&str>,
    body: Vec<u8>,
) -> AttemptOutcome {
    match status {
        200 => AttemptOutcome::Issued { body },
        202 => match retry_after.and_then(parse_retry_after_secs) {
            Some(secs) => AttemptOutcome::Deferred {
                retry_after_secs: Some(secs),
            },
            None => AttemptOutcome::Failed(TransportErrorKind::MalformedResponse),
        },
        401 | 403 => AttemptOutcome::Failed(TransportErrorKind::Auth),
        s if s >= 500 => AttemptOutcome::Failed(TransportErrorKind::Server),
        _ => AttemptOutcome::Failed(TransportErrorKind::MalformedResponse),
    }
}

/// Parse a `Retry-After` header value as whole seconds.
pub fn parse_retry_after_secs(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
