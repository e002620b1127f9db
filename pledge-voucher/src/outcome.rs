//! Outcome vocabulary for a single transport exchange.
//!
//! The transport adapter condenses one HTTP request/response cycle into an
//! [`AttemptOutcome`]; the state machine consumes nothing else.

/// Classification of a hard transport failure.
///
/// These are terminal for the current invocation: none of them indicate that
/// the registrar merely needs more time, so none are retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not reach the registrar (connect, DNS, timeout).
    Connection,
    /// TLS handshake or peer-certificate verification failed.
    Tls,
    /// The registrar rejected the pledge's credentials.
    Auth,
    /// The response could not be interpreted, including an accepted-retry
    /// response that carries no usable delay value.
    MalformedResponse,
    /// The registrar reported a server-side application error.
    Server,
}

/// Result of one transport exchange with the registrar.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The registrar issued the voucher.  The body is opaque to this crate.
    Issued { body: Vec<u8> },
    /// The registrar accepted the request but is not ready yet; retry after
    /// the suggested number of whole seconds.
    Deferred { retry_after_secs: Option<u64> },
    /// The exchange failed outright.
    Failed(TransportErrorKind),
}
