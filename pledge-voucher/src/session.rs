//! Per-invocation request value and retry bookkeeping.

/// Number of automatic retries permitted within one external invocation.
///
/// This is a protocol-policy decision, not a tunable: callers rely on the
/// bounded worst-case latency it implies, and the acceptance tests pin it.
pub const MAX_AUTO_RETRIES: u32 = 1;

/// Immutable description of one voucher request.
///
/// Endpoint and credentials live on the transport session, constructed by the
/// caller before the first call; this value only carries what varies per
/// request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoucherRequest {
    /// Whether the registrar is asked for a MASA-signed voucher.
    pub want_signed: bool,
    /// Caller-supplied, already-signed voucher-request payload.  When absent
    /// the transport builds an unsigned request body itself.
    pub prebuilt_body: Option<Vec<u8>>,
}

impl VoucherRequest {
    /// An unsigned voucher request; the transport builds the body.
    pub fn unsigned() -> Self {
        Self::default()
    }

    /// A request carrying a payload the caller has already signed.
    pub fn signed(prebuilt_body: Vec<u8>) -> Self {
        Self {
            want_signed: true,
            prebuilt_body: Some(prebuilt_body),
        }
    }
}

/// Transient retry state owned by the state machine for one invocation.
///
/// Destroyed when the call returns; nothing is shared across invocations.
#[derive(Debug, Clone)]
pub struct RetrySession {
    retries_made: u32,
    max_auto_retries: u32,
    last_delay_requested: Option<u64>,
}

impl RetrySession {
    pub fn new() -> Self {
        Self {
            retries_made: 0,
            max_auto_retries: MAX_AUTO_RETRIES,
            last_delay_requested: None,
        }
    }

    /// Whether another automatic retry is still permitted.
    pub fn can_retry(&self) -> bool {
        self.retries_made < self.max_auto_retries
    }

    /// Record a deferral the machine is about to honor with a wait.
    pub fn record_deferral(&mut self, suggested_secs: Option<u64>) {
        self.retries_made += 1;
        self.last_delay_requested = suggested_secs;
    }

    /// Automatic retries consumed so far (0 or 1).
    pub fn retries_made(&self) -> u32 {
        self.retries_made
    }

    /// The delay the registrar suggested on the most recent deferral.
    pub fn last_delay_requested(&self) -> Option<u64> {
        self.last_delay_requested
    }
}

impl Default for RetrySession {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
