//! Terminal-state reporting: the caller-facing success/error contract.

use crate::error::{Result, VoucherError};
use crate::machine::TerminalState;

/// An issued voucher: opaque signed bytes owned by the caller.
///
/// This crate never parses or validates the voucher content; it only carries
/// the bytes and their length back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voucher {
    bytes: Vec<u8>,
}

impl Voucher {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Map a terminal state to the caller-visible result.
///
/// Total and stable: every terminal state maps to exactly one reported
/// outcome, so callers can branch deterministically on the error kind.
pub fn report(terminal: TerminalState) -> Result<Voucher> {
    match terminal {
        TerminalState::Success { body } => Ok(Voucher::new(body)),
        TerminalState::RetryExhausted => Err(VoucherError::RetryExhausted),
        TerminalState::TransportFailure(kind) => Err(kind.into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
