//! Retry-after state machine for the voucher-request exchange.
//!
//! One external invocation performs at most two transport exchanges: the
//! initial attempt plus exactly one automatic retry.  A second deferral from
//! the registrar terminates the call with a retry-exhausted outcome instead
//! of waiting again — longer-term backoff belongs to the caller, who can see
//! application constraints (power budget, scheduling) this machine cannot.

use std::time::Duration;

use tracing::{debug, info};

use crate::delay::DelayPolicy;
use crate::error::Result;
use crate::outcome::{AttemptOutcome, TransportErrorKind};
use crate::report::{report, Voucher};
use crate::session::{RetrySession, VoucherRequest};

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// One authenticated request/response cycle against the registrar.
///
/// Implementations own the session (endpoint, credentials, TLS); the machine
/// only sees the condensed [`AttemptOutcome`].  A transport reused across
/// calls must be serialized by the caller: one voucher-request operation in
/// flight per session at a time.
pub trait VoucherTransport {
    fn exchange(&mut self, request: &VoucherRequest) -> AttemptOutcome;
}

/// Blocking-wait seam for the `Waiting` phase.
///
/// Production code sleeps on the calling thread via [`ThreadSleeper`]; tests
/// substitute a recording implementation so the clamp behavior is observable
/// without a real 60-second stall.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Non-terminal phases of one voucher-request invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Nothing issued yet.
    Init,
    /// A transport exchange is in flight.
    AwaitingResponse,
    /// Blocking for the enforced delay after a deferral.
    Waiting,
    /// About to issue the single automatic retry.
    Retrying,
}

/// Terminal state of one voucher-request invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalState {
    /// The registrar issued the voucher.
    Success { body: Vec<u8> },
    /// The registrar deferred a second time; the caller decides when to
    /// re-invoke the whole operation.
    RetryExhausted,
    /// A transport exchange failed outright.
    TransportFailure(TransportErrorKind),
}

// ---------------------------------------------------------------------------
// Drive loop
// ---------------------------------------------------------------------------

/// Run one voucher-request invocation to a terminal state.
///
/// Worst-case occupancy of the calling thread is bounded by the enforced
/// delay cap plus two network round-trips.  The only externally observable
/// side effect is the blocking wait between the two exchanges.
pub fn run_voucher_exchange<T, S>(
    transport: &mut T,
    sleeper: &mut S,
    policy: &DelayPolicy,
    request: &VoucherRequest,
) -> TerminalState
where
    T: VoucherTransport + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut session = RetrySession::new();
    let mut phase = ExchangePhase::Init;
    debug!(?phase, "starting voucher-request exchange");

    loop {
        phase = ExchangePhase::AwaitingResponse;
        debug!(
            ?phase,
            retries_made = session.retries_made(),
            "issuing voucher request"
        );

        match transport.exchange(request) {
            AttemptOutcome::Issued { body } => {
                debug!(body_len = body.len(), "registrar issued voucher");
                return TerminalState::Success { body };
            }
            AttemptOutcome::Failed(kind) => {
                debug!(?kind, "voucher request failed");
                return TerminalState::TransportFailure(kind);
            }
            AttemptOutcome::Deferred { retry_after_secs } => {
                if !session.can_retry() {
                    debug!("registrar deferred again; retry budget exhausted");
                    return TerminalState::RetryExhausted;
                }
                session.record_deferral(retry_after_secs);

                // Saturate so an absurd suggestion still hits the cap
                // instead of wrapping negative and skipping the wait.
                let wait = policy
                    .enforce(retry_after_secs.map(|secs| i64::try_from(secs).unwrap_or(i64::MAX)));
                phase = ExchangePhase::Waiting;
                info!(
                    ?phase,
                    suggested_secs = retry_after_secs,
                    enforced_secs = wait.as_secs(),
                    "registrar deferred; waiting before the automatic retry"
                );
                sleeper.sleep(wait);
                phase = ExchangePhase::Retrying;
                debug!(?phase, "enforced wait complete");
            }
        }
    }
}

/// Request a voucher over an established session.
///
/// The caller-facing operation: issues the initial exchange, honors at most
/// one deferral with a bounded blocking wait, and reports a typed result.
pub fn request_voucher<T>(
    transport: &mut T,
    policy: &DelayPolicy,
    want_signed: bool,
) -> Result<Voucher>
where
    T: VoucherTransport + ?Sized,
{
    let request = VoucherRequest {
        want_signed,
        prebuilt_body: None,
    };
    request_voucher_with(transport, policy, &request)
}

/// Like [`request_voucher`], but with a caller-built [`VoucherRequest`]
/// (e.g. one carrying a pre-signed payload).
pub fn request_voucher_with<T>(
    transport: &mut T,
    policy: &DelayPolicy,
    request: &VoucherRequest,
) -> Result<Voucher>
where
    T: VoucherTransport + ?Sized,
{
    report(run_voucher_exchange(
        transport,
        &mut ThreadSleeper,
        policy,
        request,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Transport that replays a fixed script of outcomes.
    struct ScriptedTransport {
        script: Vec<AttemptOutcome>,
        exchanges: usize,
    }

    impl ScriptedTransport {
        fn new(script: Vec<AttemptOutcome>) -> Self {
            Self {
                script,
                exchanges: 0,
            }
        }
    }

    impl VoucherTransport for ScriptedTransport {
        fn exchange(&mut self, _request: &VoucherRequest) -> AttemptOutcome {
            let outcome = self.script[self.exchanges].clone();
            self.exchanges += 1;
            outcome
        }
    }

    /// Sleeper that records requested durations instead of blocking.
    #[derive(Default)]
    struct RecordingSleeper {
        slept: Vec<Duration>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.slept.push(duration);
        }
    }

    fn issued(body: &[u8]) -> AttemptOutcome {
        AttemptOutcome::Issued {
            body: body.to_vec(),
        }
    }

    fn deferred(secs: u64) -> AttemptOutcome {
        AttemptOutcome::Deferred {
            retry_after_secs: Some(secs),
        }
    }

    #[test]
    fn test_issued_on_first_exchange_succeeds_without_waiting() {
        let mut transport = ScriptedTransport::new(vec![issued(b"voucher")]);
        let mut sleeper = RecordingSleeper::default();

        let terminal = run_voucher_exchange(
            &mut transport,
            &mut sleeper,
            &DelayPolicy::default(),
            &VoucherRequest::unsigned(),
        );

        assert_eq!(
            terminal,
            TerminalState::Success {
                body: b"voucher".to_vec()
            }
        );
        assert_eq!(transport.exchanges, 1);
        assert!(sleeper.slept.is_empty());
    }

    #[test]
    fn test_deferred_once_waits_enforced_delay_then_retries() {
        let mut transport = ScriptedTransport::new(vec![deferred(5), issued(b"voucher")]);
        let mut sleeper = RecordingSleeper::default();

        let terminal = run_voucher_exchange(
            &mut transport,
            &mut sleeper,
            &DelayPolicy::default(),
            &VoucherRequest::unsigned(),
        );

        assert!(matches!(terminal, TerminalState::Success { .. }));
        assert_eq!(transport.exchanges, 2);
        assert_eq!(sleeper.slept, vec![Duration::from_secs(5)]);
    }

    #[test]
    fn test_suggested_delay_above_cap_is_clamped_to_sixty_seconds() {
        let mut transport = ScriptedTransport::new(vec![deferred(70), issued(b"voucher")]);
        let mut sleeper = RecordingSleeper::default();

        let terminal = run_voucher_exchange(
            &mut transport,
            &mut sleeper,
            &DelayPolicy::default(),
            &VoucherRequest::unsigned(),
        );

        assert!(matches!(terminal, TerminalState::Success { .. }));
        assert_eq!(sleeper.slept, vec![Duration::from_secs(60)]);
    }

    #[test]
    fn test_second_deferral_exhausts_retries_without_third_exchange() {
        // A third scripted outcome proves the machine never reaches it.
        let mut transport =
            ScriptedTransport::new(vec![deferred(5), deferred(5), issued(b"unreached")]);
        let mut sleeper = RecordingSleeper::default();

        let terminal = run_voucher_exchange(
            &mut transport,
            &mut sleeper,
            &DelayPolicy::default(),
            &VoucherRequest::unsigned(),
        );

        assert_eq!(terminal, TerminalState::RetryExhausted);
        assert_eq!(transport.exchanges, 2);
        assert_eq!(sleeper.slept.len(), 1);
    }

    #[test]
    fn test_failure_on_first_exchange_is_terminal() {
        let mut transport =
            ScriptedTransport::new(vec![AttemptOutcome::Failed(TransportErrorKind::Auth)]);
        let mut sleeper = RecordingSleeper::default();

        let terminal = run_voucher_exchange(
            &mut transport,
            &mut sleeper,
            &DelayPolicy::default(),
            &VoucherRequest::unsigned(),
        );

        assert_eq!(
            terminal,
            TerminalState::TransportFailure(TransportErrorKind::Auth)
        );
        assert_eq!(transport.exchanges, 1);
        assert!(sleeper.slept.is_empty());
    }

    #[test]
    fn test_failure_on_retry_is_terminal() {
        let mut transport = ScriptedTransport::new(vec![
            deferred(1),
            AttemptOutcome::Failed(TransportErrorKind::Server),
        ]);
        let mut sleeper = RecordingSleeper::default();

        let terminal = run_voucher_exchange(
            &mut transport,
            &mut sleeper,
            &DelayPolicy::default(),
            &VoucherRequest::unsigned(),
        );

        assert_eq!(
            terminal,
            TerminalState::TransportFailure(TransportErrorKind::Server)
        );
        assert_eq!(transport.exchanges, 2);
    }

    #[test]
    fn test_zero_suggestion_retries_immediately() {
        let mut transport = ScriptedTransport::new(vec![deferred(0), issued(b"voucher")]);
        let mut sleeper = RecordingSleeper::default();

        let terminal = run_voucher_exchange(
            &mut transport,
            &mut sleeper,
            &DelayPolicy::default(),
            &VoucherRequest::unsigned(),
        );

        assert!(matches!(terminal, TerminalState::Success { .. }));
        assert_eq!(sleeper.slept, vec![Duration::ZERO]);
    }

    #[test]
    fn test_request_voucher_reports_typed_results() {
        let mut transport = ScriptedTransport::new(vec![issued(b"voucher")]);
        let voucher = request_voucher(&mut transport, &DelayPolicy::default(), false)
            .expect("voucher should be issued");
        assert_eq!(voucher.len(), 7);

        let mut transport =
            ScriptedTransport::new(vec![AttemptOutcome::Failed(TransportErrorKind::Tls)]);
        let err = request_voucher(&mut transport, &DelayPolicy::default(), false)
            .expect_err("tls failure should surface");
        assert_eq!(err, crate::VoucherError::Tls);
    }
}
