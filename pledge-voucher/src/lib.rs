pub mod delay;
pub mod error;
pub mod machine;
pub mod outcome;
pub mod report;
pub mod session;

pub use delay::{DelayPolicy, MAX_RETRY_DELAY_SECS};
pub use error::{Result, VoucherError};
pub use machine::{
    request_voucher, request_voucher_with, run_voucher_exchange, ExchangePhase, Sleeper,
    TerminalState, ThreadSleeper, VoucherTransport,
};
pub use outcome::{AttemptOutcome, TransportErrorKind};
pub use report::{report, Voucher};
pub use session::{RetrySession, VoucherRequest, MAX_AUTO_RETRIES};
