pub mod classify;
pub mod config;
pub mod error;
pub mod https;
pub mod verify;

pub use classify::{classify_response, parse_retry_after_secs};
pub use config::{
    ClientIdentity, Credentials, PledgeSessionConfig, DEFAULT_TIMEOUT_SECS,
    DEFAULT_WELL_KNOWN_SEGMENT,
};
pub use error::{Result, TransportSetupError};
pub use https::{HttpsTransport, VOUCHER_REQUEST_OP};
pub use verify::{CertVerifyError, VerifyOverride};
