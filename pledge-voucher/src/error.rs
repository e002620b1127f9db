use crate::outcome::TransportErrorKind;

/// Errors reported to the caller of a voucher-request operation.
///
/// `RetryExhausted` is deliberately distinct from every transport failure:
/// it is the one error the caller recovers from by re-invoking the whole
/// operation later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VoucherError {
    #[error("registrar deferred twice; retry the voucher request later")]
    RetryExhausted,

    #[error("could not reach the registrar")]
    Connection,

    #[error("TLS verification of the registrar failed")]
    Tls,

    #[error("registrar rejected the pledge credentials")]
    Auth,

    #[error("malformed response from the registrar")]
    MalformedResponse,

    #[error("registrar reported a server-side error")]
    Server,
}

impl From<TransportErrorKind> for VoucherError {
    fn from(kind: TransportErrorKind) -> Self {
        match kind {
            TransportErrorKind::Connection => VoucherError::Connection,
            TransportErrorKind::Tls => VoucherError::Tls,
            TransportErrorKind::Auth => VoucherError::Auth,
            TransportErrorKind::MalformedResponse => VoucherError::MalformedResponse,
            TransportErrorKind::Server => VoucherError::Server,
        }
    }
}

pub type Result<T> = std::result::Result<T, VoucherError>;
