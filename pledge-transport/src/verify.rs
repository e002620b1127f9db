//! Peer-certificate verification override capability.
//!
//! The pledge normally verifies the registrar against its configured trust
//! anchors.  Deployments sometimes need to approve a chain that fails stock
//! verification (e.g. a CRL endpoint is unreachable during bootstrap).  That
//! decision is modeled as a predicate the session is configured with — never
//! a process-global callback registration.

use std::fmt;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::{CertificateError, DigitallySignedStruct, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};

/// Classification of a failed peer-certificate verification, handed to the
/// override predicate alongside the offending end-entity certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertVerifyError {
    /// The chain does not lead to a configured trust anchor.
    UntrustedRoot,
    /// The certificate has expired.
    Expired,
    /// The certificate is not yet valid.
    NotYetValid,
    /// The certificate has been revoked.
    Revoked,
    /// The certificate does not match the requested server name.
    NameMismatch,
    /// The certificate could not be parsed.
    BadEncoding,
    /// Any other verification failure.
    Other,
}

/// Predicate deciding whether to accept a peer certificate that failed
/// verification.  Returning `true` approves the connection.
pub type VerifyOverride = Arc<dyn Fn(&CertificateDer<'_>, CertVerifyError) -> bool + Send + Sync>;

pub(crate) fn classify_tls_error(err: &rustls::Error) -> CertVerifyError {
    match err {
        rustls::Error::InvalidCertificate(cert_err) => match cert_err {
            CertificateError::UnknownIssuer => CertVerifyError::UntrustedRoot,
            CertificateError::Expired | CertificateError::ExpiredContext { .. } => {
                CertVerifyError::Expired
            }
            CertificateError::NotValidYet | CertificateError::NotValidYetContext { .. } => {
                CertVerifyError::NotYetValid
            }
            CertificateError::Revoked => CertVerifyError::Revoked,
            CertificateError::NotValidForName
            | CertificateError::NotValidForNameContext { .. } => CertVerifyError::NameMismatch,
            CertificateError::BadEncoding => CertVerifyError::BadEncoding,
            _ => CertVerifyError::Other,
        },
        _ => CertVerifyError::Other,
    }
}

/// [`ServerCertVerifier`] that delegates to the stock WebPKI verifier and
/// consults the override predicate only when stock verification fails.
pub(crate) struct OverridableServerVerifier {
    inner: Arc<WebPkiServerVerifier>,
    decide: VerifyOverride,
}

impl OverridableServerVerifier {
    pub(crate) fn new(inner: Arc<WebPkiServerVerifier>, decide: VerifyOverride) -> Self {
        Self { inner, decide }
    }
}

impl fmt::Debug for OverridableServerVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverridableServerVerifier")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl ServerCertVerifier for OverridableServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Ok(verified) => Ok(verified),
            Err(err) => {
                let class = classify_tls_error(&err);
                if (self.decide)(end_entity, class) {
                    tracing::warn!(?class, "verification override approved peer certificate");
                    Ok(ServerCertVerified::assertion())
                } else {
                    Err(err)
                }
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
