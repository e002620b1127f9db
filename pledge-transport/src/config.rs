//! Per-session configuration for the pledge's registrar connection.
//!
//! Everything the transport needs is carried explicitly on this value and
//! owned by the caller: construct before the first call, drop after the last.
//! There is no process-global credential or session bootstrap.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TransportSetupError};
use crate::verify::VerifyOverride;

/// Default well-known path segment for the voucher-request endpoint.
pub const DEFAULT_WELL_KNOWN_SEGMENT: &str = ".well-known/est";

/// Default per-exchange timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP basic-auth credentials presented alongside the TLS client identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// PEM-encoded client identity for mutual TLS.
#[derive(Clone)]
pub struct ClientIdentity {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("cert_pem_len", &self.cert_pem.len())
            .finish_non_exhaustive()
    }
}

/// Configuration for one registrar session.
#[derive(Clone)]
pub struct PledgeSessionConfig {
    /// Registrar base URL, e.g. `https://registrar.example:8443`.
    pub base_url: String,
    /// Well-known path segment under which EST operations live.
    pub well_known_segment: String,
    /// HTTP basic-auth credentials, if the registrar requires them.
    pub credentials: Option<Credentials>,
    /// PEM bundle of trust anchors used to verify the registrar.
    pub trust_anchors_pem: Vec<u8>,
    /// Client certificate and key for mutual TLS.
    pub identity: Option<ClientIdentity>,
    /// Per-exchange timeout in seconds.
    pub timeout_secs: u64,
    /// Extra HTTP headers to include in requests.
    pub extra_headers: HashMap<String, String>,
    /// Predicate consulted when stock certificate verification fails.
    pub verify_override: Option<VerifyOverride>,
}

impl fmt::Debug for PledgeSessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PledgeSessionConfig")
            .field("base_url", &self.base_url)
            .field("well_known_segment", &self.well_known_segment)
            .field("credentials", &self.credentials)
            .field("trust_anchors_pem_len", &self.trust_anchors_pem.len())
            .field("identity", &self.identity)
            .field("timeout_secs", &self.timeout_secs)
            .field("has_verify_override", &self.verify_override.is_some())
            .finish()
    }
}

impl PledgeSessionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            well_known_segment: DEFAULT_WELL_KNOWN_SEGMENT.to_string(),
            credentials: None,
            trust_anchors_pem: Vec::new(),
            identity: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            extra_headers: HashMap::new(),
            verify_override: None,
        }
    }

    pub fn with_credentials(mut self, user_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            user_id: user_id.into(),
            secret: secret.into(),
        });
        self
    }

    pub fn with_trust_anchors(mut self, pem: Vec<u8>) -> Self {
        self.trust_anchors_pem = pem;
        self
    }

    pub fn with_identity(mut self, cert_pem: Vec<u8>, key_pem: Vec<u8>) -> Self {
        self.identity = Some(ClientIdentity { cert_pem, key_pem });
        self
    }

    pub fn with_verify_override(mut self, decide: VerifyOverride) -> Self {
        self.verify_override = Some(decide);
        self
    }

    /// Validate the configuration and return the parsed base URL.
    ///
    /// An `https` URL requires a non-empty trust-anchor bundle: the pledge
    /// never verifies a registrar against an implicit system store.
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|err| TransportSetupError::InvalidBaseUrl(format!("{}: {err}", self.base_url)))?;
        match url.scheme() {
            "https" => {
                if self.trust_anchors_pem.is_empty() {
                    return Err(TransportSetupError::NoTrustAnchors);
                }
            }
            "http" => {}
            other => {
                return Err(TransportSetupError::UnsupportedScheme(other.to_string()));
            }
        }
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
