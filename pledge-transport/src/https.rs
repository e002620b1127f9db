//! Blocking HTTPS transport for the voucher-request exchange.
//!
//! One [`HttpsTransport`] owns the authenticated session (client, endpoint,
//! credentials) and condenses each request/response cycle into the core's
//! `AttemptOutcome`.  The retry loop lives in `pledge-voucher`, not here.

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use pledge_voucher::{AttemptOutcome, TransportErrorKind, VoucherRequest, VoucherTransport};
use rustls::client::WebPkiServerVerifier;
use rustls::RootCertStore;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tracing::{debug, warn};

use crate::classify::classify_response;
use crate::config::{Credentials, PledgeSessionConfig};
use crate::error::{Result, TransportSetupError};
use crate::verify::OverridableServerVerifier;

/// EST/BRSKI operation name for requesting a voucher.
pub const VOUCHER_REQUEST_OP: &str = "requestvoucher";

/// Content type of an unsigned JSON voucher request.
const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of a CMS-signed voucher request and of the voucher itself.
const CMS_CONTENT_TYPE: &str = "application/voucher-cms+json";

/// Blocking transport over an established registrar session.
#[derive(Debug)]
pub struct HttpsTransport {
    client: reqwest::blocking::Client,
    endpoint: reqwest::Url,
    credentials: Option<Credentials>,
    extra_headers: Vec<(String, String)>,
}

impl HttpsTransport {
    /// Build a transport from the session configuration.
    ///
    /// TLS material is parsed and the client constructed here, so that
    /// configuration mistakes surface before the first exchange.
    pub fn connect(config: &PledgeSessionConfig) -> Result<Self> {
        let base = config.validate()?;
        let endpoint = base
            .join(&format!(
                "{}/{}",
                config.well_known_segment.trim_matches('/'),
                VOUCHER_REQUEST_OP
            ))
            .map_err(|err| TransportSetupError::InvalidBaseUrl(err.to_string()))?;

        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("pledge/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs));
        if base.scheme() == "https" {
            builder = builder.use_preconfigured_tls(build_tls_config(config)?);
        }
        let client = builder.build()?;

        debug!(endpoint = %endpoint, "registrar session ready");
        Ok(Self {
            client,
            endpoint,
            credentials: config.credentials.clone(),
            extra_headers: config
                .extra_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// The fully resolved voucher-request endpoint.
    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

impl VoucherTransport for HttpsTransport {
    fn exchange(&mut self, request: &VoucherRequest) -> AttemptOutcome {
        let (body, content_type) = match &request.prebuilt_body {
            Some(signed) => (signed.clone(), CMS_CONTENT_TYPE),
            None => {
                if request.want_signed {
                    warn!("signed voucher requested without a prebuilt payload; sending unsigned");
                }
                (build_unsigned_body(), JSON_CONTENT_TYPE)
            }
        };

        let mut req = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::ACCEPT, CMS_CONTENT_TYPE)
            .body(body);
        if let Some(creds) = &self.credentials {
            req = req.basic_auth(&creds.user_id, Some(&creds.secret));
        }
        for (name, value) in &self.extra_headers {
            req = req.header(name, value);
        }

        debug!(endpoint = %self.endpoint, "issuing voucher request");
        let response = match req.send() {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "voucher request could not be sent");
                return AttemptOutcome::Failed(classify_send_error(&err));
            }
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = match response.bytes() {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                warn!(error = %err, "voucher response body could not be read");
                return AttemptOutcome::Failed(TransportErrorKind::MalformedResponse);
            }
        };

        debug!(status, retry_after = retry_after.as_deref(), "registrar responded");
        classify_response(status, retry_after.as_deref(), body)
    }
}

/// Build the JSON body of an unsigned voucher request.
fn build_unsigned_body() -> Vec<u8> {
    let nonce: [u8; 16] = rand::random();
    let body = serde_json::json!({
        "ietf-voucher-request:voucher": {
            "assertion": "proximity",
            "nonce": base64::engine::general_purpose::STANDARD.encode(nonce),
            "created-on": chrono::Utc::now().to_rfc3339(),
        }
    });
    serde_json::to_vec(&body).unwrap_or_default()
}

/// Map a reqwest send error onto the transport failure taxonomy.
fn classify_send_error(err: &reqwest::Error) -> TransportErrorKind {
    if has_tls_source(err) {
        return TransportErrorKind::Tls;
    }
    if err.is_timeout() || err.is_connect() || err.is_request() {
        return TransportErrorKind::Connection;
    }
    if err.is_body() || err.is_decode() {
        return TransportErrorKind::MalformedResponse;
    }
    TransportErrorKind::Connection
}

/// Walk the error source chain looking for a TLS-layer failure.
fn has_tls_source(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
            if io_err.kind() == std::io::ErrorKind::InvalidData {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// Build the rustls client configuration from the session's PEM material.
fn build_tls_config(config: &PledgeSessionConfig) -> Result<rustls::ClientConfig> {
    let mut roots = RootCertStore::empty();
    for cert in CertificateDer::pem_slice_iter(&config.trust_anchors_pem) {
        let cert =
            cert.map_err(|err| TransportSetupError::BadPemMaterial(format!("trust anchor: {err:?}")))?;
        roots
            .add(cert)
            .map_err(TransportSetupError::Tls)?;
    }
    if roots.is_empty() {
        return Err(TransportSetupError::NoTrustAnchors);
    }
    let roots = Arc::new(roots);

    let builder = rustls::ClientConfig::builder().with_root_certificates(roots.clone());
    let mut tls = match &config.identity {
        Some(identity) => {
            let certs = CertificateDer::pem_slice_iter(&identity.cert_pem)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|err| {
                    TransportSetupError::BadPemMaterial(format!("client certificate: {err:?}"))
                })?;
            let key = PrivateKeyDer::from_pem_slice(&identity.key_pem).map_err(|err| {
                TransportSetupError::BadPemMaterial(format!("client key: {err:?}"))
            })?;
            builder.with_client_auth_cert(certs, key)?
        }
        None => builder.with_no_client_auth(),
    };

    if let Some(decide) = &config.verify_override {
        let inner = WebPkiServerVerifier::builder(roots).build()?;
        tls.dangerous()
            .set_certificate_verifier(Arc::new(OverridableServerVerifier::new(
                inner,
                decide.clone(),
            )));
    }

    Ok(tls)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
