/// Errors building a transport session, before any exchange is attempted.
///
/// Exchange-time failures never surface here: they are condensed into the
/// core's `AttemptOutcome` so the state machine can classify them.
#[derive(Debug, thiserror::Error)]
pub enum TransportSetupError {
    #[error("invalid registrar base url: {0}")]
    InvalidBaseUrl(String),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("no usable trust anchors in the configured CA bundle")]
    NoTrustAnchors,

    #[error("bad PEM material: {0}")]
    BadPemMaterial(String),

    #[error("tls: {0}")]
    Tls(#[from] rustls::Error),

    #[error("verifier: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, TransportSetupError>;
