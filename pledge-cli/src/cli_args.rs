use std::path::PathBuf;

use clap::Parser;

/// Request a BRSKI trust voucher from a network registrar.
#[derive(Debug, Parser)]
#[command(name = "pledge", version, about)]
pub struct PledgeArgs {
    /// Registrar base URL, e.g. https://registrar.example:8443
    #[arg(long, env = "PLEDGE_REGISTRAR_URL")]
    pub registrar_url: String,

    /// PEM bundle of trust anchors used to verify the registrar.
    #[arg(long, env = "PLEDGE_CA_BUNDLE")]
    pub ca_bundle: Option<PathBuf>,

    /// PEM client certificate for mutual TLS.
    #[arg(long, env = "PLEDGE_CLIENT_CERT", requires = "client_key")]
    pub client_cert: Option<PathBuf>,

    /// PEM client private key for mutual TLS.
    #[arg(long, env = "PLEDGE_CLIENT_KEY", requires = "client_cert")]
    pub client_key: Option<PathBuf>,

    /// HTTP basic-auth user id.
    #[arg(long, env = "PLEDGE_USER")]
    pub user: Option<String>,

    /// HTTP basic-auth secret.
    #[arg(long, env = "PLEDGE_SECRET", requires = "user")]
    pub secret: Option<String>,

    /// Ask the registrar for a MASA-signed voucher.
    #[arg(long)]
    pub sign: bool,

    /// Per-exchange timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Write the issued voucher to this path instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Increase log verbosity.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
