mod cli_args;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pledge_transport::{HttpsTransport, PledgeSessionConfig};
use pledge_voucher::{request_voucher, DelayPolicy, Voucher, VoucherError};
use tracing::info;

use crate::cli_args::PledgeArgs;

/// Exit code for "registrar not ready; try again later", distinct from hard
/// failures so scripts can schedule their own re-invocation.
const EXIT_RETRY_LATER: u8 = 2;

fn main() -> ExitCode {
    let args = PledgeArgs::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pledge: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut transport = match HttpsTransport::connect(&config) {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("pledge: {err}");
            return ExitCode::FAILURE;
        }
    };

    match request_voucher(&mut transport, &DelayPolicy::default(), args.sign) {
        Ok(voucher) => {
            info!(voucher_len = voucher.len(), "voucher issued");
            if let Err(err) = emit_voucher(&args, &voucher) {
                eprintln!("pledge: {err:#}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(VoucherError::RetryExhausted) => {
            eprintln!("pledge: registrar is not ready yet; try again later");
            ExitCode::from(EXIT_RETRY_LATER)
        }
        Err(err) => {
            eprintln!("pledge: voucher request failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(args: &PledgeArgs) -> anyhow::Result<PledgeSessionConfig> {
    let mut config = PledgeSessionConfig::new(&args.registrar_url);
    config.timeout_secs = args.timeout_secs;

    if let Some(path) = &args.ca_bundle {
        config.trust_anchors_pem = std::fs::read(path)
            .with_context(|| format!("reading CA bundle {}", path.display()))?;
    }
    if let (Some(cert), Some(key)) = (&args.client_cert, &args.client_key) {
        let cert_pem = std::fs::read(cert)
            .with_context(|| format!("reading client certificate {}", cert.display()))?;
        let key_pem = std::fs::read(key)
            .with_context(|| format!("reading client key {}", key.display()))?;
        config = config.with_identity(cert_pem, key_pem);
    }
    if let (Some(user), Some(secret)) = (&args.user, &args.secret) {
        config = config.with_credentials(user, secret);
    }
    Ok(config)
}

fn emit_voucher(args: &PledgeArgs, voucher: &Voucher) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            std::fs::write(path, voucher.as_bytes())
                .with_context(|| format!("writing voucher to {}", path.display()))?;
            println!("voucher issued ({} bytes) -> {}", voucher.len(), path.display());
        }
        None => {
            std::io::stdout()
                .write_all(voucher.as_bytes())
                .context("writing voucher to stdout")?;
            eprintln!("voucher issued ({} bytes)", voucher.len());
        }
    }
    Ok(())
}
