//! End-to-end exchange tests against a scripted in-process HTTP server.
//!
//! These drive the full client — transport, classification, and the core
//! retry loop — over plain HTTP so no certificate material is needed.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use pledge_transport::{HttpsTransport, PledgeSessionConfig};
use pledge_voucher::{request_voucher, DelayPolicy, VoucherError};

/// One scripted response: status, optional Retry-After, body.
struct Scripted {
    status: u16,
    retry_after: Option<&'static str>,
    body: &'static [u8],
}

impl Scripted {
    fn issued(body: &'static [u8]) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body,
        }
    }

    fn deferred(retry_after: Option<&'static str>) -> Self {
        Self {
            status: 202,
            retry_after,
            body: b"",
        }
    }

    fn status(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
            body: b"",
        }
    }
}

/// Spawn a server that answers each incoming request with the next scripted
/// response, asserting the request shape on the way.
fn serve_script(script: Vec<Scripted>) -> (String, JoinHandle<usize>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind test server");
    let port = server
        .server_addr()
        .to_ip()
        .expect("ip listener")
        .port();
    let base_url = format!("http://127.0.0.1:{port}");

    let handle = std::thread::spawn(move || {
        let mut served = 0;
        for scripted in script {
            let request = match server.recv() {
                Ok(request) => request,
                Err(_) => break,
            };
            assert_eq!(request.url(), "/.well-known/est/requestvoucher");
            assert_eq!(request.method(), &tiny_http::Method::Post);

            let mut response = tiny_http::Response::from_data(scripted.body.to_vec())
                .with_status_code(scripted.status);
            if let Some(value) = scripted.retry_after {
                let header =
                    tiny_http::Header::from_bytes(&b"Retry-After"[..], value.as_bytes())
                        .expect("header");
                response = response.with_header(header);
            }
            request.respond(response).expect("respond");
            served += 1;
        }
        served
    });

    (base_url, handle)
}

#[test]
fn deferred_then_issued_round_trip() {
    let (base_url, server) = serve_script(vec![
        Scripted::deferred(Some("1")),
        Scripted::issued(b"pinned-domain-voucher"),
    ]);
    let config = PledgeSessionConfig::new(base_url).with_credentials("estuser", "estpwd");
    let mut transport = HttpsTransport::connect(&config).expect("transport");

    let start = Instant::now();
    let voucher =
        request_voucher(&mut transport, &DelayPolicy::default(), false).expect("voucher issued");
    let elapsed = start.elapsed();

    assert_eq!(voucher.as_bytes(), b"pinned-domain-voucher");
    assert_eq!(voucher.len(), 21);
    assert!(elapsed >= Duration::from_secs(1), "elapsed {elapsed:?}");
    assert!(elapsed <= Duration::from_secs(4), "elapsed {elapsed:?}");
    assert_eq!(server.join().expect("server thread"), 2);
}

#[test]
fn deferred_twice_reports_retry_exhausted() {
    let (base_url, server) = serve_script(vec![
        Scripted::deferred(Some("1")),
        Scripted::deferred(Some("1")),
    ]);
    let config = PledgeSessionConfig::new(base_url);
    let mut transport = HttpsTransport::connect(&config).expect("transport");

    let err = request_voucher(&mut transport, &DelayPolicy::default(), false)
        .expect_err("second deferral exhausts the budget");

    assert_eq!(err, VoucherError::RetryExhausted);
    assert_eq!(server.join().expect("server thread"), 2);
}

#[test]
fn deferral_without_retry_after_is_malformed() {
    let (base_url, server) = serve_script(vec![Scripted::deferred(None)]);
    let config = PledgeSessionConfig::new(base_url);
    let mut transport = HttpsTransport::connect(&config).expect("transport");

    let err = request_voucher(&mut transport, &DelayPolicy::default(), false)
        .expect_err("missing Retry-After is a policy violation");

    assert_eq!(err, VoucherError::MalformedResponse);
    assert_eq!(server.join().expect("server thread"), 1);
}

#[test]
fn auth_rejection_surfaces_immediately() {
    let (base_url, server) = serve_script(vec![Scripted::status(401)]);
    let config = PledgeSessionConfig::new(base_url).with_credentials("estuser", "wrong");
    let mut transport = HttpsTransport::connect(&config).expect("transport");

    let err = request_voucher(&mut transport, &DelayPolicy::default(), false)
        .expect_err("401 is a hard failure");

    assert_eq!(err, VoucherError::Auth);
    assert_eq!(server.join().expect("server thread"), 1);
}

#[test]
fn server_error_is_not_retried() {
    let (base_url, server) = serve_script(vec![Scripted::status(500)]);
    let config = PledgeSessionConfig::new(base_url);
    let mut transport = HttpsTransport::connect(&config).expect("transport");

    let start = Instant::now();
    let err = request_voucher(&mut transport, &DelayPolicy::default(), false)
        .expect_err("500 is a hard failure");

    assert_eq!(err, VoucherError::Server);
    // No deferral was honored, so the call returns promptly.
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(server.join().expect("server thread"), 1);
}

#[test]
fn unreachable_registrar_reports_connection_failure() {
    // Nothing listens on this port; connect fails fast.
    let config = PledgeSessionConfig::new("http://127.0.0.1:1");
    let mut transport = HttpsTransport::connect(&config).expect("transport");

    let err = request_voucher(&mut transport, &DelayPolicy::default(), false)
        .expect_err("nothing is listening");

    assert_eq!(err, VoucherError::Connection);
}
