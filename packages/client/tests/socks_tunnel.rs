//! Requests carried end to end through fake SOCKS4 and SOCKS5 proxies

mod common;

use std::time::{Duration, Instant};

use common::{Behavior, FakeProxy, SilentProxy, closed_port, init_logging};
use socks_proxy_client::{
    HeaderMap, Method, PoolConfig, SocksProxyManager, StatusCode, Timeout, TlsSupport,
};

fn manager(proxy_url: &str) -> SocksProxyManager {
    SocksProxyManager::builder(proxy_url)
        .timeout(Duration::from_secs(5))
        .tls_support(TlsSupport::Unavailable)
        .build()
        .expect("manager builds")
}

fn body_text(response: &http::Response<Vec<u8>>) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

#[test]
fn socks5_tunnel_carries_http() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5());
    let manager = manager(&proxy.url("socks5"));

    let response = manager
        .request(Method::GET, "http://example.com/hello?x=1")
        .expect("request through proxy");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(&response), "GET /hello?x=1 HTTP/1.1 via example.com:80");

    let seen = proxy.next_seen();
    assert_eq!(seen.host, "example.com");
    assert_eq!(seen.port, 80);
}

#[test]
fn socks5_forwards_ip_targets() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5());
    let manager = manager(&proxy.url("socks5"));

    manager
        .request(Method::GET, "http://10.1.2.3:8080/")
        .expect("request through proxy");
    let seen = proxy.next_seen();
    assert_eq!(seen.host, "10.1.2.3");
    assert_eq!(seen.port, 8080);
}

#[test]
fn socks5_username_password_from_url() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5().with_credentials("alice", "s3cret"));
    let url = format!("socks5://alice:s3cret@{}", proxy.addr);
    let manager = manager(&url);

    let response = manager
        .request(Method::GET, "http://example.org/")
        .expect("authenticated request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn socks5_explicit_credentials_override_url() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5().with_credentials("bob", "right"));
    let url = format!("socks5://bob:wrong@{}", proxy.addr);
    let manager = SocksProxyManager::builder(url)
        .username("bob")
        .password("right")
        .tls_support(TlsSupport::Unavailable)
        .build()
        .expect("manager builds");

    assert!(manager.request(Method::GET, "http://example.org/").is_ok());
}

#[test]
fn socks5_wrong_password_is_a_new_connection_error() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5().with_credentials("alice", "s3cret"));
    let url = format!("socks5://alice:nope@{}", proxy.addr);
    let manager = manager(&url);

    let err = manager
        .request(Method::GET, "http://example.org/")
        .expect_err("authentication fails");
    assert!(err.is_new_connection(), "{err:?}");
    assert!(err.to_string().contains("authentication failed"));
}

#[test]
fn socks5_rejection_is_a_new_connection_error() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5().rejecting(0x05));
    let manager = manager(&proxy.url("socks5"));

    let err = manager
        .request(Method::GET, "http://example.com/")
        .expect_err("proxy refuses");
    assert!(err.is_new_connection());
    assert!(!err.is_connect_timeout());
    assert!(err.to_string().starts_with("Failed to establish a new connection:"));
    assert!(err.to_string().contains("Connection refused"));

    let connection = err.connection().expect("error names the connection");
    assert_eq!(connection.host, "example.com");
    assert_eq!(connection.port, 80);
}

#[test]
fn socks4a_tunnel_sends_user_id_and_hostname() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks4().with_credentials("carol", ""));
    let manager = SocksProxyManager::builder(proxy.url("socks4"))
        .username("carol")
        .tls_support(TlsSupport::Unavailable)
        .build()
        .expect("manager builds");

    let response = manager
        .request(Method::GET, "http://example.net:8000/index")
        .expect("request through proxy");
    assert_eq!(body_text(&response), "GET /index HTTP/1.1 via example.net:8000");

    let seen = proxy.next_seen();
    assert_eq!(seen.host, "example.net");
    assert_eq!(seen.port, 8000);
    assert_eq!(seen.user_id.as_deref(), Some("carol"));
}

#[test]
fn socks4_rejection_is_a_new_connection_error() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks4().rejecting(0x5B));
    let manager = manager(&proxy.url("socks4"));

    let err = manager
        .request(Method::GET, "http://192.0.2.1/")
        .expect_err("proxy rejects");
    assert!(err.is_new_connection());
}

#[test]
fn pooled_connection_is_reused_for_the_same_origin() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5());
    let manager = manager(&proxy.url("socks5"));

    for path in ["/one", "/two", "/three"] {
        let url = format!("http://example.com{path}");
        let response = manager.request(Method::GET, &url).expect("request");
        assert!(body_text(&response).starts_with(&format!("GET {path} ")));
    }

    let pool = manager
        .connection_from_url("http://example.com/")
        .expect("pool");
    assert_eq!(pool.num_connections(), 1);
    assert_eq!(pool.num_requests(), 3);
}

#[test]
fn idle_connection_dropped_by_proxy_is_redialed() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5().closing_after(1));
    let manager = manager(&proxy.url("socks5"));

    for path in ["/first", "/second"] {
        let url = format!("http://example.com{path}");
        let response = manager.request(Method::GET, &url).expect("request");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(&response).starts_with(&format!("GET {path} ")));
    }

    // One tunnel per request: the second rode a fresh handshake.
    assert_eq!(proxy.next_seen().host, "example.com");
    assert_eq!(proxy.next_seen().host, "example.com");

    let pool = manager
        .connection_from_url("http://example.com/")
        .expect("pool");
    assert_eq!(pool.num_connections(), 1);
}

#[test]
fn default_headers_reach_the_origin() {
    init_logging();
    let proxy = FakeProxy::start(Behavior::socks5());
    let mut headers = HeaderMap::new();
    headers.insert("user-agent", "socks-test/1.0".parse().expect("header value"));
    let manager = SocksProxyManager::new(
        &proxy.url("socks5"),
        None,
        None,
        10,
        headers,
        PoolConfig::default().with_timeout(Timeout::new(Duration::from_secs(5))),
    )
    .expect("manager builds");

    assert_eq!(manager.headers()["user-agent"], "socks-test/1.0");
    let response = manager
        .request(Method::GET, "http://example.com/")
        .expect("request");
    assert_eq!(response.headers()["x-target"], "example.com");
}

#[test]
fn unreachable_proxy_is_a_new_connection_error() {
    init_logging();
    let url = format!("socks5://{}", closed_port());
    let manager = manager(&url);

    let err = manager
        .request(Method::GET, "http://example.com/")
        .expect_err("nothing listens on the proxy port");
    assert!(err.is_new_connection());
    assert!(err.is_connect());
}

#[test]
fn silent_proxy_hits_the_connect_timeout() {
    init_logging();
    let proxy = SilentProxy::start();
    let manager = SocksProxyManager::builder(format!("socks5://{}", proxy.addr))
        .connect_timeout(Duration::from_millis(200))
        .tls_support(TlsSupport::Unavailable)
        .build()
        .expect("manager builds");

    let started = Instant::now();
    let err = manager
        .request(Method::GET, "http://example.com/")
        .expect_err("handshake never completes");

    assert!(err.is_connect_timeout(), "{err:?}");
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        err.to_string(),
        "Connection to example.com timed out. (connect timeout=200ms)"
    );
}
