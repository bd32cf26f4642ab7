//! SOCKS protocol implementation
//!
//! Client side of SOCKS4/4a (with user id) and SOCKS5 (no-auth and
//! username/password, RFC 1929) CONNECT handshakes. Target host names are
//! always forwarded to the proxy for remote resolution.
//!
//! Every failure is an `io::Error`, so a proxy that rejects the request is
//! reported exactly like a refused socket.

use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::connect::proxy::{ProxyOptions, SocksAuth, SocksVersion};

const SOCKS4_VERSION: u8 = 0x04;
const SOCKS4_GRANTED: u8 = 0x5A;

const SOCKS5_VERSION: u8 = 0x05;
const AUTH_NO_AUTH: u8 = 0x00;
const AUTH_USERNAME_PASSWORD: u8 = 0x02;
const AUTH_NO_ACCEPTABLE: u8 = 0xFF;
const AUTH_SUBNEG_VERSION: u8 = 0x01;

const CMD_CONNECT: u8 = 0x01;

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Perform the handshake matching the configured SOCKS version.
pub fn socks_handshake<S: Read + Write>(
    stream: &mut S,
    target_host: &str,
    target_port: u16,
    options: &ProxyOptions,
) -> io::Result<()> {
    tracing::debug!(
        version = ?options.socks_version,
        proxy = %options.authority(),
        "SOCKS handshake for {target_host}:{target_port}"
    );

    match options.socks_version {
        SocksVersion::V4 => socks4_handshake(
            stream,
            target_host,
            target_port,
            options.username.as_deref().unwrap_or(""),
        ),
        SocksVersion::V5 => socks5_handshake(stream, target_host, target_port, options.auth()),
    }
}

/// SOCKS4 handshake implementation.
pub fn socks4_handshake<S: Read + Write>(
    stream: &mut S,
    target_host: &str,
    target_port: u16,
    user_id: &str,
) -> io::Result<()> {
    // SOCKS4A - use 0.0.0.x to indicate hostname follows
    let (target_ip, send_hostname) = match Ipv4Addr::from_str(target_host) {
        Ok(ipv4) => (ipv4, false),
        Err(_) => (Ipv4Addr::new(0, 0, 0, 1), true),
    };

    let mut request = vec![SOCKS4_VERSION, CMD_CONNECT];
    request.extend_from_slice(&target_port.to_be_bytes());
    request.extend_from_slice(&target_ip.octets());
    request.extend_from_slice(user_id.as_bytes());
    request.push(0x00);

    if send_hostname {
        request.extend_from_slice(target_host.as_bytes());
        request.push(0x00);
    }

    stream.write_all(&request)?;

    let mut response = [0u8; 8];
    stream.read_exact(&mut response)?;

    if response[0] != 0x00 {
        return Err(invalid_data(format!(
            "SOCKS4 proxy server sent invalid data (reply version 0x{:02x})",
            response[0]
        )));
    }

    if response[1] != SOCKS4_GRANTED {
        return Err(socks4_reply_error(response[1]));
    }

    Ok(())
}

/// SOCKS5 handshake implementation.
pub fn socks5_handshake<S: Read + Write>(
    stream: &mut S,
    target_host: &str,
    target_port: u16,
    auth: SocksAuth<'_>,
) -> io::Result<()> {
    // Method negotiation: VER | NMETHODS | METHODS
    let greeting: &[u8] = match auth {
        SocksAuth::None => &[SOCKS5_VERSION, 0x01, AUTH_NO_AUTH],
        SocksAuth::UsernamePassword { .. } => {
            &[SOCKS5_VERSION, 0x02, AUTH_NO_AUTH, AUTH_USERNAME_PASSWORD]
        }
    };
    stream.write_all(greeting)?;

    let mut chosen = [0u8; 2];
    stream.read_exact(&mut chosen)?;

    if chosen[0] != SOCKS5_VERSION {
        return Err(invalid_data(format!(
            "SOCKS5 proxy server sent invalid data (version 0x{:02x})",
            chosen[0]
        )));
    }

    match (chosen[1], auth) {
        (AUTH_NO_AUTH, _) => {}
        (AUTH_USERNAME_PASSWORD, SocksAuth::UsernamePassword { username, password }) => {
            authenticate_password(stream, username, password)?;
        }
        (AUTH_NO_ACCEPTABLE, _) => {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "All offered SOCKS5 authentication methods were rejected",
            ));
        }
        (method, _) => {
            return Err(invalid_data(format!(
                "SOCKS5 proxy server chose unoffered authentication method 0x{method:02x}"
            )));
        }
    }

    // Connection request: VER | CMD | RSV | ATYP | DST.ADDR | DST.PORT
    let mut request = vec![SOCKS5_VERSION, CMD_CONNECT, 0x00];

    if let Ok(ip) = IpAddr::from_str(target_host) {
        match ip {
            IpAddr::V4(ipv4) => {
                request.push(ATYP_IPV4);
                request.extend_from_slice(&ipv4.octets());
            }
            IpAddr::V6(ipv6) => {
                request.push(ATYP_IPV6);
                request.extend_from_slice(&ipv6.octets());
            }
        }
    } else {
        let name = target_host.as_bytes();
        let len = u8::try_from(name.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Host name too long for SOCKS5: {target_host}"),
            )
        })?;
        request.push(ATYP_DOMAIN);
        request.push(len);
        request.extend_from_slice(name);
    }

    request.extend_from_slice(&target_port.to_be_bytes());
    stream.write_all(&request)?;

    let mut response = [0u8; 4];
    stream.read_exact(&mut response)?;

    if response[0] != SOCKS5_VERSION {
        return Err(invalid_data(format!(
            "SOCKS5 proxy server sent invalid data (reply version 0x{:02x})",
            response[0]
        )));
    }

    if response[1] != 0x00 {
        return Err(socks5_reply_error(response[1]));
    }

    // Skip bound address (variable length)
    match response[3] {
        ATYP_IPV4 => {
            let mut addr = [0u8; 6]; // 4 bytes IP + 2 bytes port
            stream.read_exact(&mut addr)?;
        }
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len)?;
            let mut domain_and_port = vec![0u8; usize::from(len[0]) + 2];
            stream.read_exact(&mut domain_and_port)?;
        }
        ATYP_IPV6 => {
            let mut addr = [0u8; 18]; // 16 bytes IP + 2 bytes port
            stream.read_exact(&mut addr)?;
        }
        other => {
            return Err(invalid_data(format!(
                "Invalid SOCKS5 address type in response: 0x{other:02x}"
            )));
        }
    }

    Ok(())
}

fn authenticate_password<S: Read + Write>(
    stream: &mut S,
    username: &str,
    password: &str,
) -> io::Result<()> {
    let too_long = |what: &str| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("SOCKS5 {what} too long (max 255 bytes)"),
        )
    };
    let ulen = u8::try_from(username.len()).map_err(|_| too_long("username"))?;
    let plen = u8::try_from(password.len()).map_err(|_| too_long("password"))?;

    // VER | ULEN | UNAME | PLEN | PASSWD
    let mut request = vec![AUTH_SUBNEG_VERSION, ulen];
    request.extend_from_slice(username.as_bytes());
    request.push(plen);
    request.extend_from_slice(password.as_bytes());
    stream.write_all(&request)?;

    let mut response = [0u8; 2];
    stream.read_exact(&mut response)?;

    if response[0] != AUTH_SUBNEG_VERSION {
        return Err(invalid_data(format!(
            "SOCKS5 proxy server sent invalid data (auth version 0x{:02x})",
            response[0]
        )));
    }

    if response[1] != 0x00 {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "SOCKS5 authentication failed",
        ));
    }

    Ok(())
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn socks4_reply_error(code: u8) -> io::Error {
    let message = match code {
        0x5B => "Request rejected or failed",
        0x5C => "Request rejected because SOCKS server cannot connect to identd on the client",
        0x5D => "Request rejected because the client program and identd report different user-ids",
        _ => "Unknown error",
    };
    io::Error::new(
        io::ErrorKind::ConnectionRefused,
        format!("SOCKS4 proxy rejected connection: 0x{code:02x}: {message}"),
    )
}

fn socks5_reply_error(code: u8) -> io::Error {
    let (kind, message) = match code {
        0x01 => (io::ErrorKind::Other, "General SOCKS server failure"),
        0x02 => (io::ErrorKind::PermissionDenied, "Connection not allowed by ruleset"),
        0x03 => (io::ErrorKind::Other, "Network unreachable"),
        0x04 => (io::ErrorKind::Other, "Host unreachable"),
        0x05 => (io::ErrorKind::ConnectionRefused, "Connection refused"),
        0x06 => (io::ErrorKind::Other, "TTL expired"),
        0x07 => (io::ErrorKind::Unsupported, "Command not supported, or protocol error"),
        0x08 => (io::ErrorKind::Unsupported, "Address type not supported"),
        _ => (io::ErrorKind::Other, "Unknown error"),
    };
    io::Error::new(
        kind,
        format!("SOCKS5 proxy rejected connection: 0x{code:02x}: {message}"),
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Replays scripted proxy replies and records what the client wrote.
    struct Scripted {
        replies: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Scripted {
        fn new(replies: &[u8]) -> Self {
            Self {
                replies: Cursor::new(replies.to_vec()),
                written: Vec::new(),
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.replies.read(buf)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    const SOCKS5_OK_IPV4: [u8; 10] = [0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0];

    #[test]
    fn socks4a_sends_user_id_and_hostname() {
        let mut stream = Scripted::new(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0]);
        socks4_handshake(&mut stream, "example.com", 80, "alice").expect("granted");

        let mut expected = vec![0x04, 0x01, 0x00, 0x50, 0, 0, 0, 1];
        expected.extend_from_slice(b"alice\0example.com\0");
        assert_eq!(stream.written, expected);
    }

    #[test]
    fn socks4_ip_target_is_sent_inline() {
        let mut stream = Scripted::new(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0]);
        socks4_handshake(&mut stream, "10.0.0.7", 443, "").expect("granted");
        assert_eq!(stream.written, vec![0x04, 0x01, 0x01, 0xBB, 10, 0, 0, 7, 0]);
    }

    #[test]
    fn socks4_rejection_is_connection_refused() {
        let mut stream = Scripted::new(&[0x00, 0x5B, 0, 0, 0, 0, 0, 0]);
        let err = socks4_handshake(&mut stream, "example.com", 80, "").expect_err("rejected");
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert!(err.to_string().contains("Request rejected or failed"));
    }

    #[test]
    fn socks5_without_auth_uses_domain_address() {
        let mut replies = vec![0x05, 0x00];
        replies.extend_from_slice(&SOCKS5_OK_IPV4);
        let mut stream = Scripted::new(&replies);

        socks5_handshake(&mut stream, "example.com", 8080, SocksAuth::None).expect("granted");

        let mut expected = vec![0x05, 0x01, 0x00, 0x05, 0x01, 0x00, 0x03, 11];
        expected.extend_from_slice(b"example.com");
        expected.extend_from_slice(&8080u16.to_be_bytes());
        assert_eq!(stream.written, expected);
    }

    #[test]
    fn socks5_password_subnegotiation() {
        let mut replies = vec![0x05, 0x02, 0x01, 0x00];
        replies.extend_from_slice(&SOCKS5_OK_IPV4);
        let mut stream = Scripted::new(&replies);

        let auth = SocksAuth::UsernamePassword {
            username: "u",
            password: "p",
        };
        socks5_handshake(&mut stream, "127.0.0.1", 80, auth).expect("granted");

        let expected = [
            0x05, 0x02, 0x00, 0x02, // greeting
            0x01, 0x01, b'u', 0x01, b'p', // credentials
            0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x00, 0x50, // connect
        ];
        assert_eq!(stream.written, expected);
    }

    #[test]
    fn socks5_bad_credentials_are_permission_denied() {
        let mut stream = Scripted::new(&[0x05, 0x02, 0x01, 0x01]);
        let auth = SocksAuth::UsernamePassword {
            username: "u",
            password: "wrong",
        };
        let err = socks5_handshake(&mut stream, "example.com", 80, auth).expect_err("denied");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn socks5_refused_reply() {
        let mut stream = Scripted::new(&[0x05, 0x00, 0x05, 0x05, 0x00, 0x01]);
        let err = socks5_handshake(&mut stream, "example.com", 80, SocksAuth::None)
            .expect_err("refused");
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert!(err.to_string().contains("Connection refused"));
    }

    #[test]
    fn socks5_truncated_reply_is_unexpected_eof() {
        let mut stream = Scripted::new(&[0x05]);
        let err = socks5_handshake(&mut stream, "example.com", 80, SocksAuth::None)
            .expect_err("truncated");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn dispatch_follows_configured_version() {
        let options = ProxyOptions::socks4("proxy", 1080)
            .with_credentials(Some("bob".into()), None);
        let mut stream = Scripted::new(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0]);
        socks_handshake(&mut stream, "1.2.3.4", 80, &options).expect("granted");
        assert_eq!(stream.written[0], 0x04);
        assert!(stream.written.ends_with(b"bob\0"));
    }
}
