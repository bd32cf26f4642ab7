//! Fake SOCKS proxies for integration tests
//!
//! Each proxy accepts connections on an ephemeral localhost port, runs the
//! server side of the handshake, records the requested target, and then acts
//! as the HTTP origin itself: it answers every request with a body naming the
//! target it was asked to reach.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Socks4,
    Socks5,
}

/// What the fake proxy does once a client connects.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub protocol: Protocol,
    /// SOCKS5 credentials the proxy insists on; SOCKS4 expects the username as user id
    pub credentials: Option<(String, String)>,
    /// Reply code sent instead of success (SOCKS5 REP or SOCKS4 CD)
    pub reject_with: Option<u8>,
    /// Close the tunnel silently after this many responses
    pub responses_per_tunnel: Option<usize>,
}

impl Behavior {
    pub fn socks5() -> Self {
        Self {
            protocol: Protocol::Socks5,
            credentials: None,
            reject_with: None,
            responses_per_tunnel: None,
        }
    }

    pub fn socks4() -> Self {
        Self {
            protocol: Protocol::Socks4,
            ..Self::socks5()
        }
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    pub fn rejecting(mut self, code: u8) -> Self {
        self.reject_with = Some(code);
        self
    }

    pub fn closing_after(mut self, responses: usize) -> Self {
        self.responses_per_tunnel = Some(responses);
        self
    }
}

/// Target requested through the proxy, plus the user id for SOCKS4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub host: String,
    pub port: u16,
    pub user_id: Option<String>,
}

pub struct FakeProxy {
    pub addr: SocketAddr,
    seen: Receiver<Seen>,
}

impl FakeProxy {
    pub fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake proxy");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let behavior = behavior.clone();
                let tx = tx.clone();
                thread::spawn(move || {
                    let _ = serve(stream, &behavior, &tx);
                });
            }
        });

        Self { addr, seen: rx }
    }

    pub fn url(&self, scheme: &str) -> String {
        format!("{scheme}://{}", self.addr)
    }

    /// Next target a client asked for.
    pub fn next_seen(&self) -> Seen {
        self.seen
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("proxy saw a connection")
    }
}

fn serve(mut stream: TcpStream, behavior: &Behavior, seen: &Sender<Seen>) -> io::Result<()> {
    let target = match behavior.protocol {
        Protocol::Socks5 => socks5_server(&mut stream, behavior)?,
        Protocol::Socks4 => socks4_server(&mut stream, behavior)?,
    };
    let Some(target) = target else {
        return Ok(());
    };
    let _ = seen.send(target.clone());

    // Act as the origin for as many requests as the client sends.
    let mut answered = 0;
    loop {
        if behavior.responses_per_tunnel.is_some_and(|limit| answered >= limit) {
            return Ok(());
        }
        let Some(head) = read_head(&mut stream)? else {
            return Ok(());
        };
        let first_line = head.lines().next().unwrap_or_default().to_string();
        let body = format!("{} via {}:{}", first_line, target.host, target.port);
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nX-Target: {}\r\n\r\n{}",
            body.len(),
            target.host,
            body
        )?;
        stream.flush()?;
        answered += 1;
    }
}

fn read_head(stream: &mut TcpStream) -> io::Result<Option<String>> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if stream.read(&mut byte)? == 0 {
            return Ok(None);
        }
        head.push(byte[0]);
    }
    Ok(Some(String::from_utf8_lossy(&head).into_owned()))
}

fn read_u8(stream: &mut TcpStream) -> io::Result<u8> {
    let mut b = [0u8; 1];
    stream.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_vec(stream: &mut TcpStream, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_port(stream: &mut TcpStream) -> io::Result<u16> {
    let mut port = [0u8; 2];
    stream.read_exact(&mut port)?;
    Ok(u16::from_be_bytes(port))
}

fn read_cstring(stream: &mut TcpStream) -> io::Result<String> {
    let mut out = Vec::new();
    loop {
        match read_u8(stream)? {
            0 => break,
            b => out.push(b),
        }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn socks5_server(stream: &mut TcpStream, behavior: &Behavior) -> io::Result<Option<Seen>> {
    let version = read_u8(stream)?;
    assert_eq!(version, 5, "client must greet with SOCKS5");
    let nmethods = read_u8(stream)?;
    let methods = read_vec(stream, usize::from(nmethods))?;

    if let Some((username, password)) = &behavior.credentials {
        if !methods.contains(&0x02) {
            stream.write_all(&[5, 0xFF])?;
            return Ok(None);
        }
        stream.write_all(&[5, 0x02])?;

        let sub_version = read_u8(stream)?;
        assert_eq!(sub_version, 1);
        let ulen = read_u8(stream)?;
        let user = read_vec(stream, usize::from(ulen))?;
        let plen = read_u8(stream)?;
        let pass = read_vec(stream, usize::from(plen))?;
        if user != username.as_bytes() || pass != password.as_bytes() {
            stream.write_all(&[1, 1])?;
            return Ok(None);
        }
        stream.write_all(&[1, 0])?;
    } else {
        stream.write_all(&[5, 0x00])?;
    }

    let header = read_vec(stream, 4)?;
    assert_eq!(&header[..3], &[5, 1, 0], "CONNECT request");
    let host = match header[3] {
        1 => {
            let ip = read_vec(stream, 4)?;
            Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]).to_string()
        }
        3 => {
            let len = read_u8(stream)?;
            String::from_utf8_lossy(&read_vec(stream, usize::from(len))?).into_owned()
        }
        4 => {
            let ip: [u8; 16] = read_vec(stream, 16)?
                .try_into()
                .expect("16 address bytes");
            Ipv6Addr::from(ip).to_string()
        }
        other => panic!("unexpected address type {other}"),
    };
    let port = read_port(stream)?;

    let rep = behavior.reject_with.unwrap_or(0);
    stream.write_all(&[5, rep, 0, 1, 127, 0, 0, 1, 0, 0])?;
    if rep != 0 {
        return Ok(None);
    }

    Ok(Some(Seen {
        host,
        port,
        user_id: None,
    }))
}

fn socks4_server(stream: &mut TcpStream, behavior: &Behavior) -> io::Result<Option<Seen>> {
    let header = read_vec(stream, 8)?;
    assert_eq!(&header[..2], &[4, 1], "SOCKS4 CONNECT request");
    let port = u16::from_be_bytes([header[2], header[3]]);
    let ip = Ipv4Addr::new(header[4], header[5], header[6], header[7]);
    let user_id = read_cstring(stream)?;

    // SOCKS4a: 0.0.0.x with x != 0 means a host name follows
    let octets = ip.octets();
    let host = if octets[..3] == [0, 0, 0] && octets[3] != 0 {
        read_cstring(stream)?
    } else {
        ip.to_string()
    };

    let expected_user = behavior
        .credentials
        .as_ref()
        .map(|(user, _)| user.as_str())
        .unwrap_or("");
    let code = match behavior.reject_with {
        Some(code) => code,
        None if user_id != expected_user => 0x5D,
        None => 0x5A,
    };
    stream.write_all(&[0, code, 0, 0, 0, 0, 0, 0])?;
    if code != 0x5A {
        return Ok(None);
    }

    Ok(Some(Seen {
        host,
        port,
        user_id: Some(user_id),
    }))
}

/// A listener that accepts connections and never speaks, to force handshake timeouts.
pub struct SilentProxy {
    pub addr: SocketAddr,
}

impl SilentProxy {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent proxy");
        let addr = listener.local_addr().expect("local addr");
        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => held.push(stream),
                    Err(_) => break,
                }
            }
        });
        Self { addr }
    }
}

/// An address with nothing listening on it.
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}
