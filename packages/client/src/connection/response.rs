//! Minimal HTTP/1.1 message framing over a connection's transport
//!
//! Only what a pooled connection needs: write a request head and body, read a
//! status line, headers and a body delimited by `Content-Length`, chunked
//! transfer-encoding or connection close. Interim `1xx` responses are
//! skipped.

use std::io::{self, Read, Write};

use http::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Response, StatusCode, Version};

const MAX_LINE: usize = 64 * 1024;
const MAX_HEADERS: usize = 100;
const READ_CHUNK: usize = 8 * 1024;

/// The peer closed or failed the transport before sending a single byte of
/// the response.
///
/// On a reused keep-alive connection this usually means the peer dropped the
/// connection while it sat idle.
#[derive(Debug, thiserror::Error)]
#[error("no response received: {source}")]
pub struct NoResponse {
    #[source]
    source: io::Error,
}

pub(crate) fn no_response(source: io::Error) -> io::Error {
    io::Error::new(source.kind(), NoResponse { source })
}

/// Whether `e` failed before any response byte arrived.
pub fn is_no_response(e: &io::Error) -> bool {
    e.get_ref().is_some_and(|inner| inner.is::<NoResponse>())
}

/// Reject request targets that would break out of the request line.
pub fn validate_target(path: &str) -> io::Result<()> {
    if path.bytes().any(|b| b.is_ascii_control() || b == b' ') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "request target contains whitespace or control characters",
        ));
    }
    Ok(())
}

/// Serialize a request onto `w`.
///
/// `Host` and `Content-Length` are added unless the caller supplied them.
pub fn write_request<W: Write + ?Sized>(
    w: &mut W,
    method: &Method,
    path: &str,
    authority: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> io::Result<()> {
    validate_target(path)?;
    let path = if path.is_empty() { "/" } else { path };
    let mut head = Vec::with_capacity(256);
    write!(head, "{method} {path} HTTP/1.1\r\n")?;

    if !headers.contains_key(HOST) {
        write!(head, "host: {authority}\r\n")?;
    }
    for (name, value) in headers {
        head.extend_from_slice(name.as_str().as_bytes());
        head.extend_from_slice(b": ");
        head.extend_from_slice(value.as_bytes());
        head.extend_from_slice(b"\r\n");
    }
    let needs_length = !body.is_empty()
        || *method == Method::POST
        || *method == Method::PUT
        || *method == Method::PATCH;
    if needs_length && !headers.contains_key(CONTENT_LENGTH) {
        write!(head, "content-length: {}\r\n", body.len())?;
    }
    head.extend_from_slice(b"\r\n");

    w.write_all(&head)?;
    w.write_all(body)?;
    w.flush()
}

/// A parsed response plus whether the connection may carry another request.
#[derive(Debug)]
pub struct ReadResponse {
    pub response: Response<Vec<u8>>,
    pub keep_alive: bool,
}

/// Read one response from `r`.
///
/// A failure before the first response byte is tagged [`NoResponse`].
pub fn read_response<R: Read + ?Sized>(r: &mut R, method: &Method) -> io::Result<ReadResponse> {
    let mut reader = LineReader::new(r);

    let (version, status, headers) = loop {
        let status_line = match reader.read_line() {
            Ok(line) => line,
            Err(e) if reader.received == 0 => return Err(no_response(e)),
            Err(e) => return Err(e),
        };
        let (version, status) = parse_status_line(&status_line)?;
        let headers = read_headers(&mut reader)?;
        if status.is_informational() && status != StatusCode::SWITCHING_PROTOCOLS {
            tracing::trace!("Skipping interim {} response", status);
            continue;
        }
        break (version, status, headers);
    };

    let mut keep_alive = match header_str(&headers, &CONNECTION) {
        Some(v) if v.eq_ignore_ascii_case("close") => false,
        Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
        _ => version == Version::HTTP_11,
    };

    let bodyless = *method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED;

    let body = if bodyless {
        Vec::new()
    } else if is_chunked(&headers) {
        reader.read_chunked()?
    } else if let Some(length) = header_str(&headers, &CONTENT_LENGTH) {
        let length: usize = length
            .trim()
            .parse()
            .map_err(|_| invalid("invalid content-length"))?;
        reader.read_exact_vec(length)?
    } else {
        keep_alive = false;
        reader.read_to_end()?
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.version_mut() = version;
    *response.headers_mut() = headers;

    Ok(ReadResponse {
        response,
        keep_alive,
    })
}

fn read_headers<R: Read + ?Sized>(reader: &mut LineReader<'_, R>) -> io::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    loop {
        let line = reader.read_line()?;
        if line.is_empty() {
            return Ok(headers);
        }
        if headers.len() >= MAX_HEADERS {
            return Err(invalid("too many response headers"));
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| invalid("malformed response header"))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| invalid("invalid header name"))?;
        let value =
            HeaderValue::from_str(value.trim()).map_err(|_| invalid("invalid header value"))?;
        headers.append(name, value);
    }
}

fn parse_status_line(line: &str) -> io::Result<(Version, StatusCode)> {
    let mut parts = line.splitn(3, ' ');
    let version = match parts.next() {
        Some("HTTP/1.1") => Version::HTTP_11,
        Some("HTTP/1.0") => Version::HTTP_10,
        _ => return Err(invalid("invalid status line")),
    };
    let status = parts
        .next()
        .and_then(|code| StatusCode::from_bytes(code.as_bytes()).ok())
        .ok_or_else(|| invalid("invalid status code"))?;
    Ok((version, status))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .next_back()
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Buffered reader over a transport; may hold bytes past the current message.
struct LineReader<'a, R: ?Sized> {
    inner: &'a mut R,
    buf: Vec<u8>,
    pos: usize,
    received: usize,
}

impl<'a, R: Read + ?Sized> LineReader<'a, R> {
    fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            pos: 0,
            received: 0,
        }
    }

    fn available(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Pull more bytes from the transport; `false` on EOF.
    fn fill(&mut self) -> io::Result<bool> {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        let mut chunk = [0u8; READ_CHUNK];
        let n = loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        self.buf.extend_from_slice(&chunk[..n]);
        self.received += n;
        Ok(n > 0)
    }

    fn read_line(&mut self) -> io::Result<String> {
        loop {
            if let Some(end) = self.available().windows(2).position(|w| w == b"\r\n") {
                let line = String::from_utf8(self.available()[..end].to_vec())
                    .map_err(|_| invalid("response head is not valid UTF-8"))?;
                self.pos += end + 2;
                return Ok(line);
            }
            if self.available().len() > MAX_LINE {
                return Err(invalid("response line too long"));
            }
            if !self.fill()? {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before message completed",
                ));
            }
        }
    }

    fn read_exact_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        while self.available().len() < len {
            if !self.fill()? {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before body completed",
                ));
            }
        }
        let out = self.available()[..len].to_vec();
        self.pos += len;
        Ok(out)
    }

    fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        while self.fill()? {}
        let out = self.available().to_vec();
        self.pos = self.buf.len();
        Ok(out)
    }

    fn read_chunked(&mut self) -> io::Result<Vec<u8>> {
        let mut body = Vec::new();
        loop {
            let line = self.read_line()?;
            let size = line.split(';').next().unwrap_or("").trim();
            let size =
                usize::from_str_radix(size, 16).map_err(|_| invalid("invalid chunk size"))?;
            if size == 0 {
                // trailers
                while !self.read_line()?.is_empty() {}
                return Ok(body);
            }
            body.extend_from_slice(&self.read_exact_vec(size)?);
            if !self.read_line()?.is_empty() {
                return Err(invalid("missing CRLF after chunk"));
            }
        }
    }
}
