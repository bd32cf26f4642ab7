//! Socket options applied to the TCP connection towards the proxy

use std::time::Duration;

/// Options set on the proxy socket before the SOCKS handshake starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    /// Enable TCP_NODELAY
    pub tcp_nodelay: bool,

    /// TCP keep-alive idle time
    pub keepalive: Option<Duration>,

    /// SO_RCVBUF size in bytes
    pub recv_buffer_size: Option<usize>,

    /// SO_SNDBUF size in bytes
    pub send_buffer_size: Option<usize>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            keepalive: None,
            recv_buffer_size: None,
            send_buffer_size: None,
        }
    }
}

impl SocketOptions {
    #[must_use]
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = nodelay;
        self
    }

    #[must_use]
    pub fn with_keepalive(mut self, idle: Duration) -> Self {
        self.keepalive = Some(idle);
        self
    }

    #[must_use]
    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_send_buffer_size(mut self, size: usize) -> Self {
        self.send_buffer_size = Some(size);
        self
    }
}
