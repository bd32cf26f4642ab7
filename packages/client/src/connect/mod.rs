//! Connection establishment through SOCKS proxies
//!
//! The dial primitive, its blocking TCP helpers and the proxy options record.

pub mod dialer;
pub mod proxy;
pub mod request;
pub mod tcp;

pub use dialer::{Dial, DialError, SocksDialer, translate_dial_error};
pub use proxy::{ProxyOptions, SocksAuth, SocksVersion};
pub use request::{ConnectionId, ConnectionRequest, Stream, Transport};
