//! Connection pools keyed by scheme, host and port

pub mod connection_pool;
pub mod key;
pub mod manager;
pub mod recently_used;
pub mod selector;

pub use connection_pool::ConnectionPool;
pub use key::PoolKey;
pub use manager::{PoolManager, PoolManagerConfig};
pub use recently_used::RecentlyUsed;
pub use selector::{PoolClass, PoolClasses, TlsSupport};
