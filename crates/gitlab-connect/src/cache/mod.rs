//! Process-wide connection cache
//!
//! [`ConnectionCache`] maps a [`CacheKey`] to the [`ConnectionHandle`] resolved
//! for it. There is no TTL and no eviction: entries live until they are
//! replaced by a forced refresh or removed explicitly.
//!
//! The cache is an ordinary value. Construct one at startup, wrap it in an
//! `Arc` and hand it to every [`ConnectionResolver`] that should share it.
//!
//! [`ConnectionHandle`]: crate::connection::ConnectionHandle
//! [`ConnectionResolver`]: crate::resolver::ConnectionResolver

mod key;
mod store;

pub use key::CacheKey;
pub use store::ConnectionCache;
