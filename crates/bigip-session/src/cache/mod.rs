//! Identity cache for resource proxies
//!
//! Every proxy handed out for a remote resource goes through an [`IdentityCache`]
//! so that two lookups of the same resource on the same device converge on one
//! in-memory object and share its cached attribute values.
//!
//! # Ownership
//!
//! Callers own proxies through `Arc`; the cache keeps only a `Weak`. A proxy nobody
//! references any more is disposable: the next lookup builds a fresh one.
//!
//! # Keys
//!
//! [`ResourceKey`] combines the endpoint host, the [`ResourceKind`] and the
//! kind-specific identity. The same name on two devices, or a pool and a node that
//! share a name, map to distinct entries.

mod identity;
mod key;

pub use identity::{CacheStats, IdentityCache};
pub use key::{ResourceIdentity, ResourceKey, ResourceKind};
