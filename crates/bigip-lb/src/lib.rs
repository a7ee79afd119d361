//! Resource proxies for BIG-IP local traffic objects.
//!
//! [`Lb`] wraps a [`Connection`](bigip_session::Connection) and hands out one
//! shared proxy per remote pool, pool member, node, rule or virtual server.
//! Proxies cache their attributes; getters refresh the cached value from the
//! device, setters write through. A proxy built with `new` is not bound to any
//! connection and behaves as a plain record.
//!
//! Bulk reads (`pools_get`, `nodes_get`, ...) run at the root folder with
//! recursive queries on, and put the session back as they found it. Saves run
//! in a writable folder inside a transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bigip_lb::{Lb, MemberAddress, Resource};
//!
//! let lb = Lb::new(Arc::new(conn));
//! let pool = lb.pool("web");
//! pool.stage(|a| {
//!     a.lbmethod = Some("round_robin".into());
//!     a.members = Some(vec![MemberAddress::new("/Common/10.0.0.1", 80)]);
//! });
//! pool.save()?;
//!
//! for pool in lb.pools_get(Some("www-"), false)? {
//!     println!("{} {:?}", pool.name(), pool.cached().members);
//! }
//! ```

pub mod constants;
mod lb;
mod node;
mod pool;
mod pool_member;
mod resource;
mod rule;
mod virtual_server;

pub use lb::{Lb, Registry};
pub use node::{Node, NodeAttrs};
pub use pool::{Pool, PoolAttrs};
pub use pool_member::{MemberAddress, MemberId, PoolMember, PoolMemberAttrs};
pub use resource::{Import, Resource};
pub use rule::{Rule, RuleAttrs};
pub use virtual_server::{VirtualServer, VirtualServerAttrs};
