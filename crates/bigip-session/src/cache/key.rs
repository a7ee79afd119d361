//! Identity keys for cached resource proxies

use std::fmt;

use serde::Serialize;

/// Kind of remote resource a proxy stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Pool,
    PoolMember,
    Node,
    Rule,
    VirtualServer,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::PoolMember => "pool member",
            Self::Node => "node",
            Self::Rule => "rule",
            Self::VirtualServer => "virtual server",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource-kind-specific identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceIdentity {
    /// Pools, nodes, rules and virtual servers are identified by their full path.
    Name(String),
    /// Pool members are identified by node, port and owning pool.
    Member {
        node: String,
        port: u16,
        pool: String,
    },
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Member { node, port, pool } => write!(f, "{node}:{port}@{pool}"),
        }
    }
}

/// Cache key: endpoint identity, resource kind and resource identity.
///
/// Hashing and equality run over the structured value, so a pool and a node that
/// share a literal name, or the same pool on two devices, never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    endpoint: Option<String>,
    kind: ResourceKind,
    identity: ResourceIdentity,
}

impl ResourceKey {
    /// Key for a named resource (pool, node, rule, virtual server).
    #[must_use]
    pub fn named(endpoint: Option<&str>, kind: ResourceKind, name: &str) -> Self {
        Self {
            endpoint: endpoint.map(ToString::to_string),
            kind,
            identity: ResourceIdentity::Name(name.to_string()),
        }
    }

    /// Key for a pool member.
    #[must_use]
    pub fn member(endpoint: Option<&str>, node: &str, port: u16, pool: &str) -> Self {
        Self {
            endpoint: endpoint.map(ToString::to_string),
            kind: ResourceKind::PoolMember,
            identity: ResourceIdentity::Member {
                node: node.to_string(),
                port,
                pool: pool.to_string(),
            },
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub const fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Some(host) => write!(f, "{}://{host}/{}", self.kind.as_str(), self.identity),
            None => write!(f, "{}:///{}", self.kind.as_str(), self.identity),
        }
    }
}
