//! Entry point handing out canonical proxies and bulk reads.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bigip_session::{
    CacheStats, Connection, IdentityCache, ResourceKey, ResourceKind, Result, wire,
    with_folder_read, with_recursive_read, with_write_transaction,
};
use serde_json::{Value, json};

use crate::constants::{node, pool, rule, virtual_server};
use crate::node::Node;
use crate::pool::Pool;
use crate::pool_member::{self, MemberAddress, MemberId, PoolMember};
use crate::resource::{Binding, Import, NameFilter, Resource, full_path};
use crate::rule::Rule;
use crate::virtual_server::VirtualServer;

/// One identity cache per resource kind.
///
/// A registry may be shared by several [`Lb`] instances; keys carry the
/// endpoint, so proxies for different devices never collide.
#[derive(Default)]
pub struct Registry {
    pools: IdentityCache<Pool>,
    pool_members: IdentityCache<PoolMember>,
    nodes: IdentityCache<Node>,
    rules: IdentityCache<Rule>,
    virtual_servers: IdentityCache<VirtualServer>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("pools", &self.pools.len())
            .field("pool_members", &self.pool_members.len())
            .field("nodes", &self.nodes.len())
            .field("rules", &self.rules.len())
            .field("virtual_servers", &self.virtual_servers.len())
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn pools(&self) -> &IdentityCache<Pool> {
        &self.pools
    }

    #[must_use]
    pub const fn pool_members(&self) -> &IdentityCache<PoolMember> {
        &self.pool_members
    }

    #[must_use]
    pub const fn nodes(&self) -> &IdentityCache<Node> {
        &self.nodes
    }

    #[must_use]
    pub const fn rules(&self) -> &IdentityCache<Rule> {
        &self.rules
    }

    #[must_use]
    pub const fn virtual_servers(&self) -> &IdentityCache<VirtualServer> {
        &self.virtual_servers
    }

    /// Counters of every cache, by resource kind.
    #[must_use]
    pub fn stats(&self) -> BTreeMap<ResourceKind, CacheStats> {
        BTreeMap::from([
            (ResourceKind::Pool, self.pools.stats()),
            (ResourceKind::PoolMember, self.pool_members.stats()),
            (ResourceKind::Node, self.nodes.stats()),
            (ResourceKind::Rule, self.rules.stats()),
            (ResourceKind::VirtualServer, self.virtual_servers.stats()),
        ])
    }

    /// Drop dead entries from every cache.
    pub fn purge(&self) -> usize {
        self.pools.purge()
            + self.pool_members.purge()
            + self.nodes.purge()
            + self.rules.purge()
            + self.virtual_servers.purge()
    }
}

/// Load balancer view of one connection.
///
/// Names without a leading `/` are qualified with the connection's writable
/// folder. Handles come from the registry, so asking twice for the same
/// resource yields the same `Arc`.
#[derive(Debug, Clone)]
pub struct Lb {
    conn: Arc<Connection>,
    registry: Arc<Registry>,
}

impl Lb {
    #[must_use]
    pub fn new(conn: Arc<Connection>) -> Self {
        Self::with_registry(conn, Arc::new(Registry::new()))
    }

    #[must_use]
    pub const fn with_registry(conn: Arc<Connection>, registry: Arc<Registry>) -> Self {
        Self { conn, registry }
    }

    #[must_use]
    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    fn binding(&self) -> Binding {
        Binding {
            conn: Arc::clone(&self.conn),
            registry: Arc::clone(&self.registry),
        }
    }

    fn qualify(&self, name: &str) -> String {
        full_path(self.conn.writable_folder(), name)
    }

    fn key(&self, kind: ResourceKind, name: &str) -> ResourceKey {
        ResourceKey::named(Some(self.conn.host()), kind, name)
    }

    // Handles (no remote call)

    pub fn pool(&self, name: &str) -> Arc<Pool> {
        let name = self.qualify(name);
        let key = self.key(ResourceKind::Pool, &name);
        self.registry
            .pools
            .lookup_or_create(key, || Pool::bound(self.binding(), name))
    }

    pub fn node(&self, name: &str) -> Arc<Node> {
        let name = self.qualify(name);
        let key = self.key(ResourceKind::Node, &name);
        self.registry
            .nodes
            .lookup_or_create(key, || Node::bound(self.binding(), name))
    }

    pub fn pool_member(&self, node: &str, port: u16, pool: &str) -> Arc<PoolMember> {
        let id = MemberId::new(self.qualify(node), port, self.qualify(pool));
        pool_member::handle(&self.binding(), id)
    }

    pub fn rule(&self, name: &str) -> Arc<Rule> {
        let name = self.qualify(name);
        let key = self.key(ResourceKind::Rule, &name);
        self.registry
            .rules
            .lookup_or_create(key, || Rule::bound(self.binding(), name))
    }

    pub fn virtual_server(&self, name: &str) -> Arc<VirtualServer> {
        let name = self.qualify(name);
        let key = self.key(ResourceKind::VirtualServer, &name);
        self.registry
            .virtual_servers
            .lookup_or_create(key, || VirtualServer::bound(self.binding(), name))
    }

    // Single fetches

    /// Canonical proxy for `name`, refreshed from the device.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](bigip_session::Error::NotFound) of kind pool when
    /// the pool does not exist.
    pub fn pool_get(&self, name: &str) -> Result<Arc<Pool>> {
        fetched(self.pool(name))
    }

    pub fn node_get(&self, name: &str) -> Result<Arc<Node>> {
        fetched(self.node(name))
    }

    pub fn pm_get(&self, node: &str, port: u16, pool: &str) -> Result<Arc<PoolMember>> {
        fetched(self.pool_member(node, port, pool))
    }

    pub fn rule_get(&self, name: &str) -> Result<Arc<Rule>> {
        fetched(self.rule(name))
    }

    pub fn vs_get(&self, name: &str) -> Result<Arc<VirtualServer>> {
        fetched(self.virtual_server(name))
    }

    // Bulk reads

    /// Every pool whose path or name matches `pattern`, across all folders.
    ///
    /// With `minimal`, only the names are fetched.
    pub fn pools_get(&self, pattern: Option<&str>, minimal: bool) -> Result<Vec<Arc<Pool>>> {
        let filter = NameFilter::new(pattern)?;
        with_recursive_read(&self.conn, |conn| self.pools_listed(conn, &filter, minimal))
    }

    /// Pools directly inside `folder` (all folders when `folder` is `/`).
    pub fn pools_get_in(
        &self,
        folder: &str,
        pattern: Option<&str>,
        minimal: bool,
    ) -> Result<Vec<Arc<Pool>>> {
        let filter = NameFilter::new(pattern)?;
        with_folder_read(&self.conn, folder, |conn| {
            self.pools_listed(conn, &filter, minimal)
        })
    }

    fn pools_listed(
        &self,
        conn: &Connection,
        filter: &NameFilter,
        minimal: bool,
    ) -> Result<Vec<Arc<Pool>>> {
        let pools: Vec<Arc<Pool>> = list(conn, pool::GET_LIST, filter)?
            .iter()
            .map(|name| self.pool(name))
            .collect();
        if !minimal {
            Pool::load_all(&self.binding(), &refs(&pools))?;
        }
        Ok(pools)
    }

    /// Members of `pools` (every pool when `None`) whose `node:port` matches
    /// `pattern`.
    pub fn pms_get(
        &self,
        pools: Option<&[&str]>,
        pattern: Option<&str>,
        minimal: bool,
    ) -> Result<Vec<Arc<PoolMember>>> {
        let filter = NameFilter::new(pattern)?;
        with_recursive_read(&self.conn, |conn| {
            let names: Vec<String> = match pools {
                Some(pools) => pools.iter().map(|p| self.qualify(p)).collect(),
                None => list(conn, pool::GET_LIST, &NameFilter::default())?,
            };
            if names.is_empty() {
                return Ok(Vec::new());
            }

            let lists = conn
                .call(pool::GET_MEMBER, &[json!(names)])
                .map_err(|e| e.into_not_found(ResourceKind::Pool, names.join(", ")))?;
            let lists = wire::exact(&lists, names.len(), pool::GET_MEMBER)?;

            let binding = self.binding();
            let mut members = Vec::new();
            for (pool, list) in names.iter().zip(lists) {
                let addresses = wire::as_array(list, "members")?
                    .iter()
                    .map(MemberAddress::from_wire)
                    .collect::<Result<Vec<_>>>()?
                    .into_iter()
                    .filter(|address| filter.matches(&address.to_string()));
                members.extend(pool_member::handles(&binding, pool, addresses));
            }
            if !minimal {
                PoolMember::load_all(&binding, &refs(&members))?;
            }
            Ok(members)
        })
    }

    pub fn nodes_get(&self, pattern: Option<&str>, minimal: bool) -> Result<Vec<Arc<Node>>> {
        let filter = NameFilter::new(pattern)?;
        with_recursive_read(&self.conn, |conn| self.nodes_listed(conn, &filter, minimal))
    }

    /// Nodes directly inside `folder` (all folders when `folder` is `/`).
    pub fn nodes_get_in(
        &self,
        folder: &str,
        pattern: Option<&str>,
        minimal: bool,
    ) -> Result<Vec<Arc<Node>>> {
        let filter = NameFilter::new(pattern)?;
        with_folder_read(&self.conn, folder, |conn| {
            self.nodes_listed(conn, &filter, minimal)
        })
    }

    fn nodes_listed(
        &self,
        conn: &Connection,
        filter: &NameFilter,
        minimal: bool,
    ) -> Result<Vec<Arc<Node>>> {
        let nodes: Vec<Arc<Node>> = list(conn, node::GET_LIST, filter)?
            .iter()
            .map(|name| self.node(name))
            .collect();
        if !minimal {
            Node::load_all(&self.binding(), &refs(&nodes))?;
        }
        Ok(nodes)
    }

    pub fn rules_get(&self, pattern: Option<&str>, minimal: bool) -> Result<Vec<Arc<Rule>>> {
        let filter = NameFilter::new(pattern)?;
        with_recursive_read(&self.conn, |conn| {
            let rules: Vec<Arc<Rule>> = list(conn, rule::GET_LIST, &filter)?
                .iter()
                .map(|name| self.rule(name))
                .collect();
            if !minimal {
                Rule::load_all(&self.binding(), &refs(&rules))?;
            }
            Ok(rules)
        })
    }

    pub fn vss_get(
        &self,
        pattern: Option<&str>,
        minimal: bool,
    ) -> Result<Vec<Arc<VirtualServer>>> {
        let filter = NameFilter::new(pattern)?;
        with_recursive_read(&self.conn, |conn| {
            let servers: Vec<Arc<VirtualServer>> = list(conn, virtual_server::GET_LIST, &filter)?
                .iter()
                .map(|name| self.virtual_server(name))
                .collect();
            if !minimal {
                VirtualServer::load_all(&self.binding(), &refs(&servers))?;
            }
            Ok(servers)
        })
    }

    /// Virtual servers grouped by the pool they use as default pool.
    ///
    /// Every requested pool (every pool on the device when `None`) has an entry,
    /// empty when no virtual server points at it.
    pub fn pools_get_vs(
        &self,
        pools: Option<&[&str]>,
        minimal: bool,
    ) -> Result<BTreeMap<String, Vec<Arc<VirtualServer>>>> {
        with_recursive_read(&self.conn, |conn| {
            let pool_names: Vec<String> = match pools {
                Some(pools) => pools.iter().map(|p| self.qualify(p)).collect(),
                None => list(conn, pool::GET_LIST, &NameFilter::default())?,
            };
            let vs_names = list(conn, virtual_server::GET_LIST, &NameFilter::default())?;

            let binding = self.binding();
            let defaults = if vs_names.is_empty() {
                Vec::new()
            } else {
                binding.get_many(virtual_server::GET_DEFAULT_POOL, &vs_names)?
            };

            let mut grouped: BTreeMap<String, Vec<Arc<VirtualServer>>> = pool_names
                .into_iter()
                .map(|name| (name, Vec::new()))
                .collect();
            let mut used = Vec::new();
            for (name, default) in vs_names.iter().zip(&defaults) {
                let default = wire::as_string(default, "default_pool_name")?;
                if let Some(servers) = grouped.get_mut(&default) {
                    let server = self.virtual_server(name);
                    used.push(Arc::clone(&server));
                    servers.push(server);
                }
            }
            if !minimal {
                VirtualServer::load_all(&binding, &refs(&used))?;
            }
            Ok(grouped)
        })
    }

    // Writes

    /// Save every resource inside one write transaction.
    ///
    /// Resources bound to this connection join the transaction; the whole batch
    /// is submitted once or rolled back together.
    pub fn sync<R: Resource>(&self, resources: &[Arc<R>]) -> Result<()> {
        tracing::debug!(kind = %R::KIND, count = resources.len(), "Syncing resources");
        with_write_transaction(&self.conn, |_| {
            resources.iter().try_for_each(|resource| resource.save())
        })
    }

    /// Rebuild proxies from serialized documents and save them in one write
    /// transaction.
    ///
    /// `documents` is a JSON array of what serializing each proxy produces. Each
    /// entry becomes the canonical proxy for its identity with the document's
    /// attributes staged; a failing save rolls the whole batch back.
    pub fn import<R: Import>(&self, documents: Value) -> Result<Vec<Arc<R>>> {
        let documents: Vec<Value> = serde_json::from_value(documents)?;
        let proxies = documents
            .into_iter()
            .map(|document| R::import(self, document))
            .collect::<Result<Vec<_>>>()?;
        self.sync(&proxies)?;
        Ok(proxies)
    }

    pub fn submit_transaction(&self) -> Result<()> {
        self.conn.submit_transaction()
    }
}

fn fetched<R: Resource>(proxy: Arc<R>) -> Result<Arc<R>> {
    proxy.refresh()?;
    Ok(proxy)
}

fn refs<T>(items: &[Arc<T>]) -> Vec<&T> {
    items.iter().map(AsRef::as_ref).collect()
}

/// Names returned by `procedure` that pass `filter`.
fn list(conn: &Connection, procedure: &str, filter: &NameFilter) -> Result<Vec<String>> {
    let names = wire::string_list(&conn.call(procedure, &[])?, procedure)?;
    Ok(names.into_iter().filter(|name| filter.matches(name)).collect())
}
