//! Pool member proxy.
//!
//! A pool member is identified by `(node, port, pool)`. The identity is fixed
//! for the lifetime of a proxy; moving a member means deleting it and saving a
//! new one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bigip_session::{
    Error, IdentityCache, ResourceKey, ResourceKind, Result, wire, with_write_transaction,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::pool as proc;
use crate::lb::{Lb, Registry};
use crate::resource::{Binding, Import, Record, Resource, decode_object_status};

/// `(node, port)` entry of a pool's member list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberAddress {
    pub node: String,
    pub port: u16,
}

impl MemberAddress {
    #[must_use]
    pub fn new(node: impl Into<String>, port: u16) -> Self {
        Self {
            node: node.into(),
            port,
        }
    }

    pub(crate) fn to_wire(&self) -> Value {
        json!({ "address": self.node, "port": self.port })
    }

    pub(crate) fn from_wire(value: &Value) -> Result<Self> {
        let node = wire::as_string(&value["address"], "member address")?;
        let port = wire::as_u64(&value["port"], "member port")?;
        let port = u16::try_from(port)
            .map_err(|_| Error::unexpected(format!("member port out of range: {port}")))?;
        Ok(Self { node, port })
    }
}

impl fmt::Display for MemberAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.port)
    }
}

/// Identity of a pool member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId {
    pub node: String,
    pub port: u16,
    pub pool: String,
}

impl MemberId {
    #[must_use]
    pub fn new(node: impl Into<String>, port: u16, pool: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port,
            pool: pool.into(),
        }
    }

    #[must_use]
    pub fn address(&self) -> MemberAddress {
        MemberAddress::new(self.node.clone(), self.port)
    }

    pub(crate) fn to_wire(&self) -> Value {
        json!({ "address": self.node, "port": self.port })
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in {}", self.node, self.port, self.pool)
    }
}

/// Cached pool member attributes. `None` means not fetched and not staged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMemberAttrs {
    pub description: Option<String>,
    pub connection_limit: Option<u32>,
    pub dynamic_ratio: Option<u32>,
    pub priority: Option<u32>,
    pub rate_limit: Option<u32>,
    pub ratio: Option<u32>,
    pub enabled: Option<bool>,
    /// Munged availability, e.g. `green`. Read-only.
    pub availability_status: Option<String>,
    /// Read-only.
    pub status_description: Option<String>,
}

#[derive(Debug)]
pub struct PoolMember {
    id: MemberId,
    record: Record<PoolMemberAttrs>,
}

impl Serialize for PoolMember {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct View<'a> {
            #[serde(flatten)]
            id: &'a MemberId,
            #[serde(flatten)]
            attrs: &'a PoolMemberAttrs,
        }
        self.record.read(|attrs| View { id: &self.id, attrs }.serialize(serializer))
    }
}

impl PoolMember {
    /// Unbound pool member record.
    #[must_use]
    pub fn new(node: impl Into<String>, port: u16, pool: impl Into<String>) -> Self {
        Self {
            id: MemberId::new(node, port, pool),
            record: Record::new(None, PoolMemberAttrs::default()),
        }
    }

    pub(crate) fn bound(binding: Binding, id: MemberId) -> Self {
        Self {
            id,
            record: Record::new(Some(binding), PoolMemberAttrs::default()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> &MemberId {
        &self.id
    }

    #[must_use]
    pub fn node(&self) -> &str {
        &self.id.node
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.id.port
    }

    #[must_use]
    pub fn pool(&self) -> &str {
        &self.id.pool
    }

    /// Cached attributes. No remote call.
    #[must_use]
    pub fn cached(&self) -> PoolMemberAttrs {
        self.record.snapshot()
    }

    /// Edit cached attributes locally; [`Resource::save`] pushes them.
    pub fn stage(&self, edit: impl FnOnce(&mut PoolMemberAttrs)) {
        self.record.write(edit);
    }

    fn pull_u32(&self, procedure: &'static str, store: fn(&mut PoolMemberAttrs, u32)) -> Result<()> {
        self.record.pull(
            |b| wire::as_u32(&b.get_member(procedure, &self.id)?, procedure),
            store,
        )
    }

    fn push_u32(
        &self,
        procedure: &'static str,
        value: u32,
        store: fn(&mut PoolMemberAttrs, u32),
    ) -> Result<()> {
        self.record.push(
            value,
            |b, v| b.set_member(procedure, &self.id, json!(v)),
            store,
        )
    }

    pub fn description(&self) -> Result<Option<String>> {
        self.record.pull(
            |b| {
                let value = b.get_member(proc::GET_MEMBER_DESCRIPTION, &self.id)?;
                wire::as_string(&value, "description")
            },
            |a, v| a.description = Some(v),
        )?;
        Ok(self.record.read(|a| a.description.clone()))
    }

    pub fn set_description(&self, description: &str) -> Result<()> {
        self.record.push(
            description.to_string(),
            |b, v| b.set_member(proc::SET_MEMBER_DESCRIPTION, &self.id, json!(v)),
            |a, v| a.description = Some(v),
        )
    }

    pub fn connection_limit(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_MEMBER_CONNECTION_LIMIT, |a, v| {
            a.connection_limit = Some(v);
        })?;
        Ok(self.record.read(|a| a.connection_limit))
    }

    pub fn set_connection_limit(&self, limit: u32) -> Result<()> {
        self.push_u32(proc::SET_MEMBER_CONNECTION_LIMIT, limit, |a, v| {
            a.connection_limit = Some(v);
        })
    }

    pub fn dynamic_ratio(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_MEMBER_DYNAMIC_RATIO, |a, v| a.dynamic_ratio = Some(v))?;
        Ok(self.record.read(|a| a.dynamic_ratio))
    }

    pub fn set_dynamic_ratio(&self, ratio: u32) -> Result<()> {
        self.push_u32(proc::SET_MEMBER_DYNAMIC_RATIO, ratio, |a, v| {
            a.dynamic_ratio = Some(v);
        })
    }

    pub fn priority(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_MEMBER_PRIORITY, |a, v| a.priority = Some(v))?;
        Ok(self.record.read(|a| a.priority))
    }

    pub fn set_priority(&self, priority: u32) -> Result<()> {
        self.push_u32(proc::SET_MEMBER_PRIORITY, priority, |a, v| {
            a.priority = Some(v);
        })
    }

    pub fn rate_limit(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_MEMBER_RATE_LIMIT, |a, v| a.rate_limit = Some(v))?;
        Ok(self.record.read(|a| a.rate_limit))
    }

    pub fn set_rate_limit(&self, limit: u32) -> Result<()> {
        self.push_u32(proc::SET_MEMBER_RATE_LIMIT, limit, |a, v| {
            a.rate_limit = Some(v);
        })
    }

    pub fn ratio(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_MEMBER_RATIO, |a, v| a.ratio = Some(v))?;
        Ok(self.record.read(|a| a.ratio))
    }

    pub fn set_ratio(&self, ratio: u32) -> Result<()> {
        self.push_u32(proc::SET_MEMBER_RATIO, ratio, |a, v| a.ratio = Some(v))
    }

    /// Session enabled state: whether the member accepts new connections.
    pub fn enabled(&self) -> Result<Option<bool>> {
        self.record.pull(
            |b| {
                let value = b.get_member(proc::GET_MEMBER_SESSION_ENABLED_STATE, &self.id)?;
                wire::parse_enabled_state(&value, "session_enabled_state")
            },
            |a, v| a.enabled = Some(v),
        )?;
        Ok(self.record.read(|a| a.enabled))
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.record.push(
            enabled,
            |b, v| {
                b.set_member(
                    proc::SET_MEMBER_SESSION_ENABLED_STATE,
                    &self.id,
                    json!(wire::enabled_state(*v)),
                )
            },
            |a, v| a.enabled = Some(v),
        )
    }

    /// Munged availability status, e.g. `green` or `red`.
    pub fn availability_status(&self) -> Result<Option<String>> {
        self.record.pull(
            |b| decode_object_status(&b.get_member(proc::GET_MEMBER_OBJECT_STATUS, &self.id)?),
            |a, (availability, description)| {
                a.availability_status = Some(availability);
                a.status_description = Some(description);
            },
        )?;
        Ok(self.record.read(|a| a.availability_status.clone()))
    }

    /// Reason text that goes with the availability status.
    pub fn status_description(&self) -> Result<Option<String>> {
        self.availability_status()?;
        Ok(self.record.read(|a| a.status_description.clone()))
    }

    /// Push every staged attribute.
    fn push_staged(&self, binding: &Binding) -> Result<()> {
        let attrs = self.cached();
        let id = &self.id;
        if let Some(description) = &attrs.description {
            binding.set_member(proc::SET_MEMBER_DESCRIPTION, id, json!(description))?;
        }
        let numbers = [
            (proc::SET_MEMBER_CONNECTION_LIMIT, attrs.connection_limit),
            (proc::SET_MEMBER_DYNAMIC_RATIO, attrs.dynamic_ratio),
            (proc::SET_MEMBER_PRIORITY, attrs.priority),
            (proc::SET_MEMBER_RATE_LIMIT, attrs.rate_limit),
            (proc::SET_MEMBER_RATIO, attrs.ratio),
        ];
        for (procedure, value) in numbers {
            if let Some(value) = value {
                binding.set_member(procedure, id, json!(value))?;
            }
        }
        if let Some(enabled) = attrs.enabled {
            binding.set_member(
                proc::SET_MEMBER_SESSION_ENABLED_STATE,
                id,
                json!(wire::enabled_state(enabled)),
            )?;
        }
        Ok(())
    }

    /// Fetch every attribute of `members` with one call per attribute.
    pub(crate) fn load_all(binding: &Binding, members: &[&Self]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }

        let mut groups: BTreeMap<&str, Vec<&Self>> = BTreeMap::new();
        for member in members {
            groups.entry(member.pool()).or_default().push(member);
        }
        let pools: Vec<&str> = groups.keys().copied().collect();
        let lists: Vec<Vec<Value>> = groups
            .values()
            .map(|group| group.iter().map(|m| m.id.to_wire()).collect())
            .collect();
        let ordered: Vec<&Self> = groups.values().flatten().copied().collect();
        let args = [json!(pools), json!(lists)];

        let column = |procedure: &str| -> Result<Vec<Value>> {
            let value = binding.conn.call(procedure, &args)?;
            let rows = wire::exact(&value, groups.len(), procedure)?;
            let mut out = Vec::with_capacity(ordered.len());
            for (row, group) in rows.iter().zip(groups.values()) {
                out.extend_from_slice(wire::exact(row, group.len(), procedure)?);
            }
            Ok(out)
        };

        let descriptions = column(proc::GET_MEMBER_DESCRIPTION)?;
        let limits = column(proc::GET_MEMBER_CONNECTION_LIMIT)?;
        let dynamic = column(proc::GET_MEMBER_DYNAMIC_RATIO)?;
        let priorities = column(proc::GET_MEMBER_PRIORITY)?;
        let rate_limits = column(proc::GET_MEMBER_RATE_LIMIT)?;
        let ratios = column(proc::GET_MEMBER_RATIO)?;
        let states = column(proc::GET_MEMBER_SESSION_ENABLED_STATE)?;
        let statuses = column(proc::GET_MEMBER_OBJECT_STATUS)?;

        for (i, member) in ordered.iter().enumerate() {
            let (availability, status_description) = decode_object_status(&statuses[i])?;
            let attrs = PoolMemberAttrs {
                description: Some(wire::as_string(&descriptions[i], "description")?),
                connection_limit: Some(wire::as_u32(&limits[i], "connection_limit")?),
                dynamic_ratio: Some(wire::as_u32(&dynamic[i], "dynamic_ratio")?),
                priority: Some(wire::as_u32(&priorities[i], "priority")?),
                rate_limit: Some(wire::as_u32(&rate_limits[i], "rate_limit")?),
                ratio: Some(wire::as_u32(&ratios[i], "ratio")?),
                enabled: Some(wire::parse_enabled_state(&states[i], "session_enabled_state")?),
                availability_status: Some(availability),
                status_description: Some(status_description),
            };
            member.record.write(|cached| *cached = attrs);
        }
        Ok(())
    }
}

impl Resource for PoolMember {
    const KIND: ResourceKind = ResourceKind::PoolMember;

    fn key(&self) -> ResourceKey {
        ResourceKey::member(
            self.record.endpoint(),
            &self.id.node,
            self.id.port,
            &self.id.pool,
        )
    }

    fn is_bound(&self) -> bool {
        self.record.binding_opt().is_some()
    }

    fn exists(&self) -> Result<bool> {
        let binding = self.record.binding(Self::KIND)?;
        let value = match binding.get(ResourceKind::Pool, proc::GET_MEMBER, &self.id.pool) {
            Ok(value) => value,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        let address = self.id.address();
        Ok(wire::as_array(&value, "members")?
            .iter()
            .map(MemberAddress::from_wire)
            .collect::<Result<Vec<_>>>()?
            .contains(&address))
    }

    fn refresh(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        Self::load_all(binding, &[self])
            .map_err(|e| e.into_not_found(Self::KIND, self.id.to_string()))
    }

    fn save(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        with_write_transaction(&binding.conn, |conn| {
            if !self.exists()? {
                tracing::debug!(member = %self.id, "Adding pool member");
                conn.call(
                    proc::ADD_MEMBER,
                    &[json!([self.id.pool]), json!([[self.id.to_wire()]])],
                )
                .map_err(|e| e.into_not_found(ResourceKind::Pool, self.id.pool.clone()))?;
            }
            self.push_staged(binding)
        })
    }

    fn delete(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        with_write_transaction(&binding.conn, |conn| {
            conn.call(
                proc::REMOVE_MEMBER,
                &[json!([self.id.pool]), json!([[self.id.to_wire()]])],
            )
            .map(|_| ())
            .map_err(|e| e.into_not_found(Self::KIND, self.id.to_string()))
        })?;
        Self::cache(&binding.registry).forget_if(&self.key(), self);
        Ok(())
    }

    fn cache(registry: &Registry) -> &IdentityCache<Self> {
        registry.pool_members()
    }
}

/// Canonical pool member proxy for `id`, through the registry.
pub(crate) fn handle(binding: &Binding, id: MemberId) -> Arc<PoolMember> {
    let key = ResourceKey::member(Some(binding.host()), &id.node, id.port, &id.pool);
    binding
        .registry
        .pool_members()
        .lookup_or_create(key, || PoolMember::bound(binding.clone(), id))
}

/// Proxies for `addresses` of `pool`.
pub(crate) fn handles(
    binding: &Binding,
    pool: &str,
    addresses: impl IntoIterator<Item = MemberAddress>,
) -> Vec<Arc<PoolMember>> {
    addresses
        .into_iter()
        .map(|address| handle(binding, MemberId::new(address.node, address.port, pool)))
        .collect()
}

impl Import for PoolMember {
    fn import(lb: &Lb, document: Value) -> Result<Arc<Self>> {
        #[derive(Deserialize)]
        struct Document {
            #[serde(flatten)]
            id: MemberId,
            #[serde(flatten)]
            attrs: PoolMemberAttrs,
        }
        let Document { id, attrs } = serde_json::from_value(document)?;
        let member = lb.pool_member(&id.node, id.port, &id.pool);
        member.stage(|cached| *cached = attrs);
        Ok(member)
    }
}
