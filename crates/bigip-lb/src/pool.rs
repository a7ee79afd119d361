//! Pool proxy.

use std::sync::Arc;

use bigip_session::{
    Connection, Error, IdentityCache, ResourceKey, ResourceKind, Result, wire,
    with_write_transaction,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::{LB_METHOD_PREFIX, pool as proc};
use crate::lb::{Lb, Registry};
use crate::pool_member::{self, MemberAddress, PoolMember};
use crate::resource::{
    Binding, Import, Named, Record, Resource, full_path, munge, unmunge,
};

/// Cached pool attributes. `None` means not fetched and not staged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAttrs {
    pub description: Option<String>,
    /// Munged load balancing method, e.g. `round_robin`.
    pub lbmethod: Option<String>,
    pub members: Option<Vec<MemberAddress>>,
    pub minimum_active_member: Option<u32>,
    pub minimum_up_member: Option<u32>,
    pub slow_ramp_time: Option<u32>,
}

#[derive(Debug)]
pub struct Pool {
    name: RwLock<String>,
    record: Record<PoolAttrs>,
}

impl Serialize for Pool {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct View<'a> {
            name: &'a str,
            #[serde(flatten)]
            attrs: &'a PoolAttrs,
        }
        let name = self.name.read();
        self.record.read(|attrs| View { name: &name, attrs }.serialize(serializer))
    }
}

impl Pool {
    /// Unbound pool record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: RwLock::new(name.into()),
            record: Record::new(None, PoolAttrs::default()),
        }
    }

    pub(crate) fn bound(binding: Binding, name: String) -> Self {
        Self {
            name: RwLock::new(name),
            record: Record::new(Some(binding), PoolAttrs::default()),
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Change the local name. The device object is not renamed; the cache entry
    /// moves to the new key.
    pub fn rename(self: &Arc<Self>, name: &str) -> Result<()> {
        let Some(binding) = self.record.binding_opt() else {
            *self.name.write() = name.to_string();
            return Ok(());
        };
        let name = full_path(binding.conn.writable_folder(), name);
        let new = ResourceKey::named(self.record.endpoint(), Self::KIND, &name);
        Self::cache(&binding.registry)
            .rekey(&self.key(), new, self)
            .map_err(|_| Error::IdentityConflict {
                kind: Self::KIND,
                name: name.clone(),
            })?;
        *self.name.write() = name;
        Ok(())
    }

    /// Cached attributes. No remote call.
    #[must_use]
    pub fn cached(&self) -> PoolAttrs {
        self.record.snapshot()
    }

    /// Edit cached attributes locally; [`Resource::save`] pushes them.
    pub fn stage(&self, edit: impl FnOnce(&mut PoolAttrs)) {
        self.record.write(edit);
    }

    fn pull_u32(&self, procedure: &'static str, store: fn(&mut PoolAttrs, u32)) -> Result<()> {
        let name = self.name();
        self.record
            .pull(|b| b.get_u32(ResourceKind::Pool, procedure, &name), store)
    }

    fn push_u32(
        &self,
        procedure: &'static str,
        value: u32,
        store: fn(&mut PoolAttrs, u32),
    ) -> Result<()> {
        let name = self.name();
        self.record.push(
            value,
            |b, v| b.set(ResourceKind::Pool, procedure, &name, json!(v)),
            store,
        )
    }

    pub fn description(&self) -> Result<Option<String>> {
        let name = self.name();
        self.record.pull(
            |b| b.get_string(ResourceKind::Pool, proc::GET_DESCRIPTION, &name),
            |a, v| a.description = Some(v),
        )?;
        Ok(self.record.read(|a| a.description.clone()))
    }

    pub fn set_description(&self, description: &str) -> Result<()> {
        let name = self.name();
        self.record.push(
            description.to_string(),
            |b, v| b.set(ResourceKind::Pool, proc::SET_DESCRIPTION, &name, json!(v)),
            |a, v| a.description = Some(v),
        )
    }

    /// Load balancing method in munged form, e.g. `least_connection_member`.
    pub fn lbmethod(&self) -> Result<Option<String>> {
        let name = self.name();
        self.record.pull(
            |b| b.get_string(ResourceKind::Pool, proc::GET_LB_METHOD, &name),
            |a, v| a.lbmethod = Some(munge(&v, LB_METHOD_PREFIX)),
        )?;
        Ok(self.record.read(|a| a.lbmethod.clone()))
    }

    pub fn set_lbmethod(&self, method: &str) -> Result<()> {
        let name = self.name();
        self.record.push(
            method.to_lowercase(),
            |b, v| {
                let wire = unmunge(v, LB_METHOD_PREFIX);
                b.set(ResourceKind::Pool, proc::SET_LB_METHOD, &name, json!(wire))
            },
            |a, v| a.lbmethod = Some(v),
        )
    }

    pub fn members(&self) -> Result<Option<Vec<MemberAddress>>> {
        let name = self.name();
        self.record.pull(
            |b| decode_members(&b.get(ResourceKind::Pool, proc::GET_MEMBER, &name)?),
            |a, v| a.members = Some(v),
        )?;
        Ok(self.record.read(|a| a.members.clone()))
    }

    /// Replace the member list: every current member is removed and `members`
    /// added, in one transaction.
    pub fn set_members(&self, members: Vec<MemberAddress>) -> Result<()> {
        let name = self.name();
        self.record.push(
            members,
            |b, v| with_write_transaction(&b.conn, |conn| replace_members(conn, &name, v)),
            |a, v| a.members = Some(v),
        )
    }

    /// Proxies for the current members.
    pub fn pool_members(&self) -> Result<Vec<Arc<PoolMember>>> {
        let members = self.members()?.unwrap_or_default();
        let name = self.name();
        Ok(match self.record.binding_opt() {
            Some(binding) => pool_member::handles(binding, &name, members),
            None => members
                .into_iter()
                .map(|m| Arc::new(PoolMember::new(m.node, m.port, name.as_str())))
                .collect(),
        })
    }

    pub fn minimum_active_member(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_MINIMUM_ACTIVE_MEMBER, |a, v| {
            a.minimum_active_member = Some(v);
        })?;
        Ok(self.record.read(|a| a.minimum_active_member))
    }

    pub fn set_minimum_active_member(&self, value: u32) -> Result<()> {
        self.push_u32(proc::SET_MINIMUM_ACTIVE_MEMBER, value, |a, v| {
            a.minimum_active_member = Some(v);
        })
    }

    pub fn minimum_up_member(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_MINIMUM_UP_MEMBER, |a, v| {
            a.minimum_up_member = Some(v);
        })?;
        Ok(self.record.read(|a| a.minimum_up_member))
    }

    pub fn set_minimum_up_member(&self, value: u32) -> Result<()> {
        self.push_u32(proc::SET_MINIMUM_UP_MEMBER, value, |a, v| {
            a.minimum_up_member = Some(v);
        })
    }

    pub fn slow_ramp_time(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_SLOW_RAMP_TIME, |a, v| a.slow_ramp_time = Some(v))?;
        Ok(self.record.read(|a| a.slow_ramp_time))
    }

    pub fn set_slow_ramp_time(&self, seconds: u32) -> Result<()> {
        self.push_u32(proc::SET_SLOW_RAMP_TIME, seconds, |a, v| {
            a.slow_ramp_time = Some(v);
        })
    }

    /// Members currently able to take traffic. Always remote.
    pub fn active_member_count(&self) -> Result<u32> {
        let binding = self.record.binding(Self::KIND)?;
        binding.get_u32(ResourceKind::Pool, proc::GET_ACTIVE_MEMBER_COUNT, &self.name())
    }

    pub fn reset_statistics(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        let name = self.name();
        bigip_session::with_writable_folder(&binding.conn, |conn| {
            conn.call(proc::RESET_STATISTICS, &[json!([name])])
                .map(|_| ())
                .map_err(|e| e.into_not_found(Self::KIND, name.as_str()))
        })
    }

    fn create(conn: &Connection, name: &str, attrs: &PoolAttrs) -> Result<()> {
        let lbmethod = attrs.lbmethod.as_deref().ok_or(Error::Incomplete {
            kind: Self::KIND,
            field: "lbmethod",
        })?;
        let members = attrs.members.as_deref().ok_or(Error::Incomplete {
            kind: Self::KIND,
            field: "members",
        })?;

        tracing::debug!(pool = name, members = members.len(), "Creating pool");
        conn.call(
            proc::CREATE,
            &[
                json!([name]),
                json!([unmunge(lbmethod, LB_METHOD_PREFIX)]),
                json!([[]]),
            ],
        )?;
        if !members.is_empty() {
            add_members(conn, name, members)?;
        }
        Self::push_scalars(conn, name, attrs)
    }

    fn update(conn: &Connection, name: &str, attrs: &PoolAttrs) -> Result<()> {
        if let Some(lbmethod) = &attrs.lbmethod {
            conn.call(
                proc::SET_LB_METHOD,
                &[json!([name]), json!([unmunge(lbmethod, LB_METHOD_PREFIX)])],
            )?;
        }
        if let Some(members) = &attrs.members {
            replace_members(conn, name, members)?;
        }
        Self::push_scalars(conn, name, attrs)
    }

    fn push_scalars(conn: &Connection, name: &str, attrs: &PoolAttrs) -> Result<()> {
        if let Some(description) = &attrs.description {
            conn.call(
                proc::SET_DESCRIPTION,
                &[json!([name]), json!([description])],
            )?;
        }
        let numbers = [
            (proc::SET_MINIMUM_ACTIVE_MEMBER, attrs.minimum_active_member),
            (proc::SET_MINIMUM_UP_MEMBER, attrs.minimum_up_member),
            (proc::SET_SLOW_RAMP_TIME, attrs.slow_ramp_time),
        ];
        for (procedure, value) in numbers {
            if let Some(value) = value {
                conn.call(procedure, &[json!([name]), json!([value])])?;
            }
        }
        Ok(())
    }

    /// Fetch every attribute of `pools` with one call per attribute.
    pub(crate) fn load_all(binding: &Binding, pools: &[&Self]) -> Result<()> {
        if pools.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = pools.iter().map(|p| p.name()).collect();

        let descriptions = binding.get_many(proc::GET_DESCRIPTION, &names)?;
        let methods = binding.get_many(proc::GET_LB_METHOD, &names)?;
        let members = binding.get_many(proc::GET_MEMBER, &names)?;
        let min_active = binding.get_many(proc::GET_MINIMUM_ACTIVE_MEMBER, &names)?;
        let min_up = binding.get_many(proc::GET_MINIMUM_UP_MEMBER, &names)?;
        let ramp = binding.get_many(proc::GET_SLOW_RAMP_TIME, &names)?;

        for (i, pool) in pools.iter().enumerate() {
            let lbmethod = wire::as_string(&methods[i], "lb_method")?;
            let attrs = PoolAttrs {
                description: Some(wire::as_string(&descriptions[i], "description")?),
                lbmethod: Some(munge(&lbmethod, LB_METHOD_PREFIX)),
                members: Some(decode_members(&members[i])?),
                minimum_active_member: Some(wire::as_u32(&min_active[i], "minimum_active_member")?),
                minimum_up_member: Some(wire::as_u32(&min_up[i], "minimum_up_member")?),
                slow_ramp_time: Some(wire::as_u32(&ramp[i], "slow_ramp_time")?),
            };
            pool.record.write(|cached| *cached = attrs);
        }
        Ok(())
    }
}

fn decode_members(value: &Value) -> Result<Vec<MemberAddress>> {
    wire::as_array(value, "members")?
        .iter()
        .map(MemberAddress::from_wire)
        .collect()
}

fn add_members(conn: &Connection, pool: &str, members: &[MemberAddress]) -> Result<()> {
    let list: Vec<Value> = members.iter().map(MemberAddress::to_wire).collect();
    conn.call(proc::ADD_MEMBER, &[json!([pool]), json!([list])])
        .map(|_| ())
}

/// Remove every current member of `pool`, then add `members`.
fn replace_members(conn: &Connection, pool: &str, members: &[MemberAddress]) -> Result<()> {
    let current = conn
        .call(proc::GET_MEMBER, &[json!([pool])])
        .map_err(|e| e.into_not_found(ResourceKind::Pool, pool))?;
    let current = decode_members(wire::first(&current, proc::GET_MEMBER)?)?;
    if !current.is_empty() {
        let list: Vec<Value> = current.iter().map(MemberAddress::to_wire).collect();
        conn.call(proc::REMOVE_MEMBER, &[json!([pool]), json!([list])])?;
    }
    if !members.is_empty() {
        add_members(conn, pool, members)?;
    }
    Ok(())
}

impl Resource for Pool {
    const KIND: ResourceKind = ResourceKind::Pool;

    fn key(&self) -> ResourceKey {
        ResourceKey::named(self.record.endpoint(), Self::KIND, &self.name.read())
    }

    fn is_bound(&self) -> bool {
        self.record.binding_opt().is_some()
    }

    fn exists(&self) -> Result<bool> {
        let binding = self.record.binding(Self::KIND)?;
        match binding.get(Self::KIND, proc::GET_DESCRIPTION, &self.name()) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn refresh(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        Self::load_all(binding, &[self]).map_err(|e| e.into_not_found(Self::KIND, self.name()))
    }

    fn save(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        let name = self.name();
        let attrs = self.cached();
        with_write_transaction(&binding.conn, |conn| {
            if self.exists()? {
                Self::update(conn, &name, &attrs)
            } else {
                Self::create(conn, &name, &attrs)
            }
        })
    }

    fn delete(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        let name = self.name();
        with_write_transaction(&binding.conn, |conn| {
            conn.call(proc::DELETE, &[json!([name])]).map(|_| ())
        })
        .map_err(|e| e.into_not_found(Self::KIND, name.as_str()))?;
        Self::cache(&binding.registry).forget_if(&self.key(), self);
        Ok(())
    }

    fn cache(registry: &Registry) -> &IdentityCache<Self> {
        registry.pools()
    }
}

impl Import for Pool {
    fn import(lb: &Lb, document: Value) -> Result<Arc<Self>> {
        let Named { name, attrs } = serde_json::from_value::<Named<PoolAttrs>>(document)?;
        let proxy = lb.pool(&name);
        proxy.stage(|cached| *cached = attrs);
        Ok(proxy)
    }
}
