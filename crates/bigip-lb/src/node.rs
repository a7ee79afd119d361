//! Node address proxy.

use std::sync::Arc;

use bigip_session::{
    Connection, Error, IdentityCache, ResourceKey, ResourceKind, Result, wire,
    with_write_transaction,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::node as proc;
use crate::lb::{Lb, Registry};
use crate::resource::{
    Binding, Import, Named, Record, Resource, decode_object_status,
};

/// Cached node attributes. `None` means not fetched and not staged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    /// IP address. Fixed once the node exists.
    pub address: Option<String>,
    pub connection_limit: Option<u32>,
    pub description: Option<String>,
    pub dynamic_ratio: Option<u32>,
    pub rate_limit: Option<u32>,
    pub ratio: Option<u32>,
    pub enabled: Option<bool>,
    /// Munged availability, e.g. `green`. Read-only.
    pub availability_status: Option<String>,
    /// Read-only.
    pub status_description: Option<String>,
}

#[derive(Debug)]
pub struct Node {
    name: String,
    record: Record<NodeAttrs>,
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct View<'a> {
            name: &'a str,
            #[serde(flatten)]
            attrs: &'a NodeAttrs,
        }
        self.record.read(|attrs| {
            View {
                name: &self.name,
                attrs,
            }
            .serialize(serializer)
        })
    }
}

impl Node {
    /// Unbound node record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record: Record::new(None, NodeAttrs::default()),
        }
    }

    pub(crate) fn bound(binding: Binding, name: String) -> Self {
        Self {
            name,
            record: Record::new(Some(binding), NodeAttrs::default()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn cached(&self) -> NodeAttrs {
        self.record.snapshot()
    }

    pub fn stage(&self, edit: impl FnOnce(&mut NodeAttrs)) {
        self.record.write(edit);
    }

    fn pull_u32(&self, procedure: &'static str, store: fn(&mut NodeAttrs, u32)) -> Result<()> {
        self.record
            .pull(|b| b.get_u32(Self::KIND, procedure, &self.name), store)
    }

    fn push_u32(
        &self,
        procedure: &'static str,
        value: u32,
        store: fn(&mut NodeAttrs, u32),
    ) -> Result<()> {
        self.record.push(
            value,
            |b, v| b.set(Self::KIND, procedure, &self.name, json!(v)),
            store,
        )
    }

    pub fn address(&self) -> Result<Option<String>> {
        self.record.pull(
            |b| b.get_string(Self::KIND, proc::GET_ADDRESS, &self.name),
            |a, v| a.address = Some(v),
        )?;
        Ok(self.record.read(|a| a.address.clone()))
    }

    pub fn connection_limit(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_CONNECTION_LIMIT, |a, v| {
            a.connection_limit = Some(v);
        })?;
        Ok(self.record.read(|a| a.connection_limit))
    }

    pub fn set_connection_limit(&self, limit: u32) -> Result<()> {
        self.push_u32(proc::SET_CONNECTION_LIMIT, limit, |a, v| {
            a.connection_limit = Some(v);
        })
    }

    pub fn description(&self) -> Result<Option<String>> {
        self.record.pull(
            |b| b.get_string(Self::KIND, proc::GET_DESCRIPTION, &self.name),
            |a, v| a.description = Some(v),
        )?;
        Ok(self.record.read(|a| a.description.clone()))
    }

    pub fn set_description(&self, description: &str) -> Result<()> {
        self.record.push(
            description.to_string(),
            |b, v| b.set(Self::KIND, proc::SET_DESCRIPTION, &self.name, json!(v)),
            |a, v| a.description = Some(v),
        )
    }

    pub fn dynamic_ratio(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_DYNAMIC_RATIO, |a, v| a.dynamic_ratio = Some(v))?;
        Ok(self.record.read(|a| a.dynamic_ratio))
    }

    pub fn set_dynamic_ratio(&self, ratio: u32) -> Result<()> {
        self.push_u32(proc::SET_DYNAMIC_RATIO, ratio, |a, v| {
            a.dynamic_ratio = Some(v);
        })
    }

    pub fn rate_limit(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_RATE_LIMIT, |a, v| a.rate_limit = Some(v))?;
        Ok(self.record.read(|a| a.rate_limit))
    }

    pub fn set_rate_limit(&self, limit: u32) -> Result<()> {
        self.push_u32(proc::SET_RATE_LIMIT, limit, |a, v| a.rate_limit = Some(v))
    }

    pub fn ratio(&self) -> Result<Option<u32>> {
        self.pull_u32(proc::GET_RATIO, |a, v| a.ratio = Some(v))?;
        Ok(self.record.read(|a| a.ratio))
    }

    pub fn set_ratio(&self, ratio: u32) -> Result<()> {
        self.push_u32(proc::SET_RATIO, ratio, |a, v| a.ratio = Some(v))
    }

    /// Session enabled state.
    pub fn enabled(&self) -> Result<Option<bool>> {
        self.record.pull(
            |b| b.get_enabled(Self::KIND, proc::GET_SESSION_ENABLED_STATE, &self.name),
            |a, v| a.enabled = Some(v),
        )?;
        Ok(self.record.read(|a| a.enabled))
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.record.push(
            enabled,
            |b, v| {
                b.set(
                    Self::KIND,
                    proc::SET_SESSION_ENABLED_STATE,
                    &self.name,
                    json!(wire::enabled_state(*v)),
                )
            },
            |a, v| a.enabled = Some(v),
        )
    }

    fn pull_object_status(&self) -> Result<()> {
        self.record.pull(
            |b| decode_object_status(&b.get(Self::KIND, proc::GET_OBJECT_STATUS, &self.name)?),
            |a, (availability, description)| {
                a.availability_status = Some(availability);
                a.status_description = Some(description);
            },
        )
    }

    /// Munged availability status, e.g. `green` or `red`.
    pub fn availability_status(&self) -> Result<Option<String>> {
        self.pull_object_status()?;
        Ok(self.record.read(|a| a.availability_status.clone()))
    }

    pub fn status_description(&self) -> Result<Option<String>> {
        self.pull_object_status()?;
        Ok(self.record.read(|a| a.status_description.clone()))
    }

    fn create(&self, conn: &Connection, attrs: &NodeAttrs) -> Result<()> {
        let address = attrs.address.as_deref().ok_or(Error::Incomplete {
            kind: Self::KIND,
            field: "address",
        })?;
        tracing::debug!(node = %self.name, address, "Creating node");
        conn.call(
            proc::CREATE,
            &[
                json!([self.name]),
                json!([address]),
                json!([attrs.connection_limit.unwrap_or(0)]),
            ],
        )?;
        Ok(())
    }

    fn push_staged(&self, conn: &Connection, attrs: &NodeAttrs, created: bool) -> Result<()> {
        let name = json!([self.name]);
        if let Some(description) = &attrs.description {
            conn.call(proc::SET_DESCRIPTION, &[name.clone(), json!([description])])?;
        }
        // A fresh node already carries its connection limit.
        let limit = if created { None } else { attrs.connection_limit };
        let numbers = [
            (proc::SET_CONNECTION_LIMIT, limit),
            (proc::SET_DYNAMIC_RATIO, attrs.dynamic_ratio),
            (proc::SET_RATE_LIMIT, attrs.rate_limit),
            (proc::SET_RATIO, attrs.ratio),
        ];
        for (procedure, value) in numbers {
            if let Some(value) = value {
                conn.call(procedure, &[name.clone(), json!([value])])?;
            }
        }
        if let Some(enabled) = attrs.enabled {
            conn.call(
                proc::SET_SESSION_ENABLED_STATE,
                &[name, json!([wire::enabled_state(enabled)])],
            )?;
        }
        Ok(())
    }

    pub(crate) fn load_all(binding: &Binding, nodes: &[&Self]) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();

        let addresses = binding.get_many(proc::GET_ADDRESS, &names)?;
        let limits = binding.get_many(proc::GET_CONNECTION_LIMIT, &names)?;
        let descriptions = binding.get_many(proc::GET_DESCRIPTION, &names)?;
        let dynamic = binding.get_many(proc::GET_DYNAMIC_RATIO, &names)?;
        let rate_limits = binding.get_many(proc::GET_RATE_LIMIT, &names)?;
        let ratios = binding.get_many(proc::GET_RATIO, &names)?;
        let states = binding.get_many(proc::GET_SESSION_ENABLED_STATE, &names)?;
        let statuses = binding.get_many(proc::GET_OBJECT_STATUS, &names)?;

        for (i, node) in nodes.iter().enumerate() {
            let (availability, status_description) = decode_object_status(&statuses[i])?;
            let attrs = NodeAttrs {
                address: Some(wire::as_string(&addresses[i], "address")?),
                connection_limit: Some(wire::as_u32(&limits[i], "connection_limit")?),
                description: Some(wire::as_string(&descriptions[i], "description")?),
                dynamic_ratio: Some(wire::as_u32(&dynamic[i], "dynamic_ratio")?),
                rate_limit: Some(wire::as_u32(&rate_limits[i], "rate_limit")?),
                ratio: Some(wire::as_u32(&ratios[i], "ratio")?),
                enabled: Some(wire::parse_enabled_state(&states[i], "session_enabled_state")?),
                availability_status: Some(availability),
                status_description: Some(status_description),
            };
            node.record.write(|cached| *cached = attrs);
        }
        Ok(())
    }
}

impl Resource for Node {
    const KIND: ResourceKind = ResourceKind::Node;

    fn key(&self) -> ResourceKey {
        ResourceKey::named(self.record.endpoint(), Self::KIND, &self.name)
    }

    fn is_bound(&self) -> bool {
        self.record.binding_opt().is_some()
    }

    fn exists(&self) -> Result<bool> {
        let binding = self.record.binding(Self::KIND)?;
        match binding.get(Self::KIND, proc::GET_ADDRESS, &self.name) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn refresh(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        Self::load_all(binding, &[self]).map_err(|e| e.into_not_found(Self::KIND, &self.name))
    }

    fn save(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        let attrs = self.cached();
        with_write_transaction(&binding.conn, |conn| {
            let created = !self.exists()?;
            if created {
                self.create(conn, &attrs)?;
            }
            self.push_staged(conn, &attrs, created)
        })
    }

    fn delete(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        with_write_transaction(&binding.conn, |conn| {
            conn.call(proc::DELETE, &[json!([self.name])]).map(|_| ())
        })
        .map_err(|e| e.into_not_found(Self::KIND, &self.name))?;
        Self::cache(&binding.registry).forget_if(&self.key(), self);
        Ok(())
    }

    fn cache(registry: &Registry) -> &IdentityCache<Self> {
        registry.nodes()
    }
}

impl Import for Node {
    fn import(lb: &Lb, document: Value) -> Result<Arc<Self>> {
        let Named { name, attrs } = serde_json::from_value::<Named<NodeAttrs>>(document)?;
        let proxy = lb.node(&name);
        proxy.stage(|cached| *cached = attrs);
        Ok(proxy)
    }
}
