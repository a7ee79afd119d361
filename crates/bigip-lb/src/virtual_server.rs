//! Virtual server proxy.

use std::sync::Arc;

use bigip_session::{
    IdentityCache, ResourceKey, ResourceKind, Result, wire, with_write_transaction,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::{PROTOCOL_PREFIX, VS_TYPE_PREFIX, virtual_server as proc};
use crate::lb::{Lb, Registry};
use crate::resource::{Binding, Import, Named, Record, Resource, munge};

/// Cached virtual server attributes.
///
/// `address`, `port`, `protocol` and `vstype` are read-only; saving pushes the
/// default pool, description and enabled state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualServerAttrs {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub default_pool: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    /// Munged, e.g. `tcp`.
    pub protocol: Option<String>,
    /// Munged, e.g. `pool` or `ip_forwarding`.
    pub vstype: Option<String>,
}

#[derive(Debug)]
pub struct VirtualServer {
    name: String,
    record: Record<VirtualServerAttrs>,
}

impl Serialize for VirtualServer {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct View<'a> {
            name: &'a str,
            #[serde(flatten)]
            attrs: &'a VirtualServerAttrs,
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

fn decode_destination(value: &Value) -> Result<(String, u16)> {
    let address = wire::as_string(&value["address"], "destination address")?;
    let port = wire::as_u64(&value["port"], "destination port")?;
    let port = u16::try_from(port).map_err(|_| {
        bigip_session::Error::unexpected(format!("destination port out of range: {port}"))
    })?;
    Ok((address, port))
}

impl VirtualServer {
    /// Unbound virtual server record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record: Record::new(None, VirtualServerAttrs::default()),
        }
    }

    pub(crate) fn bound(binding: Binding, name: String) -> Self {
        Self {
            name,
            record: Record::new(Some(binding), VirtualServerAttrs::default()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn cached(&self) -> VirtualServerAttrs {
        self.record.snapshot()
    }

    pub fn stage(&self, edit: impl FnOnce(&mut VirtualServerAttrs)) {
        self.record.write(edit);
    }

    fn pull_destination(&self) -> Result<()> {
        self.record.pull(
            |b| decode_destination(&b.get(Self::KIND, proc::GET_DESTINATION, &self.name)?),
            |a, (address, port)| {
                a.address = Some(address);
                a.port = Some(port);
            },
        )
    }

    /// Destination address.
    pub fn address(&self) -> Result<Option<String>> {
        self.pull_destination()?;
        Ok(self.record.read(|a| a.address.clone()))
    }

    /// Destination port.
    pub fn port(&self) -> Result<Option<u16>> {
        self.pull_destination()?;
        Ok(self.record.read(|a| a.port))
    }

    /// Full path of the default pool; empty when none is assigned.
    pub fn default_pool(&self) -> Result<Option<String>> {
        self.record.pull(
            |b| b.get_string(Self::KIND, proc::GET_DEFAULT_POOL, &self.name),
            |a, v| a.default_pool = Some(v),
        )?;
        Ok(self.record.read(|a| a.default_pool.clone()))
    }

    pub fn set_default_pool(&self, pool: &str) -> Result<()> {
        self.record.push(
            pool.to_string(),
            |b, v| b.set(Self::KIND, proc::SET_DEFAULT_POOL, &self.name, json!(v)),
            |a, v| a.default_pool = Some(v),
        )
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

    pub fn enabled(&self) -> Result<Option<bool>> {
        self.record.pull(
            |b| b.get_enabled(Self::KIND, proc::GET_ENABLED_STATE, &self.name),
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
                    proc::SET_ENABLED_STATE,
                    &self.name,
                    json!(wire::enabled_state(*v)),
                )
            },
            |a, v| a.enabled = Some(v),
        )
    }

    pub fn protocol(&self) -> Result<Option<String>> {
        self.record.pull(
            |b| b.get_string(Self::KIND, proc::GET_PROTOCOL, &self.name),
            |a, v| a.protocol = Some(munge(&v, PROTOCOL_PREFIX)),
        )?;
        Ok(self.record.read(|a| a.protocol.clone()))
    }

    pub fn vstype(&self) -> Result<Option<String>> {
        self.record.pull(
            |b| b.get_string(Self::KIND, proc::GET_TYPE, &self.name),
            |a, v| a.vstype = Some(munge(&v, VS_TYPE_PREFIX)),
        )?;
        Ok(self.record.read(|a| a.vstype.clone()))
    }

    pub(crate) fn load_all(binding: &Binding, servers: &[&Self]) -> Result<()> {
        if servers.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = servers.iter().map(|v| v.name.clone()).collect();

        let destinations = binding.get_many(proc::GET_DESTINATION, &names)?;
        let pools = binding.get_many(proc::GET_DEFAULT_POOL, &names)?;
        let descriptions = binding.get_many(proc::GET_DESCRIPTION, &names)?;
        let states = binding.get_many(proc::GET_ENABLED_STATE, &names)?;
        let protocols = binding.get_many(proc::GET_PROTOCOL, &names)?;
        let types = binding.get_many(proc::GET_TYPE, &names)?;

        for (i, server) in servers.iter().enumerate() {
            let (address, port) = decode_destination(&destinations[i])?;
            let protocol = wire::as_string(&protocols[i], "protocol")?;
            let vstype = wire::as_string(&types[i], "type")?;
            let attrs = VirtualServerAttrs {
                address: Some(address),
                port: Some(port),
                default_pool: Some(wire::as_string(&pools[i], "default_pool_name")?),
                description: Some(wire::as_string(&descriptions[i], "description")?),
                enabled: Some(wire::parse_enabled_state(&states[i], "enabled_state")?),
                protocol: Some(munge(&protocol, PROTOCOL_PREFIX)),
                vstype: Some(munge(&vstype, VS_TYPE_PREFIX)),
            };
            server.record.write(|cached| *cached = attrs);
        }
        Ok(())
    }
}

impl Resource for VirtualServer {
    const KIND: ResourceKind = ResourceKind::VirtualServer;

    fn key(&self) -> ResourceKey {
        ResourceKey::named(self.record.endpoint(), Self::KIND, &self.name)
    }

    fn is_bound(&self) -> bool {
        self.record.binding_opt().is_some()
    }

    fn exists(&self) -> Result<bool> {
        let binding = self.record.binding(Self::KIND)?;
        match binding.get(Self::KIND, proc::GET_DESCRIPTION, &self.name) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn refresh(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        Self::load_all(binding, &[self]).map_err(|e| e.into_not_found(Self::KIND, &self.name))
    }

    /// Push staged writable attributes. Virtual servers are not created here; a
    /// missing one surfaces as not-found.
    fn save(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        let attrs = self.cached();
        let name = json!([self.name]);
        with_write_transaction(&binding.conn, |conn| {
            if let Some(pool) = &attrs.default_pool {
                conn.call(proc::SET_DEFAULT_POOL, &[name.clone(), json!([pool])])?;
            }
            if let Some(description) = &attrs.description {
                conn.call(proc::SET_DESCRIPTION, &[name.clone(), json!([description])])?;
            }
            if let Some(enabled) = attrs.enabled {
                conn.call(
                    proc::SET_ENABLED_STATE,
                    &[name.clone(), json!([wire::enabled_state(enabled)])],
                )?;
            }
            Ok(())
        })
        .map_err(|e| e.into_not_found(Self::KIND, &self.name))
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
        registry.virtual_servers()
    }
}

impl Import for VirtualServer {
    fn import(lb: &Lb, document: Value) -> Result<Arc<Self>> {
        let Named { name, attrs } = serde_json::from_value::<Named<VirtualServerAttrs>>(document)?;
        let proxy = lb.virtual_server(&name);
        proxy.stage(|cached| *cached = attrs);
        Ok(proxy)
    }
}
