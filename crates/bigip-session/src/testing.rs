//! In-memory simulated device for tests.
//!
//! [`FakeDevice`] implements [`Transport`] and keeps just enough device behavior
//! to exercise the session guards and resource proxies:
//!
//! * session procedures (active folder, recursive query flag, transaction timeout);
//! * transactions, with rollback restoring a snapshot of the object store;
//! * `get_list` scoped by the active folder and the recursive query flag;
//! * rejection of mutating calls while the session sits at `/`;
//! * generic `get_<attr>` / `set_<attr>` / `get_member_<attr>` / `set_member_<attr>`
//!   calls over per-object attribute maps, plus `create`, `delete_*`,
//!   member add/remove and the rule query/modify calls;
//! * one-shot failure injection per procedure, and a log of every call.
//!
//! Faults are rendered in the device's textual fault format and decoded through
//! [`Fault::parse`], so callers see exactly what a real transport would produce.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use crate::constants::{ROOT_FOLDER, procedures};
use crate::fault::Fault;
use crate::transport::Transport;
use crate::{Error, Result, wire};

const POOL: &str = "LocalLB.Pool";
const NODE: &str = "LocalLB.NodeAddressV2";
const RULE: &str = "LocalLB.Rule";
const VIRTUAL_SERVER: &str = "LocalLB.VirtualServer";

const DEFAULT_VERSION: &str = "BIG-IP_v11.6.1";
const DEFAULT_FOLDER: &str = "/Common";

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub procedure: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone)]
enum Injected {
    Fault(String),
    Transport(String),
}

#[derive(Debug, Clone, Default)]
struct FakeMember {
    address: String,
    port: u16,
    attrs: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
struct FakeObject {
    attrs: Map<String, Value>,
    members: Vec<FakeMember>,
}

type Store = BTreeMap<String, BTreeMap<String, FakeObject>>;

#[derive(Debug)]
struct DeviceState {
    version: String,
    folder: String,
    recursive: bool,
    transaction_timeout: u64,
    snapshot: Option<Store>,
    objects: Store,
    injected: Vec<(String, Injected)>,
    calls: Vec<Call>,
}

/// Simulated device. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    inner: Arc<Mutex<DeviceState>>,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::with_version(DEFAULT_VERSION)
    }

    #[must_use]
    pub fn with_version(version: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DeviceState {
                version: version.to_string(),
                folder: DEFAULT_FOLDER.to_string(),
                recursive: false,
                transaction_timeout: 60,
                snapshot: None,
                objects: Store::new(),
                injected: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }

    // Session state

    /// Set the device-side active folder without going through a connection.
    pub fn set_folder(&self, folder: &str) {
        self.inner.lock().folder = folder.to_string();
    }

    pub fn folder(&self) -> String {
        self.inner.lock().folder.clone()
    }

    pub fn set_recursive(&self, enabled: bool) {
        self.inner.lock().recursive = enabled;
    }

    pub fn recursive(&self) -> bool {
        self.inner.lock().recursive
    }

    pub fn transaction_open(&self) -> bool {
        self.inner.lock().snapshot.is_some()
    }

    // Object store

    /// Add an object to `interface` (e.g. `LocalLB.Pool`) with default attributes
    /// overlaid by `attrs` (a JSON object).
    pub fn seed(&self, interface: &str, name: &str, attrs: &Value) {
        let mut object = FakeObject {
            attrs: defaults(interface),
            members: Vec::new(),
        };
        if let Some(map) = attrs.as_object() {
            object.attrs.extend(map.clone());
        }
        self.inner
            .lock()
            .objects
            .entry(interface.to_string())
            .or_default()
            .insert(name.to_string(), object);
    }

    pub fn seed_pool(&self, name: &str) {
        self.seed(POOL, name, &json!({}));
    }

    pub fn seed_node(&self, name: &str, address: &str) {
        self.seed(NODE, name, &json!({ "address": address }));
    }

    pub fn seed_rule(&self, name: &str, definition: &str) {
        self.seed(RULE, name, &json!({ "definition": definition }));
    }

    pub fn seed_virtual_server(&self, name: &str, address: &str, port: u16, pool: &str) {
        self.seed(
            VIRTUAL_SERVER,
            name,
            &json!({
                "destination_v2": { "address": address, "port": port },
                "default_pool_name": pool,
            }),
        );
    }

    /// Add a member to an existing seeded pool.
    pub fn seed_member(&self, pool: &str, address: &str, port: u16) {
        let mut state = self.inner.lock();
        if let Some(object) = state
            .objects
            .get_mut(POOL)
            .and_then(|objects| objects.get_mut(pool))
        {
            object.members.push(FakeMember {
                address: address.to_string(),
                port,
                attrs: member_defaults(),
            });
        }
    }

    pub fn contains(&self, interface: &str, name: &str) -> bool {
        self.inner
            .lock()
            .objects
            .get(interface)
            .is_some_and(|objects| objects.contains_key(name))
    }

    /// Attribute map of one object, if it exists.
    pub fn attrs(&self, interface: &str, name: &str) -> Option<Value> {
        self.inner
            .lock()
            .objects
            .get(interface)
            .and_then(|objects| objects.get(name))
            .map(|object| Value::Object(object.attrs.clone()))
    }

    /// `(address, port)` of every member of `pool`.
    pub fn members(&self, pool: &str) -> Vec<(String, u16)> {
        self.inner
            .lock()
            .objects
            .get(POOL)
            .and_then(|objects| objects.get(pool))
            .map(|object| {
                object
                    .members
                    .iter()
                    .map(|m| (m.address.clone(), m.port))
                    .collect()
            })
            .unwrap_or_default()
    }

    // Failure injection

    /// Make the next call to `procedure` fail with a device fault carrying
    /// `error_string`. The call has no effect on device state.
    pub fn fail_next(&self, procedure: &str, error_string: &str) {
        self.inner
            .lock()
            .injected
            .push((procedure.to_string(), Injected::Fault(error_string.to_string())));
    }

    /// Make the next call to `procedure` fail before reaching the device.
    pub fn fail_next_transport(&self, procedure: &str, message: &str) {
        self.inner
            .lock()
            .injected
            .push((procedure.to_string(), Injected::Transport(message.to_string())));
    }

    // Call log

    /// Procedure names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .map(|c| c.procedure.clone())
            .collect()
    }

    pub fn calls_with_args(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn count(&self, procedure: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.procedure == procedure)
            .count()
    }

    /// Number of calls whose procedure name starts with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.procedure.starts_with(prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }
}

impl Transport for FakeDevice {
    fn invoke(&self, procedure: &str, args: &[Value]) -> Result<Value> {
        let mut state = self.inner.lock();
        state.calls.push(Call {
            procedure: procedure.to_string(),
            args: args.to_vec(),
        });

        if let Some(pos) = state.injected.iter().position(|(p, _)| p == procedure) {
            let (_, injected) = state.injected.remove(pos);
            return Err(match injected {
                Injected::Fault(text) => fault(procedure, &text),
                Injected::Transport(text) => Error::transport(text),
            });
        }

        state.dispatch(procedure, args)
    }
}

impl DeviceState {
    fn dispatch(&mut self, procedure: &str, args: &[Value]) -> Result<Value> {
        match procedure {
            procedures::GET_VERSION => Ok(json!(self.version)),
            procedures::GET_SYSTEM_INFORMATION => Ok(json!({
                "system_name": "Linux",
                "host_name": "bigip.fake",
                "product_category": "Virtual Edition",
            })),
            procedures::GET_FAILOVER_STATE => Ok(json!("FAILOVER_STATE_ACTIVE")),
            procedures::GET_ACTIVE_FOLDER => Ok(json!(self.folder)),
            procedures::SET_ACTIVE_FOLDER => {
                self.folder = wire::as_string(arg(args, 0)?, "folder")?;
                Ok(Value::Null)
            }
            procedures::GET_RECURSIVE_QUERY_STATE => {
                Ok(json!(wire::enabled_state(self.recursive)))
            }
            procedures::SET_RECURSIVE_QUERY_STATE => {
                self.recursive = wire::parse_enabled_state(arg(args, 0)?, "state")?;
                Ok(Value::Null)
            }
            procedures::GET_TRANSACTION_TIMEOUT => Ok(json!(self.transaction_timeout)),
            procedures::SET_TRANSACTION_TIMEOUT => {
                self.transaction_timeout = wire::as_u64(arg(args, 0)?, "timeout")?;
                Ok(Value::Null)
            }
            procedures::START_TRANSACTION => {
                if self.snapshot.is_some() {
                    return Err(fault(
                        procedure,
                        "Only one transaction can be open at any time.",
                    ));
                }
                self.snapshot = Some(self.objects.clone());
                Ok(Value::Null)
            }
            procedures::SUBMIT_TRANSACTION => {
                if self.snapshot.take().is_none() {
                    return Err(fault(procedure, "No transaction is open to submit."));
                }
                Ok(Value::Null)
            }
            procedures::ROLLBACK_TRANSACTION => match self.snapshot.take() {
                Some(snapshot) => {
                    self.objects = snapshot;
                    Ok(Value::Null)
                }
                None => Err(fault(procedure, "No transaction is open to roll back.")),
            },
            _ => self.object_call(procedure, args),
        }
    }

    fn object_call(&mut self, procedure: &str, args: &[Value]) -> Result<Value> {
        let Some((interface, method)) = procedure.rsplit_once('.') else {
            return Err(fault(procedure, "Unknown method."));
        };

        if method == "get_list" {
            return Ok(self.list(interface));
        }
        if !is_read(method) && self.folder == ROOT_FOLDER {
            return Err(fault(
                procedure,
                "Cannot modify objects while the active folder is the root folder (/).",
            ));
        }

        match method {
            "create" | "create_v2" if interface == RULE => self.create_rules(procedure, args),
            "create" | "create_v2" => self.create(procedure, interface, args),
            "modify_rule" => self.modify_rules(procedure, args),
            "query_rule" => self.query_rules(procedure, args),
            "add_member" | "add_member_v2" => self.add_members(procedure, args),
            "remove_member" | "remove_member_v2" => self.remove_members(procedure, args),
            "get_member" | "get_member_v2" => self.get_members(procedure, args),
            "get_active_member_count" => {
                let names = self.names(args)?;
                let counts = names
                    .iter()
                    .map(|name| {
                        self.object(procedure, POOL, name)
                            .map(|object| json!(object.members.len()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(counts))
            }
            "reset_statistics" => {
                for name in self.names(args)? {
                    self.object(procedure, interface, &name)?;
                }
                Ok(Value::Null)
            }
            _ => {
                if method.starts_with("delete_") {
                    self.delete(procedure, interface, args)
                } else if let Some(attr) = method.strip_prefix("get_member_") {
                    self.get_member_attr(procedure, attr, args)
                } else if let Some(attr) = method.strip_prefix("set_member_") {
                    self.set_member_attr(procedure, attr, args)
                } else if let Some(attr) = method.strip_prefix("get_") {
                    self.get_attr(procedure, interface, attr, args)
                } else if let Some(attr) = method.strip_prefix("set_") {
                    self.set_attr(procedure, interface, attr, args)
                } else {
                    Err(fault(procedure, "Unknown method."))
                }
            }
        }
    }

    fn resolve(&self, name: &str) -> String {
        if name.starts_with('/') {
            name.to_string()
        } else if self.folder == ROOT_FOLDER {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.folder)
        }
    }

    fn names(&self, args: &[Value]) -> Result<Vec<String>> {
        Ok(wire::string_list(arg(args, 0)?, "names")?
            .iter()
            .map(|name| self.resolve(name))
            .collect())
    }

    fn list(&self, interface: &str) -> Value {
        let folder = self.folder.as_str();
        let visible = |name: &str| {
            let parent = name.rsplit_once('/').map_or("", |(parent, _)| parent);
            let parent = if parent.is_empty() { ROOT_FOLDER } else { parent };
            if self.recursive {
                folder == ROOT_FOLDER
                    || parent == folder
                    || parent.starts_with(&format!("{folder}/"))
            } else {
                parent == folder
            }
        };
        let names: Vec<Value> = self
            .objects
            .get(interface)
            .into_iter()
            .flat_map(BTreeMap::keys)
            .filter(|name| visible(name))
            .map(|name| json!(name))
            .collect();
        Value::Array(names)
    }

    fn object(&self, procedure: &str, interface: &str, name: &str) -> Result<&FakeObject> {
        self.objects
            .get(interface)
            .and_then(|objects| objects.get(name))
            .ok_or_else(|| not_found(procedure, interface, name))
    }

    fn object_mut(
        &mut self,
        procedure: &str,
        interface: &str,
        name: &str,
    ) -> Result<&mut FakeObject> {
        self.objects
            .get_mut(interface)
            .and_then(|objects| objects.get_mut(name))
            .ok_or_else(|| not_found(procedure, interface, name))
    }

    fn create(&mut self, procedure: &str, interface: &str, args: &[Value]) -> Result<Value> {
        let names = self.names(args)?;
        let fields = create_fields(interface);
        for (i, name) in names.iter().enumerate() {
            if self
                .objects
                .get(interface)
                .is_some_and(|objects| objects.contains_key(name))
            {
                return Err(fault(
                    procedure,
                    &format!(
                        "The requested {} ({name}) already exists.",
                        object_kind(interface)
                    ),
                ));
            }
            let mut object = FakeObject {
                attrs: defaults(interface),
                members: Vec::new(),
            };
            for (offset, field) in fields.iter().enumerate() {
                let value = arg(args, offset + 1)?
                    .get(i)
                    .cloned()
                    .unwrap_or(Value::Null);
                object.attrs.insert((*field).to_string(), value);
            }
            if interface == POOL
                && let Some(members) = args.get(2).and_then(|m| m.get(i))
            {
                for (address, port) in member_ids(members)? {
                    object.members.push(FakeMember {
                        address,
                        port,
                        attrs: member_defaults(),
                    });
                }
            }
            self.objects
                .entry(interface.to_string())
                .or_default()
                .insert(name.clone(), object);
        }
        Ok(Value::Null)
    }

    fn delete(&mut self, procedure: &str, interface: &str, args: &[Value]) -> Result<Value> {
        for name in self.names(args)? {
            self.object(procedure, interface, &name)?;
            if let Some(objects) = self.objects.get_mut(interface) {
                objects.remove(&name);
            }
        }
        Ok(Value::Null)
    }

    fn get_attr(
        &self,
        procedure: &str,
        interface: &str,
        attr: &str,
        args: &[Value],
    ) -> Result<Value> {
        let values = self
            .names(args)?
            .iter()
            .map(|name| {
                self.object(procedure, interface, name)
                    .map(|object| object.attrs.get(attr).cloned().unwrap_or(Value::Null))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(values))
    }

    fn set_attr(
        &mut self,
        procedure: &str,
        interface: &str,
        attr: &str,
        args: &[Value],
    ) -> Result<Value> {
        let names = self.names(args)?;
        let values = wire::exact(arg(args, 1)?, names.len(), "values")?.to_vec();
        for (name, value) in names.iter().zip(values) {
            self.object_mut(procedure, interface, name)?
                .attrs
                .insert(attr.to_string(), value);
        }
        Ok(Value::Null)
    }

    fn create_rules(&mut self, procedure: &str, args: &[Value]) -> Result<Value> {
        for (name, definition) in rule_definitions(arg(args, 0)?)? {
            let name = self.resolve(&name);
            if self
                .objects
                .get(RULE)
                .is_some_and(|objects| objects.contains_key(&name))
            {
                return Err(fault(
                    procedure,
                    &format!("The requested rule ({name}) already exists."),
                ));
            }
            let mut attrs = defaults(RULE);
            attrs.insert("definition".to_string(), json!(definition));
            self.objects
                .entry(RULE.to_string())
                .or_default()
                .insert(name, FakeObject {
                    attrs,
                    members: Vec::new(),
                });
        }
        Ok(Value::Null)
    }

    fn modify_rules(&mut self, procedure: &str, args: &[Value]) -> Result<Value> {
        for (name, definition) in rule_definitions(arg(args, 0)?)? {
            let name = self.resolve(&name);
            self.object_mut(procedure, RULE, &name)?
                .attrs
                .insert("definition".to_string(), json!(definition));
        }
        Ok(Value::Null)
    }

    fn query_rules(&self, procedure: &str, args: &[Value]) -> Result<Value> {
        let rules = self
            .names(args)?
            .iter()
            .map(|name| {
                self.object(procedure, RULE, name).map(|object| {
                    json!({
                        "rule_name": name,
                        "rule_definition": object.attrs.get("definition").cloned().unwrap_or(Value::Null),
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(rules))
    }

    fn add_members(&mut self, procedure: &str, args: &[Value]) -> Result<Value> {
        let pools = self.names(args)?;
        let lists = wire::exact(arg(args, 1)?, pools.len(), "members")?.to_vec();
        for (pool, list) in pools.iter().zip(lists) {
            let object = self.object_mut(procedure, POOL, pool)?;
            for (address, port) in member_ids(&list)? {
                if object
                    .members
                    .iter()
                    .any(|m| m.address == address && m.port == port)
                {
                    return Err(fault(
                        procedure,
                        &format!(
                            "The requested pool member ({pool} {address} {port}) already exists."
                        ),
                    ));
                }
                object.members.push(FakeMember {
                    address,
                    port,
                    attrs: member_defaults(),
                });
            }
        }
        Ok(Value::Null)
    }

    fn remove_members(&mut self, procedure: &str, args: &[Value]) -> Result<Value> {
        let pools = self.names(args)?;
        let lists = wire::exact(arg(args, 1)?, pools.len(), "members")?.to_vec();
        for (pool, list) in pools.iter().zip(lists) {
            for (address, port) in member_ids(&list)? {
                let object = self.object_mut(procedure, POOL, pool)?;
                let before = object.members.len();
                object
                    .members
                    .retain(|m| !(m.address == address && m.port == port));
                if object.members.len() == before {
                    return Err(member_not_found(procedure, pool, &address, port));
                }
            }
        }
        Ok(Value::Null)
    }

    fn get_members(&self, procedure: &str, args: &[Value]) -> Result<Value> {
        let lists = self
            .names(args)?
            .iter()
            .map(|pool| {
                self.object(procedure, POOL, pool).map(|object| {
                    Value::Array(
                        object
                            .members
                            .iter()
                            .map(|m| json!({ "address": m.address, "port": m.port }))
                            .collect(),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(lists))
    }

    fn member<'a>(
        object: &'a FakeObject,
        procedure: &str,
        pool: &str,
        address: &str,
        port: u16,
    ) -> Result<&'a FakeMember> {
        object
            .members
            .iter()
            .find(|m| m.address == address && m.port == port)
            .ok_or_else(|| member_not_found(procedure, pool, address, port))
    }

    fn get_member_attr(&self, procedure: &str, attr: &str, args: &[Value]) -> Result<Value> {
        let pools = self.names(args)?;
        let lists = wire::exact(arg(args, 1)?, pools.len(), "members")?;
        let mut out = Vec::with_capacity(pools.len());
        for (pool, list) in pools.iter().zip(lists) {
            let object = self.object(procedure, POOL, pool)?;
            let values = member_ids(list)?
                .iter()
                .map(|(address, port)| {
                    Self::member(object, procedure, pool, address, *port)
                        .map(|m| m.attrs.get(attr).cloned().unwrap_or(Value::Null))
                })
                .collect::<Result<Vec<_>>>()?;
            out.push(Value::Array(values));
        }
        Ok(Value::Array(out))
    }

    fn set_member_attr(&mut self, procedure: &str, attr: &str, args: &[Value]) -> Result<Value> {
        let pools = self.names(args)?;
        let lists = wire::exact(arg(args, 1)?, pools.len(), "members")?.to_vec();
        let values = wire::exact(arg(args, 2)?, pools.len(), "values")?.to_vec();
        for ((pool, list), values) in pools.iter().zip(lists).zip(values) {
            let ids = member_ids(&list)?;
            let values = wire::exact(&values, ids.len(), "values")?.to_vec();
            let object = self.object_mut(procedure, POOL, pool)?;
            for ((address, port), value) in ids.into_iter().zip(values) {
                let member = object
                    .members
                    .iter_mut()
                    .find(|m| m.address == address && m.port == port)
                    .ok_or_else(|| member_not_found(procedure, pool, &address, port))?;
                member.attrs.insert(attr.to_string(), value);
            }
        }
        Ok(Value::Null)
    }
}

fn is_read(method: &str) -> bool {
    method.starts_with("get_") || method.starts_with("query_")
}

fn arg<'a>(args: &'a [Value], index: usize) -> Result<&'a Value> {
    args.get(index)
        .ok_or_else(|| Error::unexpected(format!("missing argument {index}")))
}

fn member_ids(list: &Value) -> Result<Vec<(String, u16)>> {
    wire::as_array(list, "members")?
        .iter()
        .map(|member| {
            let address = wire::as_string(&member["address"], "member address")?;
            let port = u16::try_from(wire::as_u64(&member["port"], "member port")?)
                .map_err(|_| Error::unexpected("member port out of range"))?;
            Ok((address, port))
        })
        .collect()
}

fn rule_definitions(list: &Value) -> Result<Vec<(String, String)>> {
    wire::as_array(list, "rules")?
        .iter()
        .map(|rule| {
            Ok((
                wire::as_string(&rule["rule_name"], "rule_name")?,
                wire::as_string(&rule["rule_definition"], "rule_definition")?,
            ))
        })
        .collect()
}

fn object_kind(interface: &str) -> &'static str {
    match interface {
        POOL => "pool",
        NODE => "node address",
        RULE => "rule",
        VIRTUAL_SERVER => "virtual server",
        _ => "object",
    }
}

/// Positional attributes following the name list in `create`.
fn create_fields(interface: &str) -> &'static [&'static str] {
    match interface {
        POOL => &["lb_method"],
        NODE => &["address", "connection_limit"],
        _ => &[],
    }
}

fn defaults(interface: &str) -> Map<String, Value> {
    let value = match interface {
        POOL => json!({
            "description": "",
            "lb_method": "LB_METHOD_ROUND_ROBIN",
            "minimum_active_member": 0,
            "minimum_up_member": 0,
            "slow_ramp_time": 10,
        }),
        NODE => json!({
            "description": "",
            "connection_limit": 0,
            "dynamic_ratio_v2": 1,
            "rate_limit": 0,
            "ratio": 1,
            "session_enabled_state": "STATE_ENABLED",
            "object_status": {
                "availability_status": "AVAILABILITY_STATUS_BLUE",
                "enabled_status": "ENABLED_STATUS_ENABLED",
                "status_description": "Node address does not have service checking enabled",
            },
        }),
        RULE => json!({
            "description": "",
            "ignore_verification": false,
        }),
        VIRTUAL_SERVER => json!({
            "description": "",
            "default_pool_name": "",
            "enabled_state": "STATE_ENABLED",
            "protocol": "PROTOCOL_TCP",
            "type": "RESOURCE_TYPE_POOL",
        }),
        _ => json!({}),
    };
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn member_defaults() -> Map<String, Value> {
    match json!({
        "description": "",
        "connection_limit": 0,
        "dynamic_ratio": 1,
        "priority": 0,
        "rate_limit": 0,
        "ratio": 1,
        "session_enabled_state": "STATE_ENABLED",
        "object_status": {
            "availability_status": "AVAILABILITY_STATUS_GREEN",
            "enabled_status": "ENABLED_STATUS_ENABLED",
            "status_description": "",
        },
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Render `error_string` the way the device formats faults, then decode it.
fn fault(procedure: &str, error_string: &str) -> Error {
    let (interface, method) = procedure.rsplit_once('.').unwrap_or(("", procedure));
    let namespace = interface.split('.').next().unwrap_or_default();
    let path = interface.replace('.', "/");
    let code: u32 = 0x0102_0036;
    let text = format!(
        "Server raised fault: 'Exception caught in {namespace}::urn:iControl:{path}::{method}()\n\
Exception: Common::OperationFailed\n\
\tprimary_error_code   : {code} (0x{code:08X})\n\
\tsecondary_error_code : 0\n\
\terror_string         : {code:08X}:3: {error_string}'"
    );
    Fault::parse(&text).into()
}

fn not_found(procedure: &str, interface: &str, name: &str) -> Error {
    fault(
        procedure,
        &format!(
            "The requested {} ({name}) was not found.",
            object_kind(interface)
        ),
    )
}

fn member_not_found(procedure: &str, pool: &str, address: &str, port: u16) -> Error {
    fault(
        procedure,
        &format!("The requested pool member ({pool} {address} {port}) was not found."),
    )
}
