//! Shared plumbing for resource proxies.
//!
//! A proxy is a [`Record`] of cached attributes plus an optional [`Binding`] to a
//! connection. Unbound proxies are plain local records; remote operations on
//! them fail with [`Error::Unbound`].

use std::fmt;
use std::sync::Arc;

use bigip_session::{
    Connection, Error, IdentityCache, ResourceKey, ResourceKind, Result, wire,
    with_writable_folder,
};
use parking_lot::RwLock;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::constants::AVAILABILITY_STATUS_PREFIX;
use crate::lb::{Lb, Registry};
use crate::pool_member::MemberId;

/// Operations every resource proxy supports.
pub trait Resource: Send + Sync + Sized + 'static {
    const KIND: ResourceKind;

    /// Cache key of the proxy in its current identity.
    fn key(&self) -> ResourceKey;

    fn is_bound(&self) -> bool;

    /// Whether the resource exists on the device.
    fn exists(&self) -> Result<bool>;

    /// Reload every cached attribute from the device.
    fn refresh(&self) -> Result<()>;

    /// Push staged attributes to the device, creating the resource if needed.
    fn save(&self) -> Result<()>;

    /// Delete the resource on the device and evict it from the cache.
    fn delete(&self) -> Result<()>;

    #[doc(hidden)]
    fn cache(registry: &Registry) -> &IdentityCache<Self>;
}

/// Resources that can be rebuilt from their serialized form.
///
/// A document is what serializing the proxy produces: its identity fields plus
/// the attributes, flattened into one object.
pub trait Import: Resource {
    /// Canonical proxy for the document's identity, with the document's
    /// attributes staged. No remote call.
    #[doc(hidden)]
    fn import(lb: &Lb, document: Value) -> Result<Arc<Self>>;
}

/// Document of a named resource.
#[derive(Debug, Deserialize)]
pub(crate) struct Named<A> {
    pub(crate) name: String,
    #[serde(flatten)]
    pub(crate) attrs: A,
}

/// Connection and cache registry a bound proxy talks through.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) conn: Arc<Connection>,
    pub(crate) registry: Arc<Registry>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("host", &self.conn.host())
            .finish_non_exhaustive()
    }
}

impl Binding {
    pub(crate) fn host(&self) -> &str {
        self.conn.host()
    }

    /// One attribute of one named object.
    pub(crate) fn get(&self, kind: ResourceKind, procedure: &str, name: &str) -> Result<Value> {
        let value = self
            .conn
            .call(procedure, &[json!([name])])
            .map_err(|e| e.into_not_found(kind, name))?;
        wire::first(&value, procedure).cloned()
    }

    pub(crate) fn get_string(
        &self,
        kind: ResourceKind,
        procedure: &str,
        name: &str,
    ) -> Result<String> {
        wire::as_string(&self.get(kind, procedure, name)?, procedure)
    }

    pub(crate) fn get_u32(&self, kind: ResourceKind, procedure: &str, name: &str) -> Result<u32> {
        wire::as_u32(&self.get(kind, procedure, name)?, procedure)
    }

    pub(crate) fn get_enabled(
        &self,
        kind: ResourceKind,
        procedure: &str,
        name: &str,
    ) -> Result<bool> {
        wire::parse_enabled_state(&self.get(kind, procedure, name)?, procedure)
    }

    /// One attribute of many named objects, in order.
    pub(crate) fn get_many(&self, procedure: &str, names: &[String]) -> Result<Vec<Value>> {
        let value = self.conn.call(procedure, &[json!(names)])?;
        Ok(wire::exact(&value, names.len(), procedure)?.to_vec())
    }

    /// Write one attribute of one named object from a writable folder.
    pub(crate) fn set(
        &self,
        kind: ResourceKind,
        procedure: &str,
        name: &str,
        value: Value,
    ) -> Result<()> {
        with_writable_folder(&self.conn, |conn| {
            conn.call(procedure, &[json!([name]), json!([value])])
                .map(|_| ())
                .map_err(|e| e.into_not_found(kind, name))
        })
    }

    /// One attribute of one pool member.
    pub(crate) fn get_member(&self, procedure: &str, member: &MemberId) -> Result<Value> {
        let value = self
            .conn
            .call(
                procedure,
                &[json!([member.pool]), json!([[member.to_wire()]])],
            )
            .map_err(|e| e.into_not_found(ResourceKind::PoolMember, member.to_string()))?;
        wire::first(wire::first(&value, procedure)?, procedure).cloned()
    }

    pub(crate) fn set_member(
        &self,
        procedure: &str,
        member: &MemberId,
        value: Value,
    ) -> Result<()> {
        with_writable_folder(&self.conn, |conn| {
            conn.call(
                procedure,
                &[
                    json!([member.pool]),
                    json!([[member.to_wire()]]),
                    json!([[value]]),
                ],
            )
            .map(|_| ())
            .map_err(|e| e.into_not_found(ResourceKind::PoolMember, member.to_string()))
        })
    }
}

/// Cached attributes plus an optional binding.
pub(crate) struct Record<A> {
    binding: Option<Binding>,
    attrs: RwLock<A>,
}

impl<A: fmt::Debug> fmt::Debug for Record<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("binding", &self.binding)
            .field("attrs", &*self.attrs.read())
            .finish()
    }
}

impl<A: Clone> Record<A> {
    pub(crate) fn new(binding: Option<Binding>, attrs: A) -> Self {
        Self {
            binding,
            attrs: RwLock::new(attrs),
        }
    }

    pub(crate) const fn binding_opt(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub(crate) fn binding(&self, kind: ResourceKind) -> Result<&Binding> {
        self.binding.as_ref().ok_or(Error::Unbound { kind })
    }

    pub(crate) fn endpoint(&self) -> Option<&str> {
        self.binding.as_ref().map(Binding::host)
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.attrs.read())
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.attrs.write())
    }

    pub(crate) fn snapshot(&self) -> A {
        self.attrs.read().clone()
    }

    /// When bound, fetch a value and store it. Unbound records keep their value.
    pub(crate) fn pull<T>(
        &self,
        fetch: impl FnOnce(&Binding) -> Result<T>,
        store: impl FnOnce(&mut A, T),
    ) -> Result<()> {
        if let Some(binding) = &self.binding {
            let value = fetch(binding)?;
            store(&mut self.attrs.write(), value);
        }
        Ok(())
    }

    /// When bound, send a value to the device first; store it locally on success.
    pub(crate) fn push<T>(
        &self,
        value: T,
        send: impl FnOnce(&Binding, &T) -> Result<()>,
        store: impl FnOnce(&mut A, T),
    ) -> Result<()> {
        if let Some(binding) = &self.binding {
            send(binding, &value)?;
        }
        store(&mut self.attrs.write(), value);
        Ok(())
    }
}

/// Optional name filter for bulk reads.
///
/// The pattern is a regular expression anchored at the start. A name matches if
/// either its full path or its last path component matches.
#[derive(Debug, Default)]
pub(crate) struct NameFilter(Option<Regex>);

impl NameFilter {
    pub(crate) fn new(pattern: Option<&str>) -> Result<Self> {
        let regex = pattern
            .map(|p| Regex::new(&format!("^(?:{p})")))
            .transpose()?;
        Ok(Self(regex))
    }

    pub(crate) fn matches(&self, path: &str) -> bool {
        self.0
            .as_ref()
            .is_none_or(|re| re.is_match(path) || re.is_match(basename(path)))
    }
}

/// Last component of a folder path.
pub(crate) fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Qualify a relative name with `folder`.
pub(crate) fn full_path(folder: &str, name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("{}/{name}", folder.trim_end_matches('/'))
    }
}

/// `(availability, description)` from an `ObjectStatus` value, availability munged.
pub(crate) fn decode_object_status(value: &Value) -> Result<(String, String)> {
    let availability = wire::as_string(&value["availability_status"], "availability_status")?;
    let description = wire::as_string(&value["status_description"], "status_description")?;
    Ok((munge(&availability, AVAILABILITY_STATUS_PREFIX), description))
}

/// Strip `prefix` and lowercase, e.g. `LB_METHOD_ROUND_ROBIN` to `round_robin`.
pub(crate) fn munge(value: &str, prefix: &str) -> String {
    value.strip_prefix(prefix).unwrap_or(value).to_lowercase()
}

/// Inverse of [`munge`].
pub(crate) fn unmunge(value: &str, prefix: &str) -> String {
    format!("{prefix}{}", value.to_uppercase())
}
