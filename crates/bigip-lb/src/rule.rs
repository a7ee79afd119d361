//! iRule proxy.

use std::sync::Arc;

use bigip_session::{
    Connection, Error, IdentityCache, ResourceKey, ResourceKind, Result, wire,
    with_write_transaction,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::rule as proc;
use crate::lb::{Lb, Registry};
use crate::resource::{Binding, Import, Named, Record, Resource, full_path};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAttrs {
    pub definition: Option<String>,
    pub description: Option<String>,
    pub ignore_verification: Option<bool>,
}

#[derive(Debug)]
pub struct Rule {
    name: RwLock<String>,
    record: Record<RuleAttrs>,
}

impl Serialize for Rule {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct View<'a> {
            name: &'a str,
            #[serde(flatten)]
            attrs: &'a RuleAttrs,
        }
        let name = self.name.read();
        self.record.read(|attrs| View { name: &name, attrs }.serialize(serializer))
    }
}

fn as_bool(value: &Value, what: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::unexpected(format!("{what}: expected boolean, got {value}")))
}

fn definition_of(value: &Value) -> Result<String> {
    wire::as_string(&value["rule_definition"], "rule_definition")
}

impl Rule {
    /// Unbound rule record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: RwLock::new(name.into()),
            record: Record::new(None, RuleAttrs::default()),
        }
    }

    pub(crate) fn bound(binding: Binding, name: String) -> Self {
        Self {
            name: RwLock::new(name),
            record: Record::new(Some(binding), RuleAttrs::default()),
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Change the local name and move the cache entry. Nothing changes on the
    /// device until the next save, which creates a rule under the new name.
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

    #[must_use]
    pub fn cached(&self) -> RuleAttrs {
        self.record.snapshot()
    }

    pub fn stage(&self, edit: impl FnOnce(&mut RuleAttrs)) {
        self.record.write(edit);
    }

    /// Rule source text.
    pub fn definition(&self) -> Result<Option<String>> {
        let name = self.name();
        self.record.pull(
            |b| definition_of(&b.get(Self::KIND, proc::QUERY, &name)?),
            |a, v| a.definition = Some(v),
        )?;
        Ok(self.record.read(|a| a.definition.clone()))
    }

    pub fn set_definition(&self, definition: &str) -> Result<()> {
        let name = self.name();
        self.record.push(
            definition.to_string(),
            |b, v| {
                bigip_session::with_writable_folder(&b.conn, |conn| {
                    modify(conn, &name, v).map_err(|e| e.into_not_found(Self::KIND, name.as_str()))
                })
            },
            |a, v| a.definition = Some(v),
        )
    }

    pub fn description(&self) -> Result<Option<String>> {
        let name = self.name();
        self.record.pull(
            |b| b.get_string(Self::KIND, proc::GET_DESCRIPTION, &name),
            |a, v| a.description = Some(v),
        )?;
        Ok(self.record.read(|a| a.description.clone()))
    }

    pub fn set_description(&self, description: &str) -> Result<()> {
        let name = self.name();
        self.record.push(
            description.to_string(),
            |b, v| b.set(Self::KIND, proc::SET_DESCRIPTION, &name, json!(v)),
            |a, v| a.description = Some(v),
        )
    }

    pub fn ignore_verification(&self) -> Result<Option<bool>> {
        let name = self.name();
        self.record.pull(
            |b| {
                as_bool(
                    &b.get(Self::KIND, proc::GET_IGNORE_VERIFICATION, &name)?,
                    "ignore_verification",
                )
            },
            |a, v| a.ignore_verification = Some(v),
        )?;
        Ok(self.record.read(|a| a.ignore_verification))
    }

    pub fn set_ignore_verification(&self, ignore: bool) -> Result<()> {
        let name = self.name();
        self.record.push(
            ignore,
            |b, v| b.set(Self::KIND, proc::SET_IGNORE_VERIFICATION, &name, json!(v)),
            |a, v| a.ignore_verification = Some(v),
        )
    }

    pub(crate) fn load_all(binding: &Binding, rules: &[&Self]) -> Result<()> {
        if rules.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = rules.iter().map(|r| r.name()).collect();

        let definitions = binding.get_many(proc::QUERY, &names)?;
        let descriptions = binding.get_many(proc::GET_DESCRIPTION, &names)?;
        let ignore = binding.get_many(proc::GET_IGNORE_VERIFICATION, &names)?;

        for (i, rule) in rules.iter().enumerate() {
            let attrs = RuleAttrs {
                definition: Some(definition_of(&definitions[i])?),
                description: Some(wire::as_string(&descriptions[i], "description")?),
                ignore_verification: Some(as_bool(&ignore[i], "ignore_verification")?),
            };
            rule.record.write(|cached| *cached = attrs);
        }
        Ok(())
    }
}

fn modify(conn: &Connection, name: &str, definition: &str) -> Result<()> {
    conn.call(
        proc::MODIFY,
        &[json!([{ "rule_name": name, "rule_definition": definition }])],
    )
    .map(|_| ())
}

impl Resource for Rule {
    const KIND: ResourceKind = ResourceKind::Rule;

    fn key(&self) -> ResourceKey {
        ResourceKey::named(self.record.endpoint(), Self::KIND, &self.name.read())
    }

    fn is_bound(&self) -> bool {
        self.record.binding_opt().is_some()
    }

    fn exists(&self) -> Result<bool> {
        let binding = self.record.binding(Self::KIND)?;
        match binding.get(Self::KIND, proc::QUERY, &self.name()) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn refresh(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        Self::load_all(binding, &[self]).map_err(|e| e.into_not_found(Self::KIND, self.name()))
    }

    /// Create the rule when missing (a definition is required), otherwise
    /// modify its definition; then push the other staged attributes.
    fn save(&self) -> Result<()> {
        let binding = self.record.binding(Self::KIND)?;
        let name = self.name();
        let attrs = self.cached();
        with_write_transaction(&binding.conn, |conn| {
            if self.exists()? {
                if let Some(definition) = &attrs.definition {
                    modify(conn, &name, definition)?;
                }
            } else {
                let definition = attrs.definition.as_deref().ok_or(Error::Incomplete {
                    kind: Self::KIND,
                    field: "definition",
                })?;
                tracing::debug!(rule = %name, "Creating rule");
                conn.call(
                    proc::CREATE,
                    &[json!([{ "rule_name": name, "rule_definition": definition }])],
                )?;
            }
            if let Some(description) = &attrs.description {
                conn.call(proc::SET_DESCRIPTION, &[json!([name]), json!([description])])?;
            }
            if let Some(ignore) = attrs.ignore_verification {
                conn.call(
                    proc::SET_IGNORE_VERIFICATION,
                    &[json!([name]), json!([ignore])],
                )?;
            }
            Ok(())
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
        registry.rules()
    }
}

impl Import for Rule {
    fn import(lb: &Lb, document: Value) -> Result<Arc<Self>> {
        let Named { name, attrs } = serde_json::from_value::<Named<RuleAttrs>>(document)?;
        let proxy = lb.rule(&name);
        proxy.stage(|cached| *cached = attrs);
        Ok(proxy)
    }
}
