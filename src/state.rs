//! Applied declarative state.
//!
//! After an apply step the engine reports every managed resource with its
//! computed id and attribute values. [`State`] keeps them keyed by address
//! (`<type>.<name>`) with attributes flattened to strings, the shape
//! attribute checks compare against.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One resource as recorded in state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceState {
    pub resource_type: String,
    pub name: String,
    pub id: String,
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the id; it is mirrored into the `id` attribute.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self.attributes.insert("id".to_string(), self.id.clone());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// The resource's id, or `None` when it is empty.
    pub fn primary_id(&self) -> Option<&str> {
        Some(self.id.as_str()).filter(|id| !id.is_empty())
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Root-module state after an apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    pub resources: BTreeMap<String, ResourceState>,
}

#[derive(Deserialize)]
struct ShowOutput {
    #[serde(default)]
    values: Option<ShowValues>,
}

#[derive(Deserialize)]
struct ShowValues {
    root_module: ShowModule,
}

#[derive(Deserialize)]
struct ShowModule {
    #[serde(default)]
    resources: Vec<ShowResource>,
}

#[derive(Deserialize)]
struct ShowResource {
    address: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    values: serde_json::Map<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: ResourceState) {
        self.resources.insert(resource.address(), resource);
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        self.resources.remove(address)
    }

    /// Look up a resource by `<type>.<name>` address.
    pub fn resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Decode the output of `terraform show -json`.
    ///
    /// An empty state (no `values` key) decodes to an empty [`State`].
    pub fn from_show_json(json: &str) -> Result<Self, serde_json::Error> {
        let output: ShowOutput = serde_json::from_str(json)?;
        let mut state = State::new();

        let Some(values) = output.values else {
            return Ok(state);
        };

        for resource in values.root_module.resources {
            let mut attributes = BTreeMap::new();
            for (key, value) in &resource.values {
                flatten(key, value, &mut attributes);
            }
            let id = attributes.get("id").cloned().unwrap_or_default();

            state.resources.insert(
                resource.address,
                ResourceState {
                    resource_type: resource.resource_type,
                    name: resource.name,
                    id,
                    attributes,
                },
            );
        }

        Ok(state)
    }
}

/// Flatten a JSON value into dotted keys. Lists record their length under
/// `<key>.#` and maps under `<key>.%`; nulls are omitted.
fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Array(items) => {
            out.insert(format!("{}.#", prefix), items.len().to_string());
            for (index, item) in items.iter().enumerate() {
                flatten(&format!("{}.{}", prefix, index), item, out);
            }
        }
        Value::Object(map) => {
            out.insert(format!("{}.%", prefix), map.len().to_string());
            for (key, item) in map {
                flatten(&format!("{}.{}", prefix, key), item, out);
            }
        }
    }
}
