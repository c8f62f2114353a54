//! In-memory catalog document.
//!
//! The document is kept as a `serde_json::Value` so that label edits can be
//! written back without losing fields the graph does not model. All readers
//! are lenient: a field with the wrong shape reads as absent.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::{DocumentError, EditError};
use crate::ir::{NodeStatus, domain_node_id};

const DEFAULT_RELATION: &str = "related_to";

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDocument {
    root: Value,
}

/// A domain entry with its synthesized id resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEntry {
    pub index: usize,
    pub id: String,
    pub node_id: String,
    pub label: String,
    pub status: NodeStatus,
    pub features: Vec<FeatureEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEntry {
    pub index: usize,
    pub id: String,
    pub label: String,
    pub status: NodeStatus,
}

/// Index path of the entry that backs a domain or feature node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLocation {
    Domain(usize),
    Feature { domain: usize, feature: usize },
}

impl EntryLocation {
    fn domain_index(self) -> usize {
        match self {
            EntryLocation::Domain(index) => index,
            EntryLocation::Feature { domain, .. } => domain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipEntry {
    pub from: String,
    pub to: String,
    pub relation: String,
}

impl CatalogDocument {
    pub fn from_value(root: Value) -> Result<Self, DocumentError> {
        if !root.is_object() {
            return Err(DocumentError::NotAnObject(value_kind(&root)));
        }
        Ok(Self { root })
    }

    /// Parses JSON or JSON5 text.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let value = json5::from_str::<Value>(text)?;
        Self::from_value(value)
    }

    pub fn value(&self) -> &Value {
        &self.root
    }

    pub fn to_pretty_json(&self) -> String {
        // Serializing a Value cannot fail: keys are always strings.
        serde_json::to_string_pretty(&self.root).unwrap_or_default()
    }

    /// Resolves domain and feature ids the same way graph construction does.
    ///
    /// Positional fallbacks (`domain_<n>`, `feature_<n>`) use the number of
    /// distinct nodes created so far, so the walk tracks which ids exist.
    pub fn entries(&self) -> Vec<DomainEntry> {
        let mut created: HashSet<String> = HashSet::new();
        let mut domains = Vec::new();

        for (index, domain) in array_field(&self.root, "domains").iter().enumerate() {
            let id = truthy_string(domain.get("id"))
                .or_else(|| truthy_string(domain.get("label")))
                .unwrap_or_else(|| format!("domain_{}", created.len()));
            let label = truthy_string(domain.get("label")).unwrap_or_else(|| id.clone());
            let node_id = domain_node_id(&id);
            created.insert(node_id.clone());

            let mut features = Vec::new();
            for (feature_index, feature) in array_field(domain, "features").iter().enumerate() {
                let feature_id = truthy_string(feature.get("id"))
                    .or_else(|| truthy_string(feature.get("label")))
                    .unwrap_or_else(|| format!("feature_{}", created.len()));
                let feature_label =
                    truthy_string(feature.get("label")).unwrap_or_else(|| feature_id.clone());
                created.insert(feature_id.clone());
                features.push(FeatureEntry {
                    index: feature_index,
                    id: feature_id,
                    label: feature_label,
                    status: status_field(feature),
                });
            }

            domains.push(DomainEntry {
                index,
                id,
                node_id,
                label,
                status: status_field(domain),
                features,
            });
        }
        domains
    }

    /// Relationships with both endpoints present; incomplete tuples are skipped.
    pub fn relationships(&self) -> Vec<RelationshipEntry> {
        array_field(&self.root, "relationships")
            .iter()
            .filter_map(|rel| {
                let from = truthy_string(rel.get("from"))?;
                let to = truthy_string(rel.get("to"))?;
                let relation =
                    truthy_string(rel.get("type")).unwrap_or_else(|| DEFAULT_RELATION.to_string());
                Some(RelationshipEntry { from, to, relation })
            })
            .collect()
    }

    /// Maps every domain and feature node id to the entry it was built from.
    ///
    /// The first entry resolving to an id wins, matching graph construction.
    /// Locations are index paths, so they stay valid after label edits change
    /// the ids a fresh walk would derive.
    pub fn entry_locations(&self) -> HashMap<String, EntryLocation> {
        let mut locations = HashMap::new();
        for domain in self.entries() {
            let index = domain.index;
            locations
                .entry(domain.node_id)
                .or_insert(EntryLocation::Domain(index));
            for feature in domain.features {
                locations
                    .entry(feature.id)
                    .or_insert(EntryLocation::Feature {
                        domain: index,
                        feature: feature.index,
                    });
            }
        }
        locations
    }

    /// Writes `label` into the entry at `location`; `node_id` names it in errors.
    pub fn set_label(
        &mut self,
        location: EntryLocation,
        node_id: &str,
        label: &str,
    ) -> Result<(), EditError> {
        let domain = self
            .root
            .get_mut("domains")
            .and_then(|domains| domains.get_mut(location.domain_index()));
        let entry = match location {
            EntryLocation::Domain(_) => domain,
            EntryLocation::Feature { feature, .. } => domain
                .and_then(|domain| domain.get_mut("features"))
                .and_then(|features| features.get_mut(feature)),
        };
        write_label(entry, node_id, label)
    }
}

fn write_label(entry: Option<&mut Value>, id: &str, label: &str) -> Result<(), EditError> {
    match entry.and_then(Value::as_object_mut) {
        Some(object) => {
            object.insert("label".to_string(), Value::String(label.to_string()));
            Ok(())
        }
        None => Err(EditError::UnresolvedLabelTarget(id.to_string())),
    }
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn status_field(value: &Value) -> NodeStatus {
    truthy_string(value.get("status"))
        .map(|status| NodeStatus::from_token(&status))
        .unwrap_or_default()
}

/// Reads a scalar as a non-empty string; empty strings, zero, `false`,
/// `null` and containers read as absent.
fn truthy_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => {
            let zero = number.as_f64().map(|v| v == 0.0).unwrap_or(false);
            (!zero).then(|| number.to_string())
        }
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object_roots() {
        assert!(matches!(
            CatalogDocument::from_value(json!([1, 2])),
            Err(DocumentError::NotAnObject("array"))
        ));
        assert!(CatalogDocument::parse("{ domains: [], }").is_ok());
    }

    #[test]
    fn ids_fall_back_to_label_then_position() {
        let doc = CatalogDocument::from_value(json!({
            "domains": [
                { "label": "Billing", "features": [{ "label": "Invoices" }, {}] },
                { "features": [{ "id": 42 }] }
            ]
        }))
        .unwrap();
        let entries = doc.entries();
        assert_eq!(entries[0].id, "Billing");
        assert_eq!(entries[0].node_id, "domain__Billing");
        assert_eq!(entries[0].features[0].id, "Invoices");
        // Two nodes exist when the unnamed feature is reached.
        assert_eq!(entries[0].features[1].id, "feature_2");
        assert_eq!(entries[1].id, "domain_3");
        assert_eq!(entries[1].features[0].id, "42");
        assert_eq!(entries[1].features[0].label, "42");
    }

    #[test]
    fn malformed_fields_read_as_absent() {
        let doc = CatalogDocument::from_value(json!({
            "domains": { "not": "a list" },
            "relationships": [
                { "from": "a" },
                { "from": "", "to": "b" },
                { "from": "a", "to": "b", "type": ["x"] },
                "garbage"
            ]
        }))
        .unwrap();
        assert!(doc.entries().is_empty());
        let rels = doc.relationships();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relation, "related_to");
    }

    #[test]
    fn label_write_back_preserves_other_fields() {
        let mut doc = CatalogDocument::from_value(json!({
            "domains": [
                { "id": "auth", "owner": "team-a", "features": [{ "id": "login", "label": "Login", "tags": ["x"] }] }
            ]
        }))
        .unwrap();
        let locations = doc.entry_locations();
        doc.set_label(locations["login"], "login", "Sign in").unwrap();
        doc.set_label(locations["domain__auth"], "domain__auth", "Authentication")
            .unwrap();
        let value = doc.value();
        assert_eq!(value["domains"][0]["label"], "Authentication");
        assert_eq!(value["domains"][0]["owner"], "team-a");
        assert_eq!(value["domains"][0]["features"][0]["label"], "Sign in");
        assert_eq!(value["domains"][0]["features"][0]["tags"], json!(["x"]));
    }

    #[test]
    fn first_entry_owns_a_shared_id() {
        let doc = CatalogDocument::from_value(json!({
            "domains": [
                { "id": "a", "features": [{ "id": "x" }] },
                { "label": "b", "features": [{ "label": "x" }, { "label": "domain__a" }] }
            ]
        }))
        .unwrap();
        let locations = doc.entry_locations();
        assert_eq!(locations["x"], EntryLocation::Feature { domain: 0, feature: 0 });
        assert_eq!(locations["domain__a"], EntryLocation::Domain(0));
        assert_eq!(locations["domain__b"], EntryLocation::Domain(1));
        assert_eq!(locations.len(), 3);
    }

    #[test]
    fn non_object_entries_are_reported() {
        let mut doc = CatalogDocument::from_value(json!({ "domains": ["oops"] })).unwrap();
        let location = doc.entry_locations()["domain__domain_0"];
        assert_eq!(
            doc.set_label(location, "domain__domain_0", "x"),
            Err(EditError::UnresolvedLabelTarget("domain__domain_0".to_string()))
        );
    }
}
