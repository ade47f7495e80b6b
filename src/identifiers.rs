//! Global cross-document identifier table.
//!
//! Maps `(schema document URI, element id)` to `(target namespace, local
//! name)`. Populated by the schema processor from element declarations,
//! consumed by the linkbase resolver to turn locator hrefs into concept
//! names.

use std::collections::HashMap;

use crate::uri::{expand_relative, is_http_url};

#[derive(Debug, Default)]
pub struct IdentifierTable {
    map: HashMap<String, (String, String)>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `doc_uri#id -> (namespace, name)`. Last write wins.
    pub fn insert(&mut self, doc_uri: &str, id: &str, namespace: &str, name: &str) {
        let key = format!("{doc_uri}#{id}");
        self.map
            .insert(key, (namespace.to_string(), name.to_string()));
    }

    /// Resolve a locator href (URI plus `#id` fragment). Relative references
    /// are expanded against the linkbase's own URI first.
    pub fn resolve(&self, href: &str, base: &str) -> Option<(&str, &str)> {
        let key = if !href.starts_with('/') && !is_http_url(href) {
            expand_relative(href, base)
        } else {
            href.to_string()
        };
        self.map.get(&key).map(|(ns, name)| (ns.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
