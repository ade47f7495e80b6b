//! Namespace and role prefix registry.
//!
//! One registry lives for a whole run. Every component that meets a new
//! namespace or role/arcrole URI registers it here, and the final `@prefix`
//! header is rendered from it in registration order.

use std::collections::HashMap;

use tracing::warn;

use crate::run::Counters;
use crate::vocab::BUILTIN_PREFIXES;

/// Bidirectional URI <-> prefix mapping with stable registration order.
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    entries: Vec<(String, String)>,
    by_uri: HashMap<String, usize>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the fixed XBRL prefix table.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        for (prefix, uri) in BUILTIN_PREFIXES {
            reg.add(prefix, uri);
        }
        reg
    }

    /// Bind `prefix` to `uri`. Re-adding the same pair is a no-op. A URI
    /// already bound to a different prefix keeps its original prefix; the
    /// attempt is logged and `false` returned.
    pub fn add(&mut self, prefix: &str, uri: &str) -> bool {
        if let Some(&idx) = self.by_uri.get(uri) {
            if self.entries[idx].1 != prefix {
                warn!(uri, old = %self.entries[idx].1, new = prefix, "prefix rebinding rejected");
                return false;
            }
            return true;
        }
        self.by_uri.insert(uri.to_string(), self.entries.len());
        self.entries.push((uri.to_string(), prefix.to_string()));
        true
    }

    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(|&i| self.entries[i].1.as_str())
    }

    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, p)| p == prefix)
            .map(|(u, _)| u.as_str())
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.uri_for(prefix).is_some()
    }

    /// Render the `@prefix` header. URIs get a `#` suffix unless they already
    /// end in one.
    pub fn prefix_block(&self) -> String {
        let mut out = String::new();
        for (uri, prefix) in &self.entries {
            if uri.ends_with('#') {
                out.push_str(&format!("@prefix {prefix}: <{uri}>.\n"));
            } else {
                out.push_str(&format!("@prefix {prefix}: <{uri}#>.\n"));
            }
        }
        out
    }

    /// Shorten a role or arcrole URI to `prefix:name`, registering a fresh
    /// gensymmed prefix (`role<N>` / `arcrole<N>`) for an unseen base.
    pub fn short_role_name(&mut self, role: &str, is_arc: bool, counters: &mut Counters) -> String {
        let (base, name) = split_role(role);
        let prefix = match self.prefix_for(&base) {
            Some(p) => p.to_string(),
            None => {
                let p = gen_role_prefix(is_arc, counters);
                self.add(&p, &base);
                p
            }
        };
        format!("{prefix}:{name}")
    }

    /// Register the base of a role/arcrole URI without producing a name.
    /// Used for `roleURI`/`arcroleURI` declarations on simple links.
    pub fn declare_role(&mut self, role: &str, is_arc: bool, counters: &mut Counters) {
        let (base, _) = split_role(role);
        if self.prefix_for(&base).is_none() {
            let p = gen_role_prefix(is_arc, counters);
            self.add(&p, &base);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Register every namespace declared on a document's root element, skipping
/// the infrastructure namespaces and unnamed (default) declarations.
pub fn register_namespaces(root: roxmltree::Node, registry: &mut NamespaceRegistry) {
    for decl in root.namespaces() {
        let Some(prefix) = decl.name() else { continue };
        if !crate::vocab::is_skip_namespace(decl.uri()) {
            registry.add(prefix, decl.uri());
        }
    }
}

/// Split a role URI into its base path and final segment at the last `/`.
pub fn split_role(role: &str) -> (String, String) {
    match role.rsplit_once('/') {
        Some((base, name)) => (base.to_string(), name.to_string()),
        None => (String::new(), role.to_string()),
    }
}

fn gen_role_prefix(is_arc: bool, counters: &mut Counters) -> String {
    if is_arc {
        format!("arcrole{}", counters.next_arcrole())
    } else {
        format!("role{}", counters.next_role())
    }
}
