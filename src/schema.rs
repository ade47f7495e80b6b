//! Schema document processor.
//!
//! Walks one parsed schema: extracts concept declarations into the output
//! stream, registers element ids in the identifier table, and discovers the
//! schemas and linkbases the document pulls in.

use roxmltree::Node;
use tracing::{debug, warn};

use crate::dts::{DocumentKind, DtsQueue};
use crate::error::Result;
use crate::registry::register_namespaces;
use crate::run::RunContext;
use crate::uri::is_http_url;
use crate::vocab::{is_skip_namespace, ns};

pub fn process_schema(
    root: Node,
    base: &str,
    origin_ns: Option<&str>,
    stream: &str,
    queue: &mut DtsQueue,
    ctx: &mut RunContext,
) -> Result<()> {
    let target_ns = root.attribute("targetNamespace").or(origin_ns);

    // Core framework schemas carry no business concepts and would emit
    // misleading triples if processed for elements.
    if let Some(tns) = target_ns {
        if is_skip_namespace(tns) {
            debug!(base, "infrastructure schema, skipping");
            return Ok(());
        }
    }

    debug!(base, "processing schema");
    register_namespaces(root, &mut ctx.registry);

    process_elements(root, base, target_ns, stream, ctx);
    process_linkbase_refs(root, base, target_ns, queue);
    process_imports(root, base, queue);

    Ok(())
}

/// Walk top-level element declarations: emit a concept block for every
/// declaration carrying type/period-type/balance metadata, and map
/// `base#id` to `(targetNamespace, name)` for locator resolution.
fn process_elements(
    root: Node,
    base: &str,
    target_ns: Option<&str>,
    stream: &str,
    ctx: &mut RunContext,
) {
    let Some(tns) = target_ns else {
        warn!(base, "schema has no target namespace, element pass skipped");
        return;
    };
    let prefix = ctx.registry.prefix_for(tns).map(str::to_string);

    for child in root.children().filter(|c| c.is_element()) {
        if child.tag_name().namespace() != Some(ns::XSD) || child.tag_name().name() != "element" {
            continue;
        }
        let Some(name) = child.attribute("name") else {
            warn!(base, "element declaration without a name");
            continue;
        };
        let id = child.attribute("id");
        let el_type = child.attribute("type");
        let period_type = child.attribute((ns::XBRLI, "periodType"));
        let balance = child.attribute("balance");

        if el_type.is_some() || period_type.is_some() || balance.is_some() {
            match &prefix {
                Some(prefix) => {
                    ctx.write(stream, &concept_block(prefix, name, el_type, period_type, balance));
                    ctx.counters.concepts += 1;
                }
                None => {
                    warn!(base, name, "target namespace has no prefix, concept skipped");
                }
            }
        }

        match id {
            // Elements without an id cannot be targeted by a locator; that
            // is permitted, but worth a trace.
            None => debug!(base, name, "element declaration without id"),
            Some(id) => ctx.identifiers.insert(base, id, tns, name),
        }
    }
}

fn concept_block(
    prefix: &str,
    name: &str,
    el_type: Option<&str>,
    period_type: Option<&str>,
    balance: Option<&str>,
) -> String {
    let mut out = format!("{prefix}:{name} \n");
    if let Some(el_type) = el_type {
        let normalized = normalize_type(el_type);
        let sep = if period_type.is_some() || balance.is_some() { ";" } else { "." };
        out.push_str(&format!("    rdf:type {normalized} {sep}\n"));
    }
    if let Some(period_type) = period_type {
        let sep = if balance.is_some() { ";" } else { "." };
        out.push_str(&format!("    xbrli:periodType \"{period_type}\" {sep}\n"));
    }
    if let Some(balance) = balance {
        out.push_str(&format!("    xbrli:balance \"{balance}\".\n"));
    }
    out.push('\n');
    out
}

/// Bare type names get the `xsd:` prefix; the legacy `xs:` prefix seen in
/// some taxonomies is rewritten to `xsd:`.
fn normalize_type(el_type: &str) -> String {
    if !el_type.contains(':') {
        format!("xsd:{el_type}")
    } else if let Some(rest) = el_type.strip_prefix("xs:") {
        format!("xsd:{rest}")
    } else {
        el_type.to_string()
    }
}

/// `link:linkbaseRef` may appear anywhere in the document, not only at the
/// top level. Referenced linkbases are deferrable, so they go to the back of
/// the queue; the schema's target namespace travels along as a hint for
/// relative references.
fn process_linkbase_refs(root: Node, base: &str, target_ns: Option<&str>, queue: &mut DtsQueue) {
    for node in root.descendants().filter(|n| n.is_element()) {
        if node.tag_name().namespace() != Some(ns::LINK) || node.tag_name().name() != "linkbaseRef" {
            continue;
        }
        let Some(href) = node.attribute((ns::XLINK, "href")) else {
            warn!(base, "linkbaseRef without href");
            continue;
        };
        debug!(base, href, "importing linkbase");
        let hint = if is_http_url(href) { None } else { target_ns };
        queue.enqueue_back(DocumentKind::Linkbase, href, base, hint, false);
    }
}

/// `xsd:import`/`xsd:include` children reference schemas the current one
/// depends on; they jump the queue.
fn process_imports(root: Node, base: &str, queue: &mut DtsQueue) {
    for node in root.children().filter(|c| c.is_element()) {
        if node.tag_name().namespace() != Some(ns::XSD) {
            continue;
        }
        let tag = node.tag_name().name();
        if tag != "import" && tag != "include" {
            continue;
        }
        let Some(location) = node.attribute("schemaLocation") else {
            warn!(base, "import without schemaLocation");
            continue;
        };
        let namespace = node.attribute("namespace");
        let hint = if is_http_url(location) { None } else { namespace };
        queue.enqueue_front(DocumentKind::Schema, location, base, hint, false);
    }
}
