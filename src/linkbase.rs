//! Linkbase / XLink resolver.
//!
//! Works in two phases. Phase one scans a linkbase for locator targets whose
//! schemas have not been processed yet; if any are missing the linkbase is
//! deferred (re-queued behind the schemas it needs) so the identifier table
//! is fully populated before any arc is resolved. Phase two builds each
//! extended link's locator/arc graph and translates every arc into
//! relationship triples by label cross product.

use std::collections::HashMap;

use roxmltree::Node;
use tracing::{debug, warn};

use crate::dts::{DocumentKind, DtsQueue, MAX_DEFERRALS};
use crate::error::Result;
use crate::output::{self, PropKind};
use crate::run::RunContext;
use crate::uri::{expand_relative, is_http_url, synthetic_label};
use crate::vocab::ns;

/// A locator or resource node, indexed by its XLink label.
struct LabeledNode<'a, 'input> {
    label: String,
    href: Option<String>,
    role: Option<String>,
    lang: Option<String>,
    /// Present for resource nodes: the element itself, kept for inline
    /// content embedding.
    resource: Option<Node<'a, 'input>>,
}

/// An arc with its known attributes; anything outside the allow-list is
/// logged and dropped at build time.
struct Arc {
    from: String,
    to: String,
    arcrole: String,
    order: Option<String>,
    use_: Option<String>,
    priority: Option<String>,
    weight: Option<String>,
    name: Option<String>,
    cover: Option<String>,
    complement: Option<String>,
    axis: Option<String>,
    context_element: Option<String>,
    closed: Option<String>,
    target_role: Option<String>,
    usable: Option<String>,
}

const KNOWN_XLINK_ATTRS: &[&str] = &["from", "to", "arcrole", "title", "type"];
const KNOWN_XBRLDT_ATTRS: &[&str] = &["contextElement", "closed", "targetRole", "usable"];
const KNOWN_PLAIN_ATTRS: &[&str] = &[
    "order", "use", "priority", "weight", "name", "cover", "complement", "axis",
];

pub fn process_linkbase(
    root: Node,
    base: &str,
    origin_ns: Option<&str>,
    stream: &str,
    queue: &mut DtsQueue,
    ctx: &mut RunContext,
) -> Result<()> {
    debug!(base, "checking linkbase");

    let mut missing = 0u32;
    for node in root.children().filter(|n| n.is_element()) {
        match node.attribute((ns::XLINK, "type")) {
            Some("extended") => missing += check_extended_link(node, base, origin_ns, queue),
            Some("simple") => missing += check_simple_link(node, base, origin_ns, queue),
            _ => {}
        }
    }

    if missing > 0 {
        let deferrals = queue.note_deferral(base);
        if deferrals <= MAX_DEFERRALS {
            debug!(base, missing, "missing schemas, deferring linkbase");
            queue.enqueue_back(DocumentKind::Linkbase, base, "", origin_ns, true);
            return Ok(());
        }
        // A dependency that never arrives must not stall the run; resolve
        // with synthetic fallbacks for whatever is still unresolved.
        warn!(base, "deferral limit reached, resolving with unresolved locators");
        ctx.counters.errors += 1;
    }
    queue.clear_deferrals(base);

    debug!(base, "processing linkbase");
    for node in root.children().filter(|n| n.is_element()) {
        match node.attribute((ns::XLINK, "type")) {
            Some("extended") => process_extended_link(node, base, stream, ctx),
            Some("simple") => process_simple_link(node, ctx),
            _ => {}
        }
    }
    Ok(())
}

/// Count the locators of one extended link whose target documents have not
/// been processed; queue each missing schema ahead of everything else.
fn check_extended_link(
    element: Node,
    base: &str,
    origin_ns: Option<&str>,
    queue: &mut DtsQueue,
) -> u32 {
    let mut missing = 0;
    for node in element.children().filter(|n| n.is_element()) {
        if node.attribute((ns::XLINK, "type")) != Some("locator") {
            continue;
        }
        let Some(href) = node.attribute((ns::XLINK, "href")) else {
            continue;
        };
        missing += check_locator_target(href, base, origin_ns, queue);
    }
    missing
}

/// Simple links carry their href on the link node itself.
fn check_simple_link(node: Node, base: &str, origin_ns: Option<&str>, queue: &mut DtsQueue) -> u32 {
    match node.attribute((ns::XLINK, "href")) {
        Some(href) => check_locator_target(href, base, origin_ns, queue),
        None => 0,
    }
}

fn check_locator_target(
    href: &str,
    base: &str,
    origin_ns: Option<&str>,
    queue: &mut DtsQueue,
) -> u32 {
    // The fragment names an element inside the target; only the document
    // itself needs loading. A bare-fragment href points into this linkbase.
    let target = href.split('#').next().unwrap_or(href);
    if target.is_empty() {
        return 0;
    }
    let uri = expand_relative(target, base);
    if queue.is_processed(&uri) {
        return 0;
    }
    debug!(%uri, "locator target not yet loaded");
    let hint = if is_http_url(href) { None } else { origin_ns };
    // Already expanded; an empty base keeps the URI as-is.
    queue.enqueue_front(DocumentKind::Schema, &uri, "", hint, false);
    1
}

/// Build one extended link's locator/arc graph and translate every arc into
/// relationship triples. Also entered directly for instance footnote links.
pub(crate) fn process_extended_link(element: Node, base: &str, stream: &str, ctx: &mut RunContext) {
    ctx.counters.xlinks += 1;

    let mut nodes: Vec<LabeledNode> = Vec::new();
    let mut arcs: Vec<Arc> = Vec::new();

    for node in element.children().filter(|n| n.is_element()) {
        match node.attribute((ns::XLINK, "type")) {
            Some("locator") => {
                ctx.counters.locators += 1;
                if let Some(labeled) = labeled_node(node, None) {
                    nodes.push(labeled);
                }
            }
            Some("resource") => {
                ctx.counters.resources += 1;
                if let Some(labeled) = labeled_node(node, Some(node)) {
                    nodes.push(labeled);
                }
            }
            Some("arc") => {
                ctx.counters.arcs += 1;
                if let Some(arc) = build_arc(node) {
                    arcs.push(arc);
                }
            }
            other => {
                warn!(node_type = ?other, "unknown type found in xlink");
            }
        }
    }

    // Duplicate labels accumulate; an arc endpoint label may fan out to
    // several nodes and each pairing produces its own triple.
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.label.as_str()).or_default().push(i);
    }

    let link_role = element.attribute((ns::XLINK, "role"));
    let mut header = String::from("# XLINKS\n");
    header.push_str(&format!("# localname: {}\n", element.tag_name().name()));
    header.push_str(&format!("# role: {}\n", link_role.unwrap_or("")));
    header.push_str(&format!("# base: {base}\n\n"));
    ctx.write(stream, &header);

    // footnoteLink carries a fixed, uninformative role; suppress it.
    let node_role = match link_role {
        Some(role) if element.tag_name().name() != "footnoteLink" => {
            Some(ctx.registry.short_role_name(role, false, &mut ctx.counters))
        }
        _ => None,
    };

    for arc in &arcs {
        let (Some(from_nodes), Some(to_nodes)) =
            (index.get(arc.from.as_str()), index.get(arc.to.as_str()))
        else {
            warn!(from = %arc.from, to = %arc.to, "arc label matches no locator");
            continue;
        };
        let predicate = ctx
            .registry
            .short_role_name(&arc.arcrole, true, &mut ctx.counters);
        for &fi in from_nodes {
            for &ti in to_nodes {
                let block =
                    relationship_block(&nodes[fi], &nodes[ti], arc, node_role.as_deref(), &predicate, base, ctx);
                ctx.write(stream, &block);
            }
        }
    }
}

fn labeled_node<'a, 'input>(
    node: Node<'a, 'input>,
    resource: Option<Node<'a, 'input>>,
) -> Option<LabeledNode<'a, 'input>> {
    let Some(label) = node.attribute((ns::XLINK, "label")) else {
        warn!("locator without label");
        return None;
    };
    Some(LabeledNode {
        label: label.to_string(),
        href: node.attribute((ns::XLINK, "href")).map(str::to_string),
        role: node.attribute((ns::XLINK, "role")).map(str::to_string),
        lang: node.attribute((ns::XML, "lang")).map(str::to_string),
        resource,
    })
}

fn build_arc(node: Node) -> Option<Arc> {
    for attr in node.attributes() {
        let known = match attr.namespace() {
            Some(ns::XLINK) => KNOWN_XLINK_ATTRS.contains(&attr.name()),
            Some(ns::XBRLDT) => KNOWN_XBRLDT_ATTRS.contains(&attr.name()),
            None => KNOWN_PLAIN_ATTRS.contains(&attr.name()),
            Some(_) => false,
        };
        if !known {
            warn!(attribute = attr.name(), "arc attribute not supported");
        }
    }

    let from = node.attribute((ns::XLINK, "from"));
    let to = node.attribute((ns::XLINK, "to"));
    let arcrole = node.attribute((ns::XLINK, "arcrole"));
    let (Some(from), Some(to), Some(arcrole)) = (from, to, arcrole) else {
        warn!("arc without from/to/arcrole");
        return None;
    };

    Some(Arc {
        from: from.to_string(),
        to: to.to_string(),
        arcrole: arcrole.to_string(),
        order: node.attribute("order").map(str::to_string),
        use_: node.attribute("use").map(str::to_string),
        priority: node.attribute("priority").map(str::to_string),
        weight: node.attribute("weight").map(str::to_string),
        name: node.attribute("name").map(str::to_string),
        cover: node.attribute("cover").map(str::to_string),
        complement: node.attribute("complement").map(str::to_string),
        axis: node.attribute("axis").map(str::to_string),
        context_element: node.attribute((ns::XBRLDT, "contextElement")).map(str::to_string),
        closed: node.attribute((ns::XBRLDT, "closed")).map(str::to_string),
        target_role: node.attribute((ns::XBRLDT, "targetRole")).map(str::to_string),
        usable: node.attribute((ns::XBRLDT, "usable")).map(str::to_string),
    })
}

/// Render one from/to pairing of an arc as a relationship block.
fn relationship_block(
    from: &LabeledNode,
    to: &LabeledNode,
    arc: &Arc,
    link_role: Option<&str>,
    predicate: &str,
    base: &str,
    ctx: &mut RunContext,
) -> String {
    let blank = format!("_:link{}", ctx.counters.next_link());
    let subject = turtle_name(from, base, ctx);

    let mut out = format!("{blank} {predicate} [\n");
    out.push_str("    xl:type xl:link ;\n");
    if let Some(role) = link_role {
        out.push_str(&format!("    xl:role {role} ;\n"));
    }
    if let Some(role) = &to.role {
        let short = ctx.registry.short_role_name(role, false, &mut ctx.counters);
        out.push_str(&format!("    xlink:role {short} ;\n"));
    }
    output::push_property(&mut out, "rdf:lang", to.lang.as_deref(), PropKind::Str);

    output::push_property(&mut out, "xbrldt:contextElement", arc.context_element.as_deref(), PropKind::Str);
    output::push_property(&mut out, "xbrldt:targetRole", arc.target_role.as_deref(), PropKind::Str);
    output::push_property(&mut out, "xbrldt:closed", arc.closed.as_deref(), PropKind::Bool);
    output::push_property(&mut out, "xbrldt:usable", arc.usable.as_deref(), PropKind::Bool);
    output::push_property(&mut out, "xl:cover", arc.cover.as_deref(), PropKind::Str);
    output::push_property(&mut out, "xl:axis", arc.axis.as_deref(), PropKind::Str);
    output::push_property(&mut out, "xl:complement", arc.complement.as_deref(), PropKind::Str);
    output::push_property(&mut out, "xl:name", arc.name.as_deref(), PropKind::Str);

    if arc.use_.is_some() {
        out.push_str("    xl:use \"prohibited\" ;\n");
    }
    output::push_property(&mut out, "xl:priority", arc.priority.as_deref(), PropKind::Int);
    output::push_property(&mut out, "xl:order", nonnegative(&arc.order), PropKind::Decimal);

    out.push_str(&format!("    xl:from {subject} ;\n"));
    output::push_property(&mut out, "xl:weight", nonnegative(&arc.weight), PropKind::Decimal);

    match to.resource {
        Some(res) => embed_resource(&mut out, res, to),
        None => {
            let object = turtle_name(to, base, ctx);
            out.push_str(&format!("    xl:to {object} ;\n"));
        }
    }

    out.push_str("    ].\n\n");
    out
}

/// `order`/`weight` appear in output only when they parse as non-negative
/// numbers.
fn nonnegative(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| v.trim().parse::<f64>().is_ok_and(|f| f >= 0.0))
}

/// Resolve a node to a turtle name: href through the identifier table, or a
/// synthetic label-derived blank node for virtual resources.
fn turtle_name(node: &LabeledNode, base: &str, ctx: &RunContext) -> String {
    if let Some(href) = &node.href {
        if let Some((target_ns, name)) = ctx.identifiers.resolve(href, base) {
            if let Some(prefix) = ctx.registry.prefix_for(target_ns) {
                return format!("{prefix}:{name}");
            }
        }
        debug!(href, label = %node.label, base, "locator did not resolve, using synthetic name");
    }
    format!("_:{}", synthetic_label(&node.label))
}

/// A resource node on the to-side embeds its own properties and literal
/// content instead of referencing another named concept.
fn embed_resource(out: &mut String, res: Node, to: &LabeledNode) {
    if let Some(value) = res.attribute("as") {
        output::push_property(out, "xl:as", Some(value), PropKind::Ref);
    }
    for key in ["abstract", "merge", "nils", "strict", "implicitFiltering", "matches", "matchAny"] {
        output::push_property(out, &format!("xl:{key}"), res.attribute(key), PropKind::Bool);
    }
    for key in [
        "name", "output", "fallbackValue", "bindAsSequence", "id", "aspectModel", "test",
        "parentChildOrder", "select", "variable", "dimension", "scheme",
    ] {
        output::push_property(out, &format!("xl:{key}"), res.attribute(key), PropKind::XmlLiteral);
    }

    let children: Vec<Node> = res.children().filter(|c| c.is_element()).collect();
    if !children.is_empty() {
        for child in children {
            let xml = output::xml_content(&output::serialize_fragment(child));
            if !xml.is_empty() {
                out.push_str(&format!("    rdf:value \"\"\"{xml}\"\"\"^^rdf:XMLLiteral ;\n"));
            }
        }
    } else if let Some(text) = res.text().filter(|t| !t.is_empty()) {
        let content = output::xml_content(text);
        match &to.lang {
            Some(lang) => out.push_str(&format!("    rdf:value \"\"\"{content}\"\"\"@{lang} ;\n")),
            None => out.push_str(&format!("    rdf:value \"\"\"{content}\"\"\" ;\n")),
        }
    }
}

/// Simple links never produce relationship triples; their only effect is
/// declaring role/arcrole URIs into the registry.
fn process_simple_link(node: Node, ctx: &mut RunContext) {
    if let Some(role) = node.attribute("roleURI") {
        ctx.registry.declare_role(role, false, &mut ctx.counters);
    }
    if let Some(arcrole) = node.attribute("arcroleURI") {
        ctx.registry.declare_role(arcrole, true, &mut ctx.counters);
    }
}
