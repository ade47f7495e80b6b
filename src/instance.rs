//! Instance document processor.
//!
//! Consumes contexts, units and facts, emits their triple blocks, and seeds
//! the DTS crawler with the instance's schema reference. Footnote links are
//! collected during the main pass and translated as extended links at the
//! end.

use roxmltree::Node;
use tracing::{debug, warn};

use crate::dts::{DocumentKind, DtsQueue};
use crate::error::{Result, XbrlError};
use crate::output::{self, escape_backslashes, xml_content};
use crate::registry::register_namespaces;
use crate::run::RunContext;
use crate::vocab::ns;
use crate::{linkbase, schema};

pub fn process_instance(
    root: Node,
    base: &str,
    origin_ns: Option<&str>,
    stream: &str,
    queue: &mut DtsQueue,
    ctx: &mut RunContext,
) -> Result<()> {
    // An input handed to us as an instance may turn out to be a taxonomy
    // document; route it where it belongs.
    match root.tag_name().name() {
        "schema" => return schema::process_schema(root, base, origin_ns, stream, queue, ctx),
        "linkbase" => return linkbase::process_linkbase(root, base, origin_ns, stream, queue, ctx),
        _ => {}
    }

    debug!(base, "processing instance");
    register_namespaces(root, &mut ctx.registry);

    let provenance = gen_provenance(base, stream, ctx);
    let mut footnote_links: Vec<Node> = Vec::new();
    let mut seen_schema_ref = false;

    for child in root.children().filter(|c| c.is_element()) {
        match child.tag_name().name() {
            "context" => process_context(child, stream, ctx),
            "unit" => process_unit(child, stream, ctx),
            "schemaRef" => {
                let Some(href) = child.attribute((ns::XLINK, "href")) else {
                    warn!(base, "couldn't identify schema location");
                    ctx.counters.errors += 1;
                    return Err(XbrlError::document(base, "schemaRef without href"));
                };
                seen_schema_ref = true;
                process_schema_ref(href, &provenance, stream, ctx);
                queue.enqueue_front(DocumentKind::Schema, href, base, origin_ns, false);
            }
            "footnoteLink" => footnote_links.push(child),
            _ => {
                process_fact(child, &provenance, stream, ctx);
            }
        }
    }

    for link in footnote_links {
        linkbase::process_extended_link(link, base, stream, ctx);
    }

    if !seen_schema_ref {
        ctx.counters.errors += 1;
        return Err(XbrlError::document(base, "instance has no schemaRef"));
    }
    Ok(())
}

/// One provenance node per source document; every fact links back to it.
fn gen_provenance(base: &str, stream: &str, ctx: &mut RunContext) -> String {
    let name = format!("_:provenance{}", ctx.counters.next_provenance());
    let mut out = String::from("# provenance for facts from same filing\n");
    out.push_str(&format!("{name} \n"));
    out.push_str(&format!("    xl:instance \"{}\".\n\n", escape_backslashes(base)));
    ctx.write(stream, &out);
    name
}

fn process_schema_ref(href: &str, provenance: &str, stream: &str, ctx: &mut RunContext) {
    // Some filing sets double the "eu/" path segment in their schemaRef;
    // the emitted reference is repaired, the fetch uses the href as-is.
    let repaired = href.replace("eu/eu/", "eu/");
    let mut out = String::from("_:schemaRef \n");
    out.push_str(&format!("    xl:provenance {provenance} ;\n"));
    out.push_str(&format!("    link:schemaRef <{repaired}> .\n\n"));
    ctx.write(stream, &out);
}

fn find_child<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == local)
}

fn process_context(context: Node, stream: &str, ctx: &mut RunContext) {
    let Some(id) = context.attribute("id") else {
        warn!("context without id");
        ctx.counters.errors += 1;
        return;
    };
    let mut out = format!("_:context_{id}\n");
    out.push_str("    xl:type xbrli:context;\n");
    out.push_str("    xbrli:entity [\n");

    // The entity element may carry a segment with opaque content.
    if let Some(segment) = context
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "segment")
    {
        let inner: Vec<Node> = segment.children().filter(|c| c.is_element()).collect();
        let text = if inner.len() == 1 { inner[0].text() } else { segment.text() };
        if let Some(text) = text {
            out.push_str(&format!(
                "        xbrli:segment \"\"\"{}\"\"\"^^rdf:XMLLiteral;\n",
                xml_content(text)
            ));
        }
    }

    let identifier = find_child(context, "entity").and_then(|e| find_child(e, "identifier"));
    let Some(identifier) = identifier else {
        warn!(context = id, "context without entity identifier");
        ctx.counters.errors += 1;
        return;
    };
    out.push_str(&format!(
        "        xbrli:identifier \"{}\" ;\n",
        identifier.text().unwrap_or("")
    ));
    out.push_str(&format!(
        "        xbrli:scheme <{}> ;\n        ];\n",
        identifier.attribute("scheme").unwrap_or("")
    ));

    // Scenario: ordered dimension-member pairs, values written as qnames.
    if let Some(scenario) = find_child(context, "scenario") {
        out.push_str("    xbrli:scenario [\n");
        for member in scenario.children().filter(|c| c.is_element()) {
            let Some(prefix) = member
                .tag_name()
                .namespace()
                .and_then(|n| ctx.registry.prefix_for(n))
            else {
                continue;
            };
            if let Some(value) = member.text() {
                out.push_str(&format!(
                    "        {prefix}:{} {value} ;\n",
                    member.tag_name().name()
                ));
            }
        }
        out.push_str("        ] ;\n");
    }

    // Every context has exactly one period.
    let Some(period) = find_child(context, "period") else {
        warn!(context = id, "context without period");
        ctx.counters.errors += 1;
        return;
    };
    let Some(first) = period.children().find(|c| c.is_element()) else {
        warn!(context = id, "empty period");
        ctx.counters.errors += 1;
        return;
    };
    match first.tag_name().name() {
        "instant" => {
            out.push_str(&format!(
                "    xbrli:instant \"{}\"^^xsd:date.\n\n",
                first.text().unwrap_or("")
            ));
        }
        "forever" => {
            out.push_str("    xbrli:period xbrli:forever.\n\n");
        }
        // A sequence of startDate/endDate pairs, kept ordered.
        _ => {
            out.push_str("    xbrli:period (\n");
            let mut iter = period.children().filter(|c| c.is_element()).peekable();
            while let Some(start) = iter.next() {
                if start.tag_name().name() != "startDate" {
                    continue;
                }
                let end = iter
                    .peek()
                    .filter(|n| n.tag_name().name() == "endDate")
                    .copied();
                if end.is_some() {
                    iter.next();
                }
                out.push_str(&format!(
                    "        [ xbrli:startDate \"{}\"^^xsd:date;\n",
                    start.text().unwrap_or("")
                ));
                out.push_str(&format!(
                    "          xbrli:endDate \"{}\"^^xsd:date; ]\n",
                    end.and_then(|e| e.text()).unwrap_or("")
                ));
            }
            out.push_str("        ).\n\n");
        }
    }
    ctx.write(stream, &out);
}

fn process_unit(unit: Node, stream: &str, ctx: &mut RunContext) {
    let Some(id) = unit.attribute("id") else {
        warn!("unit without id");
        ctx.counters.errors += 1;
        return;
    };
    let Some(child) = unit.children().find(|c| c.is_element()) else {
        return;
    };
    match child.tag_name().name() {
        "measure" => {
            let measure = child.text().unwrap_or("");
            // Bare measures belong to the instance namespace.
            let out = if measure.contains(':') {
                format!("_:unit_{id} xbrli:measure {measure} .\n\n")
            } else {
                format!("_:unit_{id} xbrli:measure xbrli:{measure} .\n\n")
            };
            ctx.write(stream, &out);
        }
        "divide" => {
            let numerator = divide_measure(child, "unitNumerator");
            let denominator = divide_measure(child, "unitDenominator");
            let mut out = format!("_:unit_{id}\n");
            out.push_str(&format!("    xbrli:numerator {} ;\n", numerator.unwrap_or_default()));
            out.push_str(&format!("    xbrli:denominator {} .\n\n", denominator.unwrap_or_default()));
            ctx.write(stream, &out);
        }
        other => {
            warn!(unit = id, child = other, "unsupported unit shape");
        }
    }
}

fn divide_measure(divide: Node, side: &str) -> Option<String> {
    let side = find_child(divide, side)?;
    let measure = side.children().find(|c| c.is_element())?;
    measure.text().map(str::to_string)
}

/// Emit one fact block; returns the generated fact name so tuple parents can
/// reference their children directly.
fn process_fact(
    fact: Node,
    provenance: &str,
    stream: &str,
    ctx: &mut RunContext,
) -> Option<String> {
    let Some(fact_ns) = fact.tag_name().namespace() else {
        warn!(name = fact.tag_name().name(), "fact without namespace");
        ctx.counters.errors += 1;
        return None;
    };
    let Some(prefix) = ctx.registry.prefix_for(fact_ns).map(str::to_string) else {
        warn!(namespace = fact_ns, "fact namespace not registered");
        ctx.counters.errors += 1;
        return None;
    };
    let local = fact.tag_name().name();

    let Some(context_ref) = fact.attribute("contextRef") else {
        // No contextRef: this is a tuple. Children are facts themselves,
        // processed depth-first in document order; the recorded content list
        // uses the identifiers the recursive calls return.
        debug!(tuple = local, prefix = %prefix, "processing tuple fact");
        let mut child_names = Vec::new();
        for child in fact.children().filter(|c| c.is_element()) {
            if let Some(name) = process_fact(child, provenance, stream, ctx) {
                child_names.push(name);
            }
        }
        let name = format!("_:fact{}", ctx.counters.next_fact());
        let mut out = format!("{name}\n");
        out.push_str("    xl:type xbrli:tuple ;\n");
        out.push_str(&format!("    xl:provenance {provenance} ;\n"));
        out.push_str(&format!("    rdf:type {prefix}:{local} ;\n"));
        out.push_str("    xbrli:content (\n");
        for child_name in &child_names {
            out.push_str(&format!("        {child_name}\n"));
        }
        out.push_str("    ).\n");
        ctx.write(stream, &out);
        return Some(name);
    };

    let name = format!("_:fact{}", ctx.counters.next_fact());
    let mut out = format!("{name} \n");
    out.push_str("    rdf:type xbrli:fact ;\n");
    out.push_str(&format!("    xl:provenance {provenance} ;\n"));
    out.push_str(&format!("    xl:type {prefix}:{local} ;\n"));

    if let Some(unit_ref) = fact.attribute("unitRef") {
        // Numeric fact. The literal's type is decided purely by the presence
        // of a decimal point.
        let value = fact.text().unwrap_or("");
        if value.contains('.') {
            out.push_str(&format!("    rdf:value \"{value}\"^^xsd:decimal ;\n"));
        } else {
            out.push_str(&format!("    rdf:value \"{value}\"^^xsd:integer ;\n"));
        }
        output::push_property(&mut out, "xbrli:decimals", fact.attribute("decimals"), output::PropKind::Int);
        output::push_property(&mut out, "xbrli:precision", fact.attribute("precision"), output::PropKind::Int);
        output::push_property(&mut out, "xbrli:balance", fact.attribute("balance"), output::PropKind::Str);
        out.push_str(&format!("    xbrli:unit _:unit_{unit_ref};\n"));
    } else {
        let children: Vec<Node> = fact.children().filter(|c| c.is_element()).collect();
        if !children.is_empty() {
            let mut xml = String::new();
            for child in children {
                xml.push_str(&output::serialize_fragment(child));
            }
            out.push_str(&format!(
                "    xbrli:resource \"\"\"{}\"\"\"^^rdf:XMLLiteral ;\n",
                xml.replace('"', "'")
            ));
        } else {
            let content = fact.text().unwrap_or("").replace('"', "'");
            let content_prefix = content.split(':').next().unwrap_or("");
            if ctx.registry.has_prefix(content_prefix) {
                out.push_str(&format!("    xbrli:resource {content} ;\n"));
            } else {
                let lang = fact
                    .attribute((ns::XML, "lang"))
                    .or_else(|| fact.attribute("lang"));
                match lang {
                    Some(lang) => out.push_str(&format!("    xbrli:resource \"\"\"{content}\"\"\"@{lang} ;\n")),
                    None => out.push_str(&format!("    xbrli:resource \"\"\"{content}\"\"\" ;\n")),
                }
            }
        }
    }

    out.push_str(&format!("    xbrli:context _:context_{context_ref} .\n\n"));
    ctx.write(stream, &out);
    Some(name)
}
