//! Turtle literal encoding and page assembly.
//!
//! Encoding conventions reproduced exactly: backslashes doubled, embedded
//! markup triple-quoted as `rdf:XMLLiteral` with double quotes rewritten to
//! single quotes, dates/decimals/integers/booleans typed accordingly,
//! language-tagged strings suffixed `@lang`, synthetic nodes prefixed `_:`.

/// How an optional attribute value renders as a property object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    /// Plain quoted string.
    Str,
    /// `"value"^^xsd:boolean`
    Bool,
    /// `"value"^^xsd:integer`
    Int,
    /// `"value"^^xsd:decimal`
    Decimal,
    /// `"""value"""^^rdf:XMLLiteral`
    XmlLiteral,
    /// The value is already a reference (qname or blank node), written raw.
    Ref,
}

/// Append `    pred object ;` for a present attribute value; absent values
/// produce nothing.
pub fn push_property(out: &mut String, pred: &str, value: Option<&str>, kind: PropKind) {
    let Some(value) = value else { return };
    let value = escape_backslashes(value);
    match kind {
        PropKind::Str => out.push_str(&format!("    {pred} \"{value}\" ;\n")),
        PropKind::Bool => out.push_str(&format!("    {pred} \"{value}\"^^xsd:boolean ;\n")),
        PropKind::Int => out.push_str(&format!("    {pred} \"{value}\"^^xsd:integer ;\n")),
        PropKind::Decimal => out.push_str(&format!("    {pred} \"{value}\"^^xsd:decimal ;\n")),
        PropKind::XmlLiteral => {
            out.push_str(&format!("    {pred} \"\"\"{value}\"\"\"^^rdf:XMLLiteral ;\n"))
        }
        PropKind::Ref => out.push_str(&format!("    {pred} {value} ;\n")),
    }
}

/// Double every backslash so the literal survives turtle parsing.
pub fn escape_backslashes(s: &str) -> String {
    s.replace('\\', "\\\\")
}

/// Prepare text for embedding in a triple-quoted XMLLiteral: double quotes
/// become single quotes (lossy, required for compatibility), backslashes are
/// doubled.
pub fn xml_content(s: &str) -> String {
    escape_backslashes(s).replace('"', "'")
}

/// Serialize an element subtree back to markup for embedding as an
/// XMLLiteral. roxmltree has no writer, so this walks the tree by hand.
pub fn serialize_fragment(node: roxmltree::Node) -> String {
    let mut out = String::new();
    write_element(node, &mut out);
    out
}

fn write_element(node: roxmltree::Node, out: &mut String) {
    if !node.is_element() {
        if node.is_text() {
            if let Some(text) = node.text() {
                out.push_str(&escape_text(text));
            }
        }
        return;
    }
    let name = qualified_name(node);
    out.push('<');
    out.push_str(&name);
    for attr in node.attributes() {
        let attr_name = match attr.namespace().and_then(|ns| node.lookup_prefix(ns)) {
            Some(p) if !p.is_empty() => format!("{p}:{}", attr.name()),
            _ => attr.name().to_string(),
        };
        let value = escape_text(attr.value()).replace('"', "&quot;");
        out.push_str(&format!(" {attr_name}=\"{value}\""));
    }
    if !node.has_children() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in node.children() {
        write_element(child, out);
    }
    out.push_str(&format!("</{name}>"));
}

fn qualified_name(node: roxmltree::Node) -> String {
    let name = node.tag_name().name();
    match node.tag_name().namespace().and_then(|ns| node.lookup_prefix(ns)) {
        Some(p) if !p.is_empty() => format!("{p}:{name}"),
        _ => name.to_string(),
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Assemble one output file: source comment, banner, prefix header, body.
/// U+2264 is stripped from bodies; it breaks downstream turtle consumers.
pub fn assemble_page(source_href: &str, prefix_block: &str, body: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("#Source HREF: {source_href}\n\n"));
    out.push_str("# RDF triples (turtle syntax)\n\n");
    out.push_str(prefix_block);
    out.push_str("\n\n");
    out.push_str(&body.replace('\u{2264}', ""));
    out
}
