use xbrl2rdf::dts::{DocumentKind, DtsQueue};
use xbrl2rdf::linkbase::process_linkbase;
use xbrl2rdf::run::RunContext;

const BASE: &str = "http://example.org/pre.xml";
const TAX_XSD: &str = "http://example.org/tax.xsd";
const TAX_NS: &str = "http://example.org/tax";

/// Context with the taxonomy schema "already processed": its namespace
/// registered and its element ids resolvable.
fn ready_context() -> (RunContext, DtsQueue) {
    let mut ctx = RunContext::new();
    ctx.registry.add("tax", TAX_NS);
    ctx.identifiers.insert(TAX_XSD, "tax_Assets", TAX_NS, "Assets");
    ctx.identifiers.insert(TAX_XSD, "tax_Note", TAX_NS, "Note");
    ctx.identifiers.insert(TAX_XSD, "tax_Equity", TAX_NS, "Equity");
    ctx.open_page("dts1", BASE, "pre");
    let mut queue = DtsQueue::new();
    queue.mark_processed(BASE);
    queue.mark_processed(TAX_XSD);
    (ctx, queue)
}

fn run_linkbase(xml: &str, ctx: &mut RunContext, queue: &mut DtsQueue) {
    let doc = roxmltree::Document::parse(xml).unwrap();
    process_linkbase(doc.root_element(), BASE, None, "dts1", queue, ctx)
        .expect("linkbase processing failed");
}

const PRESENTATION: &str = r#"<link:linkbase
    xmlns:link="http://www.xbrl.org/2003/linkbase"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:presentationLink xlink:type="extended"
      xlink:role="http://example.org/role/balance">
    <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Assets" xlink:label="a"/>
    <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Note" xlink:label="a"/>
    <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Equity" xlink:label="b"/>
    <link:presentationArc xlink:type="arc" xlink:from="a" xlink:to="b"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" order="1.0"/>
  </link:presentationLink>
</link:linkbase>"#;

// ---------------------------------------------------------------------------
// Arc resolution
// ---------------------------------------------------------------------------

#[test]
fn label_fan_out_produces_cross_product() {
    let (mut ctx, mut queue) = ready_context();
    run_linkbase(PRESENTATION, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    // Two nodes share label "a", one has "b": exactly two relationships.
    assert_eq!(body.matches("xl:from ").count(), 2, "wrong fan-out: {body}");
    assert!(body.contains("_:link1 "));
    assert!(body.contains("_:link2 "));
    assert!(!body.contains("_:link3 "));
}

#[test]
fn locators_resolve_through_identifier_table() {
    let (mut ctx, mut queue) = ready_context();
    run_linkbase(PRESENTATION, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    assert!(body.contains("    xl:from tax:Assets ;\n"), "subject not resolved: {body}");
    assert!(body.contains("    xl:from tax:Note ;\n"));
    assert!(body.contains("    xl:to tax:Equity ;\n"));
}

#[test]
fn arcrole_shortened_with_gensym_prefix() {
    let (mut ctx, mut queue) = ready_context();
    run_linkbase(PRESENTATION, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    assert!(body.contains(" arcrole1:parent-child [\n"), "predicate not shortened: {body}");
    assert!(body.contains("    xl:role role1:balance ;\n"));
    assert!(body.contains("    xl:order \"1.0\"^^xsd:decimal ;\n"));
}

#[test]
fn unresolved_locator_falls_back_to_label() {
    let (mut ctx, mut queue) = ready_context();
    let xml = r#"<link:linkbase
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <link:presentationLink xlink:type="extended">
        <link:loc xlink:type="locator" xlink:href="tax.xsd#no_such_id" xlink:label="x."/>
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Assets" xlink:label="y"/>
        <link:presentationArc xlink:type="arc" xlink:from="x." xlink:to="y"
            xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child"/>
      </link:presentationLink>
    </link:linkbase>"#;
    run_linkbase(xml, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    // Trailing dot stripped from the synthetic name.
    assert!(body.contains("    xl:from _:x ;\n"), "no synthetic fallback: {body}");
    assert!(body.contains("    xl:to tax:Assets ;\n"));
}

// ---------------------------------------------------------------------------
// Deferral protocol
// ---------------------------------------------------------------------------

#[test]
fn missing_schema_defers_linkbase() {
    let mut ctx = RunContext::new();
    ctx.open_page("dts1", BASE, "pre");
    let mut queue = DtsQueue::new();
    queue.mark_processed(BASE);

    run_linkbase(PRESENTATION, &mut ctx, &mut queue);

    // First pass: no triples, the missing schema jumped the queue and the
    // linkbase itself was re-queued behind it with force.
    assert!(!ctx.page_body("dts1").unwrap().contains("xl:from"));
    let first = queue.pop().expect("schema entry");
    assert_eq!(first.kind, DocumentKind::Schema);
    assert_eq!(first.uri, TAX_XSD);
    let second = queue.pop().expect("linkbase retry entry");
    assert_eq!(second.kind, DocumentKind::Linkbase);
    assert_eq!(second.uri, BASE);
    assert!(second.force);

    // Simulate the schema pass, then retry the linkbase.
    queue.mark_processed(TAX_XSD);
    ctx.registry.add("tax", TAX_NS);
    ctx.identifiers.insert(TAX_XSD, "tax_Assets", TAX_NS, "Assets");
    ctx.identifiers.insert(TAX_XSD, "tax_Note", TAX_NS, "Note");
    ctx.identifiers.insert(TAX_XSD, "tax_Equity", TAX_NS, "Equity");
    run_linkbase(PRESENTATION, &mut ctx, &mut queue);

    let body = ctx.page_body("dts1").unwrap();
    assert_eq!(body.matches("xl:from ").count(), 2, "retry did not resolve: {body}");
    assert!(queue.is_empty());
}

// ---------------------------------------------------------------------------
// Arc attributes
// ---------------------------------------------------------------------------

#[test]
fn prohibited_use_and_priority() {
    let (mut ctx, mut queue) = ready_context();
    let xml = r#"<link:linkbase
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <link:calculationLink xlink:type="extended">
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Assets" xlink:label="a"/>
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Equity" xlink:label="b"/>
        <link:calculationArc xlink:type="arc" xlink:from="a" xlink:to="b"
            xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item"
            use="prohibited" priority="2" weight="-1.0"/>
      </link:calculationLink>
    </link:linkbase>"#;
    run_linkbase(xml, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    assert!(body.contains("    xl:use \"prohibited\" ;\n"));
    assert!(body.contains("    xl:priority \"2\"^^xsd:integer ;\n"));
    // Negative weights are dropped.
    assert!(!body.contains("xl:weight"), "negative weight emitted: {body}");
}

#[test]
fn dimensional_attributes_pass_through() {
    let (mut ctx, mut queue) = ready_context();
    let xml = r#"<link:linkbase
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink"
        xmlns:xbrldt="http://xbrl.org/2005/xbrldt">
      <link:definitionLink xlink:type="extended">
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Assets" xlink:label="a"/>
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Equity" xlink:label="b"/>
        <link:definitionArc xlink:type="arc" xlink:from="a" xlink:to="b"
            xlink:arcrole="http://xbrl.org/int/dim/arcrole/hypercube-dimension"
            xbrldt:contextElement="scenario" xbrldt:closed="true"
            xbrldt:targetRole="http://example.org/role/target" xbrldt:usable="false"/>
      </link:definitionLink>
    </link:linkbase>"#;
    run_linkbase(xml, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    assert!(body.contains("    xbrldt:contextElement \"scenario\" ;\n"));
    assert!(body.contains("    xbrldt:closed \"true\"^^xsd:boolean ;\n"));
    assert!(body.contains("    xbrldt:targetRole \"http://example.org/role/target\" ;\n"));
    assert!(body.contains("    xbrldt:usable \"false\"^^xsd:boolean ;\n"));
}

#[test]
fn unsupported_arc_attribute_dropped() {
    let (mut ctx, mut queue) = ready_context();
    let xml = r#"<link:linkbase
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <link:presentationLink xlink:type="extended">
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Assets" xlink:label="a"/>
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Equity" xlink:label="b"/>
        <link:presentationArc xlink:type="arc" xlink:from="a" xlink:to="b"
            xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child"
            preferredLabel="http://www.xbrl.org/2003/role/terseLabel"/>
      </link:presentationLink>
    </link:linkbase>"#;
    run_linkbase(xml, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    assert!(!body.contains("preferredLabel"), "unsupported attribute leaked: {body}");
    assert!(body.contains("xl:from"), "arc itself must still resolve");
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[test]
fn inline_resource_embeds_text_with_language() {
    let (mut ctx, mut queue) = ready_context();
    let xml = r#"<link:linkbase
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <link:labelLink xlink:type="extended">
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Assets" xlink:label="c"/>
        <link:label xlink:type="resource" xlink:label="l" xml:lang="en"
            xlink:role="http://www.xbrl.org/2003/role/label">Total assets</link:label>
        <link:labelArc xlink:type="arc" xlink:from="c" xlink:to="l"
            xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"/>
      </link:labelLink>
    </link:linkbase>"#;
    run_linkbase(xml, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    assert!(body.contains("    rdf:lang \"en\" ;\n"));
    assert!(body.contains("    rdf:value \"\"\"Total assets\"\"\"@en ;\n"), "text not embedded: {body}");
    assert!(!body.contains("xl:to "), "resource target must be embedded, not referenced: {body}");
    assert!(body.contains("    xl:from tax:Assets ;\n"));
}

#[test]
fn inline_resource_markup_becomes_xml_literal() {
    let (mut ctx, mut queue) = ready_context();
    let xml = r#"<link:linkbase
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <link:referenceLink xlink:type="extended">
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Assets" xlink:label="c"/>
        <link:reference xlink:type="resource" xlink:label="r"><Name>IAS 1</Name></link:reference>
        <link:referenceArc xlink:type="arc" xlink:from="c" xlink:to="r"
            xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-reference"/>
      </link:referenceLink>
    </link:linkbase>"#;
    run_linkbase(xml, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    assert!(
        body.contains("    rdf:value \"\"\"<Name>IAS 1</Name>\"\"\"^^rdf:XMLLiteral ;\n"),
        "markup not embedded: {body}"
    );
}

// ---------------------------------------------------------------------------
// Roles and simple links
// ---------------------------------------------------------------------------

#[test]
fn footnote_link_role_suppressed() {
    let (mut ctx, mut queue) = ready_context();
    let xml = r#"<link:linkbase
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <link:footnoteLink xlink:type="extended"
          xlink:role="http://www.xbrl.org/2003/role/link">
        <link:loc xlink:type="locator" xlink:href="tax.xsd#tax_Assets" xlink:label="f"/>
        <link:footnote xlink:type="resource" xlink:label="n" xml:lang="en">A note</link:footnote>
        <link:footnoteArc xlink:type="arc" xlink:from="f" xlink:to="n"
            xlink:arcrole="http://www.xbrl.org/2003/arcrole/fact-footnote"/>
      </link:footnoteLink>
    </link:linkbase>"#;
    run_linkbase(xml, &mut ctx, &mut queue);
    let body = ctx.page_body("dts1").unwrap();
    assert!(!body.contains("    xl:role "), "footnote link role not suppressed: {body}");
    assert!(body.contains("    rdf:value \"\"\"A note\"\"\"@en ;\n"));
}

#[test]
fn simple_links_only_declare_roles() {
    let (mut ctx, mut queue) = ready_context();
    let xml = r#"<link:linkbase
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <link:roleRef xlink:type="simple" roleURI="http://example.org/myroles/set1"
          xlink:href="tax.xsd#role_set1"/>
      <link:arcroleRef xlink:type="simple" arcroleURI="http://example.org/myarcs/rel1"
          xlink:href="tax.xsd#arc_rel1"/>
    </link:linkbase>"#;
    run_linkbase(xml, &mut ctx, &mut queue);
    assert_eq!(ctx.registry.prefix_for("http://example.org/myroles"), Some("role1"));
    assert_eq!(ctx.registry.prefix_for("http://example.org/myarcs"), Some("arcrole1"));
    // No relationship triples from simple links.
    assert!(!ctx.page_body("dts1").unwrap().contains("xl:from"));
}
