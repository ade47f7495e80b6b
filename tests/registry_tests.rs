use xbrl2rdf::registry::{split_role, NamespaceRegistry};
use xbrl2rdf::run::Counters;

// ---------------------------------------------------------------------------
// Prefix binding
// ---------------------------------------------------------------------------

#[test]
fn add_and_lookup() {
    let mut reg = NamespaceRegistry::new();
    assert!(reg.add("ex", "http://example.org/taxonomy"));
    assert_eq!(reg.prefix_for("http://example.org/taxonomy"), Some("ex"));
    assert_eq!(reg.uri_for("ex"), Some("http://example.org/taxonomy"));
}

#[test]
fn same_prefix_readd_is_noop() {
    let mut reg = NamespaceRegistry::new();
    reg.add("ex", "http://example.org/taxonomy");
    let before = reg.len();
    assert!(reg.add("ex", "http://example.org/taxonomy"));
    assert_eq!(reg.len(), before);
}

#[test]
fn rebinding_rejected_keeps_original() {
    let mut reg = NamespaceRegistry::new();
    reg.add("ex", "http://example.org/taxonomy");
    assert!(!reg.add("other", "http://example.org/taxonomy"));
    assert_eq!(reg.prefix_for("http://example.org/taxonomy"), Some("ex"));
}

#[test]
fn builtins_seeded() {
    let reg = NamespaceRegistry::with_builtins();
    assert_eq!(reg.prefix_for("http://www.xbrl.org/2003/instance"), Some("xbrli"));
    assert_eq!(reg.prefix_for("http://www.xbrl.org/2003/linkbase"), Some("link"));
    assert_eq!(reg.prefix_for("http://www.w3.org/1999/xlink"), Some("xlink"));
}

// ---------------------------------------------------------------------------
// Prefix block rendering
// ---------------------------------------------------------------------------

#[test]
fn prefix_block_appends_hash() {
    let mut reg = NamespaceRegistry::new();
    reg.add("a", "http://example.org/a");
    let block = reg.prefix_block();
    assert_eq!(block, "@prefix a: <http://example.org/a#>.\n");
}

#[test]
fn prefix_block_keeps_existing_hash() {
    let mut reg = NamespaceRegistry::new();
    reg.add("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
    let block = reg.prefix_block();
    assert_eq!(
        block,
        "@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>.\n"
    );
}

#[test]
fn prefix_block_preserves_registration_order() {
    let mut reg = NamespaceRegistry::new();
    reg.add("z", "http://z.org/ns");
    reg.add("a", "http://a.org/ns");
    let block = reg.prefix_block();
    let z_pos = block.find("@prefix z:").expect("missing z");
    let a_pos = block.find("@prefix a:").expect("missing a");
    assert!(z_pos < a_pos, "registration order not preserved: {block}");
}

// ---------------------------------------------------------------------------
// Role shortening
// ---------------------------------------------------------------------------

#[test]
fn split_role_at_last_slash() {
    let (base, name) = split_role("http://xbrl.org/int/role/foo/bar");
    assert_eq!(base, "http://xbrl.org/int/role/foo");
    assert_eq!(name, "bar");
}

#[test]
fn unseen_role_base_gets_gensym_prefix() {
    let mut reg = NamespaceRegistry::new();
    let mut counters = Counters::default();
    let short = reg.short_role_name("http://xbrl.org/int/role/foo/bar", false, &mut counters);
    assert_eq!(short, "role1:bar");
    // Same base keeps the same prefix on later encounters.
    let again = reg.short_role_name("http://xbrl.org/int/role/foo/baz", false, &mut counters);
    assert_eq!(again, "role1:baz");
}

#[test]
fn arc_roles_use_their_own_counter() {
    let mut reg = NamespaceRegistry::new();
    let mut counters = Counters::default();
    let role = reg.short_role_name("http://example.org/role/a/x", false, &mut counters);
    let arc = reg.short_role_name("http://example.org/arcrole/b/y", true, &mut counters);
    assert_eq!(role, "role1:x");
    assert_eq!(arc, "arcrole1:y");
}

#[test]
fn known_base_is_not_regenerated() {
    let mut reg = NamespaceRegistry::new();
    let mut counters = Counters::default();
    reg.add("myrole", "http://example.org/roles");
    let short = reg.short_role_name("http://example.org/roles/profit", false, &mut counters);
    assert_eq!(short, "myrole:profit");
}

#[test]
fn declare_role_registers_base_only_once() {
    let mut reg = NamespaceRegistry::new();
    let mut counters = Counters::default();
    reg.declare_role("http://example.org/roles/one", false, &mut counters);
    reg.declare_role("http://example.org/roles/two", false, &mut counters);
    assert_eq!(reg.prefix_for("http://example.org/roles"), Some("role1"));
    assert_eq!(reg.len(), 1);
}
