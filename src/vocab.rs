//! Namespace URIs and the built-in prefix table.
//!
//! - `ns::` -- URIs the processors match element/attribute names against
//! - [`BUILTIN_PREFIXES`] -- the fixed prefix seed every run starts with
//! - [`SKIP_NAMESPACES`] -- infrastructure schemas that carry no business
//!   concepts and are never processed for element declarations

/// Namespace URIs used when walking documents.
pub mod ns {
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";
    pub const XBRLI: &str = "http://www.xbrl.org/2003/instance";
    pub const LINK: &str = "http://www.xbrl.org/2003/linkbase";
    pub const XLINK: &str = "http://www.w3.org/1999/xlink";
    pub const XBRLDT: &str = "http://xbrl.org/2005/xbrldt";
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const EUROFILING_MODEL: &str = "http://www.eurofiling.info/xbrl/ext/model";
}

/// Prefixes registered at the start of every run, in declaration order.
pub const BUILTIN_PREFIXES: &[(&str, &str)] = &[
    ("xbrli", "http://www.xbrl.org/2003/instance"),
    ("link", "http://www.xbrl.org/2003/linkbase"),
    ("xl", "http://www.xbrl.org/2003/XLink"),
    ("arcrole", "http://www.xbrl.org/2003/arcrole/"),
    ("arcroledim", "http://xbrl.org/int/dim/arcrole/"),
    ("role", "http://www.xbrl.org/2003/role/"),
    ("xsd", "http://www.w3.org/2001/XMLSchema"),
    ("xlink", "http://www.w3.org/1999/xlink"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("eurofiling", "http://www.eurofiling.info/xbrl/role"),
    ("enum", "http://xbrl.org/2014/extensible-enumerations"),
    ("gen", "http://xbrl.org/2008/generic"),
    ("iso4217", "http://www.xbrl.org/2003/iso4217"),
    ("label", "http://xbrl.org/2008/label"),
    ("nonnum", "http://www.xbrl.org/dtr/type/non-numeric"),
    ("num", "http://www.xbrl.org/dtr/type/numeric"),
    ("table", "http://xbrl.org/2014/table"),
    ("variable", "http://xbrl.org/2008/variable"),
    ("xbrldi", "http://xbrl.org/2006/xbrldi"),
    ("xbrldt", "http://xbrl.org/2005/xbrldt"),
    ("cf", "http://xbrl.org/2008/filter/concept"),
    ("tf", "http://xbrl.org/2008/filter/tuple"),
    ("df", "http://xbrl.org/2008/filter/dimension"),
    ("acf", "http://xbrl.org/2010/filter/aspect-cover"),
    ("mf", "http://xbrl.org/2008/filter/match"),
    ("gf", "http://xbrl.org/2008/filter/general"),
    ("va", "http://xbrl.org/2008/assertion/value"),
    ("ea", "http://xbrl.org/2008/assertion/existence"),
    ("xbrl2rdf", "https://github.com/wjwillemse/xbrl2rdf"),
];

/// Core schemas that define the reporting framework itself. Processing their
/// element declarations would emit misleading concept triples, so the schema
/// processor treats them as no-ops and namespace registration skips them.
pub const SKIP_NAMESPACES: &[&str] = &[
    "http://www.xbrl.org/2003/instance",
    "http://xbrl.org/2005/xbrldt",
    "http://www.xbrl.org/2003/XLink",
    "http://xbrl.org/2008/variable",
    "http://www.xbrl.org/2003/linkbase",
];

/// True when `uri` names one of the infrastructure schemas.
pub fn is_skip_namespace(uri: &str) -> bool {
    SKIP_NAMESPACES.contains(&uri)
}
