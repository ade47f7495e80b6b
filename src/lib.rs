//! xbrl2rdf: convert XBRL instance documents and their discoverable
//! taxonomy sets into RDF turtle.
//!
//! An instance seeds the [`dts::DtsQueue`] with its schema reference; the
//! crawler then fetches and processes the transitive closure of schemas and
//! linkbases exactly once per document, deferring linkbases until every
//! schema their locators can reach has populated the
//! [`identifiers::IdentifierTable`]. Output is one turtle stream per source
//! document, assembled from the shared [`registry::NamespaceRegistry`].

pub mod dts;
pub mod error;
pub mod identifiers;
pub mod instance;
pub mod linkbase;
pub mod output;
pub mod registry;
pub mod run;
pub mod schema;
pub mod source;
pub mod uri;
pub mod vocab;

use roxmltree::Document;
use tracing::info;

pub use error::{Result, XbrlError};
use run::RunContext;
use source::DocumentSource;

/// Convert one instance document: process it, drain the DTS queue it seeds,
/// and leave the finished pages in `ctx`. Document-level failures are
/// counted and returned; the context still holds whatever was produced.
pub fn convert_instance(uri: &str, source: &dyn DocumentSource, ctx: &mut RunContext) -> Result<()> {
    let stem = uri::file_stem(uri);
    if ctx.is_completed(&format!("{stem}.ttl")) {
        info!(uri, "already converted, skipping");
        return Ok(());
    }

    let bytes = match source.resolve(uri) {
        Ok(bytes) => bytes,
        Err(e) => {
            ctx.counters.errors += 1;
            return Err(e);
        }
    };
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let doc = match Document::parse(&text) {
        Ok(doc) => doc,
        Err(e) => {
            ctx.counters.errors += 1;
            return Err(XbrlError::Xml {
                uri: uri.to_string(),
                source: e,
            });
        }
    };

    let basename = uri.rsplit('/').next().unwrap_or(uri);
    ctx.registry.add("instance", basename);
    ctx.open_page("instance", basename, &stem);

    let mut queue = dts::DtsQueue::new();
    queue.mark_processed(uri);

    let res = instance::process_instance(doc.root_element(), uri, None, "instance", &mut queue, ctx);
    ctx.counters.files += 1;

    // A failed instance never dispatches its taxonomy queue; everything
    // already emitted still reaches the output.
    if res.is_ok() {
        dts::dispatch_queue(&mut queue, ctx, source);
    }
    ctx.log_summary();
    res
}
