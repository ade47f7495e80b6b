//! DTS crawler: work queue, processed set and the drain loop.
//!
//! Every schema/linkbase reference discovered anywhere in the document graph
//! lands here as a [`QueueEntry`]. The queue dedups by URI (re-enqueueing
//! repositions, never duplicates), the processed set guarantees each
//! document is dispatched at most once, and `force` entries evict a URI from
//! the processed set so a deferred linkbase can be retried after its
//! dependencies have loaded.

use std::collections::{HashMap, HashSet, VecDeque};

use roxmltree::Document;
use tracing::{debug, info, warn};

use crate::run::RunContext;
use crate::source::DocumentSource;
use crate::uri::{expand_relative, file_stem};
use crate::{linkbase, schema};

/// What kind of processing a queued document needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Schema,
    Linkbase,
}

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub kind: DocumentKind,
    /// Always absolute; relative references are expanded against the
    /// referencing document's base at enqueue time.
    pub uri: String,
    /// Namespace hint carried from the referencing document, set only for
    /// relative references.
    pub origin_ns: Option<String>,
    pub force: bool,
}

/// How many times a linkbase may be deferred before it is resolved anyway,
/// with unresolved locators falling back to synthetic labels.
pub const MAX_DEFERRALS: u32 = 10;

#[derive(Debug, Default)]
pub struct DtsQueue {
    queue: VecDeque<QueueEntry>,
    processed: HashSet<String>,
    deferrals: HashMap<String, u32>,
}

impl DtsQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front: the referenced document must be resolved before
    /// its referrer can complete.
    pub fn enqueue_front(
        &mut self,
        kind: DocumentKind,
        href: &str,
        base: &str,
        origin_ns: Option<&str>,
        force: bool,
    ) {
        let uri = expand_relative(href, base);
        self.insert(
            QueueEntry {
                kind,
                uri,
                origin_ns: origin_ns.map(str::to_string),
                force,
            },
            true,
        );
    }

    /// Insert at the back: a normal, deferrable reference.
    pub fn enqueue_back(
        &mut self,
        kind: DocumentKind,
        href: &str,
        base: &str,
        origin_ns: Option<&str>,
        force: bool,
    ) {
        let uri = expand_relative(href, base);
        self.insert(
            QueueEntry {
                kind,
                uri,
                origin_ns: origin_ns.map(str::to_string),
                force,
            },
            false,
        );
    }

    fn insert(&mut self, entry: QueueEntry, front: bool) {
        if entry.force {
            self.processed.remove(&entry.uri);
        }
        self.queue.retain(|e| e.uri != entry.uri);
        if front {
            self.queue.push_front(entry);
        } else {
            self.queue.push_back(entry);
        }
    }

    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.queue.pop_front()
    }

    pub fn is_processed(&self, uri: &str) -> bool {
        self.processed.contains(uri)
    }

    pub fn mark_processed(&mut self, uri: &str) {
        self.processed.insert(uri.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Record one more deferral for a linkbase; returns the running count.
    pub fn note_deferral(&mut self, uri: &str) -> u32 {
        let count = self.deferrals.entry(uri.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Forget deferral bookkeeping once a linkbase has been resolved.
    pub fn clear_deferrals(&mut self, uri: &str) {
        self.deferrals.remove(uri);
    }
}

/// Drain the queue: pop, dedup, fetch, parse, dispatch, until empty.
/// Fetch and parse failures are counted and logged; the loop continues.
pub fn dispatch_queue(
    queue: &mut DtsQueue,
    ctx: &mut RunContext,
    source: &dyn DocumentSource,
) {
    while let Some(entry) = queue.pop() {
        if queue.is_processed(&entry.uri) && !entry.force {
            continue;
        }
        queue.mark_processed(&entry.uri);

        let stem = file_stem(&entry.uri);
        if ctx.is_completed(&format!("{stem}.ttl")) {
            info!(uri = %entry.uri, "output already produced, skipping");
            continue;
        }

        let bytes = match source.resolve(&entry.uri) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(uri = %entry.uri, error = %e, "fetch failed");
                ctx.counters.errors += 1;
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let doc = match Document::parse(&text) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(uri = %entry.uri, error = %e, "XML parse failed");
                ctx.counters.errors += 1;
                continue;
            }
        };

        // Fresh output stream for this document. A forced retry gets a new
        // stream name but keeps the URI's original prefix binding.
        let stream = format!("dts{}", ctx.counters.next_dts());
        if ctx.registry.prefix_for(&entry.uri).is_none() {
            ctx.registry.add(&stream, &entry.uri);
        }
        ctx.open_page(&stream, &entry.uri, &stem);

        debug!(uri = %entry.uri, kind = ?entry.kind, stream = %stream, "dispatching");
        let res = match entry.kind {
            DocumentKind::Schema => schema::process_schema(
                doc.root_element(),
                &entry.uri,
                entry.origin_ns.as_deref(),
                &stream,
                queue,
                ctx,
            ),
            DocumentKind::Linkbase => linkbase::process_linkbase(
                doc.root_element(),
                &entry.uri,
                entry.origin_ns.as_deref(),
                &stream,
                queue,
                ctx,
            ),
        };
        ctx.counters.files += 1;
        if let Err(e) = res {
            warn!(uri = %entry.uri, error = %e, "document processing failed");
            ctx.counters.errors += 1;
        }
    }
}
