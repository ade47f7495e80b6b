//! Run-scoped mutable state.
//!
//! One [`RunContext`] is created per converted instance document and passed
//! by mutable reference to every component. It owns the namespace registry,
//! the identifier table, the monotonic counters and the per-document output
//! pages; nothing here is global.

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::identifiers::IdentifierTable;
use crate::registry::NamespaceRegistry;

/// Monotonic counter service for gensymmed names and run tallies.
#[derive(Debug, Default)]
pub struct Counters {
    facts: u64,
    links: u64,
    provenances: u64,
    roles: u64,
    arcroles: u64,
    dts: u64,
    pub concepts: u64,
    pub xlinks: u64,
    pub arcs: u64,
    pub locators: u64,
    pub resources: u64,
    pub files: u64,
    pub errors: u64,
}

impl Counters {
    pub fn next_fact(&mut self) -> u64 {
        self.facts += 1;
        self.facts
    }

    pub fn next_link(&mut self) -> u64 {
        self.links += 1;
        self.links
    }

    pub fn next_provenance(&mut self) -> u64 {
        self.provenances += 1;
        self.provenances
    }

    pub fn next_role(&mut self) -> u64 {
        self.roles += 1;
        self.roles
    }

    pub fn next_arcrole(&mut self) -> u64 {
        self.arcroles += 1;
        self.arcroles
    }

    pub fn next_dts(&mut self) -> u64 {
        self.dts += 1;
        self.dts
    }

    pub fn fact_count(&self) -> u64 {
        self.facts
    }

    pub fn link_count(&self) -> u64 {
        self.links
    }
}

/// One output stream: the turtle body plus what is needed to write its file.
#[derive(Debug, Default)]
pub struct Page {
    pub source_href: String,
    pub stem: String,
    pub body: String,
}

/// All mutable state shared across the components of one run.
#[derive(Debug)]
pub struct RunContext {
    pub registry: NamespaceRegistry,
    pub identifiers: IdentifierTable,
    pub counters: Counters,
    pages: Vec<(String, Page)>,
    page_index: HashMap<String, usize>,
    /// Output basenames produced by earlier runs; documents whose target
    /// output is listed here are skipped.
    pub completed: HashSet<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            registry: NamespaceRegistry::with_builtins(),
            identifiers: IdentifierTable::new(),
            counters: Counters::default(),
            pages: Vec::new(),
            page_index: HashMap::new(),
            completed: HashSet::new(),
        }
    }

    /// Open a fresh output stream keyed by its prefix name (`instance`,
    /// `dts1`, ...). Re-opening an existing stream keeps its body.
    pub fn open_page(&mut self, stream: &str, source_href: &str, stem: &str) {
        if self.page_index.contains_key(stream) {
            return;
        }
        self.page_index.insert(stream.to_string(), self.pages.len());
        self.pages.push((
            stream.to_string(),
            Page {
                source_href: source_href.to_string(),
                stem: stem.to_string(),
                body: String::new(),
            },
        ));
    }

    /// Append text to a stream's body. Unknown streams are a programming
    /// error; every processor opens its page before writing.
    pub fn write(&mut self, stream: &str, text: &str) {
        let idx = self.page_index[stream];
        self.pages[idx].1.body.push_str(text);
    }

    pub fn pages(&self) -> impl Iterator<Item = (&str, &Page)> {
        self.pages.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn page_body(&self, stream: &str) -> Option<&str> {
        self.page_index
            .get(stream)
            .map(|&i| self.pages[i].1.body.as_str())
    }

    pub fn is_completed(&self, basename: &str) -> bool {
        self.completed.contains(basename)
    }

    /// Log the run tallies the way the original reported them.
    pub fn log_summary(&self) {
        info!(
            facts = self.counters.fact_count(),
            concepts = self.counters.concepts,
            links = self.counters.link_count(),
            xlinks = self.counters.xlinks,
            arcs = self.counters.arcs,
            locators = self.counters.locators,
            resources = self.counters.resources,
            files = self.counters.files,
            errors = self.counters.errors,
            "run complete"
        );
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
