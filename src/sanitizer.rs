use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use html5ever::LocalName;
use tracing::{debug, info};

use crate::anchors::sanitize_anchors;
use crate::arena_dom::Node;
use crate::config::default::DEFAULT_CONFIG;
use crate::document::Document;
use crate::elements::sanitize_elements;
use crate::error::{Error, Result};
use crate::references::relocate_references;
use crate::tables::{eliminate_nested_tables, flatten_table_cells, normalize_tables};

#[derive(Clone, Debug)]
pub struct SanitizerConfig {
    pub allow_comments: bool,
    /// Allowed tags, each mapped to the attributes it may carry on top of `allowed_attributes`.
    pub allowed_elements: HashMap<LocalName, HashSet<LocalName>>,
    /// Tags that survive without any text content.
    pub allowed_empty_elements: HashSet<LocalName>,
    pub allowed_attributes: HashSet<LocalName>,
    /// Attributes holding a URL, whose value has to start with one of `allowed_schemes`.
    pub scheme_restricted_attributes: HashSet<LocalName>,
    pub allowed_schemes: Vec<&'static str>,
}

impl SanitizerConfig {
    pub fn allows_element(&self, element: &LocalName) -> bool {
        self.allowed_elements.contains_key(element)
    }

    pub fn allows_empty(&self, element: &LocalName) -> bool {
        self.allowed_empty_elements.contains(element)
    }

    pub fn allows_attribute(&self, element: &LocalName, attribute: &LocalName) -> bool {
        self.allowed_attributes.contains(attribute)
            || self
                .allowed_elements
                .get(element)
                .map_or(false, |attributes| attributes.contains(attribute))
    }

    pub fn is_scheme_restricted(&self, attribute: &LocalName) -> bool {
        self.scheme_restricted_attributes.contains(attribute)
    }

    /// Prefix match against `allowed_schemes`, ignoring ASCII case and leading whitespace.
    pub fn allows_url(&self, value: &str) -> bool {
        let value = value.trim_start();
        self.allowed_schemes.iter().any(|scheme| {
            value
                .get(..scheme.len())
                .map_or(false, |prefix| prefix.eq_ignore_ascii_case(scheme))
        })
    }
}

/// One pass of the pipeline. `Stage::ALL` lists them in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Anchors,
    Elements,
    References,
    NestedTables,
    Tables,
    Cells,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Anchors,
        Stage::Elements,
        Stage::References,
        Stage::NestedTables,
        Stage::Tables,
        Stage::Cells,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Anchors => "anchors",
            Stage::Elements => "elements",
            Stage::References => "references",
            Stage::NestedTables => "nested-tables",
            Stage::Tables => "tables",
            Stage::Cells => "cells",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.name() == name)
            .ok_or_else(|| {
                let known: Vec<&str> = Stage::ALL.iter().map(|stage| stage.name()).collect();
                format!("unknown stage '{}' (expected one of: {})", name, known.join(", "))
            })
    }
}

pub struct Sanitizer<'config> {
    config: &'config SanitizerConfig,
}

impl Default for Sanitizer<'static> {
    fn default() -> Self {
        Sanitizer::new(&DEFAULT_CONFIG)
    }
}

impl<'config> Sanitizer<'config> {
    pub fn new(config: &'config SanitizerConfig) -> Sanitizer<'config> {
        Sanitizer { config }
    }

    pub fn run(&self, document: &Document<'_>, stage: Stage) {
        match stage {
            Stage::Anchors => sanitize_anchors(document),
            Stage::Elements => sanitize_elements(document, self.config),
            Stage::References => relocate_references(document, self.config),
            Stage::NestedTables => eliminate_nested_tables(document),
            Stage::Tables => normalize_tables(document),
            Stage::Cells => flatten_table_cells(document),
        }
    }

    pub fn clean(&self, input: &str) -> Result<String> {
        self.clean_stages(input, &Stage::ALL)
    }

    /// Runs the given subset of stages. They still execute in pipeline order, whatever order
    /// they are passed in.
    pub fn clean_stages(&self, input: &str, stages: &[Stage]) -> Result<String> {
        let arena = typed_arena::Arena::<Node<'_>>::new();
        let document = Document::parse(&arena, input)?;
        for stage in Stage::ALL.iter().filter(|stage| stages.contains(stage)) {
            self.run(&document, *stage);
        }
        debug!("Done.");
        document.render()
    }

    pub fn clean_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let input = read_source(path.as_ref())?;
        self.clean(&input)
    }
}

/// Reads an HTML file. Content that is not UTF-8 is reported as a parse error.
pub fn read_source(path: &Path) -> Result<String> {
    info!("Reading HTML file: {}", path.display());
    let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
    String::from_utf8(bytes)
        .map_err(|err| Error::parse(format!("{} is not valid UTF-8: {}", path.display(), err)))
}
