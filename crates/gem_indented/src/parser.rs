//! Indented-file parser
//!
//! One declaration per line:
//!
//! ```text
//! <indent>[*]<type> [<name>]: <args>
//! ```
//!
//! Text after `#` or `;` is a comment. A node's parent is the closest
//! preceding node with a smaller indent. Lines that do not match are
//! reported and skipped.

use std::path::Path;

use gem_core::Settings;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{IndentedError, Result};
use crate::tree::{IndentedNode, IndentedTree, NodeId};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\s*)(\*?)\s*([A-Za-z_][A-Za-z_0-9]*)\s*([A-Za-z_][A-Za-z_0-9]*)?\s*:\s*(.*)$",
    )
    .expect("line pattern")
});

/// Parser switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Store the `pcast` value of each node's arguments
    pub cast_args: bool,
    /// Keep the offending text in syntax errors
    pub detailed_syntax_errors: bool,
}

impl ParseOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            cast_args: false,
            detailed_syntax_errors: settings.detailed_syntax_errors,
        }
    }

    pub fn with_cast_args(mut self, enabled: bool) -> Self {
        self.cast_args = enabled;
        self
    }
}

/// A tree and the lines that were skipped while building it
#[derive(Debug, Default)]
pub struct Parsed {
    pub tree: IndentedTree,
    pub errors: Vec<IndentedError>,
}

fn strip_comment(line: &str) -> &str {
    let line = line.find('#').map_or(line, |at| &line[..at]);
    line.find(';').map_or(line, |at| &line[..at])
}

/// Parse indented text; `source_name` labels syntax errors
pub fn parse_named(source: &str, source_name: &str, options: &ParseOptions) -> Parsed {
    let mut parsed = Parsed::default();
    let mut parents: Vec<(NodeId, usize)> = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line_nr = index + 1;
        let line = strip_comment(raw);
        if line.trim().is_empty() {
            continue;
        }

        let Some(caps) = LINE_RE.captures(line) else {
            let error = IndentedError::Syntax {
                source_name: source_name.to_string(),
                line: line_nr,
                text: options.detailed_syntax_errors.then(|| line.to_string()),
            };
            log::warn!("{}", error);
            parsed.errors.push(error);
            continue;
        };

        let indent = caps[1].chars().count();
        let mut node = IndentedNode::new(&caps[3]);
        node.free = !caps[2].is_empty();
        node.name = caps.get(4).map(|m| m.as_str().to_string());
        node.args = caps[5].to_string();
        node.indent = indent;
        node.line = line_nr;
        if options.cast_args {
            node.value = Some(gem_cast::pcast(&node.args));
        }

        while parents.last().is_some_and(|&(_, top)| top >= indent) {
            parents.pop();
        }
        node.parent = parents.last().map(|&(id, _)| id);

        let id = parsed.tree.push(node);
        parents.push((id, indent));
    }

    parsed.tree.build_child_list();
    parsed
}

/// Parse indented text
pub fn parse_str(source: &str, options: &ParseOptions) -> Parsed {
    parse_named(source, "<string>", options)
}

/// Parse an indented file
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Parsed> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| IndentedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_named(&source, &path.display().to_string(), options))
}
