//! Export steps
//!
//! One step converts one file with one external tool. A config line
//! `models/hero.mb -keep-uvs() -cs(y-up)` becomes a step whose input is
//! `models/hero.mb` and whose options are `-keep-uvs` and `-cs y-up`.
//! Steps chain when a step's input equals the previous step's output; the
//! `generate_post_*` helpers build those follow-up steps.

use std::fmt;
use std::path::Path;

use gem_cast::Value;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::converter::{BAM2PZ, EGG2BAM};
use crate::error::{ExportError, Result};

static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*([^\t\n\r\x0c\x0b (]+)\s*(.*)$").expect("filename pattern")
});

static OPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*-?([\w-]+)\(([^()]*)\)\s*(.*)$").expect("option pattern")
});

/// Tool options, `-name -> value`. An empty string or `None` is a bare flag.
pub type ExportOptions = IndexMap<String, Value>;

/// A single file conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ExportStep {
    pub input_filename: String,
    /// Output name; its extension is replaced by the converter's
    pub output_filename: String,
    /// Converter id, see [`crate::ConverterRegistry`]
    pub converter: String,
    pub options: ExportOptions,
}

impl ExportStep {
    pub fn new(converter: impl Into<String>) -> Self {
        Self {
            input_filename: String::new(),
            output_filename: String::new(),
            converter: converter.into(),
            options: ExportOptions::new(),
        }
    }

    /// Parse `input [-option(value)]*` for the output named `key`
    pub fn parse(key: &str, data: &str, converter: &str) -> Result<Self> {
        let mut step = Self::new(converter);
        step.output_filename = key.to_string();

        let caps = FILENAME_RE
            .captures(data)
            .ok_or_else(|| ExportError::MalformedFilename(data.to_string()))?;
        step.input_filename = caps[1].to_string();

        let mut rest = caps[2].to_string();
        while !rest.is_empty() {
            let caps = OPTION_RE.captures(&rest).ok_or_else(|| ExportError::MalformedOptions {
                line: data.to_string(),
                rest: rest.clone(),
            })?;
            step.options
                .insert(format!("-{}", &caps[1]), gem_cast::cast(&caps[2]));
            rest = caps[3].to_string();
        }

        Ok(step)
    }

    /// Add or replace an option; `name` gets a leading `-` if missing
    pub fn set_option(&mut self, name: &str, value: impl Into<Value>) {
        let name = if name.starts_with('-') {
            name.to_string()
        } else {
            format!("-{}", name)
        };
        self.options.insert(name, value.into());
    }

    /// Options as command-line arguments, in insertion order
    pub fn option_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.options.len() * 2);
        for (name, value) in &self.options {
            args.push(name.clone());
            match value {
                Value::None => {}
                Value::String(s) if s.is_empty() => {}
                Value::String(s) => args.push(s.clone()),
                other => args.push(other.to_string()),
            }
        }
        args
    }

    /// Options joined into one string
    pub fn option_string(&self) -> String {
        self.option_args().join(" ")
    }

    /// Resolve relative file names against `dir`
    pub fn relocate(&mut self, dir: &Path) {
        for name in [&mut self.input_filename, &mut self.output_filename] {
            if !name.is_empty() && Path::new(name.as_str()).is_relative() {
                *name = dir.join(name.as_str()).to_string_lossy().into_owned();
            }
        }
    }

    /// The step after this one, reading this step's output
    pub fn generate_post(&self, converter: &str) -> ExportStep {
        let mut next = ExportStep::new(converter);
        next.input_filename = self.output_filename.clone();
        next.output_filename = next.input_filename.clone();
        next
    }

    /// Egg to binary conversion of this step's output
    pub fn generate_post_egg2bam(&self, options: Option<&ExportOptions>) -> ExportStep {
        let mut binary = self.generate_post(EGG2BAM);
        if let Some(options) = options {
            binary.options = options.clone();
        }
        binary
    }

    /// Compression of this step's output
    pub fn generate_post_bam2pz(&self) -> ExportStep {
        self.generate_post(BAM2PZ)
    }

    /// Binary conversion followed by compression
    pub fn generate_post_egg2bampz(&self, options: Option<&ExportOptions>) -> (ExportStep, ExportStep) {
        let binary = self.generate_post_egg2bam(options);
        let compress = binary.generate_post_bam2pz();
        (binary, compress)
    }
}

impl fmt::Display for ExportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExportStep <input: {}, output: {}, converter: {}, options: [{}]>",
            self.input_filename,
            self.output_filename,
            self.converter,
            self.option_string()
        )
    }
}
