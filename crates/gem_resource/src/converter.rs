//! Converter table and invocation
//!
//! Each converter id maps to an external tool, the input extensions it
//! reads and the extension it writes. Running the tool goes through a
//! [`ConverterInvoker`] so planning and tests never touch real binaries.

use std::path::PathBuf;
use std::process::Command;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::{ExportError, Result};
use crate::export::ExportStep;

pub const EXPORT: &str = "Export";
pub const EGG2BAM: &str = "Egg2Bam";
pub const BAM2PZ: &str = "Bam2Pz";
pub const TEXTURE_CARDS: &str = "TextureCards";
pub const OPT_CHAR: &str = "OptChar";
pub const MAKE_FONT: &str = "MakeFont";
pub const PNG2ICO: &str = "Png2Ico";

/// Target platform for tool executable names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Executable name of `tool` on this platform
    pub fn executable(self, tool: &str) -> String {
        let base = match tool {
            "maya2egg" => "maya2egg2008",
            other => other,
        };
        match self {
            Platform::Windows => format!("{}.exe", base),
            Platform::MacOs | Platform::Linux => base.to_string(),
        }
    }
}

/// How a tool takes its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentStyle {
    /// `tool [options] -o output input`
    OutputFlag,
    /// `tool output input`; options are not passed
    Positional,
}

/// One entry of the converter table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    pub id: String,
    pub tool: String,
    pub input_extensions: Vec<String>,
    pub output_extension: String,
    pub style: ArgumentStyle,
}

impl Converter {
    pub fn new(id: &str, tool: &str, input_extensions: &[&str], output_extension: &str) -> Self {
        Self {
            id: id.to_string(),
            tool: tool.to_string(),
            input_extensions: input_extensions.iter().map(|ext| ext.to_string()).collect(),
            output_extension: output_extension.to_string(),
            style: ArgumentStyle::OutputFlag,
        }
    }

    pub fn with_style(mut self, style: ArgumentStyle) -> Self {
        self.style = style;
        self
    }

    /// File `step` reads: its input, with the first accepted extension
    /// appended unless it already has one
    pub fn input_filename(&self, step: &ExportStep) -> String {
        let lower = step.input_filename.to_lowercase();
        if self.input_extensions.iter().any(|ext| lower.ends_with(ext.as_str())) {
            return step.input_filename.clone();
        }
        match self.input_extensions.first() {
            Some(ext) => format!("{}{}", step.input_filename, ext),
            None => step.input_filename.clone(),
        }
    }

    /// File `step` writes: its output with the last extension replaced
    pub fn output_filename(&self, step: &ExportStep) -> String {
        format!("{}{}", strip_extension(&step.output_filename), self.output_extension)
    }

    /// The command line that runs `step`
    pub fn invocation(&self, step: &ExportStep, platform: Platform) -> Invocation {
        let input = PathBuf::from(self.input_filename(step));
        let output = PathBuf::from(self.output_filename(step));
        let program = platform.executable(&self.tool);

        let mut args = Vec::new();
        match self.style {
            ArgumentStyle::OutputFlag => {
                args.extend(step.option_args());
                args.push("-o".to_string());
                args.push(output.to_string_lossy().into_owned());
                args.push(input.to_string_lossy().into_owned());
            }
            ArgumentStyle::Positional => {
                args.push(output.to_string_lossy().into_owned());
                args.push(input.to_string_lossy().into_owned());
            }
        }

        Invocation {
            converter: self.id.clone(),
            program,
            args,
            input,
            output,
            options: step.option_string(),
        }
    }
}

/// Strip the last extension the way a path splitter does: dots leading
/// the file name do not start an extension
fn strip_extension(name: &str) -> &str {
    let file_start = name.rfind(|c: char| c == '/' || c == '\\').map(|i| i + 1).unwrap_or(0);
    let file = &name[file_start..];
    let stem_len = file.trim_start_matches('.').len();
    let leading = file.len() - stem_len;

    match file[leading..].rfind('.') {
        Some(dot) => &name[..file_start + leading + dot],
        None => name,
    }
}

/// Converter id to converter
#[derive(Debug, Clone)]
pub struct ConverterRegistry {
    converters: IndexMap<String, Converter>,
    platform: Platform,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self {
            converters: IndexMap::new(),
            platform: Platform::current(),
        }
    }

    /// The built-in Panda3D tool table
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(Converter::new(EXPORT, "maya2egg", &[".mb", ".ma"], ".egg"))
            .register(Converter::new(EGG2BAM, "egg2bam", &[".egg"], ".bam"))
            .register(Converter::new(BAM2PZ, "pzip", &[".bam"], ".bam.pz"))
            .register(Converter::new(
                TEXTURE_CARDS,
                "egg-texture-cards",
                &[".jpg", ".bmp", ".tga", ".png"],
                ".egg",
            ))
            .register(Converter::new(OPT_CHAR, "egg-optchar", &[".egg"], ".egg"))
            .register(Converter::new(MAKE_FONT, "egg-mkfont", &[".ttf"], ".egg"))
            .register(
                Converter::new(PNG2ICO, "png2ico", &[".png"], ".ico")
                    .with_style(ArgumentStyle::Positional),
            );
        registry
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Add or replace a converter
    pub fn register(&mut self, converter: Converter) -> &mut Self {
        log::trace!("Registered converter: {} ({})", converter.id, converter.tool);
        self.converters.insert(converter.id.clone(), converter);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Converter> {
        self.converters.get(id)
    }

    /// Converter for `step`
    pub fn converter_for(&self, step: &ExportStep) -> Result<&Converter> {
        self.get(&step.converter)
            .ok_or_else(|| ExportError::UnknownConverter(step.converter.clone()))
    }

    /// Final file written by `step`, if its converter is known
    pub fn output_filename(&self, step: &ExportStep) -> Option<String> {
        match self.converter_for(step) {
            Ok(converter) => Some(converter.output_filename(step)),
            Err(e) => {
                log::warn!("Output lookup failed: {}", e);
                None
            }
        }
    }

    /// File read by `step`, if its converter is known
    pub fn input_filename(&self, step: &ExportStep) -> Option<String> {
        self.get(&step.converter)
            .map(|converter| converter.input_filename(step))
    }

    pub fn invocation(&self, step: &ExportStep) -> Result<Invocation> {
        Ok(self.converter_for(step)?.invocation(step, self.platform))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A resolved tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub converter: String,
    pub program: String,
    pub args: Vec<String>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: String,
}

impl Invocation {
    /// The command line as one string, for logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs converter tools
pub trait ConverterInvoker: Send + Sync {
    /// Run one conversion; `true` on success
    fn invoke(&self, invocation: &Invocation) -> bool;
}

/// Runs the tool as a child process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessInvoker;

impl ConverterInvoker for ProcessInvoker {
    fn invoke(&self, invocation: &Invocation) -> bool {
        log::info!("Exporting: {}", invocation.command_line());
        match Command::new(&invocation.program).args(&invocation.args).status() {
            Ok(status) if status.success() => true,
            Ok(status) => {
                log::error!("{} failed with {}", invocation.program, status);
                false
            }
            Err(e) => {
                log::error!("Failed to run {}: {}", invocation.program, e);
                false
            }
        }
    }
}

/// Records invocations without running anything
#[derive(Debug)]
pub struct DryRunInvoker {
    calls: Mutex<Vec<Invocation>>,
    succeed: bool,
}

impl DryRunInvoker {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            succeed: true,
        }
    }

    /// Report every invocation as failed
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            succeed: false,
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<Invocation> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl Default for DryRunInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterInvoker for DryRunInvoker {
    fn invoke(&self, invocation: &Invocation) -> bool {
        log::debug!("Dry run: {}", invocation.command_line());
        self.calls.lock().push(invocation.clone());
        self.succeed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(converter: &str, input: &str, output: &str) -> ExportStep {
        let mut step = ExportStep::new(converter);
        step.input_filename = input.to_string();
        step.output_filename = output.to_string();
        step
    }

    #[test]
    fn test_default_table() {
        let registry = ConverterRegistry::with_defaults();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(
            ids,
            vec![EXPORT, EGG2BAM, BAM2PZ, TEXTURE_CARDS, OPT_CHAR, MAKE_FONT, PNG2ICO]
        );
        assert_eq!(registry.get(BAM2PZ).unwrap().output_extension, ".bam.pz");
    }

    #[test]
    fn test_platform_executables() {
        assert_eq!(Platform::Windows.executable("maya2egg"), "maya2egg2008.exe");
        assert_eq!(Platform::Windows.executable("egg2bam"), "egg2bam.exe");
        assert_eq!(Platform::Linux.executable("maya2egg"), "maya2egg2008");
        assert_eq!(Platform::MacOs.executable("pzip"), "pzip");
    }

    #[test]
    fn test_file_names() {
        let registry = ConverterRegistry::with_defaults();

        let export = step(EXPORT, "models/hero.mb", "hero");
        assert_eq!(registry.input_filename(&export).unwrap(), "models/hero.mb");
        assert_eq!(registry.output_filename(&export).unwrap(), "hero.egg");

        let binary = step(EGG2BAM, "hero", "hero");
        assert_eq!(registry.input_filename(&binary).unwrap(), "hero.egg");
        assert_eq!(registry.output_filename(&binary).unwrap(), "hero.bam");

        let compress = step(BAM2PZ, "out/hero.v2", "out/hero.v2");
        assert_eq!(registry.input_filename(&compress).unwrap(), "out/hero.v2.bam");
        assert_eq!(registry.output_filename(&compress).unwrap(), "out/hero.bam.pz");
    }

    #[test]
    fn test_unknown_converter() {
        let registry = ConverterRegistry::with_defaults();
        let odd = step("Blender", "a.blend", "a");
        assert!(registry.output_filename(&odd).is_none());
        assert!(matches!(
            registry.invocation(&odd),
            Err(ExportError::UnknownConverter(id)) if id == "Blender"
        ));
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("hero.bam"), "hero");
        assert_eq!(strip_extension("hero"), "hero");
        assert_eq!(strip_extension("dir.v1/hero"), "dir.v1/hero");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("a/.b.egg"), "a/.b");
    }

    #[test]
    fn test_invocation_styles() {
        let registry = ConverterRegistry::with_defaults().with_platform(Platform::Linux);

        let mut export = step(EXPORT, "hero.mb", "hero");
        export.set_option("keep-uvs", "");
        let call = registry.invocation(&export).unwrap();
        assert_eq!(call.command_line(), "maya2egg2008 -keep-uvs -o hero.egg hero.mb");
        assert_eq!(call.options, "-keep-uvs");

        let icon = step(PNG2ICO, "icon", "icon");
        let call = registry.invocation(&icon).unwrap();
        assert_eq!(call.command_line(), "png2ico icon.ico icon.png");
    }

    #[test]
    fn test_dry_run_records() {
        let registry = ConverterRegistry::with_defaults();
        let invoker = DryRunInvoker::new();
        let call = registry.invocation(&step(EGG2BAM, "a", "a")).unwrap();

        assert!(invoker.invoke(&call));
        assert_eq!(invoker.calls().len(), 1);
        assert_eq!(invoker.take_calls()[0].converter, EGG2BAM);
        assert!(invoker.calls().is_empty());
        assert!(!DryRunInvoker::failing().invoke(&call));
    }
}
