//! Gemstone command-line tools
//!
//! ```text
//! gemstone cast "Vec(1, 2, 3)"
//! gemstone config models/hero.ini
//! gemstone tree levels/intro.scene --cast-args
//! gemstone plan models/hero.ini
//! gemstone export models/hero.ini --force
//! ```
//!
//! Runtime flags come from `gemstone.toml` and `GEMSTONE_*` variables.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gem_cast::Value;
use gem_config::{default_cache, ConfigCache, ConfigOptions, IncludeResolver, DEFAULT_SECTION};
use gem_core::{OsFileClock, Settings};
use gem_indented::{parse_file, ParseOptions};
use gem_resource::{
    partition, plan_export, ConverterRegistry, ModelResource, Resource, ResourceManager,
    TextureResource,
};

#[derive(Parser)]
#[command(name = "gemstone")]
#[command(about = "Inspect Gemstone config, scene and export files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cast a value with the lenient caster chain
    Cast { text: String },

    /// Parse a value with the strict parser
    Pcast { text: String },

    /// Print a config file with its includes merged
    Config {
        path: PathBuf,
        #[arg(help = "Main section name")]
        section: Option<String>,
    },

    /// Print the node tree of an indented file
    Tree {
        path: PathBuf,
        #[arg(long, help = "Cast node arguments")]
        cast_args: bool,
    },

    /// Show the export chains of a resource and which are stale
    Plan {
        path: PathBuf,
        #[arg(long, help = "Treat the file as a texture resource")]
        texture: bool,
    },

    /// Run the stale exports of a resource
    Export {
        path: PathBuf,
        #[arg(long, help = "Treat the file as a texture resource")]
        texture: bool,
        #[arg(long, help = "Re-run every step")]
        force: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = Settings::load();

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Cast { text } => print_value(&gem_cast::cast(&text)),
        Command::Pcast { text } => {
            let value = gem_cast::try_pcast(&text).context("pcast failed")?;
            print_value(&value);
        }
        Command::Config { path, section } => print_config(&path, section.as_deref(), settings)?,
        Command::Tree { path, cast_args } => print_tree(&path, cast_args, settings)?,
        Command::Plan { path, texture } => print_plan(open_resource(&path, texture, settings)?)?,
        Command::Export { path, texture, force } => {
            export(open_resource(&path, texture, settings)?, force, settings)?
        }
    }
    Ok(())
}

fn print_value(value: &Value) {
    println!("{:?}", value);
    println!("{}", value);
}

fn print_config(path: &Path, section: Option<&str>, settings: &Settings) -> anyhow::Result<()> {
    let cache: Arc<dyn ConfigCache> = default_cache(settings);
    let main = section.unwrap_or(DEFAULT_SECTION);
    let document = IncludeResolver::new(cache.as_ref(), main, None)
        .resolve(path)
        .with_context(|| format!("cannot load {}", path.display()))?;

    let engine = gem_cast::default_engine();
    let main_first = document
        .section(main)
        .map(|data| (main, data))
        .into_iter()
        .chain(document.sections().filter(|(name, _)| *name != main));

    for (name, data) in main_first {
        println!("[{}]", name);
        for (key, raw) in data {
            println!("{}: {}", key, engine.cast(raw));
        }
        println!();
    }
    Ok(())
}

fn print_tree(path: &Path, cast_args: bool, settings: &Settings) -> anyhow::Result<()> {
    let options = ParseOptions::from_settings(settings).with_cast_args(cast_args);
    let parsed = parse_file(path, &options)?;

    print!("{}", parsed.tree);
    if cast_args {
        for (_, node) in parsed.tree.iter() {
            if let Some(value) = &node.value {
                println!("{}:{} {:?}", node.line, node.type_name, value);
            }
        }
    }
    if !parsed.errors.is_empty() {
        eprintln!("{} line(s) skipped", parsed.errors.len());
    }
    Ok(())
}

fn open_resource(path: &Path, texture: bool, settings: &Settings) -> anyhow::Result<Box<dyn Resource>> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    let cache = default_cache(settings);
    let options = ConfigOptions::from_settings(settings);

    let resource: Box<dyn Resource> = if texture {
        Box::new(TextureResource::open(path, cache, options)?)
    } else {
        Box::new(ModelResource::open(path, cache, options)?)
    };
    Ok(resource)
}

fn print_plan(mut resource: Box<dyn Resource>) -> anyhow::Result<()> {
    let registry = ConverterRegistry::with_defaults();
    let clock = OsFileClock;

    resource.state_mut().reset_export_steps();
    resource.build_export_steps();
    let state = resource.state();

    let chains = partition(state.export_steps());
    let reference = gem_core::file_date(state.config_path());
    let plan = plan_export(&chains, reference, &registry, &clock);

    for (index, chain) in chains.iter().enumerate() {
        println!("chain {}:", index + 1);
        for step in chain.iter() {
            let marker = if plan.remaining.contains(step) { "*" } else { " " };
            let line = registry
                .invocation(step)
                .map(|call| call.command_line())
                .unwrap_or_else(|e| e.to_string());
            println!("  {} {}", marker, line);
        }
    }
    println!(
        "stale steps: {}, forced: {}, complete: {}",
        plan.remaining.len(),
        plan.forced,
        plan.complete
    );
    Ok(())
}

fn export(resource: Box<dyn Resource>, force: bool, settings: &Settings) -> anyhow::Result<()> {
    let mut manager = ResourceManager::new(settings.clone());
    let id = manager.register(resource);
    manager.load(id, force);

    let Some(resource) = manager.get(id) else {
        bail!("resource vanished during export");
    };
    if resource.state().export_failed() {
        bail!("export of {} failed", resource.state().config_path().display());
    }
    for model in resource.state().models() {
        println!("{}", model);
    }
    Ok(())
}
