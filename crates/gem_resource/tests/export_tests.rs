//! Model export through the resource manager against an in-memory file tree

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gem_config::{ConfigCache, ConfigOptions, MemoryFileSystem, VfsConfigCache};
use gem_core::Settings;
use gem_resource::prelude::*;
use gem_resource::{Invocation, BAM2PZ, EGG2BAM, EXPORT};
use parking_lot::Mutex;

/// Writes each output into the memory file system
struct TouchingInvoker {
    fs: Arc<MemoryFileSystem>,
    calls: Mutex<Vec<String>>,
}

impl TouchingInvoker {
    fn new(fs: Arc<MemoryFileSystem>) -> Self {
        Self {
            fs,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl ConverterInvoker for TouchingInvoker {
    fn invoke(&self, invocation: &Invocation) -> bool {
        self.fs.insert(invocation.output.clone(), "exported");
        self.calls.lock().push(invocation.converter.clone());
        true
    }
}

struct Fixture {
    fs: Arc<MemoryFileSystem>,
    invoker: Arc<TouchingInvoker>,
    manager: ResourceManager,
}

fn fixture(ini: &str) -> (Fixture, gem_resource::ResourceId) {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.insert("assets/hero.ini", ini);
    fs.insert("assets/hero.mb", "maya scene");

    let invoker = Arc::new(TouchingInvoker::new(fs.clone()));
    let mut manager = ResourceManager::new(Settings::default())
        .with_clock(fs.clone())
        .with_invoker(invoker.clone());

    let cache: Arc<dyn ConfigCache> = Arc::new(VfsConfigCache::new(fs.clone()));
    let model = ModelResource::open("assets/hero.ini", cache, ConfigOptions::default()).unwrap();
    let id = manager.register(Box::new(model));

    (Fixture { fs, invoker, manager }, id)
}

#[test]
fn test_first_load_exports_everything() {
    let (mut fx, id) = fixture("[Model]\nhero: hero.mb\n");

    assert_eq!(fx.manager.load(id, false), Some(true));
    assert_eq!(fx.invoker.take(), vec![EXPORT, EGG2BAM, BAM2PZ]);

    let resource = fx.manager.get(id).unwrap();
    assert!(!resource.state().export_failed());
    let models: Vec<PathBuf> = resource.state().models().iter().map(PathBuf::from).collect();
    assert_eq!(models, vec![PathBuf::from("assets/hero.bam.pz")]);
}

#[test]
fn test_only_stale_chains_rerun() {
    let (mut fx, id) = fixture("[Model]\nhero: hero.mb\n");
    fx.manager.load(id, false);
    fx.invoker.take();

    assert!(fx.manager.reload(true, false).is_empty());
    assert!(fx.invoker.take().is_empty());

    fx.fs.touch("assets/hero.mb");
    assert!(fx.manager.reload(true, false).is_empty());
    assert_eq!(fx.invoker.take(), vec![EXPORT, EGG2BAM, BAM2PZ]);
}

#[test]
fn test_config_change_forces_reexport() {
    let (mut fx, id) = fixture("[Model]\nhero: hero.mb\n");
    fx.manager.load(id, false);
    fx.invoker.take();

    fx.fs.insert("assets/hero.ini", "[Configuration]\ngenerateMipmaps: true\n[Model]\nhero: hero.mb\n");
    let reloaded = fx.manager.on_file_changed(Path::new("assets/hero.ini")).unwrap();

    assert_eq!(reloaded, vec![id]);
    assert_eq!(fx.invoker.take(), vec![EXPORT, EGG2BAM, BAM2PZ]);
}

#[test]
fn test_skip_export() {
    let (mut fx, id) = fixture("[Configuration]\nskipExport: true\n[Model]\nhero: hero.mb\n");

    assert_eq!(fx.manager.load(id, false), Some(true));
    assert!(fx.invoker.take().is_empty());
    assert!(!fx.manager.get(id).unwrap().state().export_failed());
}

#[test]
fn test_missing_source_marks_export_failed() {
    let (mut fx, id) = fixture("[Model]\nhero: hero.mb\nvillain: villain.mb\n");

    fx.manager.load(id, false);
    assert_eq!(fx.invoker.take(), vec![EXPORT, EGG2BAM, BAM2PZ]);
    assert!(fx.manager.get(id).unwrap().state().export_failed());
}
