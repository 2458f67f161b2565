//! End-to-end configuration loading against real files

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use gem_cast::Value;
use gem_config::prelude::*;
use gem_config::{LoadReport, SectionData};

#[derive(Debug, Default)]
struct Avatar {
    speed: f64,
    name: String,
    flags: Vec<bool>,
    spawn: (f64, f64),
    sounds: Vec<(String, String)>,
    other_sections: Vec<String>,
    extra: AttributeBag,
}

impl ConfigTarget for Avatar {
    fn bindings() -> ConfigBindings<Self> {
        ConfigBindings::new()
            .setter("speed", |a: &mut Avatar, v: f64| a.speed = v)
            .setter("name", |a: &mut Avatar, v: String| a.name = v)
            .setter("flags", |a: &mut Avatar, v: Vec<bool>| a.flags = v)
            .setter("spawnPoint", |a: &mut Avatar, v: (f64, f64)| a.spawn = v)
            .section("Sounds", |a: &mut Avatar, data: &SectionData| {
                a.sounds = data
                    .iter()
                    .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
                    .collect();
            })
            .fallback_section(|a: &mut Avatar, name: &str, _data: &SectionData| {
                a.other_sections.push(name.to_string());
            })
    }

    fn attributes(&mut self) -> Option<&mut AttributeBag> {
        Some(&mut self.extra)
    }
}

fn write(path: &Path, text: &str) {
    fs::write(path, text).unwrap();
}

fn bump_mtime(path: &Path) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(10)).unwrap();
}

fn configure(cache: Arc<dyn ConfigCache>, path: &Path, options: ConfigOptions) -> (Avatar, LoadReport) {
    let mut avatar = Avatar::default();
    let mut config = Configurable::<Avatar>::new(cache, options);
    let report = config.load(&mut avatar, path, None);
    config.initialize(&mut avatar).unwrap();
    (avatar, report)
}

#[test]
fn test_typed_setters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar.ini");
    write(
        &path,
        "[Configuration]\nspeed: 3.5\nname: 'Hero'\nflags: [true, false]\nspawnPoint: (1, 2.5)\n",
    );

    let cache: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(false));
    let (avatar, _) = configure(cache, &path, ConfigOptions::default());

    assert_eq!(avatar.speed, 3.5);
    assert_eq!(avatar.name, "Hero");
    assert_eq!(avatar.flags, vec![true, false]);
    assert_eq!(avatar.spawn, (1.0, 2.5));
}

#[test]
fn test_include_merges_underneath() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("base.ini"),
        "[Configuration]\nspeed: 2\nname: 'Base'\n[Sounds]\nstep: 'step.wav'\n[Extra]\nx: 1\n",
    );
    let path = dir.path().join("avatar.ini");
    write(
        &path,
        "[Configuration]\n__include__: 'base.ini'\nspeed: 4\n[Sounds]\njump: 'jump.wav'\n",
    );

    let cache: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(false));
    let (avatar, report) = configure(cache, &path, ConfigOptions::default());

    assert_eq!(avatar.speed, 4.0);
    assert_eq!(avatar.name, "Base");
    assert_eq!(
        avatar.sounds,
        vec![
            ("step".to_string(), "step.wav".to_string()),
            ("jump".to_string(), "jump.wav".to_string()),
        ]
    );
    assert_eq!(report.loaded_sections, vec!["Sounds"]);
    assert_eq!(report.fallback_sections, vec!["Extra"]);
    assert_eq!(avatar.other_sections, vec!["Extra"]);
}

#[test]
fn test_section_include_only_merges_that_section() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("sounds.ini"),
        "[Configuration]\nspeed: 9\n[Sounds]\nstep: 'step.wav'\n",
    );
    let path = dir.path().join("avatar.ini");
    write(&path, "[Configuration]\nspeed: 1\n[Sounds]\n__include__: sounds.ini\n");

    let cache: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(false));
    let (avatar, _) = configure(cache, &path, ConfigOptions::default());

    assert_eq!(avatar.speed, 1.0);
    assert_eq!(avatar.sounds, vec![("step".to_string(), "step.wav".to_string())]);
}

#[test]
fn test_include_cycle_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.ini");
    let b = dir.path().join("b.ini");
    write(&a, "[Configuration]\n__include__: 'b.ini'\nspeed: 1\n");
    write(&b, "[Configuration]\n__include__: 'a.ini'\nname: 'B'\n");

    let cache: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(false));
    let (avatar, report) = configure(cache, &a, ConfigOptions::default());

    assert!(report.found);
    assert_eq!(avatar.speed, 1.0);
    assert_eq!(avatar.name, "B");
}

#[test]
fn test_include_fixup() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("shared")).unwrap();
    write(&dir.path().join("shared").join("base.ini"), "[Configuration]\nname: 'Shared'\n");
    let path = dir.path().join("avatar.ini");
    write(&path, "[Configuration]\n__include__: '$SHARED/base.ini'\n");

    let options = ConfigOptions::default().with_include_fixup(|raw| raw.replace("$SHARED", "shared"));
    let cache: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(false));
    let (avatar, _) = configure(cache, &path, options);

    assert_eq!(avatar.name, "Shared");
}

#[test]
fn test_cache_rereads_only_when_stale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar.ini");
    write(&path, "[Configuration]\nspeed: 1\n");

    let cache: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(false));
    let (first, _) = configure(cache.clone(), &path, ConfigOptions::default());
    let (second, _) = configure(cache.clone(), &path, ConfigOptions::default());
    assert_eq!((first.speed, second.speed), (1.0, 1.0));
    assert_eq!(cache.read_count(), 1);

    write(&path, "[Configuration]\nspeed: 2\n");
    bump_mtime(&path);

    let (third, _) = configure(cache.clone(), &path, ConfigOptions::default());
    assert_eq!(third.speed, 2.0);
    assert_eq!(cache.read_count(), 2);
}

#[test]
fn test_reload_picks_up_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar.ini");
    write(&path, "[Configuration]\nname: 'Old'\n");

    let cache: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(false));
    let mut avatar = Avatar::default();
    let mut config = Configurable::<Avatar>::new(cache, ConfigOptions::default());
    config.load(&mut avatar, &path, None);
    config.initialize(&mut avatar).unwrap();
    assert_eq!(avatar.name, "Old");

    write(&path, "[Configuration]\nname: 'New'\n");
    bump_mtime(&path);

    let report = config.reload(&mut avatar).unwrap();
    assert_eq!(report.applied, vec!["name"]);
    assert_eq!(avatar.name, "New");
}

#[test]
fn test_auto_configure_and_bad_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar.ini");
    write(
        &path,
        "orphan: 1\n[Configuration]\nspeed: 2\nthis line has no delimiter\nmood: 'calm'\ncolor: Vec(1, 0, 0)\n",
    );

    let options = ConfigOptions::default().with_auto_configure(true);
    let cache: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(false));
    let (avatar, _) = configure(cache, &path, options);

    assert_eq!(avatar.speed, 2.0);
    assert_eq!(avatar.extra.get("mood"), Some(&Value::from("calm")));
    assert!(matches!(avatar.extra.get("color"), Some(Value::Vector(_))));
    assert!(!avatar.extra.contains("orphan"));
}

#[test]
fn test_dat_cache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar.ini");
    write(&path, "[Configuration]\nname: 'Blob'\n");

    let writer: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(true));
    configure(writer.clone(), &path, ConfigOptions::default());
    let blob = OsConfigCache::cache_filename(&path);
    assert!(blob.exists());
    bump_mtime(&blob);

    let reader: Arc<dyn ConfigCache> = Arc::new(OsConfigCache::new(true));
    let (avatar, _) = configure(reader.clone(), &path, ConfigOptions::default());
    assert_eq!(avatar.name, "Blob");
    assert_eq!(reader.read_count(), 0);
}
