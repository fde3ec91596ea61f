use super::load::default_config_path;
use super::*;
use crate::error::ConfigError;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

const RECORD: &str = r#"{
    "id": 3,
    "minvolume": 0.2, "maxvolume": 0.8,
    "minduration": 10, "maxduration": 30,
    "mindeadair": 1, "maxdeadair": 4,
    "minfadeintime": 2.0, "maxfadeintime": 3.0,
    "minfadeouttime": 1, "maxfadeouttime": 2,
    "repeatrecordings": false
}"#;

#[test]
fn resolve_config_path_prefers_soundscape_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("SOUNDSCAPE_CONFIG_PATH", "/tmp/soundscape-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/soundscape-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("soundscape")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("soundscape")
            .join("config.toml")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[session]
tracks_file = "/srv/project/tracks.toml"
assets_dir = "/srv/project/assets"
tick_interval_ms = 20
retry_interval_ms = 1500

[library]
extensions = ["wav"]
recursive = false

[log]
filter = "soundscape=trace"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SOUNDSCAPE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("SOUNDSCAPE__SESSION__TICK_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.session.tracks_file, std::path::PathBuf::from("/srv/project/tracks.toml"));
    assert_eq!(s.session.assets_dir, std::path::PathBuf::from("/srv/project/assets"));
    assert_eq!(s.session.tick_interval_ms, 20);
    assert_eq!(s.session.retry_interval_ms, 1500);
    // Unset keys keep their defaults.
    assert_eq!(s.session.poll_interval_ms, 100);
    assert_eq!(s.library.extensions, vec!["wav".to_string()]);
    assert!(!s.library.recursive);
    assert_eq!(s.log.filter, "soundscape=trace");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(&cfg_path, "[session]\ntick_interval_ms = 50\n").unwrap();

    let _g1 = EnvGuard::set("SOUNDSCAPE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("SOUNDSCAPE__SESSION__TICK_INTERVAL_MS", "0");

    let s = Settings::load().unwrap();
    assert_eq!(s.session.tick_interval_ms, 0);
    assert!(s.validate().is_err());
}

#[test]
fn json_batch_builds_one_descriptor_per_record() {
    let second = RECORD.replace("\"id\": 3", "\"id\": 4");
    let batch = parse_json_batch(&format!("[{RECORD}, {second}]")).unwrap();
    assert_eq!(batch.len(), 2);

    let d = &batch[0];
    assert_eq!(d.id, 3);
    assert_eq!((d.minvolume, d.maxvolume), (0.2, 0.8));
    assert_eq!((d.minduration, d.maxduration), (10.0, 30.0));
    assert_eq!((d.mindeadair, d.maxdeadair), (1.0, 4.0));
    assert_eq!((d.minfadeintime, d.maxfadeintime), (2.0, 3.0));
    assert_eq!((d.minfadeouttime, d.maxfadeouttime), (1.0, 2.0));
    assert!(!d.repeatrecordings);
    assert_eq!(batch[1].id, 4);
}

#[test]
fn batch_with_a_missing_key_fails_as_a_whole() {
    let broken = RECORD
        .replace("\"id\": 3", "\"id\": 4")
        .replace("\"maxvolume\": 0.8,", "");
    let err = parse_json_batch(&format!("[{RECORD}, {broken}]")).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
    assert!(err.to_string().contains("maxvolume"));
}

#[test]
fn batch_with_a_mistyped_value_fails() {
    let broken = RECORD.replace("\"repeatrecordings\": false", "\"repeatrecordings\": \"no\"");
    assert!(matches!(
        parse_json_batch(&format!("[{broken}]")),
        Err(ConfigError::Json(_))
    ));

    let broken = RECORD.replace("\"minvolume\": 0.2", "\"minvolume\": \"quiet\"");
    assert!(parse_json_batch(&format!("[{broken}]")).is_err());
}

#[test]
fn batch_with_an_inverted_range_fails() {
    let broken = RECORD.replace("\"minfadeintime\": 2.0", "\"minfadeintime\": 5.0");
    let err = parse_json_batch(&format!("[{broken}]")).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidRange {
            id: 3,
            field: "fadeintime",
            ..
        }
    ));
}

#[test]
fn batch_with_duplicate_ids_fails() {
    let err = parse_json_batch(&format!("[{RECORD}, {RECORD}]")).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateId(3)));
}

#[test]
fn toml_batch_uses_track_tables() {
    let text = r#"
[[track]]
id = 1
minvolume = 0.0
maxvolume = 1
minduration = 5
maxduration = 10
mindeadair = 0
maxdeadair = 0
minfadeintime = 1.5
maxfadeintime = 1.5
minfadeouttime = 1
maxfadeouttime = 1
repeatrecordings = true
"#;
    let batch = parse_toml_batch(text).unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].maxvolume, 1.0);
    assert!(batch[0].repeatrecordings);
}

#[test]
fn load_track_descriptors_picks_the_format_from_the_extension() {
    let dir = tempfile::tempdir().unwrap();

    let json = dir.path().join("tracks.json");
    std::fs::write(&json, format!("[{RECORD}]")).unwrap();
    assert_eq!(load_track_descriptors(&json).unwrap().len(), 1);

    let toml = dir.path().join("tracks.toml");
    std::fs::write(&toml, "track = []\n").unwrap();
    assert!(load_track_descriptors(&toml).unwrap().is_empty());

    let missing = dir.path().join("absent.json");
    assert!(matches!(
        load_track_descriptors(&missing),
        Err(ConfigError::Io { .. })
    ));
}
