//! Single-slot snapshot cache.
//!
//! The cache is a small key-value preference store persisted as one JSON
//! file. Only one key is used: the serialized [`WeatherSnapshot`] of the last
//! successful fetch. Writes replace it wholesale and are durable before
//! [`WeatherCache::save`] returns; reads are fail-soft.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use tracing::{debug, warn};

use crate::{
    error::{CacheError, ErrorKind},
    model::WeatherSnapshot,
};

/// Name of the preference store; the file is `<name>.json`.
pub const PREFERENCE_NAME: &str = "WeatherAppPreference";

/// Key the snapshot is stored under.
pub const WEATHER_RESPONSE_DATA: &str = "weather_response_data";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

type Preferences = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct WeatherCache {
    path: PathBuf,
}

impl WeatherCache {
    /// Cache stored in `dir`. The directory is created on first save.
    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join(format!("{PREFERENCE_NAME}.json")) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached snapshot, or `None` if nothing usable is stored.
    ///
    /// Unreadable or unparsable contents are logged and treated as absent.
    pub fn load(&self) -> Option<WeatherSnapshot> {
        let prefs = match self.read_preferences() {
            Ok(Some(prefs)) => prefs,
            Ok(None) => {
                debug!(path = %self.path.display(), "No cached weather yet");
                return None;
            }
            Err(e) => {
                warn!(
                    kind = %ErrorKind::CacheCorrupt,
                    path = %self.path.display(),
                    "Ignoring unreadable cache: {e}"
                );
                return None;
            }
        };

        let raw = prefs.get(WEATHER_RESPONSE_DATA)?;

        let snapshot = match serde_json::from_str::<WeatherSnapshot>(raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(kind = %ErrorKind::CacheCorrupt, "Ignoring corrupt cached snapshot: {e}");
                return None;
            }
        };

        if let Err(e) = snapshot.validate() {
            warn!(kind = %ErrorKind::CacheCorrupt, "Ignoring invalid cached snapshot: {e}");
            return None;
        }

        Some(snapshot)
    }

    /// Replace the cached snapshot. Other keys in the store are kept.
    pub fn save(&self, snapshot: &WeatherSnapshot) -> Result<(), CacheError> {
        // A corrupt store is overwritten rather than blocking the save.
        let mut prefs = self.read_preferences().ok().flatten().unwrap_or_default();
        prefs.insert(WEATHER_RESPONSE_DATA.to_string(), serde_json::to_string(snapshot)?);

        let contents = serde_json::to_vec_pretty(&prefs)?;
        self.write_atomically(&contents)?;

        debug!(path = %self.path.display(), "Cached weather snapshot");
        Ok(())
    }

    fn read_preferences(&self) -> Result<Option<Preferences>, CacheError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let prefs = serde_json::from_str(&contents)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(Some(prefs))
    }

    fn write_atomically(&self, contents: &[u8]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = write_synced(&tmp, contents).and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        // The rename is only durable once the directory entry is on disk.
        sync_dir(self.path.parent())?;

        Ok(())
    }
}

fn write_synced(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(unix)]
fn sync_dir(dir: Option<&Path>) -> io::Result<()> {
    let dir = match dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: Option<&Path>) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_snapshot;

    #[test]
    fn load_from_empty_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());
        assert!(cache.load().is_none());
    }

    #[test]
    fn save_then_load_returns_same_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());
        let snapshot = sample_snapshot();

        cache.save(&snapshot).unwrap();

        assert_eq!(cache.load(), Some(snapshot));
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());

        let first = sample_snapshot();
        let mut second = sample_snapshot();
        second.location_name = "Paris".to_string();
        second.country_code = "FR".to_string();

        cache.save(&first).unwrap();
        cache.save(&second).unwrap();

        assert_eq!(cache.load().map(|s| s.location_name), Some("Paris".to_string()));
    }

    #[test]
    fn garbage_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());
        fs::write(cache.path(), b"\x00not json at all").unwrap();

        assert!(cache.load().is_none());
    }

    #[test]
    fn corrupt_snapshot_value_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());
        let store = serde_json::json!({ WEATHER_RESPONSE_DATA: "{\"conditions\": 42}" });
        fs::write(cache.path(), store.to_string()).unwrap();

        assert!(cache.load().is_none());
    }

    #[test]
    fn snapshot_with_no_conditions_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());
        let mut snapshot = sample_snapshot();
        snapshot.conditions.clear();
        let store = serde_json::json!({
            WEATHER_RESPONSE_DATA: serde_json::to_string(&snapshot).unwrap()
        });
        fs::write(cache.path(), store.to_string()).unwrap();

        assert!(cache.load().is_none());
    }

    #[test]
    fn save_recovers_from_corrupt_store_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());

        fs::write(cache.path(), "{ broken").unwrap();
        cache.save(&sample_snapshot()).unwrap();
        assert!(cache.load().is_some());

        let store = serde_json::json!({ "other_key": "kept" });
        fs::write(cache.path(), store.to_string()).unwrap();
        cache.save(&sample_snapshot()).unwrap();

        let raw = fs::read_to_string(cache.path()).unwrap();
        let prefs: Preferences = serde_json::from_str(&raw).unwrap();
        assert_eq!(prefs.get("other_key").map(String::as_str), Some("kept"));
        assert!(prefs.contains_key(WEATHER_RESPONSE_DATA));
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let cache = WeatherCache::new(&nested);

        let mut snapshot = sample_snapshot();
        cache.save(&snapshot).unwrap();
        snapshot.location_name = "Reykjavik".to_string();
        cache.save(&snapshot).unwrap();

        assert_eq!(cache.load(), Some(snapshot));
        let leftovers: Vec<_> = fs::read_dir(&nested)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn directory_sync_accepts_dirs_and_bare_file_names() {
        let dir = tempfile::tempdir().unwrap();
        sync_dir(Some(dir.path())).unwrap();
        sync_dir(Some(Path::new(""))).unwrap();
        assert!(sync_dir(Some(dir.path().join("missing").as_path())).is_err());
    }
}
