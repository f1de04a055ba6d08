//! Zone directory: maps a folder of `<origin>zone` files to loaded stores.
//!
//! A zone's file name is its fully qualified origin (trailing dot included)
//! followed by the literal `zone`, e.g. `example.com.zone`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::store::ZoneStore;
use crate::error::{Result, ZoneCraftError};

const ZONE_FILE_SUFFIX: &str = "zone";

/// File name for a zone origin. The origin keeps its trailing dot, so the
/// suffix attaches without a separator.
pub fn zone_file_name(origin: &str) -> String {
    format!("{origin}{ZONE_FILE_SUFFIX}")
}

pub fn zone_file_path(dir: &Path, origin: &str) -> PathBuf {
    dir.join(zone_file_name(origin))
}

/// Recover the origin from a zone file name by stripping the suffix.
fn origin_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(ZONE_FILE_SUFFIX)
        .filter(|origin| origin.ends_with('.'))
}

/// Load every zone in the folder, sorted by origin. Any single file failing
/// to load aborts the whole listing: a broken zone file in a managed folder
/// means the store is in a state we should not paper over.
pub fn load_all(dir: &Path) -> Result<Vec<ZoneStore>> {
    let mut zones = Vec::new();
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "zone directory does not exist");
        return Ok(zones);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(origin) = origin_from_file_name(file_name) else {
            debug!(file_name, "skipping non-zone file");
            continue;
        };
        let store = ZoneStore::load(entry.path(), origin)?;
        zones.push(store);
    }

    zones.sort_by(|a, b| a.origin().cmp(b.origin()));
    Ok(zones)
}

/// Load one zone by origin. NotFound when its file is absent.
pub fn load_one(dir: &Path, origin: &str) -> Result<ZoneStore> {
    let path = zone_file_path(dir, origin);
    if !path.exists() {
        return Err(ZoneCraftError::NotFound(format!(
            "zone '{origin}' does not exist"
        )));
    }
    ZoneStore::load(path, origin)
}

pub fn zone_exists(dir: &Path, origin: &str) -> bool {
    zone_file_path(dir, origin).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    const ZONE_TEXT: &str = "\
$ORIGIN example.com.
$TTL 3600
@ 3600 IN SOA ns1.example.com. hostmaster.example.com. 20250101 10800 3600 604800 3600
@ 3600 IN NS ns1.example.com.
www 300 IN A 192.0.2.1
";

    fn write_zone(dir: &Path, file_name: &str, contents: &str) {
        let mut f = fs::File::create(dir.join(file_name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_file_name_round_trip() {
        assert_eq!(zone_file_name("example.com."), "example.com.zone");
        assert_eq!(
            origin_from_file_name("example.com.zone"),
            Some("example.com.")
        );
        // no trailing dot before the suffix means not one of ours
        assert_eq!(origin_from_file_name("examplezone"), None);
        assert_eq!(origin_from_file_name("notes.txt"), None);
    }

    #[test]
    fn test_load_all_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write_zone(
            dir.path(),
            "zzz.example.zone",
            &ZONE_TEXT.replace("example.com.", "zzz.example."),
        );
        write_zone(dir.path(), "example.com.zone", ZONE_TEXT);
        write_zone(dir.path(), "README.md", "not a zone");

        let zones = load_all(dir.path()).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].origin(), "example.com.");
        assert_eq!(zones[1].origin(), "zzz.example.");
    }

    #[test]
    fn test_load_all_aborts_on_broken_file() {
        let dir = TempDir::new().unwrap();
        write_zone(dir.path(), "example.com.zone", ZONE_TEXT);
        write_zone(dir.path(), "broken.org.zone", "@ IN NS ; no SOA here\n");

        assert!(matches!(
            load_all(dir.path()),
            Err(ZoneCraftError::Internal(_))
        ));
    }

    #[test]
    fn test_load_one_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_one(dir.path(), "nope.example."),
            Err(ZoneCraftError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_directory_is_empty_listing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        assert!(load_all(&missing).unwrap().is_empty());
    }
}
