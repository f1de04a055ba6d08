//! Zone store: one zone's full record set plus its backing file.
//!
//! All mutation goes through a scoped writer transaction; `persist` is the
//! only code path that touches disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use super::parser::ZoneParser;
use super::record::{RRset, Rdata};
use super::zone::Zone;
use crate::dns::enums::RecordType;
use crate::error::{Result, ZoneCraftError};

pub struct ZoneStore {
    zone: Zone,
    file_path: PathBuf,
    /// Count of non-SOA record sets, refreshed on load and persist
    pub record_count: usize,
}

impl ZoneStore {
    /// Load a zone from its backing file. Parse failures surface as internal
    /// errors: a file we manage ourselves should never be malformed.
    pub fn load<P: AsRef<Path>>(path: P, origin: &str) -> Result<Self> {
        let path = path.as_ref();
        debug!(origin, path = %path.display(), "loading zone file");
        let zone = ZoneParser::new()
            .parse_file(path, origin)
            .map_err(|e| match e {
                ZoneCraftError::Io(io) => ZoneCraftError::Io(io),
                other => ZoneCraftError::Internal(format!(
                    "failed to load zone file '{}': {other}",
                    path.display()
                )),
            })?;
        let mut store = Self {
            zone,
            file_path: path.to_path_buf(),
            record_count: 0,
        };
        store.record_count = store.count_records();
        Ok(store)
    }

    /// Create an empty in-memory zone bound to (but not yet written to) its
    /// backing file.
    pub fn create(origin: &str, file_path: PathBuf, default_ttl: u32) -> Result<Self> {
        let zone = Zone::new(origin, default_ttl)?;
        Ok(Self {
            zone,
            file_path,
            record_count: 0,
        })
    }

    pub fn origin(&self) -> &str {
        &self.zone.origin
    }

    pub fn default_ttl(&self) -> u32 {
        self.zone.default_ttl
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn soa(&self) -> Option<&RRset> {
        self.zone.soa()
    }

    /// Enumerate every (name, type) record set. SOA is zone metadata, not a
    /// generic record: it is excluded unless explicitly requested.
    pub fn all_records(
        &self,
        type_filter: Option<RecordType>,
        include_soa: bool,
    ) -> Vec<&RRset> {
        let include_soa = include_soa || type_filter == Some(RecordType::SOA);
        self.zone
            .iter_rrsets()
            .filter(|rrset| type_filter.is_none() || Some(rrset.rtype) == type_filter)
            .filter(|rrset| include_soa || rrset.rtype != RecordType::SOA)
            .collect()
    }

    /// Record sets at one owner name. Fails when the name has no node or the
    /// type filter matches nothing.
    pub fn lookup(&self, name: &str, type_filter: Option<RecordType>) -> Result<Vec<&RRset>> {
        let node = self.zone.node(name).ok_or_else(|| {
            ZoneCraftError::NotFound(format!("no records exist under name '{name}'"))
        })?;
        let matches: Vec<&RRset> = node
            .iter()
            .filter(|rrset| type_filter.is_none() || Some(rrset.rtype) == type_filter)
            .collect();
        if matches.is_empty() {
            return Err(ZoneCraftError::NotFound(format!(
                "no matching records under name '{name}'"
            )));
        }
        Ok(matches)
    }

    pub fn rrset(&self, name: &str, rtype: RecordType) -> Option<&RRset> {
        self.zone.rrset(name, rtype)
    }

    /// Open a mutation transaction. Changes are staged against a working
    /// copy and only become visible on commit; a dropped writer rolls back.
    pub fn writer(&mut self) -> ZoneWriter<'_> {
        let work = self.zone.clone();
        ZoneWriter { store: self, work }
    }

    /// Write the zone to its backing file: stamp the serial with today's
    /// date, serialize with comments and the origin directive, and refresh
    /// the record count. Same-day writes produce the same serial.
    pub fn persist(&mut self) -> Result<()> {
        let serial: u32 = Local::now()
            .format("%Y%m%d")
            .to_string()
            .parse()
            .map_err(|e| ZoneCraftError::Internal(format!("serial timestamp: {e}")))?;
        self.zone.set_serial(serial)?;

        debug!(origin = %self.zone.origin, path = %self.file_path.display(), "writing zone");
        let contents = self.zone.to_zonefile_string();
        write_atomic(&self.file_path, &contents)?;

        self.record_count = self.count_records();
        Ok(())
    }

    /// Delete the backing zone file. Returns false when no file existed.
    pub fn delete_file(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        info!(path = %path.display(), "removing zone file");
        fs::remove_file(path)?;
        Ok(true)
    }

    fn count_records(&self) -> usize {
        self.all_records(None, false).len()
    }
}

/// Temp-file-plus-rename so a crash mid-write never leaves a torn zone file.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Scoped mutation transaction over one zone
pub struct ZoneWriter<'a> {
    store: &'a mut ZoneStore,
    work: Zone,
}

impl ZoneWriter<'_> {
    /// Read the staged state, including changes not yet committed.
    pub fn rrset(&self, name: &str, rtype: RecordType) -> Option<&RRset> {
        self.work.rrset(name, rtype)
    }

    pub fn add(&mut self, rrset: RRset) -> Result<()> {
        self.work.add_rrset(rrset)
    }

    pub fn replace(&mut self, rrset: RRset) {
        self.work.replace_rrset(rrset);
    }

    /// Delete one exact rdata value; fails NotFound when no exact match.
    pub fn delete_exact(&mut self, name: &str, rtype: RecordType, rdata: &Rdata) -> Result<()> {
        if !self.work.delete_rdata_exact(name, rtype, rdata) {
            return Err(ZoneCraftError::NotFound(
                "specified record does not exist".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply all staged changes to the store's zone. Dropping the writer
    /// without committing discards them.
    pub fn commit(self) {
        let ZoneWriter { store, work } = self;
        store.zone = work;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::RecordClass;
    use tempfile::TempDir;

    fn soa_rrset() -> RRset {
        RRset::from_rdata(
            "@".to_string(),
            RecordType::SOA,
            RecordClass::IN,
            3600,
            Rdata::new(vec![
                "ns1.example.com.".into(),
                "hostmaster.example.com.".into(),
                "0".into(),
                "10800".into(),
                "3600".into(),
                "604800".into(),
                "3600".into(),
            ]),
        )
    }

    fn ns_rrset() -> RRset {
        RRset::from_rdata(
            "@".to_string(),
            RecordType::NS,
            RecordClass::IN,
            3600,
            Rdata::new(vec!["ns1.example.com.".into()]),
        )
    }

    fn new_store(dir: &TempDir) -> ZoneStore {
        let path = dir.path().join("example.com.zone");
        let mut store = ZoneStore::create("example.com.", path, 3600).unwrap();
        let mut txn = store.writer();
        txn.add(soa_rrset()).unwrap();
        txn.add(ns_rrset()).unwrap();
        txn.commit();
        store
    }

    #[test]
    fn test_record_count_excludes_soa() {
        let dir = TempDir::new().unwrap();
        let mut store = new_store(&dir);
        store.persist().unwrap();
        assert_eq!(store.record_count, 1); // only the NS set
        assert_eq!(store.all_records(None, false).len(), 1);
        assert_eq!(store.all_records(None, true).len(), 2);
        assert_eq!(
            store.all_records(Some(RecordType::SOA), false).len(),
            1 // SOA filter implies include_soa
        );
    }

    #[test]
    fn test_persist_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = new_store(&dir);
        let mut txn = store.writer();
        txn.add(RRset::from_rdata(
            "www".to_string(),
            RecordType::A,
            RecordClass::IN,
            300,
            Rdata::with_comment(vec!["192.0.2.1".into()], Some("web tier".into())),
        ))
        .unwrap();
        txn.commit();
        store.persist().unwrap();

        let reloaded = ZoneStore::load(store.file_path(), "example.com.").unwrap();
        assert_eq!(reloaded.origin(), "example.com.");
        assert_eq!(reloaded.record_count, store.record_count);
        let rrset = reloaded.rrset("www", RecordType::A).unwrap();
        assert_eq!(rrset.ttl, 300);
        assert_eq!(rrset.rdatas[0].fields[0], "192.0.2.1");
        assert_eq!(rrset.rdatas[0].comment.as_deref(), Some("web tier"));
    }

    #[test]
    fn test_same_day_serial_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = new_store(&dir);
        store.persist().unwrap();
        let first = store.soa().unwrap().rdatas[0].fields[2].clone();
        store.persist().unwrap();
        let second = store.soa().unwrap().rdatas[0].fields[2].clone();
        assert_eq!(first, second);
        let expected = Local::now().format("%Y%m%d").to_string();
        assert_eq!(first, expected);
    }

    #[test]
    fn test_dropped_writer_rolls_back() {
        let dir = TempDir::new().unwrap();
        let mut store = new_store(&dir);
        {
            let mut txn = store.writer();
            txn.add(RRset::from_rdata(
                "tmp".to_string(),
                RecordType::A,
                RecordClass::IN,
                300,
                Rdata::new(vec!["192.0.2.9".into()]),
            ))
            .unwrap();
            // dropped without commit
        }
        assert!(store.rrset("tmp", RecordType::A).is_none());
    }

    #[test]
    fn test_lookup_not_found() {
        let dir = TempDir::new().unwrap();
        let store = new_store(&dir);
        assert!(matches!(
            store.lookup("missing", None),
            Err(ZoneCraftError::NotFound(_))
        ));
        // name exists but filter misses
        assert!(matches!(
            store.lookup("@", Some(RecordType::AAAA)),
            Err(ZoneCraftError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_backing_file() {
        let dir = TempDir::new().unwrap();
        let mut store = new_store(&dir);
        store.persist().unwrap();
        assert!(ZoneStore::delete_file(store.file_path()).unwrap());
        assert!(!ZoneStore::delete_file(store.file_path()).unwrap());
    }
}
