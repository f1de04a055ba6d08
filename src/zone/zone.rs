use std::collections::BTreeMap;

use super::record::{RRset, Rdata};
use crate::dns::enums::RecordType;
use crate::dns::name;
use crate::error::{Result, ZoneCraftError};

/// In-memory representation of one DNS zone.
///
/// Nodes map relative owner names to their record sets; `@` is the apex.
/// Exactly one SOA record set lives at the apex.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Zone origin, fully qualified, lowercase, dot-terminated
    pub origin: String,
    /// Default TTL applied to records without an explicit TTL
    pub default_ttl: u32,
    /// Owner name (relative) -> record sets, one per type
    nodes: BTreeMap<String, Vec<RRset>>,
}

impl Zone {
    pub fn new(origin: &str, default_ttl: u32) -> Result<Self> {
        Ok(Self {
            origin: name::canonical_origin(origin)?,
            default_ttl,
            nodes: BTreeMap::new(),
        })
    }

    /// Express an owner name relative to this zone's origin.
    pub fn relativize(&self, owner: &str) -> String {
        name::relativize(owner, &self.origin)
    }

    pub fn node(&self, owner: &str) -> Option<&Vec<RRset>> {
        self.nodes.get(&self.relativize(owner))
    }

    pub fn rrset(&self, owner: &str, rtype: RecordType) -> Option<&RRset> {
        self.node(owner)
            .and_then(|sets| sets.iter().find(|s| s.rtype == rtype))
    }

    pub fn soa(&self) -> Option<&RRset> {
        self.rrset("@", RecordType::SOA)
    }

    /// All record sets in owner-name order, the apex first.
    pub fn iter_rrsets(&self) -> impl Iterator<Item = &RRset> {
        self.nodes.values().flatten()
    }

    /// Merge a record set into the zone. Rdata for an existing (name, type)
    /// set is appended (duplicates dropped) and the set TTL takes the
    /// incoming value. SOA is special: apex only, at most one set.
    pub fn add_rrset(&mut self, rrset: RRset) -> Result<()> {
        let owner = self.relativize(&rrset.name);

        if rrset.rtype == RecordType::SOA {
            if owner != "@" {
                return Err(ZoneCraftError::BadRequest(
                    "SOA record must be anchored at the zone apex".to_string(),
                ));
            }
            if self.soa().is_some() {
                return Err(ZoneCraftError::DuplicateSoa);
            }
        }

        let sets = self.nodes.entry(owner.clone()).or_default();
        match sets.iter_mut().find(|s| s.rtype == rrset.rtype) {
            Some(existing) => {
                if existing.class != rrset.class {
                    return Err(ZoneCraftError::BadRequest(format!(
                        "record class {} does not match existing {} set for '{}'",
                        rrset.class, existing.class, owner
                    )));
                }
                existing.ttl = rrset.ttl;
                for rdata in rrset.rdatas {
                    if !existing.rdatas.iter().any(|r| r.same_value(&rdata)) {
                        existing.rdatas.push(rdata);
                    }
                }
            }
            None => {
                let mut rrset = rrset;
                rrset.name = owner;
                sets.push(rrset);
            }
        }
        Ok(())
    }

    /// Replace the whole (name, type) record set.
    pub fn replace_rrset(&mut self, rrset: RRset) {
        let owner = self.relativize(&rrset.name);
        let sets = self.nodes.entry(owner.clone()).or_default();
        let mut rrset = rrset;
        rrset.name = owner;
        match sets.iter_mut().find(|s| s.rtype == rrset.rtype) {
            Some(existing) => *existing = rrset,
            None => sets.push(rrset),
        }
    }

    /// Delete the exact rdata value from the (name, type) set. Empty sets and
    /// nodes are pruned. Returns false when no exact match existed.
    pub fn delete_rdata_exact(&mut self, owner: &str, rtype: RecordType, rdata: &Rdata) -> bool {
        let owner = self.relativize(owner);
        let Some(sets) = self.nodes.get_mut(&owner) else {
            return false;
        };
        let Some(set) = sets.iter_mut().find(|s| s.rtype == rtype) else {
            return false;
        };
        let before = set.rdatas.len();
        set.rdatas.retain(|r| !r.same_value(rdata));
        let removed = set.rdatas.len() < before;
        if set.rdatas.is_empty() {
            sets.retain(|s| s.rtype != rtype);
        }
        if sets.is_empty() {
            self.nodes.remove(&owner);
        }
        removed
    }

    /// Rewrite the SOA serial field in place.
    pub fn set_serial(&mut self, serial: u32) -> Result<()> {
        let soa = self
            .nodes
            .get_mut("@")
            .and_then(|sets| sets.iter_mut().find(|s| s.rtype == RecordType::SOA))
            .ok_or(ZoneCraftError::MissingSoa)?;
        for rdata in &mut soa.rdatas {
            rdata.fields[2] = serial.to_string();
        }
        Ok(())
    }

    /// Zone invariant check: exactly one SOA anchored at the apex.
    pub fn validate(&self) -> Result<()> {
        match self.soa() {
            Some(soa) if soa.rdatas.len() == 1 => Ok(()),
            Some(_) => Err(ZoneCraftError::DuplicateSoa),
            None => Err(ZoneCraftError::MissingSoa),
        }
    }

    /// Serialize the full zone to master-file text, preserving comments and
    /// the origin directive. The SOA line leads.
    pub fn to_zonefile_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("$ORIGIN {}\n", self.origin));
        out.push_str(&format!("$TTL {}\n", self.default_ttl));

        if let Some(soa) = self.soa() {
            self.write_rrset(&mut out, soa);
        }
        for rrset in self.iter_rrsets() {
            if rrset.rtype == RecordType::SOA {
                continue;
            }
            self.write_rrset(&mut out, rrset);
        }
        out
    }

    fn write_rrset(&self, out: &mut String, rrset: &RRset) {
        for rdata in &rrset.rdatas {
            let text = match rrset.rtype {
                // free-form text rdata is quoted in master-file syntax
                RecordType::TXT | RecordType::SPF => format!("\"{}\"", rdata.fields[0]),
                _ => rdata.text(),
            };
            out.push_str(&format!(
                "{} {} {} {} {}",
                rrset.name, rrset.ttl, rrset.class, rrset.rtype, text
            ));
            if let Some(comment) = &rdata.comment {
                out.push_str(&format!(" ; {comment}"));
            }
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::RecordClass;

    fn soa_rrset() -> RRset {
        RRset::from_rdata(
            "@".to_string(),
            RecordType::SOA,
            RecordClass::IN,
            3600,
            Rdata::new(vec![
                "ns1.example.com.".into(),
                "hostmaster.example.com.".into(),
                "1".into(),
                "10800".into(),
                "3600".into(),
                "604800".into(),
                "3600".into(),
            ]),
        )
    }

    fn a_rrset(name: &str, addr: &str) -> RRset {
        RRset::from_rdata(
            name.to_string(),
            RecordType::A,
            RecordClass::IN,
            300,
            Rdata::new(vec![addr.into()]),
        )
    }

    #[test]
    fn test_add_and_lookup() {
        let mut zone = Zone::new("example.com.", 3600).unwrap();
        zone.add_rrset(soa_rrset()).unwrap();
        zone.add_rrset(a_rrset("www", "192.0.2.1")).unwrap();

        assert!(zone.soa().is_some());
        assert!(zone.rrset("www", RecordType::A).is_some());
        // absolute lookups reduce to the relative owner
        assert!(zone.rrset("www.example.com.", RecordType::A).is_some());
        assert!(zone.rrset("mail", RecordType::A).is_none());
    }

    #[test]
    fn test_add_appends_multi_value() {
        let mut zone = Zone::new("example.com.", 3600).unwrap();
        zone.add_rrset(soa_rrset()).unwrap();
        zone.add_rrset(a_rrset("www2", "192.0.2.1")).unwrap();
        zone.add_rrset(a_rrset("www2", "192.0.2.2")).unwrap();

        let set = zone.rrset("www2", RecordType::A).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_duplicate_soa_rejected() {
        let mut zone = Zone::new("example.com.", 3600).unwrap();
        zone.add_rrset(soa_rrset()).unwrap();
        assert!(matches!(
            zone.add_rrset(soa_rrset()),
            Err(ZoneCraftError::DuplicateSoa)
        ));
    }

    #[test]
    fn test_soa_must_be_at_apex() {
        let mut zone = Zone::new("example.com.", 3600).unwrap();
        let mut soa = soa_rrset();
        soa.name = "sub".to_string();
        assert!(zone.add_rrset(soa).is_err());
    }

    #[test]
    fn test_delete_exact_leaves_siblings() {
        let mut zone = Zone::new("example.com.", 3600).unwrap();
        zone.add_rrset(soa_rrset()).unwrap();
        zone.add_rrset(a_rrset("www2", "192.0.2.1")).unwrap();
        zone.add_rrset(a_rrset("www2", "192.0.2.2")).unwrap();

        assert!(zone.delete_rdata_exact(
            "www2",
            RecordType::A,
            &Rdata::new(vec!["192.0.2.1".into()])
        ));
        let set = zone.rrset("www2", RecordType::A).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rdatas[0].fields[0], "192.0.2.2");
    }

    #[test]
    fn test_delete_exact_miss_returns_false() {
        let mut zone = Zone::new("example.com.", 3600).unwrap();
        zone.add_rrset(soa_rrset()).unwrap();
        zone.add_rrset(a_rrset("www", "192.0.2.1")).unwrap();
        assert!(!zone.delete_rdata_exact(
            "www",
            RecordType::A,
            &Rdata::new(vec!["192.0.2.99".into()])
        ));
    }

    #[test]
    fn test_set_serial() {
        let mut zone = Zone::new("example.com.", 3600).unwrap();
        zone.add_rrset(soa_rrset()).unwrap();
        zone.set_serial(20250830).unwrap();
        assert_eq!(zone.soa().unwrap().rdatas[0].fields[2], "20250830");
    }

    #[test]
    fn test_serialization_leads_with_soa() {
        let mut zone = Zone::new("example.com.", 3600).unwrap();
        zone.add_rrset(a_rrset("www", "192.0.2.1")).unwrap();
        zone.add_rrset(soa_rrset()).unwrap();

        let text = zone.to_zonefile_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "$ORIGIN example.com.");
        assert!(lines[2].contains("SOA"));
    }
}
