//! Record type registry: maps a record type name to its ordered field schema.
//!
//! Schemas are a static compile-time table rather than anything discovered at
//! runtime. Field names follow the conventional rdata slot names (`target`,
//! `exchange`, `mname`, ...), excluding protocol bookkeeping (class, type tag,
//! comment).

use serde::Serialize;

use crate::error::{Result, ZoneCraftError};

/// Class-independent schemas, consulted first.
const GENERIC_SCHEMAS: &[(&str, &[&str])] = &[
    ("CAA", &["flags", "tag", "value"]),
    ("CNAME", &["target"]),
    ("DNAME", &["target"]),
    ("HINFO", &["cpu", "os"]),
    ("MX", &["preference", "exchange"]),
    // Obsolete types carry an empty schema and are treated as deprecated.
    ("MD", &[]),
    ("MF", &[]),
    ("NS", &["target"]),
    ("NSEC", &["next", "windows"]),
    ("PTR", &["target"]),
    ("RP", &["mbox", "txt"]),
    (
        "SOA",
        &[
            "mname", "rname", "serial", "refresh", "retry", "expire", "minimum",
        ],
    ),
    ("SPF", &["strings"]),
    ("TXT", &["strings"]),
];

/// Class "IN" specific schemas, consulted when the generic table misses.
const IN_SCHEMAS: &[(&str, &[&str])] = &[
    ("A", &["address"]),
    ("AAAA", &["address"]),
    ("SRV", &["priority", "weight", "port", "target"]),
];

/// Rdata fields whose value is itself a domain name. These are relativized on
/// the way in and expanded to absolute text on the way out. RP's `txt` is a
/// domain name pointing at TXT records, not free text.
pub const NAME_SLOTS: &[&str] = &["target", "next", "exchange", "mname", "rname", "mbox", "txt"];

/// Rdata fields relativized against the zone origin when encoding a request.
pub const SLOTS_TO_RELATIVIZE: &[&str] = &["target", "next", "exchange"];

/// Advertised shape of one record type
#[derive(Debug, Clone, Serialize)]
pub struct RecordTypeInfo {
    #[serde(rename = "type")]
    pub type_name: String,
    pub fields: Vec<String>,
}

fn find(type_name: &str) -> Option<&'static [&'static str]> {
    let upper = type_name.to_uppercase();
    GENERIC_SCHEMAS
        .iter()
        .chain(IN_SCHEMAS.iter())
        .find(|(name, _)| *name == upper)
        .map(|(_, slots)| *slots)
}

/// Ordered field schema for a record type.
///
/// Fails for types with no known schema, and for deprecated types whose
/// schema is empty.
pub fn schema(type_name: &str) -> Result<&'static [&'static str]> {
    match find(type_name) {
        Some(slots) if !slots.is_empty() => Ok(slots),
        _ => Err(ZoneCraftError::UnknownType(type_name.to_string())),
    }
}

/// All supported record types with their schemas, sorted by type name.
/// Deprecated (empty-schema) types are skipped.
pub fn list_types() -> Vec<RecordTypeInfo> {
    let mut types: Vec<RecordTypeInfo> = GENERIC_SCHEMAS
        .iter()
        .chain(IN_SCHEMAS.iter())
        .filter(|(_, slots)| !slots.is_empty())
        .map(|(name, slots)| RecordTypeInfo {
            type_name: (*name).to_string(),
            fields: slots.iter().map(|s| (*s).to_string()).collect(),
        })
        .collect();
    types.sort_by(|a, b| a.type_name.cmp(&b.type_name));
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soa_schema_order() {
        assert_eq!(
            schema("SOA").unwrap(),
            &["mname", "rname", "serial", "refresh", "retry", "expire", "minimum"]
        );
    }

    #[test]
    fn test_case_insensitive_lookup() {
        assert_eq!(schema("mx").unwrap(), &["preference", "exchange"]);
    }

    #[test]
    fn test_unknown_and_deprecated_types_fail() {
        assert!(matches!(
            schema("BOGUS"),
            Err(ZoneCraftError::UnknownType(_))
        ));
        // MD is obsolete: present in the table but unusable
        assert!(matches!(schema("MD"), Err(ZoneCraftError::UnknownType(_))));
    }

    #[test]
    fn test_list_types_sorted_without_deprecated() {
        let types = list_types();
        let names: Vec<&str> = types.iter().map(|t| t.type_name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(!names.contains(&"MD"));
        assert!(!names.contains(&"MF"));
        assert!(names.contains(&"A"));
        assert!(names.contains(&"SOA"));
    }
}
