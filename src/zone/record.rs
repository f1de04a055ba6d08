use crate::dns::enums::{RecordClass, RecordType};

/// One typed rdata value: ordered field values per the record type's schema,
/// plus an optional free-text comment carried out-of-band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdata {
    pub fields: Vec<String>,
    pub comment: Option<String>,
}

impl Rdata {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            comment: None,
        }
    }

    pub fn with_comment(fields: Vec<String>, comment: Option<String>) -> Self {
        Self { fields, comment }
    }

    /// Canonical zone-file text form: field values joined in schema order.
    pub fn text(&self) -> String {
        self.fields.join(" ")
    }

    /// Value equality, ignoring the comment. Exact-match deletion compares
    /// data, not annotations.
    pub fn same_value(&self, other: &Rdata) -> bool {
        self.fields == other.fields
    }
}

/// A record set: all rdata sharing one (name, type), with a common TTL.
///
/// `name` is stored relative to the zone origin (`@` for the apex).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRset {
    pub name: String,
    pub rtype: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub rdatas: Vec<Rdata>,
}

impl RRset {
    pub fn new(name: String, rtype: RecordType, class: RecordClass, ttl: u32) -> Self {
        Self {
            name,
            rtype,
            class,
            ttl,
            rdatas: Vec::new(),
        }
    }

    pub fn from_rdata(
        name: String,
        rtype: RecordType,
        class: RecordClass,
        ttl: u32,
        rdata: Rdata,
    ) -> Self {
        Self {
            name,
            rtype,
            class,
            ttl,
            rdatas: vec![rdata],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rdatas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rdatas.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdata_text_join() {
        let rdata = Rdata::new(vec!["10".into(), "mail.example.com.".into()]);
        assert_eq!(rdata.text(), "10 mail.example.com.");
    }

    #[test]
    fn test_same_value_ignores_comment() {
        let a = Rdata::with_comment(vec!["192.0.2.1".into()], Some("primary".into()));
        let b = Rdata::new(vec!["192.0.2.1".into()]);
        assert!(a.same_value(&b));
    }
}
