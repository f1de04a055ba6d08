//! Rdata codec: converts flat field-value maps to and from typed rdata.
//!
//! `encode` assembles fields in schema order, validates them the way the
//! zone-file text parser would, relativizes name-valued request fields
//! against the zone origin, and attaches the comment out-of-band. `decode`
//! flattens an RRset back into per-rdata field maps, rendering name-valued
//! slots as absolute text and reformatting the SOA responsible party into a
//! conventional email address.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::Serialize;

use crate::dns::enums::{RecordClass, RecordType};
use crate::dns::name;
use crate::error::{Result, ZoneCraftError};
use crate::rdata::registry::{self, NAME_SLOTS, SLOTS_TO_RELATIVIZE};
use crate::zone::record::{RRset, Rdata};

/// Flat response shape for one rdata entry
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordResponse {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub ttl: u32,
    pub data: BTreeMap<String, String>,
    pub comment: String,
    pub index: usize,
}

fn has_unescaped_dot(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '.' => return true,
            _ => i += 1,
        }
    }
    false
}

/// Construct one rdata entry from a request field map.
///
/// Fields must cover the type's schema exactly; unparsable values fail with
/// `BadRequest` before any zone state is touched.
pub fn encode(
    origin: &str,
    type_name: &str,
    _class: RecordClass,
    field_map: &BTreeMap<String, String>,
    comment: Option<String>,
) -> Result<(RecordType, Rdata)> {
    let slots = registry::schema(type_name)?;
    let rtype: RecordType = type_name.parse()?;

    let mut fields = Vec::with_capacity(slots.len());
    for slot in slots {
        let raw = field_map.get(*slot).ok_or_else(|| {
            ZoneCraftError::BadRequest(format!("missing field '{slot}' for record type {rtype}"))
        })?;
        let mut value = raw.trim().to_string();
        if value.is_empty() {
            return Err(ZoneCraftError::BadRequest(format!(
                "empty field '{slot}' for record type {rtype}"
            )));
        }

        if SLOTS_TO_RELATIVIZE.contains(slot) {
            value = name::relativize(&value, origin);
        } else if NAME_SLOTS.contains(slot) && !value.ends_with('.') && has_unescaped_dot(&value) {
            // mname/rname style fields with label separators are taken as
            // fully qualified
            value.push('.');
        }

        fields.push(value);
    }

    validate_fields(rtype, &fields)?;
    Ok((rtype, Rdata::with_comment(fields, comment)))
}

/// Flatten an RRset into per-rdata response maps.
pub fn decode(rrset: &RRset, origin: &str) -> Result<Vec<RecordResponse>> {
    let slots = registry::schema(rrset.rtype.as_str())?;
    let mut responses = Vec::with_capacity(rrset.rdatas.len());

    for (index, rdata) in rrset.rdatas.iter().enumerate() {
        let mut data = BTreeMap::new();
        for (slot, value) in slots.iter().zip(rdata.fields.iter()) {
            let rendered = if *slot == "rname" {
                name::rname_to_email(&name::absolutize(value, origin))
            } else if NAME_SLOTS.contains(slot) {
                name::absolutize(value, origin)
            } else {
                value.clone()
            };
            data.insert((*slot).to_string(), rendered);
        }
        responses.push(RecordResponse {
            name: rrset.name.clone(),
            rtype: rrset.rtype.as_str().to_string(),
            ttl: rrset.ttl,
            data,
            comment: rdata.comment.clone().unwrap_or_default(),
            index,
        });
    }
    Ok(responses)
}

fn bad(msg: String) -> ZoneCraftError {
    ZoneCraftError::BadRequest(msg)
}

fn check_name(slot: &str, value: &str) -> Result<()> {
    let bare = value.trim_end_matches('.');
    if bare.is_empty() && value != "." && value != "@" {
        return Err(bad(format!("invalid domain name in '{slot}': {value}")));
    }
    if value == "@" || value == "." {
        return Ok(());
    }
    if value.len() > 255 {
        return Err(bad(format!("domain name too long in '{slot}': {value}")));
    }
    // split on unescaped dots only; escaped dots stay inside their label
    let mut label_len = 0usize;
    let chars: Vec<char> = bare.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                label_len += 1;
                i += 2;
            }
            '.' => {
                if label_len == 0 || label_len > 63 {
                    return Err(bad(format!("invalid label in '{slot}': {value}")));
                }
                label_len = 0;
                i += 1;
            }
            c if c.is_whitespace() => {
                return Err(bad(format!("invalid domain name in '{slot}': {value}")));
            }
            _ => {
                label_len += 1;
                i += 1;
            }
        }
    }
    if label_len == 0 || label_len > 63 {
        return Err(bad(format!("invalid label in '{slot}': {value}")));
    }
    Ok(())
}

fn check_u8(slot: &str, value: &str) -> Result<()> {
    value
        .parse::<u8>()
        .map(|_| ())
        .map_err(|_| bad(format!("invalid value for '{slot}': {value}")))
}

fn check_u16(slot: &str, value: &str) -> Result<()> {
    value
        .parse::<u16>()
        .map(|_| ())
        .map_err(|_| bad(format!("invalid value for '{slot}': {value}")))
}

fn check_u32(slot: &str, value: &str) -> Result<()> {
    value
        .parse::<u32>()
        .map(|_| ())
        .map_err(|_| bad(format!("invalid value for '{slot}': {value}")))
}

/// Per-type field validation, mirroring what the zone-file text codec
/// enforces (numeric ranges, address syntax, name syntax).
pub fn validate_fields(rtype: RecordType, fields: &[String]) -> Result<()> {
    match rtype {
        RecordType::A => fields[0]
            .parse::<Ipv4Addr>()
            .map(|_| ())
            .map_err(|_| bad(format!("invalid IPv4 address: {}", fields[0]))),
        RecordType::AAAA => fields[0]
            .parse::<Ipv6Addr>()
            .map(|_| ())
            .map_err(|_| bad(format!("invalid IPv6 address: {}", fields[0]))),
        RecordType::NS | RecordType::CNAME | RecordType::PTR | RecordType::DNAME => {
            check_name("target", &fields[0])
        }
        RecordType::MX => {
            check_u16("preference", &fields[0])?;
            check_name("exchange", &fields[1])
        }
        RecordType::SOA => {
            check_name("mname", &fields[0])?;
            check_name("rname", &fields[1])?;
            for (slot, value) in ["serial", "refresh", "retry", "expire", "minimum"]
                .iter()
                .zip(&fields[2..])
            {
                check_u32(slot, value)?;
            }
            Ok(())
        }
        RecordType::TXT | RecordType::SPF => {
            if fields[0].is_empty() {
                Err(bad("TXT record requires text data".to_string()))
            } else {
                Ok(())
            }
        }
        RecordType::SRV => {
            check_u16("priority", &fields[0])?;
            check_u16("weight", &fields[1])?;
            check_u16("port", &fields[2])?;
            check_name("target", &fields[3])
        }
        RecordType::CAA => {
            check_u8("flags", &fields[0])?;
            if fields[1].is_empty() || !fields[1].chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(bad(format!("invalid CAA tag: {}", fields[1])));
            }
            Ok(())
        }
        RecordType::NSEC => check_name("next", &fields[0]),
        RecordType::HINFO | RecordType::RP => Ok(()),
        other => Err(ZoneCraftError::UnknownType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_a_record() {
        let (rtype, rdata) = encode(
            "example.com.",
            "A",
            RecordClass::IN,
            &fields(&[("address", "192.0.2.1")]),
            None,
        )
        .unwrap();
        assert_eq!(rtype, RecordType::A);
        assert_eq!(rdata.text(), "192.0.2.1");
    }

    #[test]
    fn test_encode_rejects_bad_address() {
        let err = encode(
            "example.com.",
            "A",
            RecordClass::IN,
            &fields(&[("address", "not-an-ip")]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ZoneCraftError::BadRequest(_)));
    }

    #[test]
    fn test_encode_rejects_missing_field() {
        let err = encode(
            "example.com.",
            "MX",
            RecordClass::IN,
            &fields(&[("preference", "10")]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ZoneCraftError::BadRequest(_)));
    }

    #[test]
    fn test_encode_relativizes_target() {
        let (_, rdata) = encode(
            "example.com.",
            "CNAME",
            RecordClass::IN,
            &fields(&[("target", "web.example.com.")]),
            None,
        )
        .unwrap();
        assert_eq!(rdata.text(), "web");
    }

    #[test]
    fn test_encode_keeps_out_of_zone_target_absolute() {
        let (_, rdata) = encode(
            "example.com.",
            "MX",
            RecordClass::IN,
            &fields(&[("preference", "10"), ("exchange", "mx.mailhost.org.")]),
            None,
        )
        .unwrap();
        assert_eq!(rdata.text(), "10 mx.mailhost.org.");
    }

    #[test]
    fn test_encode_soa_with_comment() {
        let map = fields(&[
            ("mname", "ns1.example.com."),
            ("rname", "hostmaster.example.com."),
            ("serial", "0"),
            ("refresh", "10800"),
            ("retry", "3600"),
            ("expire", "604800"),
            ("minimum", "3600"),
        ]);
        let (rtype, rdata) = encode(
            "example.com.",
            "SOA",
            RecordClass::IN,
            &map,
            Some("managed".to_string()),
        )
        .unwrap();
        assert_eq!(rtype, RecordType::SOA);
        assert_eq!(rdata.comment.as_deref(), Some("managed"));
        assert_eq!(
            rdata.text(),
            "ns1.example.com. hostmaster.example.com. 0 10800 3600 604800 3600"
        );
    }

    #[test]
    fn test_encode_unknown_type() {
        let err = encode(
            "example.com.",
            "BOGUS",
            RecordClass::IN,
            &BTreeMap::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ZoneCraftError::UnknownType(_)));
    }

    #[test]
    fn test_decode_renders_names_absolute() {
        let rrset = RRset::from_rdata(
            "@".to_string(),
            RecordType::MX,
            RecordClass::IN,
            3600,
            Rdata::new(vec!["10".into(), "mail".into()]),
        );
        let responses = decode(&rrset, "example.com.").unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].data["exchange"], "mail.example.com.");
        assert_eq!(responses[0].data["preference"], "10");
        assert_eq!(responses[0].index, 0);
    }

    #[test]
    fn test_decode_soa_rname_as_email() {
        let rrset = RRset::from_rdata(
            "@".to_string(),
            RecordType::SOA,
            RecordClass::IN,
            3600,
            Rdata::new(vec![
                "ns1.example.com.".into(),
                "hostmaster.example.com.".into(),
                "20250830".into(),
                "10800".into(),
                "3600".into(),
                "604800".into(),
                "3600".into(),
            ]),
        );
        let responses = decode(&rrset, "example.com.").unwrap();
        assert_eq!(responses[0].data["rname"], "hostmaster@example.com");
        assert_eq!(responses[0].data["mname"], "ns1.example.com.");
    }

    #[test]
    fn test_decode_rp_renders_both_names_absolute() {
        let rrset = RRset::from_rdata(
            "@".to_string(),
            RecordType::RP,
            RecordClass::IN,
            3600,
            Rdata::new(vec!["hostmaster.example.com.".into(), "contact".into()]),
        );
        let responses = decode(&rrset, "example.com.").unwrap();
        assert_eq!(responses[0].data["mbox"], "hostmaster.example.com.");
        assert_eq!(responses[0].data["txt"], "contact.example.com.");
    }

    #[test]
    fn test_decode_indexes_multi_value_set() {
        let mut rrset = RRset::from_rdata(
            "www".to_string(),
            RecordType::A,
            RecordClass::IN,
            300,
            Rdata::new(vec!["192.0.2.1".into()]),
        );
        rrset.rdatas.push(Rdata::new(vec!["192.0.2.2".into()]));
        let responses = decode(&rrset, "example.com.").unwrap();
        assert_eq!(responses[0].index, 0);
        assert_eq!(responses[1].index, 1);
        assert_eq!(responses[1].data["address"], "192.0.2.2");
    }
}
