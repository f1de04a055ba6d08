//! Minimal DNS wire codec: enough to issue an AXFR query and walk the
//! answer records of the responses. Names are decoded compression-aware
//! against the full message buffer.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::enums::RecordType;
use crate::error::{Result, ZoneCraftError};

pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_NXDOMAIN: u8 = 3;
pub const RCODE_REFUSED: u8 = 5;
pub const RCODE_NOTAUTH: u8 = 9;

const HEADER_LEN: usize = 12;
const MAX_NAME_LEN: usize = 255;
const MAX_POINTER_JUMPS: usize = 16;

fn truncated() -> ZoneCraftError {
    ZoneCraftError::BadGateway("truncated DNS message".to_string())
}

/// Encode a domain name as uncompressed wire labels.
pub fn encode_name(name: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.trim_end_matches('.').split('.') {
        if label.is_empty() {
            continue;
        }
        if label.len() > 63 {
            return Err(ZoneCraftError::BadRequest(format!(
                "label too long in name '{name}'"
            )));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    if out.len() > MAX_NAME_LEN {
        return Err(ZoneCraftError::BadRequest(format!(
            "name too long: '{name}'"
        )));
    }
    Ok(out)
}

/// Build a single-question query message.
pub fn build_query(id: u16, qname: &str, qtype: RecordType) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + qname.len() + 6);
    out.extend_from_slice(&id.to_be_bytes());
    out.extend_from_slice(&[0x00, 0x00]); // flags: standard query
    out.extend_from_slice(&1u16.to_be_bytes()); // qdcount
    out.extend_from_slice(&[0; 6]); // an/ns/ar counts
    out.extend_from_slice(&encode_name(qname)?);
    out.extend_from_slice(&qtype.to_u16().to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // class IN
    Ok(out)
}

/// One answer record, with its rdata left in place in the message buffer so
/// compressed names inside it can still be resolved.
#[derive(Debug)]
pub struct WireRecord {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    rdata_start: usize,
    rdata_len: usize,
}

#[derive(Debug)]
pub struct Message {
    pub id: u16,
    pub flags: u16,
    pub answers: Vec<WireRecord>,
}

impl Message {
    pub fn rcode(&self) -> u8 {
        (self.flags & 0x000F) as u8
    }
}

/// Parse a response message: header, skip the question section, decode the
/// answer section. Authority and additional sections are ignored.
pub fn parse_message(buf: &[u8]) -> Result<Message> {
    if buf.len() < HEADER_LEN {
        return Err(truncated());
    }
    let id = u16::from_be_bytes([buf[0], buf[1]]);
    let flags = u16::from_be_bytes([buf[2], buf[3]]);
    let qdcount = u16::from_be_bytes([buf[4], buf[5]]);
    let ancount = u16::from_be_bytes([buf[6], buf[7]]);

    let mut pos = HEADER_LEN;
    for _ in 0..qdcount {
        let (_, next) = decode_name(buf, pos)?;
        pos = next + 4; // qtype + qclass
        if pos > buf.len() {
            return Err(truncated());
        }
    }

    let mut answers = Vec::with_capacity(ancount as usize);
    for _ in 0..ancount {
        let (name, next) = decode_name(buf, pos)?;
        pos = next;
        if pos + 10 > buf.len() {
            return Err(truncated());
        }
        let rtype = u16::from_be_bytes([buf[pos], buf[pos + 1]]);
        let class = u16::from_be_bytes([buf[pos + 2], buf[pos + 3]]);
        let ttl = u32::from_be_bytes([buf[pos + 4], buf[pos + 5], buf[pos + 6], buf[pos + 7]]);
        let rdata_len = u16::from_be_bytes([buf[pos + 8], buf[pos + 9]]) as usize;
        pos += 10;
        if pos + rdata_len > buf.len() {
            return Err(truncated());
        }
        answers.push(WireRecord {
            name,
            rtype,
            class,
            ttl,
            rdata_start: pos,
            rdata_len,
        });
        pos += rdata_len;
    }

    Ok(Message { id, flags, answers })
}

/// Decode a possibly-compressed name at `pos`. Returns the dotted name and
/// the offset just past the name in the original stream.
fn decode_name(buf: &[u8], pos: usize) -> Result<(String, usize)> {
    let mut labels: Vec<String> = Vec::new();
    let mut pos = pos;
    let mut end: Option<usize> = None;
    let mut jumps = 0;
    let mut name_len = 0;

    loop {
        let len = *buf.get(pos).ok_or_else(truncated)? as usize;
        if len & 0xC0 == 0xC0 {
            // compression pointer
            let lo = *buf.get(pos + 1).ok_or_else(truncated)? as usize;
            if end.is_none() {
                end = Some(pos + 2);
            }
            pos = ((len & 0x3F) << 8) | lo;
            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return Err(ZoneCraftError::BadGateway(
                    "compression pointer loop in DNS name".to_string(),
                ));
            }
            continue;
        }
        if len == 0 {
            pos += 1;
            break;
        }
        let label = buf
            .get(pos + 1..pos + 1 + len)
            .ok_or_else(truncated)?;
        name_len += len + 1;
        if name_len > MAX_NAME_LEN {
            return Err(ZoneCraftError::BadGateway(
                "DNS name exceeds length limit".to_string(),
            ));
        }
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos += 1 + len;
    }

    let name = if labels.is_empty() {
        ".".to_string()
    } else {
        format!("{}.", labels.join("."))
    };
    Ok((name, end.unwrap_or(pos)))
}

/// Render a record's rdata into schema-ordered text fields. Types outside
/// the registry come back as None and the caller decides whether to skip.
pub fn record_fields(buf: &[u8], rec: &WireRecord) -> Result<Option<Vec<String>>> {
    let rdata = &buf[rec.rdata_start..rec.rdata_start + rec.rdata_len];
    let Some(rtype) = RecordType::from_u16(rec.rtype) else {
        return Ok(None);
    };

    let fields = match rtype {
        RecordType::A => {
            let octets: [u8; 4] = rdata.try_into().map_err(|_| truncated())?;
            vec![Ipv4Addr::from(octets).to_string()]
        }
        RecordType::AAAA => {
            let octets: [u8; 16] = rdata.try_into().map_err(|_| truncated())?;
            vec![Ipv6Addr::from(octets).to_string()]
        }
        RecordType::NS | RecordType::CNAME | RecordType::PTR | RecordType::DNAME => {
            let (name, _) = decode_name(buf, rec.rdata_start)?;
            vec![name]
        }
        RecordType::MX => {
            if rdata.len() < 2 {
                return Err(truncated());
            }
            let pref = u16::from_be_bytes([rdata[0], rdata[1]]);
            let (exchange, _) = decode_name(buf, rec.rdata_start + 2)?;
            vec![pref.to_string(), exchange]
        }
        RecordType::SOA => {
            let (mname, next) = decode_name(buf, rec.rdata_start)?;
            let (rname, next) = decode_name(buf, next)?;
            let tail = buf
                .get(next..next + 20)
                .ok_or_else(truncated)?;
            let mut fields = vec![mname, rname];
            for chunk in tail.chunks_exact(4) {
                let v = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                fields.push(v.to_string());
            }
            fields
        }
        RecordType::SRV => {
            if rdata.len() < 6 {
                return Err(truncated());
            }
            let priority = u16::from_be_bytes([rdata[0], rdata[1]]);
            let weight = u16::from_be_bytes([rdata[2], rdata[3]]);
            let port = u16::from_be_bytes([rdata[4], rdata[5]]);
            let (target, _) = decode_name(buf, rec.rdata_start + 6)?;
            vec![
                priority.to_string(),
                weight.to_string(),
                port.to_string(),
                target,
            ]
        }
        RecordType::TXT | RecordType::SPF => {
            // character-strings concatenated into one text field
            let mut text = String::new();
            let mut pos = 0;
            while pos < rdata.len() {
                let len = rdata[pos] as usize;
                let chunk = rdata
                    .get(pos + 1..pos + 1 + len)
                    .ok_or_else(truncated)?;
                text.push_str(&String::from_utf8_lossy(chunk));
                pos += 1 + len;
            }
            vec![text]
        }
        RecordType::CAA => {
            if rdata.len() < 2 {
                return Err(truncated());
            }
            let flags = rdata[0];
            let tag_len = rdata[1] as usize;
            let tag = rdata.get(2..2 + tag_len).ok_or_else(truncated)?;
            let value = rdata.get(2 + tag_len..).ok_or_else(truncated)?;
            vec![
                flags.to_string(),
                String::from_utf8_lossy(tag).into_owned(),
                String::from_utf8_lossy(value).into_owned(),
            ]
        }
        _ => return Ok(None),
    };
    Ok(Some(fields))
}

/// Build a response message carrying raw answer records. The transfer test
/// servers use this; real responses come off the wire.
pub fn build_response(
    id: u16,
    rcode: u8,
    question: (&str, RecordType),
    answers: &[(String, RecordType, u32, Vec<u8>)],
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(&id.to_be_bytes());
    let flags: u16 = 0x8400 | rcode as u16; // QR + AA
    out.extend_from_slice(&flags.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(answers.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&encode_name(question.0)?);
    out.extend_from_slice(&question.1.to_u16().to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    for (name, rtype, ttl, rdata) in answers {
        out.extend_from_slice(&encode_name(name)?);
        out.extend_from_slice(&rtype.to_u16().to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&ttl.to_be_bytes());
        out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(rdata);
    }
    Ok(out)
}

/// Wire-encode SOA rdata (uncompressed names).
pub fn soa_rdata(
    mname: &str,
    rname: &str,
    serial: u32,
    refresh: u32,
    retry: u32,
    expire: u32,
    minimum: u32,
) -> Result<Vec<u8>> {
    let mut out = encode_name(mname)?;
    out.extend_from_slice(&encode_name(rname)?);
    for v in [serial, refresh, retry, expire, minimum] {
        out.extend_from_slice(&v.to_be_bytes());
    }
    Ok(out)
}
