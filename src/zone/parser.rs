//! RFC 1035 master-file parser.
//!
//! Supports `$ORIGIN` and `$TTL` directives, parenthesized multi-line
//! records, and `;` comments. A comment trailing a record line is kept and
//! attached to that record's rdata so it survives a write/reload cycle.

use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use super::record::{RRset, Rdata};
use super::zone::Zone;
use crate::dns::enums::{RecordClass, RecordType};
use crate::dns::name;
use crate::error::{Result, ZoneCraftError};
use crate::rdata::{codec, registry};

/// Default TTL when neither the file nor a record specifies one (1 hour)
pub const FALLBACK_TTL: u32 = 3600;

/// Maximum zone file size (10MB)
pub const MAX_ZONE_FILE_SIZE: usize = 10 * 1024 * 1024;

pub struct ZoneParser {
    current_ttl: Option<u32>,
    current_class: RecordClass,
    last_owner: Option<String>,
    line_number: usize,
}

struct ParsedLine {
    record: RRset,
}

impl ZoneParser {
    pub fn new() -> Self {
        Self {
            current_ttl: None,
            current_class: RecordClass::IN,
            last_owner: None,
            line_number: 0,
        }
    }

    /// Parse a zone file from disk. `origin` is the zone the file is expected
    /// to hold (derived from the file name by the directory layer).
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P, origin: &str) -> Result<Zone> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        if contents.len() > MAX_ZONE_FILE_SIZE {
            return Err(ZoneCraftError::ZoneParse(format!(
                "zone file {} exceeds maximum size",
                path.display()
            )));
        }
        self.parse(&contents, Some(origin))
    }

    /// Parse zone file contents. When `origin` is None the file must carry an
    /// `$ORIGIN` directive.
    pub fn parse(&mut self, contents: &str, origin: Option<&str>) -> Result<Zone> {
        self.line_number = 0;
        let mut zone_origin = origin.map(|o| o.to_string());
        let mut pending: Vec<(RRset, usize)> = Vec::new();
        let mut default_ttl: Option<u32> = None;

        let mut multi_line_buffer = String::new();
        let mut multi_line_comments: Vec<String> = Vec::new();
        let mut in_parentheses = false;
        let mut paren_start_line = 0;

        for raw_line in contents.lines() {
            self.line_number += 1;
            let (line, comment) = strip_comment(raw_line);
            if line.trim().is_empty() && !in_parentheses {
                continue;
            }
            trace!(line = self.line_number, "parsing {}", line);

            if in_parentheses {
                multi_line_buffer.push(' ');
                multi_line_buffer.push_str(line.trim());
                if let Some(comment) = comment {
                    multi_line_comments.push(comment.to_string());
                }
                if line.contains(')') {
                    in_parentheses = false;
                    let complete = multi_line_buffer.replace(['(', ')'], " ");
                    multi_line_buffer.clear();
                    let combined = (!multi_line_comments.is_empty())
                        .then(|| multi_line_comments.join(" "));
                    multi_line_comments.clear();
                    let parsed = self
                        .parse_record(&complete, combined.as_deref())
                        .map_err(|e| {
                            ZoneCraftError::ZoneParse(format!(
                                "lines {}-{}: {}",
                                paren_start_line, self.line_number, e
                            ))
                        })?;
                    pending.push((parsed.record, paren_start_line));
                }
                continue;
            }

            if line.contains('(') && !line.contains(')') {
                in_parentheses = true;
                paren_start_line = self.line_number;
                multi_line_buffer = line.to_string();
                multi_line_comments.clear();
                if let Some(comment) = comment {
                    multi_line_comments.push(comment.to_string());
                }
                continue;
            }

            if line.trim_start().starts_with('$') {
                self.parse_directive(line, &mut zone_origin, &mut default_ttl)?;
                continue;
            }

            let parsed = self.parse_record(line, comment).map_err(|e| {
                ZoneCraftError::ZoneParse(format!("line {}: {}", self.line_number, e))
            })?;
            pending.push((parsed.record, self.line_number));
        }

        if in_parentheses {
            return Err(ZoneCraftError::ZoneParse(format!(
                "unclosed parentheses starting at line {paren_start_line}"
            )));
        }

        let origin = zone_origin.ok_or_else(|| {
            ZoneCraftError::ZoneParse("zone file missing $ORIGIN directive".to_string())
        })?;

        let mut zone = Zone::new(&origin, default_ttl.unwrap_or(FALLBACK_TTL))?;
        for (mut record, line) in pending {
            if record.ttl == 0 {
                record.ttl = zone.default_ttl;
            }
            relativize_rdata(&mut record, &zone.origin);
            zone.add_rrset(record)
                .map_err(|e| ZoneCraftError::ZoneParse(format!("line {line}: {e}")))?;
        }
        zone.validate()?;

        debug!(
            origin = %zone.origin,
            records = zone.iter_rrsets().count(),
            "parsed zone"
        );
        Ok(zone)
    }

    fn parse_directive(
        &mut self,
        line: &str,
        zone_origin: &mut Option<String>,
        default_ttl: &mut Option<u32>,
    ) -> Result<()> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0].to_uppercase().as_str() {
            "$ORIGIN" => {
                let value = parts.get(1).ok_or_else(|| {
                    ZoneCraftError::ZoneParse("$ORIGIN requires a domain name".to_string())
                })?;
                if zone_origin.is_none() {
                    *zone_origin = Some((*value).to_string());
                }
                debug!("origin directive: {}", value);
            }
            "$TTL" => {
                let value = parts.get(1).ok_or_else(|| {
                    ZoneCraftError::ZoneParse("$TTL requires a value".to_string())
                })?;
                let ttl = parse_ttl(value)?;
                self.current_ttl = Some(ttl);
                *default_ttl = Some(ttl);
            }
            other => {
                debug!("ignoring unsupported directive: {}", other);
            }
        }
        Ok(())
    }

    /// Parse one record line into an RRset holding a single rdata.
    fn parse_record(&mut self, line: &str, comment: Option<&str>) -> Result<ParsedLine> {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return Err(ZoneCraftError::ZoneParse("empty record line".to_string()));
        }

        let mut idx = 0;
        let name = if line.starts_with(' ') || line.starts_with('\t') {
            // blank owner inherits the previous record's owner; before any
            // record has named one, the apex
            self.last_owner.clone().unwrap_or_else(|| "@".to_string())
        } else {
            idx += 1;
            tokens[0].clone()
        };
        self.last_owner = Some(name.clone());

        let mut ttl = self.current_ttl;
        let mut class = self.current_class;
        let mut rtype = None;
        while idx < tokens.len() {
            let field = &tokens[idx];
            if let Ok(parsed_ttl) = parse_ttl(field) {
                ttl = Some(parsed_ttl);
                idx += 1;
                continue;
            }
            if let Ok(parsed_class) = field.parse::<RecordClass>() {
                class = parsed_class;
                idx += 1;
                continue;
            }
            if let Ok(parsed_type) = field.parse::<RecordType>() {
                rtype = Some(parsed_type);
                idx += 1;
                break;
            }
            return Err(ZoneCraftError::ZoneParse(format!(
                "unrecognized field: {field}"
            )));
        }
        let rtype =
            rtype.ok_or_else(|| ZoneCraftError::ZoneParse("missing record type".to_string()))?;
        if idx >= tokens.len() {
            return Err(ZoneCraftError::ZoneParse("missing rdata".to_string()));
        }

        let fields = split_rdata(rtype, &tokens[idx..])?;
        codec::validate_fields(rtype, &fields)?;

        let rdata = Rdata::with_comment(fields, comment.map(|c| c.to_string()));
        Ok(ParsedLine {
            record: RRset::from_rdata(name, rtype, class, ttl.unwrap_or(0), rdata),
        })
    }
}

impl Default for ZoneParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce name-valued rdata fields to their in-zone relative form, matching
/// how request-sourced rdata is stored. Keeps exact-match comparison working
/// no matter how the file spelled the name.
fn relativize_rdata(record: &mut RRset, origin: &str) {
    let Ok(slots) = registry::schema(record.rtype.as_str()) else {
        return;
    };
    for rdata in &mut record.rdatas {
        for (slot, value) in slots.iter().zip(rdata.fields.iter_mut()) {
            if registry::SLOTS_TO_RELATIVIZE.contains(slot) {
                *value = name::relativize(value, origin);
            }
        }
    }
}

/// Split a line at the first `;` outside of quotes. Returns the code part
/// and the trimmed comment, if any.
fn strip_comment(line: &str) -> (&str, Option<&str>) {
    let mut in_quotes = false;
    for (pos, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                let comment = line[pos + 1..].trim();
                let comment = (!comment.is_empty()).then_some(comment);
                return (&line[..pos], comment);
            }
            _ => {}
        }
    }
    (line, None)
}

/// Whitespace tokenizer that keeps quoted strings intact.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Distribute rdata tokens over the type's field schema: one token per slot,
/// with the final slot absorbing the remainder (quoted text, type bitmaps).
fn split_rdata(rtype: RecordType, tokens: &[String]) -> Result<Vec<String>> {
    let slots = registry::schema(rtype.as_str())
        .map_err(|_| ZoneCraftError::InvalidRRType(rtype.to_string()))?;
    if tokens.len() < slots.len() {
        return Err(ZoneCraftError::ZoneParse(format!(
            "{} record requires {} fields, got {}",
            rtype,
            slots.len(),
            tokens.len()
        )));
    }
    let mut fields: Vec<String> = tokens[..slots.len() - 1].to_vec();
    let tail = tokens[slots.len() - 1..].join(" ");
    fields.push(unquote(&tail));
    Ok(fields)
}

fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        let inner = &trimmed[1..trimmed.len() - 1];
        // only strip when the quotes wrap the whole value
        if !inner.contains('"') {
            return inner.to_string();
        }
    }
    trimmed.to_string()
}

/// Parse a TTL value, accepting `1h`-style duration suffixes.
pub fn parse_ttl(s: &str) -> Result<u32> {
    let s = s.to_lowercase();
    let parse = |num: &str, unit: u32| {
        num.parse::<u32>()
            .map(|n| n * unit)
            .map_err(|_| ZoneCraftError::InvalidTtl(s.to_string()))
    };
    if let Some(num) = s.strip_suffix('s') {
        parse(num, 1)
    } else if let Some(num) = s.strip_suffix('m') {
        parse(num, 60)
    } else if let Some(num) = s.strip_suffix('h') {
        parse(num, 3600)
    } else if let Some(num) = s.strip_suffix('d') {
        parse(num, 86400)
    } else if let Some(num) = s.strip_suffix('w') {
        parse(num, 604800)
    } else {
        parse(&s, 1)
    }
}
