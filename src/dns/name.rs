//! Domain name text handling: owner-name normalization relative to a zone
//! origin, absolute/relative conversion, and the SOA responsible-party
//! email <-> escaped-dot zone form.
//!
//! Origins are always fully qualified, lowercase, and dot-terminated
//! (`example.com.`). Names stored in a zone are relative (`@` for the apex,
//! `www` for `www.example.com.`); absolute names carry the trailing dot.

use crate::error::{Result, ZoneCraftError};

/// Canonicalize a zone origin: lowercase, exactly one trailing dot.
pub fn canonical_origin(origin: &str) -> Result<String> {
    let trimmed = origin.trim().trim_end_matches('.').to_lowercase();
    if trimmed.is_empty() || trimmed.split('.').any(|l| l.is_empty() || l.len() > 63) {
        return Err(ZoneCraftError::BadRequest(format!(
            "invalid zone origin: {origin}"
        )));
    }
    Ok(format!("{trimmed}."))
}

/// Express `name` relative to `origin`. Absolute names inside the zone are
/// reduced to their relative part, the origin itself becomes `@`, and
/// out-of-zone absolute names are kept fully qualified.
pub fn relativize(name: &str, origin: &str) -> String {
    let n = name.trim().to_lowercase();
    if n.is_empty() || n == "@" || n == origin {
        return "@".to_string();
    }
    if !n.ends_with('.') {
        // already relative
        return n;
    }
    match n.strip_suffix(&format!(".{origin}")) {
        Some(relative) if !relative.is_empty() => relative.to_string(),
        _ => n,
    }
}

/// Expand `name` to absolute dot-terminated text against `origin`.
pub fn absolutize(name: &str, origin: &str) -> String {
    let n = name.trim();
    if n.is_empty() || n == "@" {
        return origin.to_string();
    }
    if n.ends_with('.') {
        return n.to_string();
    }
    format!("{n}.{origin}")
}

/// Convert a conventional email address to zone-file responsible-party form:
/// `hostmaster@example.com` -> `hostmaster.example.com.` with any dots in the
/// local part escaped (`john.doe@x.com` -> `john\.doe.x.com.`).
pub fn email_to_zone_format(email: &str) -> Result<String> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ZoneCraftError::BadRequest(format!("invalid email address: {email}")))?;
    if local.is_empty() || domain.is_empty() {
        return Err(ZoneCraftError::BadRequest(format!(
            "invalid email address: {email}"
        )));
    }
    let escaped_local = local.replace('.', "\\.");
    Ok(format!("{escaped_local}.{}.", domain.trim_end_matches('.')))
}

/// Convert a zone-file responsible-party name back to a conventional email
/// address: the first unescaped dot (with at least one more dot after it)
/// becomes `@` and escaped dots are unescaped. Single-label names are
/// returned unchanged.
pub fn rname_to_email(rname: &str) -> String {
    let value = rname.trim_end_matches('.');
    let bytes: Vec<char> = value.chars().collect();

    // locate unescaped dots
    let mut dot_positions = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '\\' {
            i += 2;
            continue;
        }
        if bytes[i] == '.' {
            dot_positions.push(i);
        }
        i += 1;
    }
    if dot_positions.len() < 2 {
        return value.to_string();
    }

    let split_at = dot_positions[0];
    let local: String = bytes[..split_at].iter().collect();
    let domain: String = bytes[split_at + 1..].iter().collect();
    format!("{}@{}", local.replace("\\.", "."), domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_origin() {
        assert_eq!(canonical_origin("Example.COM").unwrap(), "example.com.");
        assert_eq!(canonical_origin("example.com.").unwrap(), "example.com.");
        assert!(canonical_origin("").is_err());
        assert!(canonical_origin("bad..name").is_err());
    }

    #[test]
    fn test_relativize() {
        let origin = "example.com.";
        assert_eq!(relativize("@", origin), "@");
        assert_eq!(relativize("example.com.", origin), "@");
        assert_eq!(relativize("www.example.com.", origin), "www");
        assert_eq!(relativize("www", origin), "www");
        assert_eq!(relativize("ns.other.org.", origin), "ns.other.org.");
    }

    #[test]
    fn test_absolutize() {
        let origin = "example.com.";
        assert_eq!(absolutize("@", origin), "example.com.");
        assert_eq!(absolutize("www", origin), "www.example.com.");
        assert_eq!(absolutize("ns.other.org.", origin), "ns.other.org.");
    }

    #[test]
    fn test_email_round_trip() {
        let zone_form = email_to_zone_format("hostmaster@example.com").unwrap();
        assert_eq!(zone_form, "hostmaster.example.com.");
        assert_eq!(rname_to_email(&zone_form), "hostmaster@example.com");
    }

    #[test]
    fn test_email_with_dotted_local_part() {
        let zone_form = email_to_zone_format("john.doe@example.com").unwrap();
        assert_eq!(zone_form, "john\\.doe.example.com.");
        assert_eq!(rname_to_email(&zone_form), "john.doe@example.com");
    }

    #[test]
    fn test_single_label_rname_unchanged() {
        assert_eq!(rname_to_email("hostmaster"), "hostmaster");
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(email_to_zone_format("no-at-sign").is_err());
        assert!(email_to_zone_format("@example.com").is_err());
    }
}
