//! Validation helpers shared by the record store, the loader and the
//! configuration layer.

use crate::error::StoreError;
use rustc_hash::FxHashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Largest TTL accepted anywhere (RFC 2181, section 8)
pub const MAX_TTL: i64 = 2_147_483_647;

/// Largest single TXT character-string in bytes
pub const MAX_TXT_LEN: usize = 255;

/// Check a fully qualified, trailing-dot terminated domain name.
///
/// Every label is made of ASCII alphanumerics and inner hyphens. All labels
/// but the last may also start with an underscore, so that service labels
/// such as `_dmarc` or `selector._domainkey` can carry TXT data.
pub fn is_valid_fqdn(fqdn: &str) -> bool {
    is_valid_name(fqdn, true)
}

/// Like [`is_valid_fqdn`], without underscores. Zone apexes are plain host
/// names.
pub fn is_valid_zone_fqdn(fqdn: &str) -> bool {
    is_valid_name(fqdn, false)
}

fn is_valid_name(fqdn: &str, leading_underscore: bool) -> bool {
    let Some(name) = fqdn.strip_suffix('.') else {
        return false;
    };
    if name.is_empty() {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    let last = labels.len() - 1;
    labels
        .iter()
        .enumerate()
        .all(|(i, label)| is_valid_label(label, leading_underscore && i != last))
}

fn is_valid_label(label: &str, leading_underscore: bool) -> bool {
    let bytes = label.as_bytes();
    let Some((&first, rest)) = bytes.split_first() else {
        return false;
    };
    if !(first.is_ascii_alphanumeric() || (leading_underscore && first == b'_')) {
        return false;
    }

    match rest.split_last() {
        None => true,
        Some((&last, inner)) => {
            last.is_ascii_alphanumeric()
                && inner.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'-')
        }
    }
}

/// Validate a fqdn, returning [`StoreError::InvalidFqdn`] on failure
pub fn check_fqdn(fqdn: &str) -> Result<(), StoreError> {
    if is_valid_fqdn(fqdn) {
        Ok(())
    } else {
        Err(StoreError::InvalidFqdn(fqdn.to_string()))
    }
}

/// TTLs live in `[0, 2^31 - 1]`. Zero means "use the default at query time".
pub fn check_ttl(ttl: i64) -> Result<(), StoreError> {
    if (0..=MAX_TTL).contains(&ttl) {
        Ok(())
    } else {
        Err(StoreError::InvalidTtl(ttl))
    }
}

/// Dotted-quad IPv4 literal
pub fn is_ipv4_literal(address: &str) -> bool {
    address.parse::<Ipv4Addr>().is_ok()
}

/// IPv6 literal. IPv4-mapped forms (`::ffff:192.0.2.1`) are rejected because
/// they denote an IPv4 address.
pub fn is_ipv6_literal(address: &str) -> bool {
    match address.parse::<Ipv6Addr>() {
        Ok(addr) => addr.to_ipv4_mapped().is_none(),
        Err(_) => false,
    }
}

/// Classify an address literal, if it is one
pub fn parse_address(literal: &str) -> Option<IpAddr> {
    if is_ipv4_literal(literal) {
        literal.parse().ok()
    } else if is_ipv6_literal(literal) {
        literal.parse().ok()
    } else {
        None
    }
}

/// Build an FQDN from a name relative to a zone.
///
/// `@` is the zone itself, a name ending in a dot is already absolute and
/// anything else is prefixed onto the zone.
pub fn make_fqdn(name: &str, zone: &str) -> String {
    if name == "@" {
        zone.to_string()
    } else if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.{}", name, zone)
    }
}

/// Wrap a TXT string in double quotes, escaping quotes and backslashes.
///
/// Non-printable bytes are rendered as `\DDD` decimal escapes, the zone file
/// presentation format.
pub fn quote_txt(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03}", c as u8)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Compare two unordered rdata sets as multisets
pub fn rdatas_equal<A, B>(a: &[A], b: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    if a.len() != b.len() {
        return false;
    }

    let mut seen: FxHashMap<&str, isize> = FxHashMap::default();
    for rdata in a {
        *seen.entry(rdata.as_ref()).or_default() += 1;
    }
    for rdata in b {
        match seen.get_mut(rdata.as_ref()) {
            Some(count) => *count -= 1,
            None => return false,
        }
    }
    seen.values().all(|&count| count == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fqdns() {
        for fqdn in [
            "com.",
            "example.com.",
            "www.example.com.",
            "a-b.example.com.",
            "1.example.com.",
            "_dmarc.example.com.",
            "sel._domainkey.example.com.",
            "_.example.com.",
            "_a-1.example.com.",
            "EXAMPLE.com.",
        ] {
            assert!(is_valid_fqdn(fqdn), "{fqdn} should be valid");
        }
    }

    #[test]
    fn test_invalid_fqdns() {
        for fqdn in [
            "",
            ".",
            "example.com",
            "example..com.",
            ".example.com.",
            "-www.example.com.",
            "www-.example.com.",
            "ex ample.com.",
            "example.com_.",
            "example._com.",
            "*.example.com.",
            "a_b.example.com.",
            "b_.example.com.",
            "__dmarc.example.com.",
            "_-.example.com.",
        ] {
            assert!(!is_valid_fqdn(fqdn), "{fqdn:?} should be invalid");
        }
    }

    #[test]
    fn test_zone_fqdns_without_underscores() {
        assert!(is_valid_zone_fqdn("example.com."));
        assert!(is_valid_zone_fqdn("a-b.example.com."));
        assert!(!is_valid_zone_fqdn("_dmarc.example.com."));
        assert!(!is_valid_zone_fqdn("example.com"));
    }

    #[test]
    fn test_ttl_bounds() {
        assert!(check_ttl(0).is_ok());
        assert!(check_ttl(MAX_TTL).is_ok());
        assert_eq!(check_ttl(-1), Err(StoreError::InvalidTtl(-1)));
        assert_eq!(
            check_ttl(MAX_TTL + 1),
            Err(StoreError::InvalidTtl(MAX_TTL + 1))
        );
    }

    #[test]
    fn test_address_literals() {
        assert!(is_ipv4_literal("192.0.2.1"));
        assert!(!is_ipv4_literal("2001:db8::1"));
        assert!(!is_ipv4_literal("192.0.2"));
        assert!(is_ipv6_literal("2001:db8::1"));
        assert!(is_ipv6_literal("::1"));
        assert!(!is_ipv6_literal("::ffff:192.0.2.1"));
        assert!(!is_ipv6_literal("192.0.2.1"));
        assert_eq!(parse_address("nonsense"), None);
    }

    #[test]
    fn test_make_fqdn() {
        assert_eq!(make_fqdn("@", "example.com."), "example.com.");
        assert_eq!(make_fqdn("www", "example.com."), "www.example.com.");
        assert_eq!(make_fqdn("other.org.", "example.com."), "other.org.");
    }

    #[test]
    fn test_quote_txt() {
        assert_eq!(quote_txt("hello"), "\"hello\"");
        assert_eq!(quote_txt("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_txt("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn test_rdatas_equal() {
        assert!(rdatas_equal(&["a", "b"], &["b", "a"]));
        assert!(rdatas_equal::<&str, &str>(&[], &[]));
        assert!(!rdatas_equal(&["a", "a"], &["a", "b"]));
        assert!(!rdatas_equal(&["a"], &["a", "a"]));
        assert!(rdatas_equal(&["a".to_string()], &["a"]));
    }
}
