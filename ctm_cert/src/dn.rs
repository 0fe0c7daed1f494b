// SPDX-License-Identifier: Apache-2.0
//! Subject identity rendering: Common Name, a human-readable Distinguished
//! Name, and the decimal serial number. The RDN walk follows
//! `extract_name`'s `attr.attr_type().to_id_string()` OID match in
//! `ct/parser.rs`, generalized from a fixed `Subject` struct into a
//! `(name, value)` list so the generic comma-joined DN string spec.md §3
//! asks for can be built from it too.
use x509_parser::certificate::TbsCertificate;
use x509_parser::prelude::X509Name;

/// Well-known attribute OIDs down to their conventional short name, per
/// RFC 4519 / RFC 4514.
const KNOWN_ATTRS: &[(&str, &str)] = &[
    ("2.5.4.3", "CN"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.6", "C"),
    ("2.5.4.8", "ST"),
    ("2.5.4.7", "L"),
    ("2.5.4.5", "SERIALNUMBER"),
    ("2.5.4.4", "SN"),
    ("2.5.4.42", "GN"),
    ("1.2.840.113549.1.9.1", "emailAddress"),
];

fn attr_short_name(oid: &str) -> &str {
    KNOWN_ATTRS
        .iter()
        .find(|(known, _)| *known == oid)
        .map_or(oid, |(_, name)| name)
}

/// Extracts every `(short attribute name, value)` pair from a subject/issuer
/// `X509Name`, in encoded order. Attribute values that aren't valid UTF-8
/// directory strings are skipped, matching `extract_name`'s `if let Ok(value)
/// = attr.attr_value().as_str()` guard.
fn name_attrs(name: &X509Name<'_>) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            if let Ok(value) = attr.attr_value().as_str() {
                let short = attr_short_name(&attr.attr_type().to_id_string()).to_string();
                attrs.push((short, value.to_string()));
            }
        }
    }
    attrs
}

/// The first `CN=` attribute value in the subject, if any. Takes a
/// `&TbsCertificate` rather than `&X509Certificate` so the same function
/// serves both full certificates (which `Deref` to their `TbsCertificate`)
/// and bare precert TBS blocks, which never get the outer `Certificate`
/// wrapper a full `X509Certificate` has.
#[must_use]
pub fn common_name(cert: &TbsCertificate<'_>) -> Option<String> {
    name_attrs(&cert.subject)
        .into_iter()
        .find(|(k, _)| k == "CN")
        .map(|(_, v)| v)
}

/// Renders the subject as an RFC 4514-style comma-separated string, e.g.
/// `CN=example.com,O=Example Inc,C=US`.
#[must_use]
pub fn distinguished_name(cert: &TbsCertificate<'_>) -> String {
    name_attrs(&cert.subject)
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders the certificate's serial number as a decimal string.
///
/// `ct/parser.rs::format_serial_number` renders this same
/// `cert.serial.to_bytes_be()` byte string as uppercase hex, which is the
/// right call for a live broadcast payload meant to look like OpenSSL's
/// `-fingerprint` output. spec.md §3/§4.D instead mandates a *decimal*
/// serial (ported from `original_source/main.go`'s `cert.SerialNumber.String()`,
/// a `big.Int` decimal render) since it's part of the `Downloaded` primary
/// key's on-disk contract, not a display nicety — so decimal is kept here.
#[must_use]
pub fn serial_number(cert: &TbsCertificate<'_>) -> String {
    let mut bytes = cert.serial.to_bytes_be();
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes.remove(0);
    }
    bytes_to_decimal(&bytes)
}

/// Converts a big-endian byte string to its decimal representation via
/// repeated base-256-to-base-10 long division.
fn bytes_to_decimal(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "0".to_string();
    }
    let mut digits = bytes.to_vec();
    let mut decimal = Vec::new();
    while digits.iter().any(|&b| b != 0) {
        let mut remainder: u32 = 0;
        for byte in &mut digits {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 10) as u8;
            remainder = acc % 10;
        }
        decimal.push(std::char::from_digit(remainder, 10).unwrap());
        // drop leading zero bytes so the loop terminates
        while digits.len() > 1 && digits[0] == 0 {
            digits.remove(0);
        }
    }
    decimal.iter().rev().collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn attr_short_name_known_and_unknown() {
        assert_eq!(attr_short_name("2.5.4.3"), "CN");
        assert_eq!(attr_short_name("1.2.3"), "1.2.3");
    }

    #[test]
    fn bytes_to_decimal_basic() {
        assert_eq!(bytes_to_decimal(&[]), "0");
        assert_eq!(bytes_to_decimal(&[0]), "0");
        assert_eq!(bytes_to_decimal(&[0xff]), "255");
        assert_eq!(bytes_to_decimal(&[0x01, 0x00]), "256");
        assert_eq!(bytes_to_decimal(&[0x01, 0x00, 0x00]), "65536");
    }
}
