// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;
use tracing::warn;
use x509_parser::certificate::TbsCertificate;
use x509_parser::prelude::{FromDer, X509Certificate};

pub mod cn_filter;
pub mod dn;
pub mod leaf;

pub use leaf::{LeafDecodeError, LogEntry, MerkleTreeLeaf};

/// The identity triple retained per certificate. Primary key:
/// `(common_name, distinguished_name, serial_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertRecord {
    pub common_name: String,
    pub distinguished_name: String,
    pub serial_number: String,
}

#[derive(Debug, Error)]
pub enum EntryParseError {
    #[error(transparent)]
    Leaf(#[from] LeafDecodeError),
    /// The embedded DER certificate or TBS block failed to parse.
    #[error("certificate decode failed: {0}")]
    CertDecode(String),
}

/// Decodes a raw Merkle leaf into a [`CertRecord`], or `Ok(None)` if the
/// entry was structurally valid but its CN was filtered out (spec.md §4.D
/// step 5) — a filtered entry is not an error, just not persisted.
///
/// `X509LogEntryType` leaves are parsed as a full `X509Certificate`, exactly
/// as `ct/parser.rs::parse_certificate` does via `X509Certificate::from_der`.
/// `PrecertLogEntryType` leaves diverge from that teacher function, which
/// feeds the bare precert TBS block into the same `X509Certificate::from_der`
/// — workable there only because it never reads anything beyond what a
/// `TbsCertificate` itself carries. The identity fields spec.md §4.D needs
/// are read through `dn`'s `&TbsCertificate` API either way (an
/// `X509Certificate` derefs to its `TbsCertificate`), so precert leaves are
/// parsed directly with `TbsCertificate::from_der` — the correct parse for a
/// DER blob that lacks the outer `Certificate` SEQUENCE a full cert has.
pub fn parse_entry(leaf_input: &[u8]) -> Result<Option<CertRecord>, EntryParseError> {
    let leaf = MerkleTreeLeaf::parse(leaf_input)?;
    let log_entry = leaf.timestamped_entry.log_entry;

    let identity = match &log_entry {
        LogEntry::X509(der) => {
            let (_, cert) = X509Certificate::from_der(der)
                .map_err(|e| EntryParseError::CertDecode(e.to_string()))?;
            read_identity(&cert.tbs_certificate)
        }
        LogEntry::Precert { tbs_certificate } => {
            let (_, tbs) = TbsCertificate::from_der(tbs_certificate)
                .map_err(|e| EntryParseError::CertDecode(e.to_string()))?;
            read_identity(&tbs)
        }
    };

    let (common_name, distinguished_name, serial_number) = match identity {
        Some(fields) => fields,
        None => {
            warn!("certificate has no subject CN, dropping");
            return Ok(None);
        }
    };

    if !cn_filter::is_acceptable(&common_name) {
        return Ok(None);
    }

    Ok(Some(CertRecord {
        common_name,
        distinguished_name,
        serial_number,
    }))
}

/// `dn`'s accessors only ever need a `TbsCertificate`; callers holding a
/// full `X509Certificate` pass `&cert.tbs_certificate` (a plain field, not a
/// `Deref`), callers holding a bare precert `TbsCertificate` pass it as-is.
fn read_identity(cert: &TbsCertificate<'_>) -> Option<(String, String, String)> {
    let common_name = dn::common_name(cert)?;
    Some((
        common_name,
        dn::distinguished_name(cert),
        dn::serial_number(cert),
    ))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_leaf_type_is_an_error() {
        let err = parse_entry(&[0, 0]).unwrap_err();
        assert!(matches!(err, EntryParseError::Leaf(_)));
    }
}
