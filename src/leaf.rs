// src/leaf.rs
//! RFC 6962 MerkleTreeLeaf decoding.
//!
//! Turns the base64 `leaf_input`/`extra_data` pair returned by get-entries
//! into a classified entry: the primary certificate (leaf certificate for
//! x509 entries, the full precertificate from extra_data for precert
//! entries) plus the issuer chain.

use anyhow::{Context, Result};
use base64::Engine;
use chrono::{TimeZone, Utc};

use crate::ct_log::RawEntry;

const ENTRY_TYPE_X509: u16 = 0;
const ENTRY_TYPE_PRECERT: u16 = 1;
const ISSUER_KEY_HASH_LEN: usize = 32;

/// Entry kind tag from the TimestampedEntry header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    X509,
    Precert,
    Unknown(u16),
}

/// Decoded log entry: exactly one primary payload plus an optional chain
#[derive(Debug, Clone)]
pub struct DecodedEntry {
    pub index: u64,
    pub kind: EntryKind,
    /// Milliseconds since the Unix epoch, as reported by the log
    pub timestamp: u64,
    /// DER bytes of the primary certificate; empty for unknown entry types
    pub cert: Vec<u8>,
    /// Issuer chain in chain order, leaf-most first
    pub chain: Vec<Vec<u8>>,
}

impl DecodedEntry {
    /// Second-granularity timestamp key used for artifact filenames
    pub fn timestamp_key(&self) -> String {
        match Utc.timestamp_millis_opt(self.timestamp as i64).single() {
            Some(when) => when.format("%Y%m%d%H%M%S").to_string(),
            None => self.timestamp.to_string(),
        }
    }
}

/// Byte cursor over TLS-encoded structures
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            anyhow::bail!(
                "Truncated input: need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.buf.len() - self.pos
            );
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(((b[0] as u16) << 8) | (b[1] as u16))
    }

    fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(b.iter().fold(0u64, |acc, &x| (acc << 8) | x as u64))
    }

    /// Read a 24-bit length prefix followed by that many bytes
    fn vec24(&mut self) -> Result<&'a [u8]> {
        let b = self.take(3)?;
        let len = ((b[0] as usize) << 16) | ((b[1] as usize) << 8) | (b[2] as usize);
        self.take(len)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Decode one raw leaf into a classified entry.
///
/// Unknown entry types decode successfully with an empty payload so the
/// classifier can record them; structural problems (bad base64, truncated
/// TLS encoding) are per-leaf errors the caller logs and skips.
pub fn decode_leaf(index: u64, raw: &RawEntry) -> Result<DecodedEntry> {
    let leaf_bytes = base64::engine::general_purpose::STANDARD
        .decode(&raw.leaf_input)
        .context("Failed to decode base64 leaf_input")?;

    let mut leaf = Reader::new(&leaf_bytes);

    let version = leaf.u8().context("Missing leaf version")?;
    if version != 0 {
        anyhow::bail!("Unsupported MerkleTreeLeaf version: {}", version);
    }

    let leaf_type = leaf.u8().context("Missing leaf type")?;
    if leaf_type != 0 {
        anyhow::bail!("Unsupported MerkleLeafType: {}", leaf_type);
    }

    let timestamp = leaf.u64().context("Missing timestamp")?;
    let entry_type = leaf.u16().context("Missing entry type")?;

    match entry_type {
        ENTRY_TYPE_X509 => {
            let cert = leaf
                .vec24()
                .context("Truncated x509_entry certificate")?
                .to_vec();
            let chain = parse_x509_chain(&raw.extra_data)?;

            Ok(DecodedEntry {
                index,
                kind: EntryKind::X509,
                timestamp,
                cert,
                chain,
            })
        }
        ENTRY_TYPE_PRECERT => {
            // leaf_input only carries the issuer key hash and the TBS; the
            // full precertificate lives at the front of extra_data.
            leaf.take(ISSUER_KEY_HASH_LEN)
                .context("Truncated precert issuer key hash")?;
            leaf.vec24().context("Truncated precert TBSCertificate")?;

            let (cert, chain) = parse_precert_extra_data(&raw.extra_data)?;

            Ok(DecodedEntry {
                index,
                kind: EntryKind::Precert,
                timestamp,
                cert,
                chain,
            })
        }
        other => Ok(DecodedEntry {
            index,
            kind: EntryKind::Unknown(other),
            timestamp,
            cert: Vec::new(),
            chain: Vec::new(),
        }),
    }
}

/// X509ChainEntry extra_data: 24-bit total length, then repeated
/// length-prefixed certificates
fn parse_x509_chain(extra_data: &str) -> Result<Vec<Vec<u8>>> {
    if extra_data.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(extra_data)
        .context("Failed to decode base64 extra_data")?;

    let mut outer = Reader::new(&bytes);
    let chain_bytes = outer.vec24().context("Truncated certificate_chain")?;

    parse_cert_list(chain_bytes)
}

/// PrecertChainEntry extra_data: full precertificate, then the chain
fn parse_precert_extra_data(extra_data: &str) -> Result<(Vec<u8>, Vec<Vec<u8>>)> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(extra_data)
        .context("Failed to decode base64 extra_data")?;

    let mut outer = Reader::new(&bytes);
    let precert = outer
        .vec24()
        .context("Truncated pre_certificate in extra_data")?
        .to_vec();

    let chain = if outer.remaining() > 0 {
        let chain_bytes = outer.vec24().context("Truncated precertificate_chain")?;
        parse_cert_list(chain_bytes)?
    } else {
        Vec::new()
    };

    Ok((precert, chain))
}

fn parse_cert_list(buf: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut reader = Reader::new(buf);
    let mut certs = Vec::new();

    while reader.remaining() > 0 {
        certs.push(reader.vec24().context("Truncated chain certificate")?.to_vec());
    }

    Ok(certs)
}

#[cfg(test)]
pub mod test_support {
    use base64::Engine;

    fn push_u24(out: &mut Vec<u8>, len: usize) {
        out.push((len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }

    /// Build a base64 leaf_input for an x509_entry
    pub fn x509_leaf_input(timestamp: u64, cert: &[u8]) -> String {
        let mut buf = vec![0u8, 0u8]; // version, leaf_type
        buf.extend_from_slice(&timestamp.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        push_u24(&mut buf, cert.len());
        buf.extend_from_slice(cert);
        buf.extend_from_slice(&0u16.to_be_bytes()); // empty extensions
        base64::engine::general_purpose::STANDARD.encode(buf)
    }

    /// Build a base64 leaf_input for a precert_entry
    pub fn precert_leaf_input(timestamp: u64, tbs: &[u8]) -> String {
        let mut buf = vec![0u8, 0u8];
        buf.extend_from_slice(&timestamp.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&[0u8; 32]); // issuer key hash
        push_u24(&mut buf, tbs.len());
        buf.extend_from_slice(tbs);
        buf.extend_from_slice(&0u16.to_be_bytes());
        base64::engine::general_purpose::STANDARD.encode(buf)
    }

    /// Build a base64 leaf_input with an arbitrary entry type tag
    pub fn unknown_leaf_input(timestamp: u64, entry_type: u16) -> String {
        let mut buf = vec![0u8, 0u8];
        buf.extend_from_slice(&timestamp.to_be_bytes());
        buf.extend_from_slice(&entry_type.to_be_bytes());
        base64::engine::general_purpose::STANDARD.encode(buf)
    }

    /// Build a base64 extra_data blob for an x509 entry chain
    pub fn x509_extra_data(chain: &[&[u8]]) -> String {
        let mut inner = Vec::new();
        for cert in chain {
            push_u24(&mut inner, cert.len());
            inner.extend_from_slice(cert);
        }
        let mut buf = Vec::new();
        push_u24(&mut buf, inner.len());
        buf.extend_from_slice(&inner);
        base64::engine::general_purpose::STANDARD.encode(buf)
    }

    /// Build a base64 extra_data blob for a precert entry
    pub fn precert_extra_data(precert: &[u8], chain: &[&[u8]]) -> String {
        let mut buf = Vec::new();
        push_u24(&mut buf, precert.len());
        buf.extend_from_slice(precert);

        let mut inner = Vec::new();
        for cert in chain {
            push_u24(&mut inner, cert.len());
            inner.extend_from_slice(cert);
        }
        push_u24(&mut buf, inner.len());
        buf.extend_from_slice(&inner);
        base64::engine::general_purpose::STANDARD.encode(buf)
    }
}
