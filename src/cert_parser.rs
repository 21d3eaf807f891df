// src/cert_parser.rs
use anyhow::Result;
use sha2::{Digest, Sha256};
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::*;

/// Parsed certificate summary used for text-mode artifacts
#[derive(Debug, Clone)]
pub struct CertSummary {
    pub serial_hex: String,
    pub subject: String,
    pub issuer: String,
    pub not_before: i64,
    pub not_after: i64,
    pub dns_names: Vec<String>,
    pub fingerprint: String,
}

impl CertSummary {
    /// Parse a DER-encoded certificate into a summary
    pub fn from_der(der_bytes: &[u8]) -> Result<Self> {
        let fingerprint = {
            let mut hasher = Sha256::new();
            hasher.update(der_bytes);
            hex::encode(hasher.finalize())
        };

        let (_, cert) = X509Certificate::from_der(der_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to parse X.509 certificate: {:?}", e))?;

        let mut dns_names = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
                for general_name in &san.general_names {
                    if let GeneralName::DNSName(dns_name) = general_name {
                        dns_names.push(dns_name.to_string());
                    }
                }
            }
        }

        Ok(Self {
            serial_hex: hex::encode(cert.raw_serial()),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: cert.validity().not_before.timestamp(),
            not_after: cert.validity().not_after.timestamp(),
            dns_names,
            fingerprint,
        })
    }

    /// Human-readable description written by text-mode output
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Serial Number: {}\n", self.serial_hex));
        out.push_str(&format!("Subject: {}\n", self.subject));
        out.push_str(&format!("Issuer: {}\n", self.issuer));
        out.push_str(&format!(
            "Validity: not_before={} not_after={}\n",
            self.not_before, self.not_after
        ));
        if !self.dns_names.is_empty() {
            out.push_str(&format!("DNS Names: {}\n", self.dns_names.join(", ")));
        }
        out.push_str(&format!("SHA-256 Fingerprint: {}\n", self.fingerprint));
        out
    }
}
