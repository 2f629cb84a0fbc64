use rcgen::{
    BasicConstraints, CertificateParams, CertificateSigningRequestParams, IsCa, KeyUsagePurpose,
    SerialNumber,
};
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::csr::{new_rsa_key_pair, parse_subject, CertificateRequest, IssuedCertificate};
use crate::error::CertGenError;
use crate::store::ArtifactStore;

/* ============================= SELF-SIGNED ISSUER ============================= */

/// Signs the CSR with a CA generated for this run alone.
///
/// The CA keypair and certificate land in the artifact store next to the
/// server artifacts so the caller can distribute `ca.crt` as a trust anchor.
#[derive(Debug, Clone)]
pub struct SelfSignedIssuer {
    pub ca_subject: String,
    pub ca_days: i64,
    pub cert_days: i64,
    pub key_bits: usize,
}

impl SelfSignedIssuer {
    /// Generate the CA and sign `csr` with it. The issued certificate carries
    /// exactly the SAN extension the CSR requested.
    pub fn issue(
        &self,
        csr: &CertificateRequest,
        store: &ArtifactStore,
    ) -> Result<IssuedCertificate, CertGenError> {
        let now = OffsetDateTime::now_utc();

        // Parsed before key generation so a bad subject fails cheaply.
        let ca_dn = parse_subject(&self.ca_subject)?;

        let (ca_key, ca_key_pem) = new_rsa_key_pair(self.key_bits)?;
        let mut ca_params = CertificateParams::default();
        ca_params.distinguished_name = ca_dn;
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        ca_params.not_before = now;
        ca_params.not_after = now + Duration::days(self.ca_days);
        let ca_cert = ca_params
            .self_signed(&ca_key)
            .map_err(|e| CertGenError::crypto(format!("ca certificate generation failed: {e}")))?;
        store.write_ca_key(&ca_key_pem)?;
        store.write_ca_cert(&ca_cert.pem())?;
        info!(subject = %self.ca_subject, days = self.ca_days, "ca_generated");

        let serial = self.next_serial(store)?;
        let serial_hex = format!("{serial:016x}");

        let mut csr_params = CertificateSigningRequestParams::from_pem(csr.pem())
            .map_err(|e| {
                CertGenError::crypto(format!("failed to parse certificate request: {e}"))
            })?;
        csr_params.params.not_before = now;
        csr_params.params.not_after = now + Duration::days(self.cert_days);
        csr_params.params.serial_number = Some(SerialNumber::from(serial));
        let cert = csr_params
            .signed_by(&ca_cert, &ca_key)
            .map_err(|e| CertGenError::crypto(format!("certificate signing failed: {e}")))?;
        info!(serial = %serial_hex, days = self.cert_days, "certificate_signed");
        IssuedCertificate::from_pem(cert.pem())
    }

    /// Next leaf serial. An existing `ca.srl` is incremented rather than
    /// replaced, so a rerun against the same store keeps issuing fresh
    /// serials; a fresh store starts from a random one.
    fn next_serial(&self, store: &ArtifactStore) -> Result<u64, CertGenError> {
        let serial = match store.read_ca_serial()? {
            Some(existing) => {
                let trimmed = existing.trim();
                let prev = u64::from_str_radix(trimmed, 16).map_err(|_| {
                    CertGenError::crypto(format!(
                        "serial file {} holds '{trimmed}', not a hex serial",
                        store.ca_serial_path().display()
                    ))
                })?;
                prev.wrapping_add(1)
            }
            None => rand::random::<u64>(),
        };
        store.write_ca_serial(&format!("{serial:016x}\n"))?;
        Ok(serial)
    }
}

/* ============================= TESTS ============================= */
