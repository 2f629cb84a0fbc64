use crate::error::CertGenError;

/* ============================= TYPES ============================= */

/// Identity of the Service a certificate is provisioned for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub name: String,
    pub namespace: String,
}

impl ServiceIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        ServiceIdentity {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Name of the cluster CertificateSigningRequest resource.
    pub fn csr_name(&self) -> String {
        format!("{}.{}", self.name, self.namespace)
    }

    /// The in-cluster DNS names a serving certificate for this Service must
    /// cover: `name`, `name.namespace`, `name.namespace.svc`.
    pub fn dns_names(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format!("{}.{}", self.name, self.namespace),
            format!("{}.{}.svc", self.name, self.namespace),
        ]
    }
}

/// Ordered DNS names the certificate must cover.
///
/// Insertion order is preserved; it determines the `DNS.N` numbering in the
/// generated extension config. Guaranteed non-empty with non-empty entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanSet(Vec<String>);

impl SanSet {
    pub fn from_dns_names(names: Vec<String>) -> Result<Self, CertGenError> {
        if names.is_empty() {
            return Err(CertGenError::input("SAN set must not be empty"));
        }
        if names.iter().any(|n| n.is_empty()) {
            return Err(CertGenError::input("SAN entries must not be empty"));
        }
        Ok(SanSet(names))
    }

    /// Split a comma-separated FQDN list verbatim: no trimming, order kept.
    pub fn parse_fqdn_list(raw: &str) -> Result<Self, CertGenError> {
        let names: Vec<String> = raw.split(',').map(str::to_string).collect();
        if names.iter().any(|n| n.is_empty()) {
            return Err(CertGenError::input(format!(
                "FQDN list '{raw}' contains an empty entry"
            )));
        }
        SanSet::from_dns_names(names)
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/* ============================= BUILDER ============================= */

/// Derive the SAN set for a provisioning run.
///
/// An explicit FQDN list (self-signed mode) wins; otherwise the names are
/// derived from the Service identity.
pub fn build_san_set(
    identity: &ServiceIdentity,
    explicit: Option<&str>,
) -> Result<SanSet, CertGenError> {
    match explicit {
        Some(list) => SanSet::parse_fqdn_list(list),
        None => SanSet::from_dns_names(identity.dns_names()),
    }
}

/* ============================= EXTENSION CONFIG ============================= */

/// Render the openssl-style request extension config (`ssl.conf`).
///
/// Written to the artifact store before the CSR is produced so operators can
/// audit exactly which SANs the request asked for; some CAs silently drop
/// mismatched SAN extensions.
pub fn render_extension_config(sans: &SanSet) -> String {
    let mut conf = String::from(
        "[req]\n\
         req_extensions = v3_req\n\
         distinguished_name = req_distinguished_name\n\
         \n\
         [req_distinguished_name]\n\
         \n\
         [v3_req]\n\
         basicConstraints = CA:FALSE\n\
         keyUsage = digitalSignature, keyEncipherment\n\
         extendedKeyUsage = serverAuth\n\
         subjectAltName = @alt_names\n\
         \n\
         [alt_names]\n",
    );
    for (i, name) in sans.entries().iter().enumerate() {
        conf.push_str(&format!("DNS.{} = {}\n", i + 1, name));
    }
    conf
}

/* ============================= TESTS ============================= */
