use thiserror::Error;

/* ============================= ERROR TAXONOMY ============================= */

/// Failure classes of a provisioning run.
///
/// Every core operation fails fast: the first error aborts the run and maps
/// to a non-zero exit. Partially written artifacts are deliberately left in
/// place for inspection.
#[derive(Debug, Error)]
pub enum CertGenError {
    /// Missing or malformed caller input, detected before any side effect.
    #[error("invalid input: {0}")]
    Input(String),

    /// Key, CSR or certificate construction failed. Artifact writes inside
    /// the generators map here as well.
    #[error("{0}")]
    Crypto(String),

    /// A Kubernetes API call failed, or the cluster refused the request.
    #[error("cluster api: {0}")]
    Cluster(String),

    /// The created CertificateSigningRequest never became readable.
    #[error("csr '{name}' not visible after {attempts} read attempts")]
    CreationTimeout { name: String, attempts: u32 },

    /// The approved CertificateSigningRequest was never signed.
    #[error("csr '{name}' not signed after {attempts} poll attempts")]
    IssuanceTimeout { name: String, attempts: u32 },
}

impl CertGenError {
    pub fn input(msg: impl Into<String>) -> Self {
        CertGenError::Input(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        CertGenError::Crypto(msg.into())
    }

    pub fn cluster(msg: impl Into<String>) -> Self {
        CertGenError::Cluster(msg.into())
    }
}

impl From<kube::Error> for CertGenError {
    fn from(e: kube::Error) -> Self {
        CertGenError::Cluster(e.to_string())
    }
}

/* ============================= TESTS ============================= */
