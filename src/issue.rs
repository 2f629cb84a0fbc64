use std::path::PathBuf;

use tracing::info;

use crate::cluster::ClusterIssuer;
use crate::csr::{generate_csr, generate_key, CertificateRequest, IssuedCertificate};
use crate::error::CertGenError;
use crate::san::{build_san_set, SanSet, ServiceIdentity};
use crate::self_signed::SelfSignedIssuer;
use crate::store::ArtifactStore;

/* ============================= STRATEGY ============================= */

/// The two signing strategies. Selected once per run; every strategy consumes
/// the same CSR and yields the same kind of certificate.
pub enum Issuer {
    SelfSigned(SelfSignedIssuer),
    Cluster(ClusterIssuer),
}

impl Issuer {
    pub fn is_self_signed(&self) -> bool {
        matches!(self, Issuer::SelfSigned(_))
    }

    fn validate(&self) -> Result<(), CertGenError> {
        match self {
            Issuer::SelfSigned(cfg) if cfg.ca_subject.is_empty() => Err(CertGenError::input(
                "self-signed mode requires a ca subject",
            )),
            _ => Ok(()),
        }
    }

    async fn issue(
        &self,
        csr_name: &str,
        csr: &CertificateRequest,
        store: &ArtifactStore,
    ) -> Result<IssuedCertificate, CertGenError> {
        match self {
            Issuer::SelfSigned(issuer) => issuer.issue(csr, store),
            Issuer::Cluster(issuer) => issuer.issue(csr_name, csr).await,
        }
    }
}

/* ============================= REQUEST ============================= */

/// Everything a provisioning run needs besides the strategy.
pub struct IssueRequest {
    pub identity: ServiceIdentity,
    /// Explicit comma-separated SAN list; self-signed mode only.
    pub sans: Option<String>,
    pub key_bits: usize,
    /// Server certificate subject; defaults to the service FQDN.
    pub subject: Option<String>,
    pub out_dir: PathBuf,
}

impl IssueRequest {
    /// Validate the request's fields. `run` calls this first; a command can
    /// call it earlier to fail before any cluster client is built.
    pub fn validate(&self) -> Result<(), CertGenError> {
        if self.identity.name.is_empty() {
            return Err(CertGenError::input("service name must not be empty"));
        }
        if self.identity.namespace.is_empty() {
            return Err(CertGenError::input("namespace must not be empty"));
        }
        Ok(())
    }

    fn subject(&self) -> String {
        match &self.subject {
            Some(s) => s.clone(),
            None => format!(
                "/CN={}.{}.svc",
                self.identity.name, self.identity.namespace
            ),
        }
    }
}

/// What a successful run produced, for reporting.
#[derive(Debug)]
pub struct IssueOutcome {
    pub store: ArtifactStore,
    pub sans: SanSet,
    pub csr_name: String,
    pub certificate: IssuedCertificate,
    pub self_signed: bool,
}

/* ============================= ORCHESTRATION ============================= */

/// Run the whole provisioning sequence. Input validation happens before any
/// file or cluster side effect; after that each step either succeeds or
/// aborts the run with its own error. No step is retried here; retry policy
/// lives inside the cluster issuer's bounded waits.
pub async fn run(request: &IssueRequest, issuer: &Issuer) -> Result<IssueOutcome, CertGenError> {
    request.validate()?;
    issuer.validate()?;
    if request.sans.is_some() && !issuer.is_self_signed() {
        return Err(CertGenError::input(
            "an explicit san list is only honored in self-signed mode",
        ));
    }

    let store = ArtifactStore::create(&request.out_dir)?;
    let sans = build_san_set(&request.identity, request.sans.as_deref())?;
    let key = generate_key(request.key_bits, &store)?;
    let subject = request.subject();
    let csr = generate_csr(&key, &subject, &sans, &store)?;

    let csr_name = request.identity.csr_name();
    let certificate = issuer.issue(&csr_name, &csr, &store).await?;
    store.write_server_cert(certificate.pem())?;
    info!(path = %store.server_cert_path().display(), "certificate_written");

    Ok(IssueOutcome {
        store,
        sans,
        csr_name,
        certificate,
        self_signed: issuer.is_self_signed(),
    })
}

/* ============================= TESTS ============================= */
