use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::certificates::v1::{
    CertificateSigningRequest, CertificateSigningRequestCondition, CertificateSigningRequestSpec,
    CertificateSigningRequestStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use k8s_openapi::ByteString;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::core::ObjectMeta;
use kube::Api;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::csr::{CertificateRequest, IssuedCertificate};
use crate::error::CertGenError;

/* ============================= CAPABILITY TRAIT ============================= */

/// Outcome of a create call against the signing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// The slice of the cluster signing API the issuer needs.
///
/// Implemented by [`KubeCsrApi`] against a live cluster and by in-memory
/// fakes in tests, so the issuance sequence is exercisable without one.
#[async_trait]
pub trait CsrApi: Send + Sync {
    /// Create the resource. An already-existing resource of the same name is
    /// reported, not treated as an error.
    async fn create(
        &self,
        resource: &CertificateSigningRequest,
    ) -> Result<CreateOutcome, CertGenError>;

    /// Read the resource, `None` if it is not (yet) visible.
    async fn get(&self, name: &str) -> Result<Option<CertificateSigningRequest>, CertGenError>;

    /// Delete the resource; deleting an absent resource succeeds.
    async fn delete(&self, name: &str) -> Result<(), CertGenError>;

    /// Record approval on the resource's approval subresource.
    async fn approve(&self, name: &str) -> Result<(), CertGenError>;
}

/* ============================= WIRE OBJECT ============================= */

/// The CertificateSigningRequest object submitted to the cluster. The request
/// payload is the raw CSR PEM; the API represents it as base64 on the wire.
pub fn build_csr_object(
    name: &str,
    csr: &CertificateRequest,
    signer_name: &str,
) -> CertificateSigningRequest {
    CertificateSigningRequest {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: CertificateSigningRequestSpec {
            groups: Some(vec!["system:authenticated".to_string()]),
            request: ByteString(csr.pem().as_bytes().to_vec()),
            signer_name: signer_name.to_string(),
            usages: Some(vec![
                "digital signature".to_string(),
                "key encipherment".to_string(),
                "server auth".to_string(),
            ]),
            ..Default::default()
        },
        status: None,
    }
}

fn denied_or_failed(
    status: &CertificateSigningRequestStatus,
) -> Option<&CertificateSigningRequestCondition> {
    status.conditions.as_ref().and_then(|conditions| {
        conditions
            .iter()
            .find(|c| (c.type_ == "Denied" || c.type_ == "Failed") && c.status == "True")
    })
}

/* ============================= KUBE CLIENT ============================= */

/// Live implementation backed by the cluster's certificates API.
pub struct KubeCsrApi {
    api: Api<CertificateSigningRequest>,
}

impl KubeCsrApi {
    pub fn new(client: kube::Client) -> Self {
        KubeCsrApi {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl CsrApi for KubeCsrApi {
    async fn create(
        &self,
        resource: &CertificateSigningRequest,
    ) -> Result<CreateOutcome, CertGenError> {
        match self.api.create(&PostParams::default(), resource).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(kube::Error::Api(err)) if err.code == 409 => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, name: &str) -> Result<Option<CertificateSigningRequest>, CertGenError> {
        Ok(self.api.get_opt(name).await?)
    }

    async fn delete(&self, name: &str) -> Result<(), CertGenError> {
        match self.api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn approve(&self, name: &str) -> Result<(), CertGenError> {
        let approval = json!({
            "status": {
                "conditions": [{
                    "type": "Approved",
                    "status": "True",
                    "reason": "WebhookCertgenApprove",
                    "message": "approved by webhook-certgen",
                    "lastUpdateTime": Time(chrono::Utc::now()),
                }]
            }
        });
        self.api
            .patch_approval(name, &PatchParams::default(), &Patch::Merge(&approval))
            .await?;
        Ok(())
    }
}

/* ============================= CLUSTER ISSUER ============================= */

/// Bounded read-retry policy: at most `max_attempts` reads, sleeping
/// `interval` between them.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl WaitPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        WaitPolicy {
            max_attempts,
            interval,
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::new(10, Duration::from_secs(1))
    }
}

/// Drives a CSR through the cluster's asynchronous signing flow:
/// submit, wait until visible, approve, poll for the signed certificate.
///
/// The four steps are strictly sequential. Approval must causally follow
/// creation and signing follows approval, so there is nothing to overlap.
pub struct ClusterIssuer {
    pub api: Arc<dyn CsrApi>,
    pub signer_name: String,
    pub creation_wait: WaitPolicy,
    pub poll_wait: WaitPolicy,
}

impl ClusterIssuer {
    pub fn new(api: Arc<dyn CsrApi>, signer_name: impl Into<String>) -> Self {
        ClusterIssuer {
            api,
            signer_name: signer_name.into(),
            creation_wait: WaitPolicy::default(),
            poll_wait: WaitPolicy::default(),
        }
    }

    /// Run the full sequence and return the signed certificate.
    pub async fn issue(
        &self,
        name: &str,
        csr: &CertificateRequest,
    ) -> Result<IssuedCertificate, CertGenError> {
        self.submit(name, csr).await?;
        self.await_creation(name).await?;
        self.approve(name).await?;
        self.poll_for_certificate(name).await
    }

    /// Delete any leftover resource of the same name, then create a fresh
    /// one. A create conflict means another writer got in between; the
    /// delete-and-create is retried once before giving up.
    pub async fn submit(&self, name: &str, csr: &CertificateRequest) -> Result<(), CertGenError> {
        self.api.delete(name).await?;
        let resource = build_csr_object(name, csr, &self.signer_name);
        match self.api.create(&resource).await? {
            CreateOutcome::Created => {
                info!(name, signer = %self.signer_name, "csr_submitted");
                Ok(())
            }
            CreateOutcome::AlreadyExists => {
                warn!(name, "csr_create_conflict");
                self.api.delete(name).await?;
                match self.api.create(&resource).await? {
                    CreateOutcome::Created => {
                        info!(name, signer = %self.signer_name, "csr_submitted");
                        Ok(())
                    }
                    CreateOutcome::AlreadyExists => Err(CertGenError::cluster(format!(
                        "csr '{name}' still exists after delete and recreate"
                    ))),
                }
            }
        }
    }

    /// Wait until the just-created resource is observable via a read.
    /// Creation is not read-your-writes against all endpoints, so a short
    /// bounded retry covers the consistency lag.
    pub async fn await_creation(&self, name: &str) -> Result<(), CertGenError> {
        for attempt in 1..=self.creation_wait.max_attempts {
            if self.api.get(name).await?.is_some() {
                debug!(name, attempt, "csr_visible");
                return Ok(());
            }
            if attempt < self.creation_wait.max_attempts {
                tokio::time::sleep(self.creation_wait.interval).await;
            }
        }
        Err(CertGenError::CreationTimeout {
            name: name.to_string(),
            attempts: self.creation_wait.max_attempts,
        })
    }

    pub async fn approve(&self, name: &str) -> Result<(), CertGenError> {
        self.api.approve(name).await?;
        info!(name, "csr_approved");
        Ok(())
    }

    /// Poll `status.certificate` until the signer populates it. Exactly
    /// `poll_wait.max_attempts` reads are made before giving up; a Denied or
    /// Failed condition aborts immediately instead of burning the budget.
    pub async fn poll_for_certificate(
        &self,
        name: &str,
    ) -> Result<IssuedCertificate, CertGenError> {
        for attempt in 1..=self.poll_wait.max_attempts {
            let resource = self.api.get(name).await?.ok_or_else(|| {
                CertGenError::cluster(format!("csr '{name}' disappeared while awaiting signature"))
            })?;
            if let Some(status) = &resource.status {
                if let Some(condition) = denied_or_failed(status) {
                    return Err(CertGenError::cluster(format!(
                        "csr '{name}' was {}: {}",
                        condition.type_.to_ascii_lowercase(),
                        condition.message.clone().unwrap_or_default()
                    )));
                }
                if let Some(cert) = &status.certificate {
                    if !cert.0.is_empty() {
                        info!(name, attempt, "csr_signed");
                        let pem = String::from_utf8(cert.0.clone()).map_err(|_| {
                            CertGenError::cluster(format!(
                                "csr '{name}' status certificate is not utf-8 pem"
                            ))
                        })?;
                        return IssuedCertificate::from_pem(pem);
                    }
                }
            }
            debug!(name, attempt, "csr_not_signed_yet");
            if attempt < self.poll_wait.max_attempts {
                tokio::time::sleep(self.poll_wait.interval).await;
            }
        }
        Err(CertGenError::IssuanceTimeout {
            name: name.to_string(),
            attempts: self.poll_wait.max_attempts,
        })
    }
}

/* ============================= TESTS ============================= */
