use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::certificates::v1::{
    CertificateSigningRequest, CertificateSigningRequestCondition, CertificateSigningRequestStatus,
};
use k8s_openapi::ByteString;

use webhook_certgen::cluster::{ClusterIssuer, CreateOutcome, CsrApi, WaitPolicy};
use webhook_certgen::error::CertGenError;

/// PEM the fake signer hands back; not a real certificate, but a valid
/// single-block PEM as far as artifact validation is concerned.
#[allow(dead_code)]
pub const FAKE_CERT_PEM: &str =
    "-----BEGIN CERTIFICATE-----\nTUlJQmZha2VjZXJ0\n-----END CERTIFICATE-----\n";

#[allow(dead_code)]
pub const FAKE_CSR_PEM: &str =
    "-----BEGIN CERTIFICATE REQUEST-----\nTUlJQmZha2Vjc3I=\n-----END CERTIFICATE REQUEST-----\n";

/* ============================= FAKE BEHAVIOR ============================= */

/// Scripted behavior of the fake signing API.
pub struct FakeBehavior {
    /// Reads after a create that still report the resource as absent.
    pub visibility_lag: u32,
    /// `Some(n)`: the certificate appears on the nth read after approval.
    /// `None`: the signer never populates the status.
    pub sign_after_polls: Option<u32>,
    /// Creates that report `AlreadyExists` before one succeeds.
    pub create_conflicts: u32,
    /// After approval the resource carries a Denied condition.
    pub deny: bool,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        FakeBehavior {
            visibility_lag: 0,
            sign_after_polls: Some(1),
            create_conflicts: 0,
            deny: false,
        }
    }
}

/* ============================= FAKE API ============================= */

struct FakeState {
    ops: Vec<String>,
    resource: Option<CertificateSigningRequest>,
    approved: bool,
    gets_after_create: u32,
    gets_after_approve: u32,
    remaining_conflicts: u32,
}

/// In-memory stand-in for the cluster's signing API. Records every call in
/// order and plays back the scripted [`FakeBehavior`].
pub struct FakeCsrApi {
    behavior: FakeBehavior,
    state: Mutex<FakeState>,
}

impl FakeCsrApi {
    pub fn new(behavior: FakeBehavior) -> Self {
        let remaining_conflicts = behavior.create_conflicts;
        FakeCsrApi {
            behavior,
            state: Mutex::new(FakeState {
                ops: Vec::new(),
                resource: None,
                approved: false,
                gets_after_create: 0,
                gets_after_approve: 0,
                remaining_conflicts,
            }),
        }
    }

    /// Signer that populates the certificate on the nth poll after approval.
    #[allow(dead_code)]
    pub fn signing_on_poll(n: u32) -> Self {
        FakeCsrApi::new(FakeBehavior {
            sign_after_polls: Some(n),
            ..Default::default()
        })
    }

    /// Signer that never populates the certificate.
    #[allow(dead_code)]
    pub fn never_signing() -> Self {
        FakeCsrApi::new(FakeBehavior {
            sign_after_polls: None,
            ..Default::default()
        })
    }

    /// Every recorded call, in order, as `"verb name"` strings.
    #[allow(dead_code)]
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().unwrap().ops.clone()
    }

    /// How many recorded calls used the given verb.
    #[allow(dead_code)]
    pub fn count(&self, verb: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|op| op.starts_with(verb))
            .count()
    }

    /// The most recently created resource, if any.
    #[allow(dead_code)]
    pub fn submitted(&self) -> Option<CertificateSigningRequest> {
        self.state.lock().unwrap().resource.clone()
    }
}

fn condition(type_: &str, message: &str) -> CertificateSigningRequestCondition {
    CertificateSigningRequestCondition {
        type_: type_.to_string(),
        status: "True".to_string(),
        message: Some(message.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl CsrApi for FakeCsrApi {
    async fn create(
        &self,
        resource: &CertificateSigningRequest,
    ) -> Result<CreateOutcome, CertGenError> {
        let mut state = self.state.lock().unwrap();
        let name = resource.metadata.name.clone().unwrap_or_default();
        state.ops.push(format!("create {name}"));
        if state.remaining_conflicts > 0 {
            state.remaining_conflicts -= 1;
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.resource = Some(resource.clone());
        state.approved = false;
        state.gets_after_create = 0;
        state.gets_after_approve = 0;
        Ok(CreateOutcome::Created)
    }

    async fn get(&self, name: &str) -> Result<Option<CertificateSigningRequest>, CertGenError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("get {name}"));

        let Some(mut resource) = state.resource.clone() else {
            return Ok(None);
        };
        if resource.metadata.name.as_deref() != Some(name) {
            return Ok(None);
        }

        state.gets_after_create += 1;
        if state.gets_after_create <= self.behavior.visibility_lag {
            return Ok(None);
        }

        if state.approved {
            state.gets_after_approve += 1;
            let mut conditions = vec![condition("Approved", "approved for test")];
            let mut certificate = None;
            if self.behavior.deny {
                conditions.push(condition("Denied", "denied by test policy"));
            } else if let Some(n) = self.behavior.sign_after_polls {
                if state.gets_after_approve >= n {
                    certificate = Some(ByteString(FAKE_CERT_PEM.as_bytes().to_vec()));
                }
            }
            resource.status = Some(CertificateSigningRequestStatus {
                certificate,
                conditions: Some(conditions),
            });
        }
        Ok(Some(resource))
    }

    async fn delete(&self, name: &str) -> Result<(), CertGenError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("delete {name}"));
        if state
            .resource
            .as_ref()
            .is_some_and(|r| r.metadata.name.as_deref() == Some(name))
        {
            state.resource = None;
        }
        Ok(())
    }

    async fn approve(&self, name: &str) -> Result<(), CertGenError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("approve {name}"));
        if state
            .resource
            .as_ref()
            .is_none_or(|r| r.metadata.name.as_deref() != Some(name))
        {
            return Err(CertGenError::cluster(format!(
                "csr '{name}' not found for approval"
            )));
        }
        state.approved = true;
        Ok(())
    }
}

/* ============================= HELPERS ============================= */

/// Cluster issuer wired to the fake with zero sleep between read attempts.
#[allow(dead_code)]
pub fn fast_issuer(api: Arc<FakeCsrApi>) -> ClusterIssuer {
    ClusterIssuer {
        api,
        signer_name: "kubernetes.io/kubelet-serving".to_string(),
        creation_wait: WaitPolicy::new(10, Duration::ZERO),
        poll_wait: WaitPolicy::new(10, Duration::ZERO),
    }
}
