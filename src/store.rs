use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CertGenError;

/* ============================= ARTIFACT STORE ============================= */

/// On-disk home of every artifact a provisioning run produces.
///
/// Each artifact has a fixed filename under the store root, so repeated runs
/// for the same output directory overwrite in place:
///
/// - `server.key`  private key (PKCS#8 PEM)
/// - `server.csr`  certificate request (PEM)
/// - `server.crt`  issued certificate chain (PEM)
/// - `ssl.conf`    request extension config the CSR was built from
/// - `ca.key` / `ca.crt` / `ca.srl`  local CA state (self-signed mode only)
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the root directory (and parents) if missing.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, CertGenError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            CertGenError::crypto(format!(
                "failed to create output directory {}: {e}",
                root.display()
            ))
        })?;
        debug!(root = %root.display(), "artifact_store_ready");
        Ok(ArtifactStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /* ── slot paths ── */

    pub fn server_key_path(&self) -> PathBuf {
        self.root.join("server.key")
    }

    pub fn server_csr_path(&self) -> PathBuf {
        self.root.join("server.csr")
    }

    pub fn server_cert_path(&self) -> PathBuf {
        self.root.join("server.crt")
    }

    pub fn san_config_path(&self) -> PathBuf {
        self.root.join("ssl.conf")
    }

    pub fn ca_key_path(&self) -> PathBuf {
        self.root.join("ca.key")
    }

    pub fn ca_cert_path(&self) -> PathBuf {
        self.root.join("ca.crt")
    }

    pub fn ca_serial_path(&self) -> PathBuf {
        self.root.join("ca.srl")
    }

    /* ── writers ── */

    pub fn write_server_key(&self, pem: &str) -> Result<(), CertGenError> {
        self.write_slot(&self.server_key_path(), "server key", pem)
    }

    pub fn write_server_csr(&self, pem: &str) -> Result<(), CertGenError> {
        self.write_slot(&self.server_csr_path(), "certificate request", pem)
    }

    pub fn write_server_cert(&self, pem: &str) -> Result<(), CertGenError> {
        self.write_slot(&self.server_cert_path(), "server certificate", pem)
    }

    pub fn write_san_config(&self, conf: &str) -> Result<(), CertGenError> {
        self.write_slot(&self.san_config_path(), "extension config", conf)
    }

    pub fn write_ca_key(&self, pem: &str) -> Result<(), CertGenError> {
        self.write_slot(&self.ca_key_path(), "ca key", pem)
    }

    pub fn write_ca_cert(&self, pem: &str) -> Result<(), CertGenError> {
        self.write_slot(&self.ca_cert_path(), "ca certificate", pem)
    }

    pub fn write_ca_serial(&self, serial_hex: &str) -> Result<(), CertGenError> {
        self.write_slot(&self.ca_serial_path(), "ca serial", serial_hex)
    }

    /// Contents of `ca.srl`, if a previous run left one behind.
    pub fn read_ca_serial(&self) -> Result<Option<String>, CertGenError> {
        let path = self.ca_serial_path();
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CertGenError::crypto(format!(
                "failed to read ca serial {}: {e}",
                path.display()
            ))),
        }
    }

    fn write_slot(&self, path: &Path, label: &str, contents: &str) -> Result<(), CertGenError> {
        std::fs::write(path, contents).map_err(|e| {
            CertGenError::crypto(format!("failed to write {label} {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "artifact_written");
        Ok(())
    }
}

/* ============================= TESTS ============================= */
