use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;

pub fn run(ca_cert: &Path, patch: bool) -> Result<()> {
    let encoded = encode_ca_bundle(ca_cert)?;
    if patch {
        println!("{}", webhook_patch(&encoded));
    } else {
        println!("{encoded}");
    }
    Ok(())
}

/// Base64 the CA certificate the way webhook `clientConfig.caBundle` expects:
/// the whole PEM file, one line, standard alphabet.
pub fn encode_ca_bundle(ca_cert: &Path) -> Result<String> {
    let ca_bytes = std::fs::read(ca_cert).context("Failed to read CA certificate file")?;
    if !String::from_utf8_lossy(&ca_bytes).contains("BEGIN CERTIFICATE") {
        anyhow::bail!("{} does not look like a PEM certificate", ca_cert.display());
    }
    Ok(base64::engine::general_purpose::STANDARD.encode(&ca_bytes))
}

/// JSON patch updating the first webhook's caBundle, ready for
/// `kubectl patch --type=json`.
pub fn webhook_patch(ca_b64: &str) -> String {
    serde_json::json!([
        {
            "op": "replace",
            "path": "/webhooks/0/clientConfig/caBundle",
            "value": ca_b64,
        }
    ])
    .to_string()
}

/* ============================= TESTS ============================= */
