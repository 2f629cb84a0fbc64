use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "webhook-certgen")]
#[command(about = "TLS certificate provisioning for Kubernetes webhook services")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a server key, CSR and signed certificate
    Issue(IssueArgs),

    /// Check cluster connectivity and signing permissions
    Check,

    /// Print RBAC manifests granting the permissions this tool needs
    Rbac {
        /// Namespace for the service account
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Signer the role is allowed to approve for
        #[arg(long, default_value = "kubernetes.io/kubelet-serving")]
        signer_name: String,
    },

    /// Encode a CA certificate for a webhook clientConfig.caBundle field
    CaBundle {
        /// Path to the CA certificate PEM
        ca_cert: PathBuf,

        /// Emit a JSON patch for a webhook configuration instead of bare base64
        #[arg(long)]
        patch: bool,
    },
}

#[derive(Args)]
pub struct IssueArgs {
    /// Name of the Service the certificate is for
    pub service: String,

    /// Namespace of the Service
    #[arg(short, long, default_value = "default")]
    pub namespace: String,

    /// Directory receiving the generated artifacts
    #[arg(short, long, default_value = "./pki")]
    pub out_dir: PathBuf,

    /// Sign with a locally generated CA instead of the cluster CA
    #[arg(long)]
    pub self_signed: bool,

    /// Comma-separated DNS names the certificate must cover (self-signed mode)
    #[arg(long, requires = "self_signed")]
    pub sans: Option<String>,

    /// RSA key length in bits
    #[arg(long, default_value_t = 2048)]
    pub bits: usize,

    /// Server certificate subject, e.g. /CN=service.namespace.svc
    #[arg(long)]
    pub subject: Option<String>,

    /// CA certificate subject (self-signed mode)
    #[arg(long, required_if_eq("self_signed", "true"))]
    pub ca_subject: Option<String>,

    /// CA certificate validity in days (self-signed mode)
    #[arg(long, default_value_t = 3650)]
    pub ca_days: i64,

    /// Server certificate validity in days (self-signed mode)
    #[arg(long, default_value_t = 365)]
    pub cert_days: i64,

    /// Cluster signer asked to sign the request
    #[arg(long, default_value = "kubernetes.io/kubelet-serving")]
    pub signer_name: String,
}
