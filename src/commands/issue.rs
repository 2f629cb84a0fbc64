use std::sync::Arc;

use anyhow::{Context, Result};
use kube::Client;

use webhook_certgen::cluster::{ClusterIssuer, KubeCsrApi};
use webhook_certgen::issue::{self, IssueOutcome, IssueRequest, Issuer};
use webhook_certgen::san::ServiceIdentity;
use webhook_certgen::self_signed::SelfSignedIssuer;

use crate::cli::IssueArgs;

pub async fn run(args: IssueArgs) -> Result<()> {
    let mode = if args.self_signed {
        "self-signed CA"
    } else {
        "cluster CA"
    };
    println!("Provisioning webhook TLS certificate ({mode})...\n");

    let request = IssueRequest {
        identity: ServiceIdentity::new(args.service.clone(), args.namespace.clone()),
        sans: args.sans.clone(),
        key_bits: args.bits,
        subject: args.subject.clone(),
        out_dir: args.out_dir.clone(),
    };
    // Reject bad input before any cluster connection is attempted.
    request.validate()?;

    let issuer = build_issuer(&args).await?;
    let outcome = issue::run(&request, &issuer).await?;
    print_summary(&outcome);
    Ok(())
}

async fn build_issuer(args: &IssueArgs) -> Result<Issuer> {
    if args.self_signed {
        return Ok(Issuer::SelfSigned(SelfSignedIssuer {
            ca_subject: args.ca_subject.clone().unwrap_or_default(),
            ca_days: args.ca_days,
            cert_days: args.cert_days,
            key_bits: args.bits,
        }));
    }

    let client = Client::try_default()
        .await
        .context("Failed to connect to Kubernetes cluster")?;

    print!("  Cluster connection .......... ");
    match client.apiserver_version().await {
        Ok(v) => println!("OK (v{}.{})\n", v.major, v.minor),
        Err(e) => {
            println!("FAIL");
            anyhow::bail!("Cannot reach cluster: {}. Is the cluster running?", e);
        }
    }

    Ok(Issuer::Cluster(ClusterIssuer::new(
        Arc::new(KubeCsrApi::new(client)),
        args.signer_name.clone(),
    )))
}

fn print_summary(outcome: &IssueOutcome) {
    let store = &outcome.store;
    println!(
        "  Server key .................. {}",
        store.server_key_path().display()
    );
    println!(
        "  Certificate request ......... {}",
        store.server_csr_path().display()
    );
    println!(
        "  Server certificate .......... {}",
        store.server_cert_path().display()
    );
    if outcome.self_signed {
        println!(
            "  CA certificate .............. {}",
            store.ca_cert_path().display()
        );
        println!(
            "  CA key ...................... {}",
            store.ca_key_path().display()
        );
    } else {
        println!("  Request name ................ {}", outcome.csr_name);
    }
    println!(
        "  Chain length ................ {}",
        outcome.certificate.chain_len()
    );
    println!("  SANs:");
    for san in outcome.sans.entries() {
        println!("    - {san}");
    }
    println!();
    println!("Certificate provisioned successfully.");
}

/* ============================= TESTS ============================= */
