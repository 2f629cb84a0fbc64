use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use kube::api::{ListParams, PostParams};
use kube::{Api, Client};

pub async fn run() -> anyhow::Result<()> {
    println!("Running certificate provisioning preflight checks...\n");

    // 1. Build Kubernetes client from kubeconfig
    print!("  Kubeconfig .................. ");
    let client = match Client::try_default().await {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAIL");
            anyhow::bail!("Cannot load kubeconfig: {}", e);
        }
    };

    // 2. Verify actual cluster connectivity by fetching server version
    print!("  Cluster connection .......... ");
    match client.apiserver_version().await {
        Ok(v) => println!("OK (v{}.{})", v.major, v.minor),
        Err(e) => {
            println!("FAIL");
            println!("\n  Error: {}", e);
            println!("  Hint:  Is the cluster running? Check with: kubectl cluster-info\n");
            return Ok(());
        }
    }

    // 3. List CSRs permission
    print!("  List CSRs permission ........ ");
    let csrs: Api<CertificateSigningRequest> = Api::all(client.clone());
    match csrs.list(&ListParams::default().limit(1)).await {
        Ok(_) => println!("OK"),
        Err(e) => println!("FAIL ({})", e),
    }

    // 4. Write permissions, asked of the authorization API rather than
    //    exercised against real resources
    print!("  Create CSRs permission ...... ");
    report_access(&client, "create", None).await;

    print!("  Delete CSRs permission ...... ");
    report_access(&client, "delete", None).await;

    print!("  Approve CSRs permission ..... ");
    report_access(&client, "update", Some("approval")).await;

    println!("\nAll checks completed.");
    Ok(())
}

async fn report_access(client: &Client, verb: &str, subresource: Option<&str>) {
    match can_i(client, verb, subresource).await {
        Ok(true) => println!("OK"),
        Ok(false) => println!("DENIED"),
        Err(e) => println!("FAIL ({})", e),
    }
}

async fn can_i(client: &Client, verb: &str, subresource: Option<&str>) -> anyhow::Result<bool> {
    let review = SelfSubjectAccessReview {
        metadata: Default::default(),
        spec: SelfSubjectAccessReviewSpec {
            resource_attributes: Some(ResourceAttributes {
                group: Some("certificates.k8s.io".to_string()),
                resource: Some("certificatesigningrequests".to_string()),
                subresource: subresource.map(str::to_string),
                verb: Some(verb.to_string()),
                ..Default::default()
            }),
            non_resource_attributes: None,
        },
        status: None,
    };
    let api: Api<SelfSubjectAccessReview> = Api::all(client.clone());
    let created = api.create(&PostParams::default(), &review).await?;
    Ok(created.status.map(|s| s.allowed).unwrap_or(false))
}
