use anyhow::Result;

const APP_NAME: &str = "webhook-certgen";

pub fn run(namespace: &str, signer_name: &str) -> Result<()> {
    print!("{}", generate_service_account(namespace));
    println!("---");
    print!("{}", generate_cluster_role(signer_name));
    println!("---");
    print!("{}", generate_cluster_role_binding(namespace));
    Ok(())
}

/* ============================= RBAC ============================= */

pub fn generate_service_account(namespace: &str) -> String {
    format!(
        r#"apiVersion: v1
kind: ServiceAccount
metadata:
  name: {APP_NAME}
  namespace: {namespace}
  labels:
    app.kubernetes.io/name: {APP_NAME}
"#
    )
}

pub fn generate_cluster_role(signer_name: &str) -> String {
    format!(
        r#"apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: {APP_NAME}
  labels:
    app.kubernetes.io/name: {APP_NAME}
rules:
  - apiGroups: ["certificates.k8s.io"]
    resources: ["certificatesigningrequests"]
    verbs: ["create", "get", "list", "watch", "delete"]
  - apiGroups: ["certificates.k8s.io"]
    resources: ["certificatesigningrequests/approval"]
    verbs: ["update", "patch"]
  - apiGroups: ["certificates.k8s.io"]
    resources: ["signers"]
    resourceNames: ["{signer_name}"]
    verbs: ["approve"]
"#
    )
}

pub fn generate_cluster_role_binding(namespace: &str) -> String {
    format!(
        r#"apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRoleBinding
metadata:
  name: {APP_NAME}
  labels:
    app.kubernetes.io/name: {APP_NAME}
subjects:
  - kind: ServiceAccount
    name: {APP_NAME}
    namespace: {namespace}
roleRef:
  kind: ClusterRole
  name: {APP_NAME}
  apiGroup: rbac.authorization.k8s.io
"#
    )
}

/* ============================= TESTS ============================= */
