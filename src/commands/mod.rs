pub mod ca_bundle;
pub mod check;
pub mod issue;
pub mod rbac;
