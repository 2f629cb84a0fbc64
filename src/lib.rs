pub mod cluster;
pub mod csr;
pub mod error;
pub mod issue;
pub mod san;
pub mod self_signed;
pub mod store;
