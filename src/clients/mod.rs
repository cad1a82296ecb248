pub mod backend;
pub mod backend_client;

pub use backend::{ItemPool, SharedCounter, SubmissionGateway};
pub use backend_client::BackendClient;
