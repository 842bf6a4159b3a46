pub mod credentials;
pub mod run_lock;
pub mod snapshot_store;

pub use credentials::read_credential;
pub use run_lock::RunLock;
pub use snapshot_store::JsonFileStore;
