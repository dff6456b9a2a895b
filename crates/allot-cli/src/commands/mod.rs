pub mod init;
pub mod reconcile;
pub mod state;
