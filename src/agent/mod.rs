pub mod conversation;
pub mod db;
pub mod error;
pub mod roster;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ErrorKind, SyncError};
pub use session::{AgentCredentials, AgentSession, AgentUserType, AppUserType};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
