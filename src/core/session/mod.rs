// Session module - Controller connection and login handshake
#[allow(clippy::module_inception)]
pub mod session;
pub mod state;

pub use session::{Session, CREDENTIAL};
pub use state::{ConnectionTarget, Phase};
