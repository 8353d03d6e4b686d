//! KhiTerm Library
//!
//! Protocol engine for the Kawasaki AS monitor shell: login handshake,
//! sentinel-framed reads, a one-slot command channel with a tick-driven
//! poller, and real variable round-trips.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::domain::error::{ConnectError, KhiTermError, KhiTermResult, ReadError, SendError, VarError};
pub use crate::domain::config::{ControllerConfig, KhiTermConfig};
pub use crate::core::framer::SentinelSet;
pub use crate::core::session::{ConnectionTarget, Phase, Session};
pub use crate::core::terminal::{CommandSender, CommandSlot, OutputSink, Terminal};
