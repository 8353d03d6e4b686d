// Terminal module - command slot, output sink and the poll loop
pub mod channel;
pub mod poller;
pub mod sink;

pub use channel::{CommandSender, CommandSlot};
pub use poller::Terminal;
pub use sink::OutputSink;
