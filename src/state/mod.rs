mod log;
mod roster;

pub use log::MessageLog;
pub use roster::Roster;
