//! 命令模块

pub mod config;
pub mod connection;
pub mod leds;
pub mod monitor;
pub mod motors;
pub mod param;
pub mod probe;
pub mod save;

pub use config::ConfigCommand;
pub use connection::LinkArgs;
pub use leds::LedsCommand;
pub use monitor::MonitorCommand;
pub use motors::MotorsCommand;
pub use param::{GetParamCommand, GetVectorCommand, SetParamCommand};
pub use probe::ProbeCommand;
pub use save::{CalibrateCommand, SaveCommand};
