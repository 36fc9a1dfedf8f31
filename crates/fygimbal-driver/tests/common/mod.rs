//! 集成测试公共设施
#![allow(dead_code)]

pub mod mock_flyer;

#[allow(unused_imports)]
pub use mock_flyer::{MockFlyer, host_reply, port_config, wait_until};
