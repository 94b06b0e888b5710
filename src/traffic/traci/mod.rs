//! SUMO TraCI 客户端
//!
//! 只实现同步桥需要的命令子集：推进、关闭，以及车辆/行人/仿真变量的读取。

pub mod codec;
mod session;

pub use codec::{TraciError, TraciValue};
pub use session::TraciSession;
