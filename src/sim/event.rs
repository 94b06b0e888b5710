//! 事件 trait
//!
//! 定义仿真事件接口。

use super::simulator::Simulator;
use super::world::World;

/// 事件执行结果；错误会终止整个仿真运行。
pub type EventResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以支持 move/所有权转移。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult;
}
