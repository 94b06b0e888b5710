//! 仿真内核错误

use super::time::SimTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// 某个事件执行失败，仿真在该时刻停止。
    #[error("event {event} failed at {at:?}")]
    EventFailed {
        at: SimTime,
        event: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
