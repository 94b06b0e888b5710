//! 同步桥错误类型
//!
//! 子系统内没有本地恢复路径：任何错误都会一路传播到运行入口并终止本次仿真。

use crate::bridge::ConfigError;
use crate::mobility::Vector;
use crate::sim::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// 与交通仿真的跟踪连接断开或对端报告内部错误。
    #[error("tracking session `{label}` failed: {reason}")]
    SessionFault { label: String, reason: String },

    /// 请求观测的实体当前不在线。
    #[error("entity `{id}` is not live in the traffic simulation")]
    UnknownEntity { id: String },

    /// 传给求解器的时间间隔非正。
    #[error("non-positive interval {interval}s passed to the waypoint solver")]
    InvalidInterval { interval: f64 },

    /// 推算位置与参考位置的偏差超过容差。
    #[error("dead-reckoned position {actual} drifted from reference {expected}")]
    DriftExceeded { expected: Vector, actual: Vector },

    #[error("the simulation world is not a BridgeWorld")]
    WorldMismatch,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(SimError),
}

impl BridgeError {
    pub(crate) fn session(label: &str, reason: impl ToString) -> Self {
        BridgeError::SessionFault {
            label: label.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<SimError> for BridgeError {
    /// 事件里抛出的 `BridgeError` 原样取回，其余保留为内核错误。
    fn from(err: SimError) -> Self {
        match err {
            SimError::EventFailed { at, event, source } => match source.downcast::<BridgeError>() {
                Ok(inner) => *inner,
                Err(source) => BridgeError::Simulation(SimError::EventFailed { at, event, source }),
            },
        }
    }
}
