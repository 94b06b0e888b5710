//! 交通仿真侧的跟踪会话
//!
//! `TraceSession` 是同步桥看到的交通仿真：推进时钟、列出在线实体、读取观测值。
//! 提供两种实现：回放录制好的 JSON 轨迹（`TraceReplay`），以及通过 TraCI 协议
//! 驱动真实的 SUMO 进程（`TraciSession`）。

mod replay;
mod road_net;
pub mod traci;

pub use replay::{EntityRecord, Timestep, Trace, TraceReplay};
pub use road_net::{Lane, RoadNet, position_at_offset};
pub use traci::TraciSession;

use crate::error::BridgeError;
use crate::mobility::Vector;
use serde::{Deserialize, Serialize};

/// 交通参与者类型；两类实体走完全相同的同步路径。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Vehicle,
    Person,
}

/// 某实体在当前时刻的观测值
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// 平面位置（z = 0）
    pub position: Vector,
    /// 标量速度
    pub speed: f64,
    /// 航向角（度），SUMO 约定：0° 指向 +y，顺时针增加
    pub angle_deg: f64,
    /// 所在车道（行人或未知时为 None）
    pub lane: Option<String>,
}

/// 与交通仿真的一条跟踪连接。
///
/// 同一时刻内必须先 `advance_to` 再读取观测值。
pub trait TraceSession {
    /// 连接标签（例如 "dry-run" / "step-by-step"）
    fn label(&self) -> &str;

    /// 交通仿真当前时间（秒）
    fn time(&self) -> f64;

    /// 推进到不早于 `t` 的时刻；连接中断或对端报错时返回 `SessionFault`。
    fn advance_to(&mut self, t: f64) -> Result<(), BridgeError>;

    /// 上一次推进期间新装载的车辆 ID
    fn loaded_ids(&mut self) -> Result<Vec<String>, BridgeError>;

    /// 当前在线的全部实体（车辆在前，行人在后）
    fn live_entities(&mut self) -> Result<Vec<(String, EntityKind)>, BridgeError>;

    /// 读取在线实体的观测值；不在线时返回 `UnknownEntity`。
    fn observe(&mut self, id: &str, kind: EntityKind) -> Result<Observation, BridgeError>;

    /// 关闭连接并释放资源
    fn close(self: Box<Self>) -> Result<(), BridgeError>;
}
