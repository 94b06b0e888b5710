//! 移动性同步桥
//!
//! 把逐步推进的交通仿真观测转换为网络仿真中的匀速运动：实体注册、
//! 预定位/重新瞄准求解、周期同步调度、区域离开计数以及运行入口。

mod config;
mod entity;
mod runner;
mod scheduler;
pub mod solver;
mod world;
mod zone;

pub use config::{ConfigError, ScenarioConfig, TrafficSource, ZoneSpec};
pub use entity::{Entity, EntityId, EntityRegistry, KinematicUpdate, OUT_OF_BOUNDS, SyncPoint};
pub use runner::{DRY_RUN_LABEL, RunSummary, STEP_LABEL, SessionFactory, discover, run, run_with};
pub use scheduler::{SchedulerState, SyncScheduler, SyncTick, TickReport, sync_tick};
pub use world::BridgeWorld;
pub use zone::{Rect, ZoneCounter, ZoneTick};
