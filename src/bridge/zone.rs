//! 区域离开计数
//!
//! 独立周期任务：每次采样统计严格位于矩形内的实体，与上一次采样比较，
//! 上次在内、这次不在的实体记为一次离开。无法区分真实驶出与仿真结束。

use std::collections::HashSet;

use super::world::BridgeWorld;
use crate::mobility::Vector;
use crate::sim::{Event, EventResult, SimTime, Simulator, World};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    /// 严格在内部；边界上的点不算
    pub fn contains(&self, p: Vector) -> bool {
        self.x1 < p.x && p.x < self.x2 && self.y1 < p.y && p.y < self.y2
    }
}

#[derive(Debug)]
pub struct ZoneCounter {
    rect: Rect,
    period: SimTime,
    inside: HashSet<String>,
    departures: u64,
}

impl ZoneCounter {
    pub fn new(rect: Rect, period: SimTime) -> Self {
        Self {
            rect,
            period,
            inside: HashSet::new(),
            departures: 0,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn period(&self) -> SimTime {
        self.period
    }

    /// 累计离开次数（单调不减）
    pub fn departures(&self) -> u64 {
        self.departures
    }

    /// 上一次采样时位于区域内的实体
    pub fn inside(&self) -> &HashSet<String> {
        &self.inside
    }

    /// 处理一次采样，返回本次新增的离开数。
    pub fn sample<'a>(&mut self, positions: impl IntoIterator<Item = (&'a str, Vector)>) -> u64 {
        let now_inside: HashSet<String> = positions
            .into_iter()
            .filter(|(_, p)| self.rect.contains(*p))
            .map(|(id, _)| id.to_string())
            .collect();
        let departed = self.inside.difference(&now_inside).count() as u64;
        self.departures += departed;
        trace!(inside = now_inside.len(), departed, "区域采样");
        self.inside = now_inside;
        departed
    }

    /// 在 `now + period` 安排第一次采样
    pub fn start(&self, sim: &mut Simulator) {
        sim.schedule(sim.now().saturating_add(self.period), ZoneTick);
    }
}

/// 事件：一次区域采样，执行时先按自身周期重新排程。
#[derive(Debug)]
pub struct ZoneTick;

impl Event for ZoneTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult {
        let w = BridgeWorld::from_world(world)?;
        let now = sim.now();
        let Some(zone) = w.zone.as_mut() else {
            return Ok(());
        };
        sim.schedule(now.saturating_add(zone.period), ZoneTick);

        // 仍停放在界外的实体不参与采样
        let positions: Vec<(&str, Vector)> = w
            .registry
            .iter()
            .filter(|e| e.sync().is_some())
            .map(|e| (e.id(), w.net.position(e.node(), now)))
            .collect();
        let departed = zone.sample(positions);
        if departed > 0 {
            debug!(departed, total = zone.departures(), now = ?now, "🚪 实体离开监测区域");
        }
        Ok(())
    }
}
