//! 周期同步调度
//!
//! 每个周期：先重新排程下一次，再把 step-by-step 会话推进到 `now + period`，
//! 然后对每个在线实体做预定位（首次观测）或重新瞄准（之后的观测）。
//! 调度器不会自行停止，由外层仿真时钟决定何时结束。

use super::entity::KinematicUpdate;
use super::solver::{pre_position, re_aim};
use super::world::BridgeWorld;
use crate::error::BridgeError;
use crate::sim::{Event, EventResult, SimTime, Simulator, World};
use crate::traffic::EntityKind;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running { ticks: u64 },
}

#[derive(Debug)]
pub struct SyncScheduler {
    period: SimTime,
    state: SchedulerState,
}

/// 单个周期的处理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 本周期观测到的在线实体数
    pub observed: usize,
    /// 其中首次观测（走预定位分支）的实体数
    pub first_seen: usize,
}

impl SyncScheduler {
    pub fn new(period: SimTime) -> Self {
        Self {
            period,
            state: SchedulerState::Idle,
        }
    }

    pub fn period(&self) -> SimTime {
        self.period
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        match self.state {
            SchedulerState::Idle => 0,
            SchedulerState::Running { ticks } => ticks,
        }
    }

    /// Idle → Running：在 `now + period` 安排第一次同步。重复调用无效。
    pub fn start(&mut self, sim: &mut Simulator) {
        if self.state != SchedulerState::Idle {
            return;
        }
        self.state = SchedulerState::Running { ticks: 0 };
        let first = sim.now().saturating_add(self.period);
        info!(first_tick = ?first, period = ?self.period, "⏱️  启动周期同步");
        sim.schedule(first, SyncTick);
    }

    fn record_tick(&mut self) {
        if let SchedulerState::Running { ticks } = &mut self.state {
            *ticks += 1;
        }
    }
}

/// 执行一次同步。交通仿真推进总是先于任何观测读取。
#[tracing::instrument(skip(world))]
pub fn sync_tick(world: &mut BridgeWorld, now: SimTime) -> Result<TickReport, BridgeError> {
    let period_s = world.sync.period.as_secs_f64();
    let target_s = now.as_secs_f64() + period_s;

    world.session.advance_to(target_s)?;

    let mut report = TickReport::default();
    for (id, kind) in world.session.live_entities()? {
        let obs = world.session.observe(&id, kind)?;
        let eid = match world.registry.lookup(&id) {
            Some(eid) => eid,
            None => {
                warn!(entity = %id, ?kind, "实体未在发现阶段出现，现场登记");
                world.registry.get_or_create(&mut world.net, &id, kind, now)
            }
        };
        let entity = world.registry.get(eid);

        let update = match entity.sync() {
            None => {
                let (initial, velocity) = pre_position(obs.position, obs.speed, obs.angle_deg, period_s)?;
                debug!(
                    entity = %id,
                    target = %obs.position,
                    %initial,
                    %velocity,
                    arrive_at = target_s,
                    "📍 预定位"
                );
                if kind == EntityKind::Vehicle {
                    if let (Some(road_net), Some(lane)) = (&world.road_net, &obs.lane) {
                        let points = road_net.points_of_interest(lane);
                        debug!(entity = %id, lane = %lane, ?points, "前瞻航点");
                    }
                }
                report.first_seen += 1;
                KinematicUpdate {
                    position: initial,
                    velocity,
                    reference: obs.position,
                    at: target_s,
                }
            }
            Some(prior) => {
                let actual = world.net.position(entity.node(), now);
                let velocity = re_aim(prior.reference, actual, obs.position, period_s, obs.speed)
                    .inspect_err(|e| error!(entity = %id, now = ?now, error = %e, "位置一致性检查失败"))?;
                KinematicUpdate {
                    position: actual,
                    velocity,
                    reference: obs.position,
                    at: target_s,
                }
            }
        };
        world.registry.apply(&mut world.net, eid, update, now);
        report.observed += 1;
    }

    world.sync.record_tick();
    debug!(observed = report.observed, first_seen = report.first_seen, "同步周期完成");
    Ok(report)
}

/// 事件：一次周期同步。
#[derive(Debug)]
pub struct SyncTick;

impl Event for SyncTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult {
        let w = BridgeWorld::from_world(world)?;
        let now = sim.now();
        // 先重新排程，保证周期任务在本次失败时依然存活
        sim.schedule(now.saturating_add(w.sync.period), SyncTick);
        sync_tick(w, now)?;
        Ok(())
    }
}
