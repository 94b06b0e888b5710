//! 运行入口
//!
//! 流程：dry-run 会话发现全部实体（随即关闭）→ 打开 step-by-step 会话 →
//! 启动周期同步与区域计数 → 运行网络仿真到指定时长 → 关闭会话并汇总。

use std::path::PathBuf;
use std::sync::Arc;

use super::config::{ScenarioConfig, TrafficSource};
use super::entity::EntityRegistry;
use super::scheduler::SyncScheduler;
use super::world::BridgeWorld;
use super::zone::ZoneCounter;
use crate::error::BridgeError;
use crate::mobility::MobilityNet;
use crate::sim::{SimTime, Simulator};
use crate::traffic::{EntityKind, RoadNet, Trace, TraceReplay, TraceSession, TraciSession};
use serde::Serialize;
use tracing::{info, warn};

pub const DRY_RUN_LABEL: &str = "dry-run";
pub const STEP_LABEL: &str = "step-by-step";

/// 按需打开跟踪会话；回放来源只加载一次轨迹，由各会话共享。
pub enum SessionFactory {
    Replay(Arc<Trace>),
    Traci {
        sumo_binary: PathBuf,
        config: PathBuf,
        port: u16,
    },
}

impl SessionFactory {
    pub fn from_source(source: &TrafficSource) -> Result<Self, BridgeError> {
        Ok(match source {
            TrafficSource::Trace { path } => SessionFactory::Replay(Arc::new(Trace::from_path(path)?)),
            TrafficSource::Traci {
                sumo_binary,
                config,
                port,
            } => SessionFactory::Traci {
                sumo_binary: sumo_binary.clone(),
                config: config.clone(),
                port: *port,
            },
        })
    }

    pub fn from_trace(trace: Trace) -> Self {
        SessionFactory::Replay(Arc::new(trace))
    }

    pub fn open(&self, label: &str) -> Result<Box<dyn TraceSession>, BridgeError> {
        Ok(match self {
            SessionFactory::Replay(trace) => Box::new(TraceReplay::start(label, Arc::clone(trace))),
            SessionFactory::Traci {
                sumo_binary,
                config,
                port,
            } => Box::new(TraciSession::launch(label, sumo_binary, config, *port)?),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub vehicles: usize,
    pub persons: usize,
    /// 至少同步过一次的实体数
    pub synced: usize,
    pub sync_ticks: u64,
    pub zone_departures: Option<u64>,
    pub final_time_s: f64,
}

/// 发现阶段：按 `step_s` 把 dry-run 会话推进到 `horizon_s`，登记所有出现过的实体。
/// 无论成功与否，会话都会被关闭；已登记的实体保持有效。
pub fn discover(
    mut session: Box<dyn TraceSession>,
    horizon_s: f64,
    step_s: f64,
    registry: &mut EntityRegistry,
    net: &mut MobilityNet,
) -> Result<usize, BridgeError> {
    let found = discover_in(session.as_mut(), horizon_s, step_s, registry, net);
    let closed = session.close();
    let found = found?;
    closed?;
    Ok(found)
}

fn discover_in(
    session: &mut dyn TraceSession,
    horizon_s: f64,
    step_s: f64,
    registry: &mut EntityRegistry,
    net: &mut MobilityNet,
) -> Result<usize, BridgeError> {
    if !(step_s > 0.0) || SimTime::from_secs_f64(step_s) == SimTime::ZERO {
        return Err(BridgeError::InvalidInterval { interval: step_s });
    }
    if !horizon_s.is_finite() {
        return Err(BridgeError::InvalidInterval { interval: horizon_s });
    }
    let before = registry.len();
    // 用步数乘步长，累加在大时刻上可能不再前进
    let steps = (horizon_s / step_s).ceil().max(1.0) as u64;
    for k in 1..=steps {
        let t = (k as f64 * step_s).min(horizon_s);
        session.advance_to(t)?;
        for id in session.loaded_ids()? {
            registry.get_or_create(net, &id, EntityKind::Vehicle, SimTime::ZERO);
        }
        for (id, kind) in session.live_entities()? {
            registry.get_or_create(net, &id, kind, SimTime::ZERO);
        }
    }
    let found = registry.len() - before;
    info!(found, horizon_s, label = session.label(), "🔍 发现阶段完成");
    Ok(found)
}

/// 读取配置中的路网与交通来源后运行
pub fn run(cfg: &ScenarioConfig) -> Result<RunSummary, BridgeError> {
    let factory = SessionFactory::from_source(&cfg.traffic)?;
    let road_net = cfg.road_net.as_deref().map(RoadNet::from_path).transpose()?;
    run_with(cfg, &factory, road_net)
}

pub fn run_with(
    cfg: &ScenarioConfig,
    factory: &SessionFactory,
    road_net: Option<RoadNet>,
) -> Result<RunSummary, BridgeError> {
    cfg.validate()?;
    let mut net = MobilityNet::default();
    let mut registry = EntityRegistry::default();

    // 位于 duration 的最后一次同步会把会话推进到 duration + period
    let horizon_s = cfg.duration_s + cfg.period_s;
    let discovered = discover(
        factory.open(DRY_RUN_LABEL)?,
        horizon_s,
        cfg.period_s,
        &mut registry,
        &mut net,
    )?;

    let step = factory.open(STEP_LABEL)?;
    let sync = SyncScheduler::new(SimTime::from_secs_f64(cfg.period_s));
    let mut world = BridgeWorld::new(net, registry, step, sync);
    if let (Some(zone), Some(period_s)) = (&cfg.zone, cfg.zone_period_s()) {
        world = world.with_zone(ZoneCounter::new(zone.rect, SimTime::from_secs_f64(period_s)));
    }
    if let Some(road_net) = road_net {
        world = world.with_road_net(road_net);
    }

    let mut sim = Simulator::default();
    world.sync.start(&mut sim);
    if let Some(zone) = &world.zone {
        zone.start(&mut sim);
    }

    let outcome = sim.run_until(SimTime::from_secs_f64(cfg.duration_s), &mut world);

    let summary = RunSummary {
        discovered,
        vehicles: world.registry.count_kind(EntityKind::Vehicle),
        persons: world.registry.count_kind(EntityKind::Person),
        synced: world.registry.iter().filter(|e| e.sync().is_some()).count(),
        sync_ticks: world.sync.ticks(),
        zone_departures: world.zone.as_ref().map(ZoneCounter::departures),
        final_time_s: sim.now().as_secs_f64(),
    };

    let BridgeWorld { session, .. } = world;
    let closed = session.close();
    if let Err(e) = &closed {
        warn!(error = %e, "关闭 step-by-step 会话失败");
    }
    outcome?;
    closed?;

    info!(?summary, "🏁 运行结束");
    Ok(summary)
}
