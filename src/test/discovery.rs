use super::replay::sample_trace;
use crate::BridgeError;
use crate::bridge::{
    DRY_RUN_LABEL, EntityRegistry, OUT_OF_BOUNDS, Rect, ScenarioConfig, SessionFactory,
    TrafficSource, ZoneSpec, discover, run_with,
};
use crate::mobility::MobilityNet;
use crate::sim::SimTime;
use crate::traffic::{EntityKind, Observation, Trace, TraceSession};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

#[test]
fn discovery_registers_every_entity_over_the_horizon() {
    let factory = SessionFactory::from_trace(sample_trace());
    let mut registry = EntityRegistry::default();
    let mut net = MobilityNet::default();

    let found = discover(
        factory.open(DRY_RUN_LABEL).expect("open"),
        3.0,
        1.0,
        &mut registry,
        &mut net,
    )
    .expect("discover");

    assert_eq!(found, 4);
    assert_eq!(registry.count_kind(EntityKind::Vehicle), 3);
    assert_eq!(registry.count_kind(EntityKind::Person), 1);
    assert_eq!(net.len(), 4);
    for entity in registry.iter() {
        assert!(entity.sync().is_none(), "{} must stay unsynced", entity.id());
        assert_eq!(net.position(entity.node(), SimTime::ZERO), OUT_OF_BOUNDS);
    }
}

#[test]
fn short_horizon_discovers_only_what_has_appeared() {
    let factory = SessionFactory::from_trace(sample_trace());
    let mut registry = EntityRegistry::default();
    let mut net = MobilityNet::default();
    let found = discover(factory.open(DRY_RUN_LABEL).expect("open"), 1.0, 1.0, &mut registry, &mut net)
        .expect("discover");
    // car1 / car2 / ped1，car3 在 3s 才出现
    assert_eq!(found, 3);
    assert!(registry.lookup("car3").is_none());
}

/// 第二次推进时失败的会话，记录是否被关闭
struct FailingSession {
    closed: Rc<Cell<bool>>,
    advances: u32,
}

impl TraceSession for FailingSession {
    fn label(&self) -> &str {
        "dry-run"
    }

    fn time(&self) -> f64 {
        0.0
    }

    fn advance_to(&mut self, _t: f64) -> Result<(), BridgeError> {
        self.advances += 1;
        if self.advances > 1 {
            return Err(BridgeError::SessionFault {
                label: "dry-run".into(),
                reason: "connection reset".into(),
            });
        }
        Ok(())
    }

    fn loaded_ids(&mut self) -> Result<Vec<String>, BridgeError> {
        Ok(vec!["early".into()])
    }

    fn live_entities(&mut self) -> Result<Vec<(String, EntityKind)>, BridgeError> {
        Ok(Vec::new())
    }

    fn observe(&mut self, id: &str, _kind: EntityKind) -> Result<Observation, BridgeError> {
        Err(BridgeError::UnknownEntity { id: id.to_string() })
    }

    fn close(self: Box<Self>) -> Result<(), BridgeError> {
        self.closed.set(true);
        Ok(())
    }
}

#[test]
fn discovery_closes_the_session_even_on_failure() {
    let closed = Rc::new(Cell::new(false));
    let session = FailingSession {
        closed: Rc::clone(&closed),
        advances: 0,
    };
    let mut registry = EntityRegistry::default();
    let mut net = MobilityNet::default();

    let err = discover(Box::new(session), 5.0, 1.0, &mut registry, &mut net).unwrap_err();
    assert!(matches!(err, BridgeError::SessionFault { .. }), "{err:?}");
    assert!(closed.get());
    // 失败前登记的实体保留
    assert!(registry.lookup("early").is_some());
}

#[test]
fn non_positive_step_is_rejected() {
    let factory = SessionFactory::from_trace(sample_trace());
    let mut registry = EntityRegistry::default();
    let mut net = MobilityNet::default();
    for step in [0.0, -1.0, f64::NAN, 4e-10] {
        let err = discover(factory.open(DRY_RUN_LABEL).expect("open"), 3.0, step, &mut registry, &mut net)
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidInterval { .. }), "step {step}: {err:?}");
    }
    assert!(registry.is_empty());
}

fn config(duration_s: f64, zone: Option<ZoneSpec>) -> ScenarioConfig {
    ScenarioConfig {
        duration_s,
        period_s: 1.0,
        traffic: TrafficSource::Trace {
            path: PathBuf::from("unused.json"),
        },
        road_net: None,
        zone,
    }
}

#[test]
fn run_with_replay_produces_summary() {
    let factory = SessionFactory::from_trace(sample_trace());
    let zone = ZoneSpec {
        rect: Rect {
            x1: -10.0,
            y1: 40.0,
            x2: 10.0,
            y2: 54.0,
        },
        period_s: None,
    };

    // 1s 同步读 t=2，car2 预定位在 (0, 50)；2s 同步读 t=3，只剩 car3，
    // car2 按原速度走到 (0, 55) 离开区域
    let summary = run_with(&config(2.0, Some(zone)), &factory, None).expect("run");
    // 发现阶段看到最后一次同步推进到的 3s，car3 已在其中
    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.discovered, summary.vehicles + summary.persons);
    assert_eq!(summary.vehicles, 3);
    assert_eq!(summary.persons, 1);
    assert_eq!(summary.sync_ticks, 2);
    // car2、ped1、car3；car1 在 2s 前已离开，从未同步
    assert_eq!(summary.synced, 3);
    assert_eq!(summary.final_time_s, 2.0);
    assert_eq!(summary.zone_departures, Some(1));
}

#[test]
fn entity_first_seen_by_the_last_tick_is_discovered() {
    let trace: Trace = serde_json::from_str(
        r#"
{
    "timesteps": [
        { "time": 1.0, "vehicles": [ { "id": "car1", "x": 0.0, "y": 0.0, "speed": 1.0, "angle": 0.0 } ] },
        { "time": 3.0, "vehicles": [ { "id": "late", "x": 9.0, "y": 9.0, "speed": 0.0, "angle": 0.0 } ] }
    ]
}
"#,
    )
    .expect("trace");
    let factory = SessionFactory::from_trace(trace);

    // 2s 的同步把会话推进到 3s，late 在那时第一次出现
    let summary = run_with(&config(2.0, None), &factory, None).expect("run");
    assert_eq!(summary.sync_ticks, 2);
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.discovered, summary.vehicles + summary.persons);
    assert_eq!(summary.synced, 2);
}

#[test]
fn sub_nanosecond_period_is_rejected_before_running() {
    let factory = SessionFactory::from_trace(Trace { timesteps: Vec::new() });
    let mut cfg = config(1e-9, None);
    cfg.period_s = 4e-10;
    let err = run_with(&cfg, &factory, None).unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)), "{err:?}");
}
