//! 轨迹回放会话
//!
//! 从录制好的逐时间步轨迹（类似 SUMO FCD 输出的 JSON）回放交通仿真。
//! 同一份轨迹可被多个会话共享，每个会话有独立的游标。

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{EntityKind, Observation, TraceSession};
use crate::bridge::ConfigError;
use crate::error::BridgeError;
use crate::mobility::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// 时间比较容差（秒）
const TIME_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub timesteps: Vec<Timestep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestep {
    pub time: f64,
    #[serde(default)]
    pub vehicles: Vec<EntityRecord>,
    #[serde(default)]
    pub persons: Vec<EntityRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub angle: f64,
    #[serde(default)]
    pub lane: Option<String>,
}

impl Trace {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trace: Trace = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        trace.validate()?;
        Ok(trace)
    }

    /// 时间步必须有限且按时间非递减排列
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut prev = f64::NEG_INFINITY;
        for (idx, step) in self.timesteps.iter().enumerate() {
            if !step.time.is_finite() || step.time < prev {
                return Err(ConfigError::Invalid(format!(
                    "trace timestep #{idx} has time {} after {prev}",
                    step.time
                )));
            }
            prev = step.time;
        }
        Ok(())
    }
}

impl EntityRecord {
    fn observation(&self) -> Observation {
        Observation {
            position: Vector::xy(self.x, self.y),
            speed: self.speed,
            angle_deg: self.angle,
            lane: self.lane.clone(),
        }
    }
}

/// 在共享轨迹上推进的一个会话
#[derive(Debug)]
pub struct TraceReplay {
    label: String,
    trace: Arc<Trace>,
    /// 当前生效的时间步下标；尚未到达第一个时间步时为 None
    cursor: Option<usize>,
    time: f64,
    seen: HashSet<String>,
    loaded: Vec<String>,
}

impl TraceReplay {
    pub fn start(label: impl Into<String>, trace: Arc<Trace>) -> Self {
        let label = label.into();
        debug!(label = %label, timesteps = trace.timesteps.len(), "🎬 打开回放会话");
        Self {
            label,
            trace,
            cursor: None,
            time: f64::NEG_INFINITY,
            seen: HashSet::new(),
            loaded: Vec::new(),
        }
    }

    fn current(&self) -> Option<&Timestep> {
        self.cursor.map(|idx| &self.trace.timesteps[idx])
    }
}

impl TraceSession for TraceReplay {
    fn label(&self) -> &str {
        &self.label
    }

    fn time(&self) -> f64 {
        self.time
    }

    #[tracing::instrument(skip(self), fields(label = %self.label))]
    fn advance_to(&mut self, t: f64) -> Result<(), BridgeError> {
        if !t.is_finite() {
            return Err(BridgeError::session(&self.label, format!("invalid target time {t}")));
        }
        if t + TIME_EPS < self.time {
            return Err(BridgeError::session(
                &self.label,
                format!("cannot rewind from {} to {t}", self.time),
            ));
        }

        let reached = self.trace.timesteps.partition_point(|s| s.time <= t + TIME_EPS);
        let first_new = self.cursor.map_or(0, |c| c + 1);

        self.loaded.clear();
        for step in self.trace.timesteps.iter().take(reached).skip(first_new) {
            for v in &step.vehicles {
                if self.seen.insert(v.id.clone()) {
                    self.loaded.push(v.id.clone());
                }
            }
        }

        self.cursor = reached.checked_sub(1);
        self.time = t;
        trace!(cursor = ?self.cursor, loaded = self.loaded.len(), "回放游标前进");
        Ok(())
    }

    fn loaded_ids(&mut self) -> Result<Vec<String>, BridgeError> {
        Ok(self.loaded.clone())
    }

    fn live_entities(&mut self) -> Result<Vec<(String, EntityKind)>, BridgeError> {
        let Some(step) = self.current() else {
            return Ok(Vec::new());
        };
        let vehicles = step.vehicles.iter().map(|r| (r.id.clone(), EntityKind::Vehicle));
        let persons = step.persons.iter().map(|r| (r.id.clone(), EntityKind::Person));
        Ok(vehicles.chain(persons).collect())
    }

    fn observe(&mut self, id: &str, kind: EntityKind) -> Result<Observation, BridgeError> {
        let record = self.current().and_then(|step| {
            let list = match kind {
                EntityKind::Vehicle => &step.vehicles,
                EntityKind::Person => &step.persons,
            };
            list.iter().find(|r| r.id == id)
        });
        record
            .map(EntityRecord::observation)
            .ok_or_else(|| BridgeError::UnknownEntity { id: id.to_string() })
    }

    fn close(self: Box<Self>) -> Result<(), BridgeError> {
        debug!(label = %self.label, "回放会话关闭");
        Ok(())
    }
}
