//! 场景配置
//!
//! JSON 场景文件：仿真时长、同步周期、交通数据来源、可选的路网与监测区域。
//! 文件中的相对路径以场景文件所在目录为基准解析。

use std::fs;
use std::path::{Path, PathBuf};

use super::zone::Rect;
use crate::sim::SimTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// 网络仿真总时长（秒），同时是 dry-run 发现阶段的视野
    pub duration_s: f64,
    /// 同步周期（秒）
    #[serde(default = "default_period_s")]
    pub period_s: f64,
    pub traffic: TrafficSource,
    #[serde(default)]
    pub road_net: Option<PathBuf>,
    #[serde(default)]
    pub zone: Option<ZoneSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrafficSource {
    /// 回放录制好的 JSON 轨迹
    Trace { path: PathBuf },
    /// 启动 SUMO 并通过 TraCI 驱动
    Traci {
        #[serde(default = "default_sumo_binary")]
        sumo_binary: PathBuf,
        config: PathBuf,
        #[serde(default = "default_traci_port")]
        port: u16,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub rect: Rect,
    /// 采样周期（秒），缺省与同步周期相同
    #[serde(default)]
    pub period_s: Option<f64>,
}

fn default_period_s() -> f64 {
    1.0
}

fn default_sumo_binary() -> PathBuf {
    PathBuf::from("sumo")
}

fn default_traci_port() -> u16 {
    8813
}

fn positive(name: &str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be a positive number, got {v}")))
    }
}

/// 周期还要能换算成非零的网络仿真时间，否则周期任务会在同一时刻无限重排。
fn period(name: &str, v: f64) -> Result<(), ConfigError> {
    positive(name, v)?;
    if SimTime::from_secs_f64(v) == SimTime::ZERO {
        return Err(ConfigError::Invalid(format!(
            "{name} must be at least one nanosecond, got {v}"
        )));
    }
    Ok(())
}

impl ScenarioConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: ScenarioConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            cfg.resolve_paths(base);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        match &mut self.traffic {
            TrafficSource::Trace { path } => rebase(path),
            TrafficSource::Traci { config, .. } => rebase(config),
        }
        if let Some(p) = self.road_net.as_mut() {
            rebase(p);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("duration_s", self.duration_s)?;
        period("period_s", self.period_s)?;
        if let Some(zone) = &self.zone {
            period("zone.period_s", zone.period_s.unwrap_or(self.period_s))?;
            let r = zone.rect;
            if !(r.x1 < r.x2 && r.y1 < r.y2) {
                return Err(ConfigError::Invalid(format!(
                    "zone rect must satisfy x1 < x2 and y1 < y2, got {r:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn zone_period_s(&self) -> Option<f64> {
        self.zone.as_ref().map(|z| z.period_s.unwrap_or(self.period_s))
    }
}
