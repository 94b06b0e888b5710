//! 路网描述
//!
//! 只读的车道连通图，仅用于首次观测时的“下一航点”前瞻，不参与位置/速度求解。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::bridge::ConfigError;
use crate::mobility::Vector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    pub length: f64,
    /// 车道中心线折线
    pub shape: Vec<[f64; 2]>,
    #[serde(default)]
    pub outgoing: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RoadNetFile {
    lanes: Vec<Lane>,
}

#[derive(Debug, Clone, Default)]
pub struct RoadNet {
    lanes: HashMap<String, Lane>,
}

impl RoadNet {
    pub fn from_lanes(lanes: impl IntoIterator<Item = Lane>) -> Self {
        Self {
            lanes: lanes.into_iter().map(|l| (l.id.clone(), l)).collect(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RoadNetFile = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(lane) = file.lanes.iter().find(|l| l.shape.is_empty()) {
            return Err(ConfigError::Invalid(format!("lane `{}` has an empty shape", lane.id)));
        }
        Ok(Self::from_lanes(file.lanes))
    }

    pub fn lane(&self, id: &str) -> Option<&Lane> {
        self.lanes.get(id)
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// 前瞻点：当前车道终点，以及每条出口车道的起点（按连接顺序）。
    /// 未知车道返回空列表；指向未知车道的连接被忽略。
    pub fn points_of_interest(&self, lane_id: &str) -> Vec<Vector> {
        let Some(lane) = self.lanes.get(lane_id) else {
            return Vec::new();
        };
        let mut points = Vec::with_capacity(1 + lane.outgoing.len());
        points.extend(position_at_offset(&lane.shape, lane.length));
        for next in lane.outgoing.iter().filter_map(|id| self.lanes.get(id)) {
            points.extend(position_at_offset(&next.shape, 0.0));
        }
        points
    }
}

/// 折线上距起点 `offset` 处的点；超出两端时取端点，空折线返回 None。
pub fn position_at_offset(shape: &[[f64; 2]], offset: f64) -> Option<Vector> {
    let first = shape.first()?;
    if offset <= 0.0 {
        return Some(Vector::xy(first[0], first[1]));
    }
    let mut walked = 0.0;
    for seg in shape.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let len = (b[0] - a[0]).hypot(b[1] - a[1]);
        if walked + len > offset {
            let k = (offset - walked) / len;
            return Some(Vector::xy(a[0] + (b[0] - a[0]) * k, a[1] + (b[1] - a[1]) * k));
        }
        walked += len;
    }
    shape.last().map(|p| Vector::xy(p[0], p[1]))
}
