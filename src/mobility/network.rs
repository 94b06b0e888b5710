//! 移动网络
//!
//! 网络仿真器一侧的协作者：创建节点、按名字登记、读写节点的移动状态。
//! 同步桥只通过这里的方法修改节点的运动学状态。

use std::collections::HashMap;

use super::id::NodeId;
use super::model::ConstantVelocity;
use super::node::MobileNode;
use super::vector::Vector;
use crate::sim::SimTime;
use tracing::{debug, trace, warn};

/// 节点集合及其名字索引
#[derive(Debug, Default)]
pub struct MobilityNet {
    nodes: Vec<MobileNode>,
    names: HashMap<String, NodeId>,
}

impl MobilityNet {
    /// 创建节点并登记名字；初始位于原点、速度为零。
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = NodeId(self.nodes.len());
        let model = ConstantVelocity::new(Vector::ZERO, Vector::ZERO, SimTime::ZERO);
        if self.names.insert(name.clone(), id).is_some() {
            warn!(name = %name, node_id = ?id, "节点名重复，名字索引指向新节点");
        }
        debug!(name = %name, node_id = ?id, "➕ 创建移动节点");
        self.nodes.push(MobileNode::new(id, name, model));
        id
    }

    /// 按名字查找节点
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> &MobileNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 原子地写入位置与速度（中间状态对网络仿真不可见）。
    #[tracing::instrument(skip(self), fields(node_name = %self.nodes[id.0].name()))]
    pub fn set_state(&mut self, id: NodeId, position: Vector, velocity: Vector, now: SimTime) {
        trace!(%position, %velocity, "写入移动状态");
        self.nodes[id.0].mobility.set_state(position, velocity, now);
    }

    pub fn set_position(&mut self, id: NodeId, position: Vector, now: SimTime) {
        self.nodes[id.0].mobility.set_position(position, now);
    }

    pub fn set_velocity(&mut self, id: NodeId, velocity: Vector, now: SimTime) {
        self.nodes[id.0].mobility.set_velocity(velocity, now);
    }

    /// `now` 时刻的推算位置
    pub fn position(&self, id: NodeId, now: SimTime) -> Vector {
        self.nodes[id.0].mobility.position(now)
    }

    pub fn velocity(&self, id: NodeId) -> Vector {
        self.nodes[id.0].mobility.velocity()
    }
}
