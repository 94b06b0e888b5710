//! 实体注册表
//!
//! 交通参与者 ID → 同步桥侧的运动学记录。实体在发现阶段创建，整个运行期间不删除；
//! 已离开的实体保留最后的状态。

use std::collections::HashMap;

use crate::mobility::{MobilityNet, NodeId, Vector};
use crate::sim::SimTime;
use crate::traffic::EntityKind;
use tracing::{debug, trace};

/// 尚未观测到的实体停放的位置：远离仿真区域，不参与邻近计算。
pub const OUT_OF_BOUNDS: Vector = Vector::new(0.0, 0.0, -2000.0);

/// 注册表内的实体下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub usize);

/// 最近一次确认与交通仿真一致的参考位置，以及对应的交通仿真时间（秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncPoint {
    pub reference: Vector,
    pub at: f64,
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: String,
    kind: EntityKind,
    node: NodeId,
    /// None 即“从未观测”
    sync: Option<SyncPoint>,
}

impl Entity {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn sync(&self) -> Option<SyncPoint> {
        self.sync
    }

    pub fn reference_position(&self) -> Option<Vector> {
        self.sync.map(|s| s.reference)
    }

    pub fn last_update_time(&self) -> Option<f64> {
        self.sync.map(|s| s.at)
    }
}

/// 一次状态写入：写给网络节点的位置/速度，以及新的参考点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicUpdate {
    pub position: Vector,
    pub velocity: Vector,
    pub reference: Vector,
    pub at: f64,
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    by_id: HashMap<String, EntityId>,
}

impl EntityRegistry {
    /// 首次调用时分配网络节点（以实体 ID 命名）并停放在 `OUT_OF_BOUNDS`；
    /// 之后对同一 ID 直接返回已有实体。
    pub fn get_or_create(
        &mut self,
        net: &mut MobilityNet,
        id: &str,
        kind: EntityKind,
        now: SimTime,
    ) -> EntityId {
        if let Some(&eid) = self.by_id.get(id) {
            return eid;
        }
        let node = net.add_node(id);
        net.set_state(node, OUT_OF_BOUNDS, Vector::ZERO, now);

        let eid = EntityId(self.entities.len());
        self.entities.push(Entity {
            id: id.to_string(),
            kind,
            node,
            sync: None,
        });
        self.by_id.insert(id.to_string(), eid);
        debug!(entity = id, ?kind, node_id = ?node, "🆕 登记实体");
        eid
    }

    /// 更新参考位置与最后更新时间，并把位置/速度一次性写入网络节点。
    pub fn apply(&mut self, net: &mut MobilityNet, eid: EntityId, update: KinematicUpdate, now: SimTime) {
        let entity = &mut self.entities[eid.0];
        entity.sync = Some(SyncPoint {
            reference: update.reference,
            at: update.at,
        });
        net.set_state(entity.node, update.position, update.velocity, now);
        trace!(entity = %entity.id, ?update, "已应用运动学更新");
    }

    pub fn lookup(&self, id: &str) -> Option<EntityId> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, eid: EntityId) -> &Entity {
        &self.entities[eid.0]
    }

    /// 按创建顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }
}
