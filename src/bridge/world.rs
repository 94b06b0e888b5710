//! 同步桥的仿真世界
//!
//! 持有网络侧节点、实体注册表、逐步推进的跟踪会话以及两个周期任务的状态。

use std::any::Any;

use super::entity::EntityRegistry;
use super::scheduler::SyncScheduler;
use super::zone::ZoneCounter;
use crate::error::BridgeError;
use crate::mobility::MobilityNet;
use crate::sim::World;
use crate::traffic::{RoadNet, TraceSession};

pub struct BridgeWorld {
    pub net: MobilityNet,
    pub registry: EntityRegistry,
    /// step-by-step 会话
    pub session: Box<dyn TraceSession>,
    pub sync: SyncScheduler,
    pub zone: Option<ZoneCounter>,
    pub road_net: Option<RoadNet>,
}

impl BridgeWorld {
    pub fn new(
        net: MobilityNet,
        registry: EntityRegistry,
        session: Box<dyn TraceSession>,
        sync: SyncScheduler,
    ) -> Self {
        Self {
            net,
            registry,
            session,
            sync,
            zone: None,
            road_net: None,
        }
    }

    pub fn with_zone(mut self, zone: ZoneCounter) -> Self {
        self.zone = Some(zone);
        self
    }

    pub fn with_road_net(mut self, road_net: RoadNet) -> Self {
        self.road_net = Some(road_net);
        self
    }

    /// 事件里取回具体世界类型
    pub fn from_world(world: &mut dyn World) -> Result<&mut BridgeWorld, BridgeError> {
        world
            .as_any_mut()
            .downcast_mut::<BridgeWorld>()
            .ok_or(BridgeError::WorldMismatch)
    }
}

impl World for BridgeWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
