//! 移动节点
//!
//! 网络仿真侧的节点：名字 + 匀速移动模型。

use super::id::NodeId;
use super::model::ConstantVelocity;

/// 带移动模型的网络节点
#[derive(Debug)]
pub struct MobileNode {
    id: NodeId,
    name: String,
    pub(crate) mobility: ConstantVelocity,
}

impl MobileNode {
    pub fn new(id: NodeId, name: impl Into<String>, mobility: ConstantVelocity) -> Self {
        Self {
            id,
            name: name.into(),
            mobility,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mobility(&self) -> &ConstantVelocity {
        &self.mobility
    }
}
