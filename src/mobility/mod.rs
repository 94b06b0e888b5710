//! 网络仿真侧的移动性模块
//!
//! 此模块包含节点、匀速移动模型和节点集合，是同步桥写入运动学状态的唯一出口。

// 子模块声明
mod id;
mod model;
mod network;
mod node;
mod vector;

// 重新导出公共接口
pub use id::NodeId;
pub use model::ConstantVelocity;
pub use network::MobilityNet;
pub use node::MobileNode;
pub use vector::Vector;
