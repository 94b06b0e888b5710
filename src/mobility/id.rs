//! 标识符类型
//!
//! 定义移动节点的唯一标识符。

/// 节点标识符（即节点在 `MobilityNet` 中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);
