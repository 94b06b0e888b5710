//! 匀速移动模型
//!
//! 节点的位置由最后一次写入的 (位置, 速度, 时刻) 外推得到。

use super::vector::Vector;
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantVelocity {
    base: Vector,
    velocity: Vector,
    base_time: SimTime,
}

impl ConstantVelocity {
    pub fn new(position: Vector, velocity: Vector, now: SimTime) -> Self {
        Self {
            base: position,
            velocity,
            base_time: now,
        }
    }

    /// `now` 时刻的推算位置。早于基准时刻的查询按基准时刻处理。
    pub fn position(&self, now: SimTime) -> Vector {
        let dt = now.0.saturating_sub(self.base_time.0) as f64 / 1e9;
        self.base + self.velocity * dt
    }

    pub fn velocity(&self) -> Vector {
        self.velocity
    }

    /// 同时写入位置与速度，并以 `now` 作为新的外推基准。
    pub fn set_state(&mut self, position: Vector, velocity: Vector, now: SimTime) {
        self.base = position;
        self.velocity = velocity;
        self.base_time = now;
    }

    pub fn set_position(&mut self, position: Vector, now: SimTime) {
        self.set_state(position, self.velocity, now);
    }

    /// 改变速度前先把当前推算位置固定下来，轨迹保持连续。
    pub fn set_velocity(&mut self, velocity: Vector, now: SimTime) {
        let here = self.position(now);
        self.set_state(here, velocity, now);
    }
}
