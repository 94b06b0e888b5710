//! 航点速度求解
//!
//! 两个纯函数：
//! - `pre_position`：首次观测时倒推初始位置，使匀速运动恰好在给定时间后到达观测点；
//! - `re_aim`：之后每个周期按位移重新计算速度，使推算位置落在下一次观测点上。
//!
//! 航向采用 SUMO 约定：0° 指向 +y，90° 指向 +x，顺时针为正，
//! 因此速度分解为 `(v·sinθ, v·cosθ)`。

use crate::error::BridgeError;
use crate::mobility::Vector;
use tracing::debug;

/// 参考位置与推算位置在任一坐标轴上允许的最大偏差（距离单位）
pub const DRIFT_TOLERANCE: f64 = 0.1;

fn require_positive(interval: f64) -> Result<(), BridgeError> {
    // 同时拒绝 NaN
    if interval > 0.0 {
        Ok(())
    } else {
        Err(BridgeError::InvalidInterval { interval })
    }
}

/// 标量速度 + 航向角（度）→ 平面速度向量
pub fn heading_velocity(speed: f64, heading_deg: f64) -> Vector {
    let rad = heading_deg.to_radians();
    Vector::xy(speed * rad.sin(), speed * rad.cos())
}

/// 返回 `(initial_position, velocity)`，满足
/// `initial_position + velocity * time_to_arrival == target`。
pub fn pre_position(
    target: Vector,
    speed: f64,
    heading_deg: f64,
    time_to_arrival: f64,
) -> Result<(Vector, Vector), BridgeError> {
    require_positive(time_to_arrival)?;
    let velocity = heading_velocity(speed, heading_deg);
    let initial = Vector::xy(
        target.x - velocity.x * time_to_arrival,
        target.y - velocity.y * time_to_arrival,
    );
    Ok((initial, velocity))
}

/// 推算位置与参考位置在任一轴上相差超过 `DRIFT_TOLERANCE` 时报错。
pub fn check_drift(expected: Vector, actual: Vector) -> Result<(), BridgeError> {
    let dx = (actual.x - expected.x).abs();
    let dy = (actual.y - expected.y).abs();
    if dx > DRIFT_TOLERANCE || dy > DRIFT_TOLERANCE {
        return Err(BridgeError::DriftExceeded { expected, actual });
    }
    Ok(())
}

/// 从当前推算位置出发、在 `elapsed` 秒内到达 `observed` 所需的速度。
///
/// `reported_speed` 只用于日志对照：转弯处标量速度与位移速度会略有差异，
/// 以位移为准才能保证落点正确。
pub fn re_aim(
    prior_reference: Vector,
    current_actual: Vector,
    observed: Vector,
    elapsed: f64,
    reported_speed: f64,
) -> Result<Vector, BridgeError> {
    check_drift(prior_reference, current_actual)?;
    require_positive(elapsed)?;

    let velocity = Vector::xy(
        (observed.x - current_actual.x) / elapsed,
        (observed.y - current_actual.y) / elapsed,
    );
    debug!(
        %velocity,
        speed = velocity.planar_norm(),
        reported_speed,
        "重新瞄准下一航点"
    );
    Ok(velocity)
}
