//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::error::SimError;
use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, error, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 调度事件在指定时间执行
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            name: std::any::type_name::<E>(),
            ev: Box::new(ev),
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
    }

    /// 执行一个已出队的事件；失败时当前时间停在该事件的时刻。
    fn dispatch(&mut self, item: ScheduledEvent, world: &mut dyn World) -> Result<(), SimError> {
        self.now = item.at;
        let ScheduledEvent { at, name, ev, .. } = item;
        if let Err(source) = ev.execute(self, world) {
            error!(event = name, at = ?at, error = %source, "❌ 事件执行失败，终止仿真");
            return Err(SimError::EventFailed {
                at,
                event: name,
                source,
            });
        }
        Ok(())
    }

    /// 运行直到事件队列为空或到达 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) -> Result<(), SimError> {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let Some(item) = self.q.pop() else { break };
            self.dispatch(item, world)?;
        }
        self.now = self.now.max(until);
        Ok(())
    }
}
