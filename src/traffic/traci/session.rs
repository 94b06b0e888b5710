//! TraCI 跟踪会话
//!
//! 通过 TCP 驱动一个 SUMO 进程。可以连接已在运行的服务端，也可以自行启动
//! `sumo -c <cfg> --remote-port <port>` 并在会话关闭时回收子进程。

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use super::codec::{self, Reader, TraciError, TraciValue};
use crate::error::BridgeError;
use crate::mobility::Vector;
use crate::traffic::{EntityKind, Observation, TraceSession};
use tracing::{debug, info, trace, warn};

/// 启动 SUMO 后等待其监听端口的重试次数与间隔
const CONNECT_RETRIES: u32 = 60;
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

pub struct TraciSession {
    label: String,
    stream: TcpStream,
    child: Option<Child>,
    time: f64,
    /// 上一次推进后在线的实体
    live: HashMap<String, EntityKind>,
    live_order: Vec<(String, EntityKind)>,
}

impl TraciSession {
    /// 连接一个已经在监听的 TraCI 服务端
    pub fn connect(label: impl Into<String>, addr: impl ToSocketAddrs) -> Result<Self, BridgeError> {
        let label = label.into();
        let stream = TcpStream::connect(addr).map_err(|e| BridgeError::session(&label, e))?;
        Ok(Self::from_stream(label, stream, None))
    }

    /// 启动 SUMO 并连接；端口就绪前按固定间隔重试。
    #[tracing::instrument(skip(sumo_binary, config))]
    pub fn launch(
        label: &str,
        sumo_binary: &Path,
        config: &Path,
        port: u16,
    ) -> Result<Self, BridgeError> {
        info!(binary = %sumo_binary.display(), config = %config.display(), "🚦 启动 SUMO");
        let mut child = Command::new(sumo_binary)
            .arg("-c")
            .arg(config)
            .arg("--remote-port")
            .arg(port.to_string())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| BridgeError::session(label, e))?;

        let mut last_err = None;
        for attempt in 0..CONNECT_RETRIES {
            match TcpStream::connect(("127.0.0.1", port)) {
                Ok(stream) => {
                    debug!(attempt, "已连接 TraCI 端口");
                    return Ok(Self::from_stream(label.to_string(), stream, Some(child)));
                }
                Err(e) => {
                    trace!(attempt, error = %e, "端口尚未就绪");
                    last_err = Some(e);
                    thread::sleep(CONNECT_BACKOFF);
                }
            }
        }
        let _ = child.kill();
        let _ = child.wait();
        Err(BridgeError::session(
            label,
            last_err.map_or_else(|| "connect retries exhausted".to_string(), |e| e.to_string()),
        ))
    }

    fn from_stream(label: String, stream: TcpStream, child: Option<Child>) -> Self {
        let _ = stream.set_nodelay(true);
        Self {
            label,
            stream,
            child,
            time: 0.0,
            live: HashMap::new(),
            live_order: Vec::new(),
        }
    }

    /// 让会话接管一个已启动的子进程
    #[cfg(test)]
    pub(crate) fn adopt_child(&mut self, child: Child) {
        self.child = Some(child);
    }

    fn fault(&self, err: TraciError) -> BridgeError {
        BridgeError::session(&self.label, err)
    }

    /// 发送一条消息并读回完整的响应体（不含长度前缀）
    fn exchange(&mut self, msg: &[u8]) -> Result<Vec<u8>, TraciError> {
        self.stream.write_all(msg)?;
        let mut len = [0u8; 4];
        self.stream.read_exact(&mut len)?;
        let total = u32::from_be_bytes(len) as usize;
        let body_len = total.checked_sub(4).ok_or(TraciError::BadLength(total))?;
        let mut body = vec![0u8; body_len];
        self.stream.read_exact(&mut body)?;
        Ok(body)
    }

    fn get(&mut self, domain: u8, var: u8, object_id: &str) -> Result<TraciValue, TraciError> {
        let body = self.exchange(&codec::get_variable_message(domain, var, object_id))?;
        let mut r = Reader::new(&body);
        r.status(domain)?;
        r.variable(domain, var)
    }

    fn id_list(&mut self, domain: u8, var: u8) -> Result<Vec<String>, TraciError> {
        self.get(domain, var, "")?.into_string_list()
    }

    fn refresh_live(&mut self) -> Result<(), TraciError> {
        let vehicles = self.id_list(codec::CMD_GET_VEHICLE_VARIABLE, codec::VAR_ID_LIST)?;
        let persons = self.id_list(codec::CMD_GET_PERSON_VARIABLE, codec::VAR_ID_LIST)?;
        self.live_order = vehicles
            .into_iter()
            .map(|id| (id, EntityKind::Vehicle))
            .chain(persons.into_iter().map(|id| (id, EntityKind::Person)))
            .collect();
        self.live = self.live_order.iter().cloned().collect();
        Ok(())
    }

    fn observe_remote(&mut self, id: &str, kind: EntityKind) -> Result<Observation, TraciError> {
        let domain = match kind {
            EntityKind::Vehicle => codec::CMD_GET_VEHICLE_VARIABLE,
            EntityKind::Person => codec::CMD_GET_PERSON_VARIABLE,
        };
        let (x, y) = self.get(domain, codec::VAR_POSITION, id)?.into_position()?;
        let speed = self.get(domain, codec::VAR_SPEED, id)?.into_double()?;
        let angle_deg = self.get(domain, codec::VAR_ANGLE, id)?.into_double()?;
        let lane = match kind {
            EntityKind::Vehicle => Some(self.get(domain, codec::VAR_LANE_ID, id)?.into_string()?),
            EntityKind::Person => None,
        };
        Ok(Observation {
            position: Vector::xy(x, y),
            speed,
            angle_deg,
            lane,
        })
    }
}

impl TraceSession for TraciSession {
    fn label(&self) -> &str {
        &self.label
    }

    fn time(&self) -> f64 {
        self.time
    }

    #[tracing::instrument(skip(self), fields(label = %self.label))]
    fn advance_to(&mut self, t: f64) -> Result<(), BridgeError> {
        let step = self
            .exchange(&codec::simstep_message(t))
            .and_then(|body| Reader::new(&body).status(codec::CMD_SIMSTEP));
        step.map_err(|e| self.fault(e))?;
        self.refresh_live().map_err(|e| self.fault(e))?;
        self.time = t;
        trace!(live = self.live.len(), "SUMO 已推进");
        Ok(())
    }

    fn loaded_ids(&mut self) -> Result<Vec<String>, BridgeError> {
        self.id_list(codec::CMD_GET_SIM_VARIABLE, codec::VAR_LOADED_VEHICLES_IDS)
            .map_err(|e| self.fault(e))
    }

    fn live_entities(&mut self) -> Result<Vec<(String, EntityKind)>, BridgeError> {
        Ok(self.live_order.clone())
    }

    fn observe(&mut self, id: &str, kind: EntityKind) -> Result<Observation, BridgeError> {
        if self.live.get(id) != Some(&kind) {
            return Err(BridgeError::UnknownEntity { id: id.to_string() });
        }
        self.observe_remote(id, kind).map_err(|e| self.fault(e))
    }

    fn close(mut self: Box<Self>) -> Result<(), BridgeError> {
        let result = self
            .exchange(&codec::close_message())
            .and_then(|body| Reader::new(&body).status(codec::CMD_CLOSE));
        if let Some(child) = self.child.take() {
            reap(&self.label, child, result.is_err());
        }
        debug!(label = %self.label, "TraCI 会话关闭");
        result.map_err(|e| self.fault(e))
    }
}

impl Drop for TraciSession {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            reap(&self.label, child, true);
        }
    }
}

/// 回收 SUMO 子进程。没有收到 CLOSE 的 SUMO 不会自行退出，必须先杀掉再等待。
fn reap(label: &str, mut child: Child, kill: bool) {
    if kill {
        if let Err(e) = child.kill() {
            warn!(label, error = %e, "结束 SUMO 失败");
        }
    }
    if let Err(e) = child.wait() {
        warn!(label, error = %e, "等待 SUMO 退出失败");
    }
}
