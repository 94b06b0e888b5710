//! TraCI 报文编解码
//!
//! 大端序。一条消息 = u32 总长度 + 若干命令；一条命令 = u8 长度
//!（或 `0` + u32 扩展长度）+ 命令 ID + 载荷。

use thiserror::Error;

pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE: u8 = 0x7f;
pub const CMD_GET_VEHICLE_VARIABLE: u8 = 0xa4;
pub const CMD_GET_SIM_VARIABLE: u8 = 0xab;
pub const CMD_GET_PERSON_VARIABLE: u8 = 0xae;
/// 读取类命令的响应 ID = 请求 ID + 该偏移
pub const RESPONSE_OFFSET: u8 = 0x10;

pub const VAR_ID_LIST: u8 = 0x00;
pub const VAR_SPEED: u8 = 0x40;
pub const VAR_POSITION: u8 = 0x42;
pub const VAR_ANGLE: u8 = 0x43;
pub const VAR_LANE_ID: u8 = 0x51;
pub const VAR_LOADED_VEHICLES_IDS: u8 = 0x72;

pub const TYPE_POSITION_2D: u8 = 0x01;
pub const TYPE_INTEGER: u8 = 0x09;
pub const TYPE_DOUBLE: u8 = 0x0b;
pub const TYPE_STRING: u8 = 0x0c;
pub const TYPE_STRING_LIST: u8 = 0x0e;

pub const RTYPE_OK: u8 = 0x00;

#[derive(Debug, Error)]
pub enum TraciError {
    #[error("i/o error on the TraCI socket")]
    Io(#[from] std::io::Error),
    #[error("truncated message: needed {needed} bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },
    #[error("malformed command length {0}")]
    BadLength(usize),
    #[error("expected response to command {expected:#04x}, got {found:#04x}")]
    UnexpectedCommand { expected: u8, found: u8 },
    #[error("expected value type {expected:#04x}, got {found:#04x}")]
    UnexpectedType { expected: u8, found: u8 },
    #[error("unknown value type {0:#04x}")]
    UnknownType(u8),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("command {command:#04x} rejected by SUMO: {description}")]
    Status { command: u8, description: String },
}

/// 带类型标记的 TraCI 值
#[derive(Debug, Clone, PartialEq)]
pub enum TraciValue {
    Position(f64, f64),
    Integer(i32),
    Double(f64),
    Str(String),
    StringList(Vec<String>),
}

impl TraciValue {
    fn type_id(&self) -> u8 {
        match self {
            TraciValue::Position(..) => TYPE_POSITION_2D,
            TraciValue::Integer(_) => TYPE_INTEGER,
            TraciValue::Double(_) => TYPE_DOUBLE,
            TraciValue::Str(_) => TYPE_STRING,
            TraciValue::StringList(_) => TYPE_STRING_LIST,
        }
    }

    pub fn into_double(self) -> Result<f64, TraciError> {
        match self {
            TraciValue::Double(v) => Ok(v),
            other => Err(TraciError::UnexpectedType {
                expected: TYPE_DOUBLE,
                found: other.type_id(),
            }),
        }
    }

    pub fn into_position(self) -> Result<(f64, f64), TraciError> {
        match self {
            TraciValue::Position(x, y) => Ok((x, y)),
            other => Err(TraciError::UnexpectedType {
                expected: TYPE_POSITION_2D,
                found: other.type_id(),
            }),
        }
    }

    pub fn into_string(self) -> Result<String, TraciError> {
        match self {
            TraciValue::Str(s) => Ok(s),
            other => Err(TraciError::UnexpectedType {
                expected: TYPE_STRING,
                found: other.type_id(),
            }),
        }
    }

    pub fn into_string_list(self) -> Result<Vec<String>, TraciError> {
        match self {
            TraciValue::StringList(v) => Ok(v),
            other => Err(TraciError::UnexpectedType {
                expected: TYPE_STRING_LIST,
                found: other.type_id(),
            }),
        }
    }
}

pub fn put_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// 追加一条命令；超过 255 字节时改用扩展长度
pub fn put_command(out: &mut Vec<u8>, id: u8, payload: &[u8]) {
    let short_len = payload.len() + 2;
    if short_len <= u8::MAX as usize {
        out.push(short_len as u8);
    } else {
        out.push(0);
        out.extend_from_slice(&((payload.len() + 6) as u32).to_be_bytes());
    }
    out.push(id);
    out.extend_from_slice(payload);
}

/// 为已编码的命令加上消息总长度
pub fn frame(commands: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(commands.len() + 4);
    msg.extend_from_slice(&((commands.len() + 4) as u32).to_be_bytes());
    msg.extend_from_slice(commands);
    msg
}

pub fn simstep_message(target_s: f64) -> Vec<u8> {
    let mut cmd = Vec::new();
    put_command(&mut cmd, CMD_SIMSTEP, &target_s.to_be_bytes());
    frame(&cmd)
}

pub fn close_message() -> Vec<u8> {
    let mut cmd = Vec::new();
    put_command(&mut cmd, CMD_CLOSE, &[]);
    frame(&cmd)
}

pub fn get_variable_message(domain: u8, var: u8, object_id: &str) -> Vec<u8> {
    let mut payload = vec![var];
    put_string(&mut payload, object_id);
    let mut cmd = Vec::new();
    put_command(&mut cmd, domain, &payload);
    frame(&cmd)
}

/// 消息体（总长度之后的字节）上的读游标
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TraciError> {
        if self.buf.len() < n {
            return Err(TraciError::Truncated {
                needed: n,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TraciError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, TraciError> {
        Ok(self.take(1)?[0])
    }

    pub fn i32(&mut self) -> Result<i32, TraciError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32, TraciError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn f64(&mut self) -> Result<f64, TraciError> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    pub fn string(&mut self) -> Result<String, TraciError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| TraciError::InvalidUtf8)
    }

    pub fn string_list(&mut self) -> Result<Vec<String>, TraciError> {
        let n = self.u32()? as usize;
        (0..n).map(|_| self.string()).collect()
    }

    pub fn value(&mut self) -> Result<TraciValue, TraciError> {
        match self.u8()? {
            TYPE_POSITION_2D => Ok(TraciValue::Position(self.f64()?, self.f64()?)),
            TYPE_INTEGER => Ok(TraciValue::Integer(self.i32()?)),
            TYPE_DOUBLE => Ok(TraciValue::Double(self.f64()?)),
            TYPE_STRING => Ok(TraciValue::Str(self.string()?)),
            TYPE_STRING_LIST => Ok(TraciValue::StringList(self.string_list()?)),
            other => Err(TraciError::UnknownType(other)),
        }
    }

    /// 读取一条命令头，返回命令 ID 与其载荷上的游标
    pub fn command(&mut self) -> Result<(u8, Reader<'a>), TraciError> {
        let short = self.u8()? as usize;
        let payload_len = if short == 0 {
            let ext = self.u32()? as usize;
            ext.checked_sub(6).ok_or(TraciError::BadLength(ext))?
        } else {
            short.checked_sub(2).ok_or(TraciError::BadLength(short))?
        };
        let id = self.u8()?;
        let payload = self.take(payload_len)?;
        Ok((id, Reader::new(payload)))
    }

    /// 消费每个响应开头的状态命令；非 OK 时带回对端描述
    pub fn status(&mut self, expected: u8) -> Result<(), TraciError> {
        let (id, mut body) = self.command()?;
        if id != expected {
            return Err(TraciError::UnexpectedCommand { expected, found: id });
        }
        let result = body.u8()?;
        let description = body.string()?;
        if result != RTYPE_OK {
            return Err(TraciError::Status {
                command: id,
                description,
            });
        }
        Ok(())
    }

    /// 解析读取请求在状态命令之后的响应命令
    pub fn variable(&mut self, domain: u8, var: u8) -> Result<TraciValue, TraciError> {
        let expected = domain.wrapping_add(RESPONSE_OFFSET);
        let (id, mut body) = self.command()?;
        if id != expected {
            return Err(TraciError::UnexpectedCommand { expected, found: id });
        }
        let got_var = body.u8()?;
        if got_var != var {
            return Err(TraciError::UnexpectedCommand {
                expected: var,
                found: got_var,
            });
        }
        let _object_id = body.string()?;
        body.value()
    }
}

#[cfg(test)]
pub(crate) fn status_command(out: &mut Vec<u8>, command: u8, result: u8, description: &str) {
    let mut payload = vec![result];
    put_string(&mut payload, description);
    put_command(out, command, &payload);
}

#[cfg(test)]
pub(crate) fn variable_command(out: &mut Vec<u8>, domain: u8, var: u8, object_id: &str, value: &TraciValue) {
    let mut payload = vec![var];
    put_string(&mut payload, object_id);
    payload.push(value.type_id());
    match value {
        TraciValue::Position(x, y) => {
            payload.extend_from_slice(&x.to_be_bytes());
            payload.extend_from_slice(&y.to_be_bytes());
        }
        TraciValue::Integer(v) => payload.extend_from_slice(&v.to_be_bytes()),
        TraciValue::Double(v) => payload.extend_from_slice(&v.to_be_bytes()),
        TraciValue::Str(s) => put_string(&mut payload, s),
        TraciValue::StringList(list) => {
            payload.extend_from_slice(&(list.len() as u32).to_be_bytes());
            for s in list {
                put_string(&mut payload, s);
            }
        }
    }
    put_command(out, domain.wrapping_add(RESPONSE_OFFSET), &payload);
}
