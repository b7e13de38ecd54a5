//! 错误类型定义

use thiserror::Error;

/// 错误类别
///
/// 除 [`ErrorKind::Usage`] 外，其余类别都会终结会话并关闭连接。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 本地调用错误，不涉及任何 I/O
    Usage,
    /// 传输层错误（连接失败、行过长/过短、帧格式错误）
    Io,
    /// 协议违例（意外状态码、序号不同步、阵营不一致）
    Protocol,
    /// 状态码承诺的数据在消息中找不到
    MissingData,
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    // === 调用错误 ===
    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,

    /// 会话已因致命错误关闭
    #[error("Session is closed")]
    SessionClosed,

    /// 无法编码的走法
    #[error("Invalid move: {0:?}")]
    InvalidMove(String),

    // === I/O 错误 ===
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 行过长
    #[error("Line too long: {len} bytes (max: {max})")]
    LineTooLong { len: usize, max: usize },

    /// 行过短
    #[error("Line too short: {len} bytes (min: {min})")]
    LineTooShort { len: usize, min: usize },

    /// 帧格式错误（不是 `NNN text`）
    #[error("Malformed frame: {line:?}")]
    MalformedFrame { line: String },

    // === 协议违例 ===
    /// 握手失败
    #[error("Handshake failed at {stage}: {code:03} {text}")]
    Handshake {
        stage: &'static str,
        code: u16,
        text: String,
    },

    /// 意外的状态码
    #[error("{context}: unexpected status {code:03} {text}")]
    UnexpectedStatus {
        context: &'static str,
        code: u16,
        text: String,
    },

    /// 状态码属于另一方
    #[error("Status code from wrong side: {code:03} {text}")]
    WrongSide { code: u16, text: String },

    /// 序号不同步
    #[error("Serial mismatch: got {actual}, expected {expected}")]
    SerialMismatch { expected: u32, actual: u32 },

    // === 缺失数据 ===
    /// 缺少剩余时间
    #[error("Missing time figure in {code:03} {text}")]
    MissingTime { code: u16, text: String },

    /// 缺少时间控制
    #[error("Missing time controls in {code:03} {text}")]
    MissingTimeControls { code: u16, text: String },

    /// 缺少走法
    #[error("Missing move in {code:03} {text}")]
    MissingMove { code: u16, text: String },

    /// 缺少序号
    #[error("Missing serial in {code:03} {text}")]
    MissingSerial { code: u16, text: String },
}

impl ProtocolError {
    /// 获取错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::GameOver
            | ProtocolError::SessionClosed
            | ProtocolError::InvalidMove(_) => ErrorKind::Usage,
            ProtocolError::Io(_)
            | ProtocolError::ConnectionTimeout
            | ProtocolError::ConnectionClosed
            | ProtocolError::LineTooLong { .. }
            | ProtocolError::LineTooShort { .. }
            | ProtocolError::MalformedFrame { .. } => ErrorKind::Io,
            ProtocolError::Handshake { .. }
            | ProtocolError::UnexpectedStatus { .. }
            | ProtocolError::WrongSide { .. }
            | ProtocolError::SerialMismatch { .. } => ErrorKind::Protocol,
            ProtocolError::MissingTime { .. }
            | ProtocolError::MissingTimeControls { .. }
            | ProtocolError::MissingMove { .. }
            | ProtocolError::MissingSerial { .. } => ErrorKind::MissingData,
        }
    }

    /// 是否终结会话
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::Usage
    }
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
