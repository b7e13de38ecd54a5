//! 消息类型定义
//!
//! 服务端每行一条消息，格式为 `NNN text`：三位十进制状态码、一个空格、任意文本。

use std::fmt;

use crate::error::{ProtocolError, Result};

/// 状态码
pub mod status {
    /// 问候
    pub const GREETING: u16 = 0;
    /// 阵营已接受，无时间控制
    pub const SIDE_ACCEPTED: u16 = 100;
    /// 阵营已接受，附带时间控制
    pub const SIDE_ACCEPTED_TIMED: u16 = 101;
    /// 走法已接受
    pub const MOVE_ACCEPTED: u16 = 200;
    /// 走法方获胜
    pub const MOVER_WINS: u16 = 201;
    /// 对手获胜
    pub const OPPONENT_WINS: u16 = 202;
    /// 其他结果（和棋/中止）
    pub const OTHER_OUTCOME: u16 = 203;
    /// 走法已接受，附带剩余时间
    pub const MOVE_ACCEPTED_TIMED: u16 = 207;
    /// 走法/状态通知的起始码
    pub const STATUS_FIRST: u16 = 311;
    /// 走法/状态通知的结束码
    pub const STATUS_LAST: u16 = 326;
    /// 白方握手确认
    pub const WHITE_READY: u16 = 351;
    /// 黑方握手确认
    pub const BLACK_READY: u16 = 352;
    /// 无走法结束：黑方胜
    pub const BLACK_WINS: u16 = 361;
    /// 无走法结束：白方胜
    pub const WHITE_WINS: u16 = 362;
}

/// 一条服务端消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// 状态码（0-999）
    pub code: u16,
    /// 空格之后的文本，原样保留
    pub text: String,
}

impl Message {
    /// 解析一行（已去掉行结束符）
    pub fn parse(line: &str) -> Result<Self> {
        let bytes = line.as_bytes();
        let framed = bytes.len() >= 4
            && bytes[..3].iter().all(u8::is_ascii_digit)
            && bytes[3] == b' ';
        if !framed {
            return Err(ProtocolError::MalformedFrame {
                line: line.to_string(),
            });
        }

        let code = bytes[..3]
            .iter()
            .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));

        Ok(Self {
            code,
            text: line[4..].to_string(),
        })
    }

    /// 是否为走法/状态通知
    pub fn is_status(&self) -> bool {
        (status::STATUS_FIRST..=status::STATUS_LAST).contains(&self.code)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03} {}", self.code, self.text)
    }
}
