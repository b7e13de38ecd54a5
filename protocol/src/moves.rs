//! 走法定义
//!
//! 格子总是两个字符，大小写保持原样。单格方言的走法是一个格子或弃着，
//! 双格方言的走法是 `XX-YY`。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// 弃着的文本形式
pub const PASS_TEXT: &str = "pass";

/// 弃着的两字符哨兵
pub const PASS_SENTINEL: &str = ".p";

/// 是否为弃着（`pass` 不区分大小写，或 `.p`）
pub(crate) fn is_pass_token(s: &str) -> bool {
    s.eq_ignore_ascii_case(PASS_TEXT) || s == PASS_SENTINEL
}

/// 棋盘格子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square([u8; 2]);

impl Square {
    /// 从两个字符创建，字符须为可见 ASCII 且不能是 `-`
    pub fn new(text: &str) -> Option<Self> {
        match text.as_bytes() {
            &[a, b] if Self::valid_byte(a) && Self::valid_byte(b) => Some(Self([a, b])),
            _ => None,
        }
    }

    fn valid_byte(b: u8) -> bool {
        b.is_ascii_graphic() && b != b'-'
    }

    /// 文本形式
    pub fn as_str(&self) -> &str {
        // 构造时保证是 ASCII
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Square {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::new(s).ok_or_else(|| ProtocolError::InvalidMove(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> Self {
        sq.to_string()
    }
}

/// 单格方言的走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingleMove {
    /// 落子
    Place(Square),
    /// 弃着
    Pass,
}

impl fmt::Display for SingleMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingleMove::Place(sq) => write!(f, "{}", sq),
            SingleMove::Pass => f.write_str(PASS_TEXT),
        }
    }
}

impl FromStr for SingleMove {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_pass_token(s) {
            return Ok(SingleMove::Pass);
        }
        Ok(SingleMove::Place(s.parse()?))
    }
}

/// 双格方言的走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairedMove {
    pub from: Square,
    pub to: Square,
}

impl PairedMove {
    /// 创建新走法
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for PairedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl FromStr for PairedMove {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidMove(s.to_string());
        let (from, to) = s.trim().split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            from: Square::new(from).ok_or_else(invalid)?,
            to: Square::new(to).ok_or_else(invalid)?,
        })
    }
}
