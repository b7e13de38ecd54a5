//! 回合制棋类对弈服务器的客户端协议库
//!
//! 包含:
//! - 行通道 (Connector, Connection traits, TCP 实现)
//! - 消息解析 (`NNN text`)
//! - 会话状态机 (握手、序号同步、胜负判定)
//! - 走法编解码 (单格方言与双格方言)
//! - 时间信息提取

pub mod clock;
mod constants;
pub mod dialect;
mod error;
mod message;
mod moves;
mod session;
mod side;
mod transport;

pub use constants::*;
pub use dialect::{Dialect, DialectKind, PairedSquare, SingleSquare};
pub use error::{ErrorKind, ProtocolError, Result};
pub use message::{status, Message};
pub use moves::{PairedMove, SingleMove, Square, PASS_SENTINEL, PASS_TEXT};
pub use session::{Session, SessionState, TimeControls};
pub use side::{Side, Winner};
pub use transport::{
    Connection, Connector, LineChannel, LineReader, LineWriter, TcpConnection, TcpConnector,
};
