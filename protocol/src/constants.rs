//! 协议常量定义

use std::time::Duration;

/// 客户端版本号（握手时发送）
pub const CLIENT_VERSION: &str = "0.9";

/// 单行最大字节数（含行结束符）
pub const MAX_LINE_LEN: usize = 1024;

/// 最短有效帧：三位状态码 + 一个空格
pub const MIN_FRAME_LEN: usize = 4;

/// 单格方言的服务器基础端口
pub const SINGLE_SERVER_BASE: u16 = 29068;

/// 双格方言的服务器基础端口
pub const PAIRED_SERVER_BASE: u16 = 29057;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
