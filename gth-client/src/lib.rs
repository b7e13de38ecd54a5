//! 棋类对弈服务器的命令行客户端
//!
//! 包含:
//! - 设置持久化
//! - 命令行参数
//! - 终端对局循环

pub mod cli;
pub mod play;
pub mod settings;

pub use cli::Cli;
pub use play::{play, run};
pub use settings::{ClientSettings, LogLevel};
