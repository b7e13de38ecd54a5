//! 命令行参数

use std::path::PathBuf;

use clap::Parser;
use gth_protocol::{DialectKind, Side};

use crate::settings::{ClientSettings, LogLevel};

/// 连接棋类对弈服务器，在终端中下棋
#[derive(Parser, Debug)]
#[command(name = "gth-client")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// 服务器主机名或地址
    #[arg(long)]
    pub host: Option<String>,

    /// 服务器编号（端口 = 方言基础端口 + 编号）
    #[arg(short, long)]
    pub variant: Option<u16>,

    /// 请求的阵营（white / black）
    #[arg(short, long)]
    pub side: Option<Side>,

    /// 协议方言（single / paired）
    #[arg(short, long)]
    pub dialect: Option<DialectKind>,

    /// 日志级别
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// 设置文件路径，默认在系统配置目录下
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 把合并后的设置写回设置文件
    #[arg(long)]
    pub save: bool,
}

impl Cli {
    /// 加载设置文件并应用命令行覆盖
    pub fn settings(&self) -> ClientSettings {
        let mut settings = match &self.config {
            Some(path) => ClientSettings::load_from(path),
            None => ClientSettings::load(),
        };
        self.apply(&mut settings);
        settings
    }

    /// 用命令行参数覆盖设置
    pub fn apply(&self, settings: &mut ClientSettings) {
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(variant) = self.variant {
            settings.variant = variant;
        }
        if let Some(side) = self.side {
            settings.side = side;
        }
        if let Some(dialect) = self.dialect {
            settings.dialect = dialect;
        }
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "gth-client",
            "--host",
            "10.0.0.7",
            "-v",
            "2",
            "--side",
            "black",
            "--dialect",
            "paired",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let mut settings = ClientSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.host, "10.0.0.7");
        assert_eq!(settings.variant, 2);
        assert_eq!(settings.side, Side::Black);
        assert_eq!(settings.dialect, DialectKind::Paired);
        assert_eq!(settings.log_level, LogLevel::Debug);
        assert!(!cli.save);
    }

    #[test]
    fn test_no_flags_keep_settings() {
        let cli = Cli::try_parse_from(["gth-client"]).unwrap();
        let mut settings = ClientSettings {
            host: "example.org".to_string(),
            ..ClientSettings::default()
        };
        cli.apply(&mut settings);
        assert_eq!(settings.host, "example.org");
    }

    #[test]
    fn test_rejects_unknown_side() {
        assert!(Cli::try_parse_from(["gth-client", "--side", "red"]).is_err());
    }

    #[test]
    fn test_config_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "host": "from-file", "variant": 4 }"#).unwrap();

        let cli = Cli::try_parse_from([
            "gth-client",
            "--config",
            path.to_str().unwrap(),
            "--variant",
            "5",
        ])
        .unwrap();
        let settings = cli.settings();
        assert_eq!(settings.host, "from-file");
        assert_eq!(settings.variant, 5);
    }
}
