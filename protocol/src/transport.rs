//! 传输层抽象
//!
//! 提供 Connector/Connection traits 使会话状态机与具体传输实现解耦，
//! 测试中可以用内存管道代替 TCP。

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{ProtocolError, Result};
use crate::{CONNECT_TIMEOUT, MAX_LINE_LEN, MIN_FRAME_LEN};

/// 连接抽象 trait（会话状态机使用）
#[async_trait]
pub trait Connection: Send {
    /// 读取一行（不含行结束符）
    async fn read_line(&mut self) -> Result<String>;

    /// 写入一行并立即刷新
    async fn write_line(&mut self, line: &str) -> Result<()>;

    /// 关闭连接
    async fn close(&mut self) -> Result<()>;

    /// 获取远端地址
    fn peer_addr(&self) -> Option<String>;
}

/// 连接器 trait
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// 建立连接
    async fn connect(&self, addr: &str) -> Result<Self::Conn>;
}

// ============================================================================
// TCP 实现
// ============================================================================

/// TCP 连接
pub type TcpConnection = LineChannel<OwnedReadHalf, OwnedWriteHalf>;

/// TCP 连接器
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Conn = TcpConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)?
            .map_err(ProtocolError::Io)?;

        LineChannel::from_stream(stream)
    }
}

impl LineChannel<OwnedReadHalf, OwnedWriteHalf> {
    /// 从 TcpStream 创建
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();

        let mut channel = Self::new(read_half, write_half);
        channel.peer_addr = peer_addr;
        Ok(channel)
    }
}

// ============================================================================
// 行通道
// ============================================================================

/// 基于任意读写端的行通道
pub struct LineChannel<R, W> {
    reader: LineReader<R>,
    writer: LineWriter<W>,
    peer_addr: Option<String>,
}

impl<R, W> LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// 由读写两端组装
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: LineReader::new(reader),
            writer: LineWriter::new(writer),
            peer_addr: None,
        }
    }
}

#[async_trait]
impl<R, W> Connection for LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_line(&mut self) -> Result<String> {
        self.reader.read_line().await
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_line(line).await
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

/// 行读取器
///
/// 行以 `\n`、`\r` 或 `\r\n` 结束。`\r` 恰好落在缓冲区末尾时，
/// 下一次读取会跳过紧随其后的 `\n`。
pub struct LineReader<R> {
    reader: BufReader<R>,
    skip_lf: bool,
}

impl<R: AsyncRead + Unpin + Send> LineReader<R> {
    /// 创建新的行读取器
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(MAX_LINE_LEN, reader),
            skip_lf: false,
        }
    }

    /// 读取一行，去掉行结束符
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();

        let raw_len = loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Err(ProtocolError::ConnectionClosed);
            }

            let mut start = 0;
            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    start = 1;
                }
            }

            let rest = &available[start..];
            match rest.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    line.extend_from_slice(&rest[..i]);
                    let mut terminator = 1;
                    if rest[i] == b'\r' {
                        match rest.get(i + 1).copied() {
                            Some(b'\n') => terminator = 2,
                            Some(_) => {}
                            None => self.skip_lf = true,
                        }
                    }
                    let used = start + i + terminator;
                    self.reader.consume(used);
                    break line.len() + terminator;
                }
                None => {
                    line.extend_from_slice(rest);
                    let used = available.len();
                    self.reader.consume(used);
                    if line.len() >= MAX_LINE_LEN {
                        return Err(ProtocolError::LineTooLong {
                            len: line.len(),
                            max: MAX_LINE_LEN,
                        });
                    }
                }
            }
        };

        if raw_len >= MAX_LINE_LEN {
            return Err(ProtocolError::LineTooLong {
                len: raw_len,
                max: MAX_LINE_LEN,
            });
        }
        if line.len() < MIN_FRAME_LEN {
            return Err(ProtocolError::LineTooShort {
                len: line.len(),
                min: MIN_FRAME_LEN,
            });
        }

        Ok(String::from_utf8_lossy(&line).into_owned())
    }
}

/// 行写入器
pub struct LineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> LineWriter<W> {
    /// 创建新的行写入器
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 写入一行（以 `\r` 结束）并刷新
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\r');

        self.writer.write_all(buf.as_bytes()).await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// 关闭写端
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
