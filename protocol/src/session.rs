//! 会话状态机
//!
//! 一个 [`Session`] 只在握手成功后存在。之后调用方交替调用
//! [`Session::submit_move`] 和 [`Session::await_move`]，每次调用是一次
//! 同步的请求/应答往返。
//!
//! 序号规则：黑方在提交前加一，白方在等待前加一。每条带走法的状态消息
//! 里的序号都必须与本地序号一致，否则两端已经不同步，会话立即终止。
//!
//! 任何致命错误或对局结束都会关闭连接，且只关闭一次；此后所有操作直接
//! 返回错误，不再触碰连接。

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock;
use crate::dialect::{self, Dialect};
use crate::error::{ProtocolError, Result};
use crate::message::{status, Message};
use crate::side::{Side, Winner};
use crate::transport::{Connection, Connector, TcpConnection, TcpConnector};
use crate::CLIENT_VERSION;

/// 一次操作后的会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// 对局继续
    Continue,
    /// 对局结束，见 [`Session::winner`]
    Done,
}

/// 双方初始时间（秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControls {
    pub white: u32,
    pub black: u32,
}

/// 客户端会话
pub struct Session<D: Dialect, C: Connection> {
    dialect: D,
    side: Side,
    serial: u32,
    winner: Option<Winner>,
    time_controls: Option<TimeControls>,
    my_time: Option<u32>,
    opp_time: Option<u32>,
    channel: Option<C>,
}

impl<D: Dialect> Session<D, TcpConnection> {
    /// 通过 TCP 连接服务器并完成握手
    ///
    /// 端口为方言的基础端口加上 `variant`。
    pub async fn start_game(dialect: D, side: Side, host: &str, variant: u16) -> Result<Self> {
        Self::start_with(&TcpConnector, dialect, side, host, variant).await
    }
}

impl<D: Dialect, C: Connection> Session<D, C> {
    /// 用指定的连接器连接服务器并完成握手
    pub async fn start_with<K>(
        connector: &K,
        dialect: D,
        side: Side,
        host: &str,
        variant: u16,
    ) -> Result<Self>
    where
        K: Connector<Conn = C>,
    {
        let addr = format!("{}:{}", host, dialect.port(variant));
        info!("Connecting to {} ({} dialect) as {}", addr, D::NAME, side);

        let channel = connector.connect(&addr).await?;
        Self::handshake(dialect, side, channel).await
    }

    /// 在已建立的连接上握手
    pub async fn handshake(dialect: D, side: Side, channel: C) -> Result<Self> {
        let mut session = Self {
            dialect,
            side,
            serial: 0,
            winner: None,
            time_controls: None,
            my_time: None,
            opp_time: None,
            channel: Some(channel),
        };

        let result = session.negotiate().await;
        session.settle(result).await?;

        match session.time_controls {
            Some(tc) => info!(
                "Playing {} (time controls: white {}s, black {}s)",
                side, tc.white, tc.black
            ),
            None => info!("Playing {} (no time controls)", side),
        }
        Ok(session)
    }

    /// 提交一步走法
    pub async fn submit_move(&mut self, mv: &D::Move) -> Result<SessionState> {
        self.ensure_active()?;
        let result = self.exchange_submit(mv).await;
        self.settle(result).await
    }

    /// 解析文本后提交走法
    pub async fn submit_move_text(&mut self, text: &str) -> Result<SessionState> {
        self.ensure_active()?;
        let mv = self.dialect.decode(text)?;
        self.submit_move(&mv).await
    }

    /// 等待对手的走法
    ///
    /// 无走法结束（361/362）时返回 `None`。
    pub async fn await_move(&mut self) -> Result<(SessionState, Option<D::Move>)> {
        self.ensure_active()?;
        let result = self.exchange_await().await;
        self.settle(result).await
    }

    /// 本方阵营
    pub fn side(&self) -> Side {
        self.side
    }

    /// 当前序号
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// 胜者，对局进行中为 `None`
    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn time_controls_enabled(&self) -> bool {
        self.time_controls.is_some()
    }

    pub fn time_controls(&self) -> Option<TimeControls> {
        self.time_controls
    }

    pub fn white_time_control(&self) -> Option<u32> {
        self.time_controls.map(|tc| tc.white)
    }

    pub fn black_time_control(&self) -> Option<u32> {
        self.time_controls.map(|tc| tc.black)
    }

    /// 本方剩余时间（秒）
    pub fn my_time(&self) -> Option<u32> {
        self.my_time
    }

    /// 对手剩余时间（秒）
    pub fn opp_time(&self) -> Option<u32> {
        self.opp_time
    }

    /// 连接是否已关闭
    pub fn is_closed(&self) -> bool {
        self.channel.is_none()
    }

    /// 获取远端地址
    pub fn peer_addr(&self) -> Option<String> {
        self.channel.as_ref().and_then(|c| c.peer_addr())
    }

    // ------------------------------------------------------------------------
    // 握手与走法交换
    // ------------------------------------------------------------------------

    async fn negotiate(&mut self) -> Result<()> {
        let greeting = self.read_message().await?;
        if greeting.code != status::GREETING {
            return Err(handshake_error("greeting", greeting));
        }

        let hello = format!("{} player {}", CLIENT_VERSION, self.side);
        self.write_line(&hello).await?;

        let reply = self.read_message().await?;
        match reply.code {
            status::SIDE_ACCEPTED => {}
            status::SIDE_ACCEPTED_TIMED => {
                let (white, black) = clock::time_controls(&reply.text).ok_or_else(|| {
                    ProtocolError::MissingTimeControls {
                        code: reply.code,
                        text: reply.text.clone(),
                    }
                })?;
                self.time_controls = Some(TimeControls { white, black });
                let (mine, theirs) = match self.side {
                    Side::White => (white, black),
                    Side::Black => (black, white),
                };
                self.my_time = Some(mine);
                self.opp_time = Some(theirs);
            }
            _ => return Err(handshake_error("side", reply)),
        }

        let ready = self.read_message().await?;
        let expected = match self.side {
            Side::White => status::WHITE_READY,
            Side::Black => status::BLACK_READY,
        };
        if ready.code != expected {
            return Err(handshake_error("ready", ready));
        }

        Ok(())
    }

    async fn exchange_submit(&mut self, mv: &D::Move) -> Result<SessionState> {
        let text = self.dialect.encode(mv);

        if self.side == Side::Black {
            self.serial += 1;
        }
        let ellipsis = match self.side {
            Side::White => " ...",
            Side::Black => "",
        };
        let line = format!("{}{} {}", self.serial, ellipsis, text);
        self.write_line(&line).await?;

        let result = self.read_message().await?;
        let winner = match result.code {
            status::MOVER_WINS => Some(Winner::from(self.side)),
            status::OPPONENT_WINS => Some(Winner::from(self.side.opponent())),
            status::OTHER_OUTCOME => Some(Winner::Other),
            _ => None,
        };
        if let Some(winner) = winner {
            self.finish(winner).await;
            return Ok(SessionState::Done);
        }

        match result.code {
            status::MOVE_ACCEPTED => {}
            status::MOVE_ACCEPTED_TIMED => {
                let time = clock::first_number(&result.text).ok_or_else(|| {
                    ProtocolError::MissingTime {
                        code: result.code,
                        text: result.text.clone(),
                    }
                })?;
                self.my_time = Some(time);
            }
            _ => return Err(unexpected("submit_move", result)),
        }

        let echo = self.read_message().await?;
        if !D::ECHO_CODES.contains(&echo.code) {
            return Err(unexpected("submit_move echo", echo));
        }
        let (serial, _) = dialect::leading_serial(&echo)?;
        self.check_serial(serial)?;

        Ok(SessionState::Continue)
    }

    async fn exchange_await(&mut self) -> Result<(SessionState, Option<D::Move>)> {
        if self.side == Side::White {
            self.serial += 1;
        }

        let msg = self.read_message().await?;
        let game_over = msg.code == status::BLACK_WINS || msg.code == status::WHITE_WINS;
        if !msg.is_status() && !game_over {
            return Err(unexpected("await_move", msg));
        }
        if self.dialect.belongs_to_other_side(self.side, msg.code) {
            return Err(ProtocolError::WrongSide {
                code: msg.code,
                text: msg.text,
            });
        }
        let Some(entry) = self.dialect.lookup(self.side, msg.code) else {
            return Err(unexpected("await_move", msg));
        };

        let report = entry.parse_report::<D::Move>(&msg)?;
        if let Some(serial) = report.serial {
            self.check_serial(serial)?;
        }
        if let Some(time) = report.time {
            self.opp_time = Some(time);
        }

        match entry.outcome {
            None => Ok((SessionState::Continue, report.mv)),
            Some(winner) => {
                self.finish(winner).await;
                Ok((SessionState::Done, report.mv))
            }
        }
    }

    // ------------------------------------------------------------------------
    // 辅助
    // ------------------------------------------------------------------------

    fn ensure_active(&self) -> Result<()> {
        if self.winner.is_some() {
            return Err(ProtocolError::GameOver);
        }
        if self.channel.is_none() {
            return Err(ProtocolError::SessionClosed);
        }
        Ok(())
    }

    fn check_serial(&self, actual: u32) -> Result<()> {
        if actual != self.serial {
            return Err(ProtocolError::SerialMismatch {
                expected: self.serial,
                actual,
            });
        }
        Ok(())
    }

    /// 致命错误时关闭连接
    async fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() {
                warn!("Session aborted: {}", e);
                self.close().await;
            }
        }
        result
    }

    async fn finish(&mut self, winner: Winner) {
        info!("Game over, winner: {}", winner);
        self.winner = Some(winner);
        self.close().await;
    }

    async fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("Error while closing connection: {}", e);
            }
        }
    }

    async fn read_message(&mut self) -> Result<Message> {
        let channel = self.channel.as_mut().ok_or(ProtocolError::SessionClosed)?;
        let line = channel.read_line().await?;
        debug!("<- {}", line);
        Message::parse(&line)
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(ProtocolError::SessionClosed)?;
        debug!("-> {}", line);
        channel.write_line(line).await
    }
}

fn handshake_error(stage: &'static str, msg: Message) -> ProtocolError {
    ProtocolError::Handshake {
        stage,
        code: msg.code,
        text: msg.text,
    }
}

fn unexpected(context: &'static str, msg: Message) -> ProtocolError {
    ProtocolError::UnexpectedStatus {
        context,
        code: msg.code,
        text: msg.text,
    }
}
