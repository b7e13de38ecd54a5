//! 终端对局循环
//!
//! 轮到本方时从输入读取一行作为走法，否则等待对手走法并打印。

use std::io::Write;

use anyhow::{bail, Context, Result};
use gth_protocol::{Connection, Dialect, Session, SessionState, Side, Winner};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::settings::ClientSettings;

/// 连接服务器并下完一局
pub async fn run<D, R, W>(
    dialect: D,
    settings: &ClientSettings,
    input: R,
    out: &mut W,
) -> Result<Winner>
where
    D: Dialect,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = Session::start_game(dialect, settings.side, &settings.host, settings.variant)
        .await
        .with_context(|| format!("无法开始对局: {}:{}", settings.host, settings.port()))?;

    play(&mut session, input, out).await
}

/// 在已握手的会话上交替走棋，直到对局结束
pub async fn play<D, C, R, W>(session: &mut Session<D, C>, input: R, out: &mut W) -> Result<Winner>
where
    D: Dialect,
    C: Connection,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "执{}，{}方先走", side_name(session.side()), side_name(D::FIRST_MOVER))?;
    if let Some(tc) = session.time_controls() {
        writeln!(out, "时间控制：白方 {} 秒，黑方 {} 秒", tc.white, tc.black)?;
    }

    let mut lines = input.lines();
    let mut my_turn = session.side() == D::FIRST_MOVER;

    loop {
        let state = if my_turn {
            write!(out, "{}> ", session.serial())?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                bail!("输入已结束，对局未完成");
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match session.submit_move_text(line).await {
                Ok(state) => state,
                Err(e) if !e.is_fatal() => {
                    writeln!(out, "无效走法: {}", e)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            let (state, mv) = session.await_move().await?;
            if let Some(mv) = mv {
                writeln!(out, "对手: {}", mv)?;
            }
            state
        };

        if let (Some(mine), Some(theirs)) = (session.my_time(), session.opp_time()) {
            writeln!(out, "剩余时间：本方 {} 秒，对手 {} 秒", mine, theirs)?;
        }

        if state == SessionState::Done {
            break;
        }
        my_turn = !my_turn;
    }

    let winner = session.winner().context("对局结束但没有结果")?;
    let verdict = match winner {
        Winner::Other => "和棋",
        w if w == Winner::from(session.side()) => "你赢了",
        Winner::White => "白方胜",
        Winner::Black => "黑方胜",
    };
    writeln!(out, "对局结束：{}", verdict)?;

    Ok(winner)
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::White => "白",
        Side::Black => "黑",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gth_protocol::{LineChannel, PairedSquare, SingleSquare};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

    /// 先把服务端的全部输出写入管道，结束后返回客户端发送的全部内容
    async fn scripted<D: Dialect>(
        dialect: D,
        side: Side,
        server_lines: &'static str,
        input: &'static [u8],
    ) -> (Result<Winner>, String, String) {
        let (client, mut server) = tokio::io::duplex(4096);
        let (r, w) = tokio::io::split(client);
        server.write_all(server_lines.as_bytes()).await.unwrap();

        let mut session = Session::handshake(dialect, side, LineChannel::new(r, w))
            .await
            .unwrap();

        let mut out = Vec::new();
        let result = play(&mut session, BufReader::new(input), &mut out).await;
        drop(session);

        let mut sent = String::new();
        server.read_to_string(&mut sent).await.unwrap();
        (result, sent, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_black_moves_first_in_single_dialect() {
        let (result, sent, out) = scripted(
            SingleSquare,
            Side::Black,
            "000 hi\r\n100 ok\r\n352 go\r\n\
             200 ok\r\n311 1 d3\r\n\
             312 1 ... c4\r\n\
             201 1 resign\r\n",
            b"d3\nzz9\n\ne3\n",
        )
        .await;

        assert_eq!(result.unwrap(), Winner::Black);
        assert_eq!(sent, "0.9 player black\r1 d3\r2 e3\r");
        assert!(out.contains("对手: c4"));
        assert!(out.contains("无效走法"));
        assert!(out.contains("你赢了"));
    }

    #[tokio::test]
    async fn test_white_waits_first_in_single_dialect() {
        let (result, sent, out) = scripted(
            SingleSquare,
            Side::White,
            "000 hi\r\n101 600 600\r\n351 go\r\n\
             313 1 d3 590\r\n\
             207 580\r\n312 1 ... c4\r\n\
             321 2 e3 wins\r\n",
            b"c4\n",
        )
        .await;

        assert_eq!(result.unwrap(), Winner::Black);
        assert_eq!(sent, "0.9 player white\r1 ... c4\r");
        assert!(out.contains("时间控制：白方 600 秒，黑方 600 秒"));
        assert!(out.contains("剩余时间：本方 580 秒，对手 590 秒"));
        assert!(out.contains("对局结束：黑方胜"));
    }

    #[tokio::test]
    async fn test_input_ends_early() {
        let (result, sent, _) = scripted(
            PairedSquare,
            Side::White,
            "000 hi\r\n100 ok\r\n351 go\r\n",
            b"",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(sent, "0.9 player white\r");
    }

    #[tokio::test]
    async fn test_protocol_error_is_reported() {
        let (result, _, _) = scripted(
            PairedSquare,
            Side::Black,
            "000 hi\r\n100 ok\r\n352 go\r\n312 0 ... e2-e4\r\n",
            b"",
        )
        .await;

        let err = result.unwrap_err();
        let err = err.downcast_ref::<gth_protocol::ProtocolError>().unwrap();
        assert!(matches!(err, gth_protocol::ProtocolError::WrongSide { code: 312, .. }));
    }
}
