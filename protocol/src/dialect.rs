//! 协议方言
//!
//! 两种方言共享握手、序号和结束判定，只在走法编码和状态表上不同：
//! - 单格方言：走法是一个格子（或 `pass`），黑方先走
//! - 双格方言：走法是 `XX-YY`，白方先走
//!
//! 状态表逐条列出每一方允许收到的状态码，没有从某个通用公式推导。

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock;
use crate::error::{ProtocolError, Result};
use crate::message::Message;
use crate::moves::{is_pass_token, PairedMove, SingleMove};
use crate::side::{Side, Winner};
use crate::{PAIRED_SERVER_BASE, SINGLE_SERVER_BASE};

/// 走法记法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// `<serial> <move>`
    Plain,
    /// `<serial> ... <move>`
    Continuation,
}

/// 状态消息携带的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// 不带走法
    Empty,
    /// 带一步走法
    Move(Notation),
    /// 带一步弃着
    Pass(Notation),
}

/// 状态消息中的对手剩余时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// 不读取时间
    Untimed,
    /// 必须带时间，缺失即出错
    Required,
    /// 有则读取，没有也不算错
    Optional,
}

/// 状态表中的一行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    pub code: u16,
    /// 允许收到此状态码的一方
    pub receiver: Side,
    pub payload: Payload,
    pub timing: Timing,
    /// `None` 表示对局继续
    pub outcome: Option<Winner>,
}

impl StatusEntry {
    const fn new(
        code: u16,
        receiver: Side,
        payload: Payload,
        timing: Timing,
        outcome: Option<Winner>,
    ) -> Self {
        Self {
            code,
            receiver,
            payload,
            timing,
            outcome,
        }
    }

    /// 从状态消息中解出序号、走法和时间
    pub fn parse_report<M>(&self, msg: &Message) -> Result<Report<M>>
    where
        M: FromStr<Err = ProtocolError>,
    {
        let notation = match self.payload {
            Payload::Empty => {
                return Ok(Report {
                    serial: None,
                    mv: None,
                    time: None,
                })
            }
            Payload::Move(n) | Payload::Pass(n) => n,
        };

        let missing_move = || ProtocolError::MissingMove {
            code: msg.code,
            text: msg.text.clone(),
        };

        let (serial, rest) = leading_serial(msg)?;

        let rest = match notation {
            Notation::Plain => rest,
            Notation::Continuation => match next_token(rest) {
                Some(("...", rest)) => rest,
                _ => return Err(missing_move()),
            },
        };

        let (token, rest) = next_token(rest).ok_or_else(missing_move)?;
        // 弃着码只收弃着，走法码不收弃着
        if matches!(self.payload, Payload::Pass(_)) != is_pass_token(token) {
            return Err(missing_move());
        }
        let mv = token.parse::<M>().map_err(|_| missing_move())?;

        let time = match self.timing {
            Timing::Untimed => None,
            Timing::Optional => clock::first_number(rest),
            Timing::Required => {
                let time = clock::first_number(rest).ok_or_else(|| ProtocolError::MissingTime {
                    code: msg.code,
                    text: msg.text.clone(),
                })?;
                Some(time)
            }
        };

        Ok(Report {
            serial: Some(serial),
            mv: Some(mv),
            time,
        })
    }
}

/// 一条状态消息解出的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<M> {
    pub serial: Option<u32>,
    pub mv: Option<M>,
    pub time: Option<u32>,
}

/// 协议方言
pub trait Dialect: Clone + Send + Sync + 'static {
    /// 走法类型
    type Move: Clone + fmt::Debug + fmt::Display + FromStr<Err = ProtocolError> + Send + Sync;

    /// 方言名称
    const NAME: &'static str;

    /// 服务器基础端口，实际端口再加上服务器编号
    const SERVER_BASE: u16;

    /// 先手方
    const FIRST_MOVER: Side;

    /// 提交走法后回显状态码的范围
    const ECHO_CODES: RangeInclusive<u16>;

    /// 等待走法时的状态表
    const STATUS_TABLE: &'static [StatusEntry];

    /// 走法的线上文本
    fn encode(&self, mv: &Self::Move) -> String {
        mv.to_string()
    }

    /// 解析线上文本
    fn decode(&self, text: &str) -> Result<Self::Move> {
        text.parse()
    }

    /// 服务器端口
    fn port(&self, variant: u16) -> u16 {
        Self::SERVER_BASE.saturating_add(variant)
    }

    /// 查找 (side, code) 对应的表项
    fn lookup(&self, side: Side, code: u16) -> Option<&'static StatusEntry> {
        Self::STATUS_TABLE
            .iter()
            .find(|e| e.receiver == side && e.code == code)
    }

    /// 状态码是否只属于另一方
    fn belongs_to_other_side(&self, side: Side, code: u16) -> bool {
        self.lookup(side, code).is_none() && self.lookup(side.opponent(), code).is_some()
    }
}

/// 单格方言
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleSquare;

/// 双格方言
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairedSquare;

use Notation::{Continuation, Plain};
use Payload::{Empty, Move, Pass};
use Timing::{Optional, Required, Untimed};

const W: Side = Side::White;
const B: Side = Side::Black;

impl Dialect for SingleSquare {
    type Move = SingleMove;

    const NAME: &'static str = "single";
    const SERVER_BASE: u16 = SINGLE_SERVER_BASE;
    const FIRST_MOVER: Side = Side::Black;
    const ECHO_CODES: RangeInclusive<u16> = 311..=318;

    const STATUS_TABLE: &'static [StatusEntry] = &[
        StatusEntry::new(311, W, Move(Plain), Untimed, None),
        StatusEntry::new(313, W, Move(Plain), Required, None),
        StatusEntry::new(315, W, Pass(Plain), Untimed, None),
        StatusEntry::new(317, W, Pass(Plain), Optional, None),
        StatusEntry::new(321, W, Move(Plain), Untimed, Some(Winner::Black)),
        StatusEntry::new(322, W, Move(Plain), Untimed, Some(Winner::White)),
        StatusEntry::new(325, W, Move(Plain), Untimed, Some(Winner::Other)),
        StatusEntry::new(361, W, Empty, Untimed, Some(Winner::Black)),
        StatusEntry::new(362, W, Empty, Untimed, Some(Winner::White)),
        StatusEntry::new(312, B, Move(Continuation), Untimed, None),
        StatusEntry::new(314, B, Move(Continuation), Required, None),
        StatusEntry::new(316, B, Pass(Continuation), Untimed, None),
        StatusEntry::new(318, B, Pass(Continuation), Optional, None),
        StatusEntry::new(323, B, Move(Continuation), Untimed, Some(Winner::White)),
        StatusEntry::new(324, B, Move(Continuation), Untimed, Some(Winner::Black)),
        StatusEntry::new(326, B, Move(Continuation), Untimed, Some(Winner::Other)),
        StatusEntry::new(361, B, Empty, Untimed, Some(Winner::Black)),
        StatusEntry::new(362, B, Empty, Untimed, Some(Winner::White)),
    ];
}

impl Dialect for PairedSquare {
    type Move = PairedMove;

    const NAME: &'static str = "paired";
    const SERVER_BASE: u16 = PAIRED_SERVER_BASE;
    const FIRST_MOVER: Side = Side::White;
    const ECHO_CODES: RangeInclusive<u16> = 311..=314;

    const STATUS_TABLE: &'static [StatusEntry] = &[
        StatusEntry::new(312, W, Move(Continuation), Untimed, None),
        StatusEntry::new(314, W, Move(Continuation), Required, None),
        StatusEntry::new(323, W, Move(Continuation), Untimed, Some(Winner::Black)),
        StatusEntry::new(324, W, Move(Continuation), Untimed, Some(Winner::White)),
        StatusEntry::new(326, W, Move(Continuation), Untimed, Some(Winner::Other)),
        StatusEntry::new(361, W, Empty, Untimed, Some(Winner::Black)),
        StatusEntry::new(362, W, Empty, Untimed, Some(Winner::White)),
        StatusEntry::new(311, B, Move(Plain), Untimed, None),
        StatusEntry::new(313, B, Move(Plain), Required, None),
        StatusEntry::new(321, B, Move(Plain), Untimed, Some(Winner::White)),
        StatusEntry::new(322, B, Move(Plain), Untimed, Some(Winner::Black)),
        StatusEntry::new(325, B, Move(Plain), Untimed, Some(Winner::Other)),
        StatusEntry::new(361, B, Empty, Untimed, Some(Winner::Black)),
        StatusEntry::new(362, B, Empty, Untimed, Some(Winner::White)),
    ];
}

/// 方言选择（用于配置和命令行）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Single,
    Paired,
}

impl DialectKind {
    /// 服务器基础端口
    pub fn server_base(self) -> u16 {
        match self {
            DialectKind::Single => SingleSquare::SERVER_BASE,
            DialectKind::Paired => PairedSquare::SERVER_BASE,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::Single => f.write_str(SingleSquare::NAME),
            DialectKind::Paired => f.write_str(PairedSquare::NAME),
        }
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(DialectKind::Single),
            "paired" => Ok(DialectKind::Paired),
            _ => Err(format!("unknown dialect: {}", s)),
        }
    }
}

/// 取出文本开头的序号
pub(crate) fn leading_serial(msg: &Message) -> Result<(u32, &str)> {
    next_token(&msg.text)
        .and_then(|(token, rest)| token.parse::<u32>().ok().map(|serial| (serial, rest)))
        .ok_or_else(|| ProtocolError::MissingSerial {
            code: msg.code,
            text: msg.text.clone(),
        })
}

/// 以空白分隔取下一个词
fn next_token(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    Some((&text[..end], &text[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(line: &str) -> Message {
        Message::parse(line).unwrap()
    }

    #[test]
    fn test_tables_have_unique_keys() {
        fn check(table: &[StatusEntry]) {
            for (i, a) in table.iter().enumerate() {
                for b in &table[i + 1..] {
                    assert!(!(a.code == b.code && a.receiver == b.receiver), "{}", a.code);
                }
            }
        }
        check(SingleSquare::STATUS_TABLE);
        check(PairedSquare::STATUS_TABLE);
    }

    #[test]
    fn test_single_side_partition() {
        let d = SingleSquare;
        for code in [311, 313, 315, 317, 321, 322, 325] {
            assert!(d.lookup(Side::White, code).is_some());
            assert!(d.belongs_to_other_side(Side::Black, code));
        }
        for code in [312, 314, 316, 318, 323, 324, 326] {
            assert!(d.lookup(Side::Black, code).is_some());
            assert!(d.belongs_to_other_side(Side::White, code));
        }
        assert!(!d.belongs_to_other_side(Side::White, 361));
        assert!(d.lookup(Side::White, 319).is_none());
    }

    #[test]
    fn test_paired_has_no_pass_codes() {
        let d = PairedSquare;
        for code in 315..=318 {
            assert!(d.lookup(Side::White, code).is_none());
            assert!(d.lookup(Side::Black, code).is_none());
        }
        assert!(d.belongs_to_other_side(Side::White, 311));
        assert!(d.belongs_to_other_side(Side::Black, 312));
    }

    #[test]
    fn test_parse_plain_move() {
        let entry = SingleSquare.lookup(Side::White, 311).unwrap();
        let report = entry.parse_report::<SingleMove>(&msg("311 3 d3")).unwrap();
        assert_eq!(report.serial, Some(3));
        assert_eq!(report.mv, Some("d3".parse().unwrap()));
        assert_eq!(report.time, None);
    }

    #[test]
    fn test_parse_continuation_move_with_time() {
        let entry = SingleSquare.lookup(Side::Black, 314).unwrap();
        let report = entry
            .parse_report::<SingleMove>(&msg("314 2 ... c4 117 seconds left"))
            .unwrap();
        assert_eq!(report.serial, Some(2));
        assert_eq!(report.mv, Some("c4".parse().unwrap()));
        assert_eq!(report.time, Some(117));
    }

    #[test]
    fn test_parse_pass() {
        let entry = SingleSquare.lookup(Side::Black, 316).unwrap();
        let report = entry.parse_report::<SingleMove>(&msg("316 5 ... pass")).unwrap();
        assert_eq!(report.mv, Some(SingleMove::Pass));

        let entry = SingleSquare.lookup(Side::White, 315).unwrap();
        assert!(matches!(
            entry.parse_report::<SingleMove>(&msg("315 5 d3")),
            Err(ProtocolError::MissingMove { .. })
        ));
    }

    #[test]
    fn test_move_codes_reject_pass() {
        for (side, line) in [
            (Side::White, "311 1 pass"),
            (Side::White, "313 1 .p 90"),
            (Side::White, "321 1 PASS"),
            (Side::Black, "326 1 ... pass"),
        ] {
            let code = msg(line).code;
            let entry = SingleSquare.lookup(side, code).unwrap();
            assert!(
                matches!(
                    entry.parse_report::<SingleMove>(&msg(line)),
                    Err(ProtocolError::MissingMove { .. })
                ),
                "{}",
                line
            );
        }
    }

    #[test]
    fn test_pass_time_is_optional() {
        let entry = SingleSquare.lookup(Side::White, 317).unwrap();
        let report = entry.parse_report::<SingleMove>(&msg("317 1 pass")).unwrap();
        assert_eq!(report.mv, Some(SingleMove::Pass));
        assert_eq!(report.time, None);

        let report = entry.parse_report::<SingleMove>(&msg("317 1 pass 45")).unwrap();
        assert_eq!(report.time, Some(45));

        let entry = SingleSquare.lookup(Side::Black, 318).unwrap();
        let report = entry.parse_report::<SingleMove>(&msg("318 2 ... .p")).unwrap();
        assert_eq!(report.mv, Some(SingleMove::Pass));
        assert_eq!(report.time, None);
    }

    #[test]
    fn test_parse_missing_pieces() {
        let entry = SingleSquare.lookup(Side::Black, 312).unwrap();
        assert!(matches!(
            entry.parse_report::<SingleMove>(&msg("312 2 c4")),
            Err(ProtocolError::MissingMove { .. })
        ));
        assert!(matches!(
            entry.parse_report::<SingleMove>(&msg("312 two ... c4")),
            Err(ProtocolError::MissingSerial { .. })
        ));

        let entry = SingleSquare.lookup(Side::White, 311).unwrap();
        assert!(matches!(
            entry.parse_report::<SingleMove>(&msg("311 2 d3, check")),
            Err(ProtocolError::MissingMove { .. })
        ));

        let entry = SingleSquare.lookup(Side::White, 313).unwrap();
        assert!(matches!(
            entry.parse_report::<SingleMove>(&msg("313 2 c4 no clock")),
            Err(ProtocolError::MissingTime { .. })
        ));
    }

    #[test]
    fn test_parse_paired_move() {
        let entry = PairedSquare.lookup(Side::Black, 311).unwrap();
        let report = entry.parse_report::<PairedMove>(&msg("311 0 e2-e4")).unwrap();
        assert_eq!(report.serial, Some(0));
        assert_eq!(report.mv, Some("e2-e4".parse().unwrap()));
    }

    #[test]
    fn test_parse_empty_payload() {
        let entry = PairedSquare.lookup(Side::White, 361).unwrap();
        let report = entry.parse_report::<PairedMove>(&msg("361 time expired")).unwrap();
        assert_eq!(report.serial, None);
        assert_eq!(report.mv, None);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for text in ["d3", "pass", "H8"] {
            let mv = SingleSquare.decode(text).unwrap();
            assert_eq!(SingleSquare.decode(&SingleSquare.encode(&mv)).unwrap(), mv);
        }
        let mv = PairedSquare.decode("a7-a5").unwrap();
        assert_eq!(PairedSquare.encode(&mv), "a7-a5");
        assert_eq!(PairedSquare.decode(&PairedSquare.encode(&mv)).unwrap(), mv);
    }

    #[test]
    fn test_ports_and_kind() {
        assert_eq!(SingleSquare.port(1), 29069);
        assert_eq!("paired".parse::<DialectKind>().unwrap(), DialectKind::Paired);
        assert_eq!(DialectKind::Single.to_string(), "single");
        assert_eq!(DialectKind::Paired.server_base(), PAIRED_SERVER_BASE);
    }
}
