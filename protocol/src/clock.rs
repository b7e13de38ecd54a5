//! 时间信息提取
//!
//! 服务端把时间（秒）嵌在自由文本里，格式没有约定。这里只取第一段连续数字，
//! 遇到第一个非数字字符即停止。

/// 找到第一段连续数字，返回其值和之后的剩余文本
///
/// 超出 `u32` 的数值饱和为 `u32::MAX`。
pub fn scan_number(text: &str) -> Option<(u32, &str)> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits = &text[start..];
    let len = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let value = digits[..len].bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    });

    Some((value, &digits[len..]))
}

/// 文本中的第一个整数
pub fn first_number(text: &str) -> Option<u32> {
    scan_number(text).map(|(value, _)| value)
}

/// 时间控制：依次取前两个整数，分别为白方和黑方的初始时间
pub fn time_controls(text: &str) -> Option<(u32, u32)> {
    let (white, rest) = scan_number(text)?;
    let (black, _) = scan_number(rest)?;
    Some((white, black))
}
