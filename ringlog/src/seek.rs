//! 寻址命令解析
//!
//! 命令格式：
//! ```text
//! AESDCHAR_IOCSEEKTO:<entry_index>,<byte_offset>\n
//! ```
//! 两个字段均为十进制无符号整数，分隔符前不允许任何多余字符。
//! 无前缀的命令是普通数据命令；有前缀但格式错误的命令整体忽略，
//! 既不追加也不回传。解析本身不做 I/O，也不访问缓冲状态。

use crate::constants::{DELIMITER, SEEK_PREFIX};

/// 寻址目标：(条目序号, 条目内字节偏移)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTo {
    pub entry_index: u32,
    pub byte_offset: u32,
}

/// 一条完整命令的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCommand {
    /// 普通数据命令，原样追加
    Write,
    /// 合法的寻址命令
    Seek(SeekTo),
    /// 带寻址前缀但格式非法，整条忽略
    InvalidSeek,
}

/// 分类一条已完成的命令（含结尾分隔符）
pub fn parse_command(cmd: &[u8]) -> ParsedCommand {
    let Some(rest) = cmd.strip_prefix(SEEK_PREFIX) else {
        return ParsedCommand::Write;
    };
    match parse_seek_args(rest) {
        Some(target) => ParsedCommand::Seek(target),
        None => ParsedCommand::InvalidSeek,
    }
}

/// 解析前缀之后的 `<entry>,<offset>\n`
fn parse_seek_args(rest: &[u8]) -> Option<SeekTo> {
    let rest = rest.strip_suffix(&[DELIMITER])?;
    let text = std::str::from_utf8(rest).ok()?;
    let (index_str, offset_str) = text.split_once(',')?;
    Some(SeekTo {
        entry_index: parse_decimal(index_str)?,
        byte_offset: parse_decimal(offset_str)?,
    })
}

/// 严格十进制解析：非空、全数字，拒绝符号与空白
fn parse_decimal(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
