//! ringlog - 有界环形命令日志
//!
//! 特性：
//! - 固定容量：超出容量后自动覆盖最旧的命令条目
//! - 流式寻址：全局字节偏移可解析为 (条目, 条目内偏移)
//! - 命令组装：按换行分隔把字节流切分为完整命令
//! - 寻址协议：`AESDCHAR_IOCSEEKTO:<entry>,<offset>` 文本命令解析
//! - 后端抽象：内存环形缓冲或文件两种存储后端

pub mod assembler;
pub mod constants;
pub mod entry;
pub mod ring;
pub mod seek;
pub mod store;

pub use assembler::CommandAssembler;
pub use entry::Entry;
pub use ring::EntryRing;
pub use seek::{parse_command, ParsedCommand, SeekTo};
pub use store::{FileStore, LogStore, MemStore, StoreError};
