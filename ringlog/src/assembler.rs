//! 命令组装器
//!
//! 每个连接持有一个组装器，把到达的字节流按分隔符切分为完整命令。
//! 字节可以一次一个地到达，命令边界与传输报文边界无关。
//!
//! 状态机：`Idle -> Accumulating -> Complete`，Complete 后回到 Idle。
//! 连接关闭时残留的未完成命令直接丢弃——没有分隔符就没有提交。

use crate::constants::DELIMITER;

/// 按换行切分命令的累积器
///
/// 空累积即 Idle，非空即 Accumulating；命令完成时
/// 累积内容的所有权一次性转移给调用方。
#[derive(Debug, Default)]
pub struct CommandAssembler {
    acc: Vec<u8>,
}

impl CommandAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送入一批字节，返回其中完成的所有命令（含分隔符）
    ///
    /// 未完成的尾部保留在累积器中，等待后续 feed。
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut completed = Vec::new();
        for &b in bytes {
            self.acc.push(b);
            if b == DELIMITER {
                completed.push(std::mem::take(&mut self.acc));
            }
        }
        completed
    }

    /// 当前累积的未完成字节数
    pub fn pending_len(&self) -> usize {
        self.acc.len()
    }

    /// 丢弃未完成的累积
    pub fn discard(&mut self) {
        self.acc.clear();
    }
}
