//! 日志条目结构
//!
//! 一条已完成（以分隔符结束）的命令封存为一个 Entry，
//! 封存后不可变，由环形缓冲中的一个槽位独占持有。

/// 单条命令条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    data: Vec<u8>,
}

impl Entry {
    /// 封存一条完整命令
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// 条目字节数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 条目内容
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 取出内容，所有权随之转移
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for Entry {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
