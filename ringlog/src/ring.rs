//! 环形条目缓冲区
//!
//! 固定容量 N 的环形缓冲，写满后覆盖最旧条目。
//!
//! 布局：
//! ```text
//! ┌────────┬────────┬────────┬────────┬────────┐
//! │ slot 0 │ slot 1 │ slot 2 │  ...   │ slot N │
//! └────────┴────────┴────────┴────────┴────────┘
//!              ↑                  ↑
//!           read_idx          write_idx
//! ```
//!
//! 已占用槽位按环形顺序 `[read_idx, write_idx)` 排列；
//! `full == true` 时 `read_idx == write_idx` 且所有槽位有效。
//! 所有条目按环形顺序拼接构成"虚拟流"，全局字节偏移即该流内的下标。

use crate::entry::Entry;

/// 环形条目缓冲
#[derive(Debug)]
pub struct EntryRing {
    slots: Vec<Option<Entry>>,
    write_idx: usize,
    read_idx: usize,
    full: bool,
}

impl EntryRing {
    /// 创建容量为 `capacity` 的空缓冲
    ///
    /// 容量必须大于 0。
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            write_idx: 0,
            read_idx: 0,
            full: false,
        }
    }

    /// 槽位总数
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 已占用槽位数
    pub fn len(&self) -> usize {
        if self.full {
            self.capacity()
        } else {
            (self.write_idx + self.capacity() - self.read_idx) % self.capacity()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.write_idx == self.read_idx
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// 虚拟流总字节数
    pub fn total_len(&self) -> u64 {
        self.iter().map(|e| e.len() as u64).sum()
    }

    /// 追加一条条目
    ///
    /// 写入 `write_idx` 槽位，返回被挤出的旧条目（所有权转移给调用方，
    /// 缓冲自身不负责释放）。缓冲已满时 `read_idx` 一并前进，
    /// 即逻辑头部条目被淘汰。
    pub fn push(&mut self, entry: Entry) -> Option<Entry> {
        let evicted = std::mem::replace(&mut self.slots[self.write_idx], Some(entry));
        self.write_idx = (self.write_idx + 1) % self.capacity();
        if self.full {
            self.read_idx = self.write_idx;
        } else if self.write_idx == self.read_idx {
            self.full = true;
        }
        evicted
    }

    /// 把全局偏移解析为 (条目, 条目内偏移)
    ///
    /// 从 `read_idx` 起按环形顺序遍历。满缓冲时 `read_idx == write_idx`，
    /// 因此固定走 `len()` 个槽位而不是以 `write_idx` 为终点。
    /// 偏移不小于 `total_len()` 时返回 `None`。
    pub fn resolve(&self, global_offset: u64) -> Option<(&Entry, usize)> {
        let mut remaining = global_offset;
        let mut idx = self.read_idx;
        for _ in 0..self.len() {
            let entry = self.slots[idx].as_ref()?;
            let len = entry.len() as u64;
            if remaining < len {
                return Some((entry, remaining as usize));
            }
            remaining -= len;
            idx = (idx + 1) % self.capacity();
        }
        None
    }

    /// 把 (条目序号, 条目内偏移) 转换为全局偏移
    ///
    /// `entry_index` 按环形顺序从最旧条目数起。序号不小于占用数、
    /// 或偏移不小于目标条目长度时返回 `None`。
    pub fn offset_of(&self, entry_index: usize, byte_offset: usize) -> Option<u64> {
        if entry_index >= self.len() {
            return None;
        }
        let mut global = 0u64;
        let mut idx = self.read_idx;
        for _ in 0..entry_index {
            global += self.slots[idx].as_ref()?.len() as u64;
            idx = (idx + 1) % self.capacity();
        }
        let entry = self.slots[idx].as_ref()?;
        if byte_offset >= entry.len() {
            return None;
        }
        Some(global + byte_offset as u64)
    }

    /// 从全局偏移处读出字节
    ///
    /// 单次最多读到所在条目末尾，返回实际读出的字节数；
    /// 偏移越界时返回 0。调用方循环推进偏移即可读完整个虚拟流。
    pub fn read_at(&self, global_offset: u64, buf: &mut [u8]) -> usize {
        let Some((entry, local)) = self.resolve(global_offset) else {
            return 0;
        };
        let n = buf.len().min(entry.len() - local);
        buf[..n].copy_from_slice(&entry.data()[local..local + n]);
        n
    }

    /// 按环形顺序遍历已占用条目（最旧在前）
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        let cap = self.capacity();
        let start = self.read_idx;
        (0..self.len()).filter_map(move |i| self.slots[(start + i) % cap].as_ref())
    }

    /// 清空为初始状态
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.write_idx = 0;
        self.read_idx = 0;
        self.full = false;
    }
}
