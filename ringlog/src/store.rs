//! 存储后端抽象
//!
//! 服务端通过统一的 `LogStore` 接口操作命令日志，后端二选一：
//! - `MemStore`：进程内环形缓冲，满后淘汰最旧条目
//! - `FileStore`：追加写文件，虚拟流即文件全部内容，不淘汰
//!
//! 文件后端的寻址不能用裸字节偏移表达"跳到第 K 条命令"，
//! 因此 `seek_to` 是显式的 (条目, 偏移) 寻址调用，由后端自行换算。

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;

use crate::constants::DELIMITER;
use crate::entry::Entry;
use crate::ring::EntryRing;
use crate::seek::SeekTo;

/// 存储后端错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("seek target out of range: entry {entry_index}, offset {byte_offset}")]
    OutOfRange { entry_index: u32, byte_offset: u32 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// 命令日志后端
///
/// 调用方负责互斥：`append`/`seek_to`/`read_at` 构成的
/// "写入后回读"或"寻址后回读"复合操作必须在同一把锁内完成，
/// 文件后端的读写游标不允许被其他操作穿插。
pub trait LogStore: Send {
    /// 追加一条完整命令，返回被淘汰条目的内容（若有）
    fn append(&mut self, command: Vec<u8>) -> io::Result<Option<Vec<u8>>>;

    /// 把 (条目序号, 条目内偏移) 解析为全局偏移
    ///
    /// 序号或偏移越界时返回 `StoreError::OutOfRange`，不改变任何状态。
    fn seek_to(&mut self, target: SeekTo) -> Result<u64, StoreError>;

    /// 从全局偏移读出字节，返回 0 表示流结束
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// 虚拟流总字节数
    fn total_len(&mut self) -> io::Result<u64>;
}

/// 内存后端：环形缓冲
#[derive(Debug)]
pub struct MemStore {
    ring: EntryRing,
}

impl MemStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: EntryRing::new(capacity),
        }
    }

    pub fn ring(&self) -> &EntryRing {
        &self.ring
    }
}

impl LogStore for MemStore {
    fn append(&mut self, command: Vec<u8>) -> io::Result<Option<Vec<u8>>> {
        let evicted = self.ring.push(command.into());
        Ok(evicted.map(Entry::into_data))
    }

    fn seek_to(&mut self, target: SeekTo) -> Result<u64, StoreError> {
        self.ring
            .offset_of(target.entry_index as usize, target.byte_offset as usize)
            .ok_or(StoreError::OutOfRange {
                entry_index: target.entry_index,
                byte_offset: target.byte_offset,
            })
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.ring.read_at(offset, buf))
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.ring.total_len())
    }
}

/// 文件后端：追加写，不淘汰
///
/// 条目即文件中以换行结束的行；未以换行结束的尾部字节
/// 属于虚拟流但不构成可寻址条目。
pub struct FileStore {
    file: File,
}

impl FileStore {
    /// 打开或创建数据文件（保留已有内容）
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// 扫描第 `entry_index` 条（0 起）完整行，返回 (行起始偏移, 行长)
    fn locate_entry(&mut self, entry_index: u32) -> io::Result<Option<(u64, usize)>> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(&self.file);
        let mut start = 0u64;
        let mut index = 0u32;
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = reader.read_until(DELIMITER, &mut line)?;
            if n == 0 || line.last() != Some(&DELIMITER) {
                // 文件结束，或尾部残缺行——不算条目
                return Ok(None);
            }
            if index == entry_index {
                return Ok(Some((start, n)));
            }
            start += n as u64;
            index += 1;
        }
    }
}

impl LogStore for FileStore {
    fn append(&mut self, command: Vec<u8>) -> io::Result<Option<Vec<u8>>> {
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&command)?;
        self.file.flush()?;
        Ok(None) // 文件后端不淘汰
    }

    fn seek_to(&mut self, target: SeekTo) -> Result<u64, StoreError> {
        let out_of_range = StoreError::OutOfRange {
            entry_index: target.entry_index,
            byte_offset: target.byte_offset,
        };
        match self.locate_entry(target.entry_index)? {
            Some((start, len)) if (target.byte_offset as usize) < len => {
                Ok(start + target.byte_offset as u64)
            }
            _ => Err(out_of_range),
        }
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let end = self.file.metadata()?.len();
        if offset >= end {
            return Ok(0);
        }
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read(buf)
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn memstore_append_and_readback() {
        let mut store = MemStore::new(4);
        assert!(store.append(b"one\n".to_vec()).unwrap().is_none());
        assert!(store.append(b"two\n".to_vec()).unwrap().is_none());
        assert_eq!(store.total_len().unwrap(), 8);

        let mut out = Vec::new();
        let mut pos = 0u64;
        let mut buf = [0u8; 16];
        loop {
            let n = store.read_at(pos, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
            pos += n as u64;
        }
        assert_eq!(out, b"one\ntwo\n");
    }

    #[test]
    fn memstore_eviction_hands_back_bytes() {
        let mut store = MemStore::new(2);
        store.append(b"A\n".to_vec()).unwrap();
        store.append(b"B\n".to_vec()).unwrap();
        let evicted = store.append(b"C\n".to_vec()).unwrap();
        assert_eq!(evicted, Some(b"A\n".to_vec()));
        assert_eq!(store.total_len().unwrap(), 4);
    }

    #[test]
    fn memstore_seek_validation() {
        let mut store = MemStore::new(4);
        store.append(b"1234\n".to_vec()).unwrap(); // len 5
        store.append(b"ab\n".to_vec()).unwrap(); // len 3
        store.append(b"stuvwx\n".to_vec()).unwrap(); // len 7

        let target = |e, o| SeekTo {
            entry_index: e,
            byte_offset: o,
        };
        assert_eq!(store.seek_to(target(2, 0)).unwrap(), 8);
        assert!(matches!(
            store.seek_to(target(0, 5)),
            Err(StoreError::OutOfRange { .. })
        ));
        assert!(matches!(
            store.seek_to(target(3, 0)),
            Err(StoreError::OutOfRange { .. })
        ));
    }

    #[test]
    fn filestore_roundtrip_and_seek() {
        let path = "/tmp/test_ringlog_filestore.dat";
        let _ = fs::remove_file(path);

        {
            let mut store = FileStore::open(path).unwrap();
            assert!(store.append(b"1234\n".to_vec()).unwrap().is_none());
            assert!(store.append(b"ab\n".to_vec()).unwrap().is_none());
            assert_eq!(store.total_len().unwrap(), 8);

            let target = |e, o| SeekTo {
                entry_index: e,
                byte_offset: o,
            };
            assert_eq!(store.seek_to(target(0, 0)).unwrap(), 0);
            assert_eq!(store.seek_to(target(1, 1)).unwrap(), 6);
            assert!(matches!(
                store.seek_to(target(0, 5)),
                Err(StoreError::OutOfRange { .. })
            ));
            assert!(matches!(
                store.seek_to(target(2, 0)),
                Err(StoreError::OutOfRange { .. })
            ));

            let mut buf = [0u8; 32];
            let n = store.read_at(5, &mut buf).unwrap();
            assert_eq!(&buf[..n], b"ab\n");
            assert_eq!(store.read_at(8, &mut buf).unwrap(), 0);
        }

        // 重新打开，内容保留
        {
            let mut store = FileStore::open(path).unwrap();
            assert_eq!(store.total_len().unwrap(), 8);
        }

        let _ = fs::remove_file(path);
    }

    #[test]
    fn filestore_unterminated_tail_is_not_an_entry() {
        let path = "/tmp/test_ringlog_filestore_tail.dat";
        let _ = fs::remove_file(path);

        let mut store = FileStore::open(path).unwrap();
        store.append(b"full\n".to_vec()).unwrap();
        store.append(b"partial".to_vec()).unwrap(); // 无分隔符

        let target = |e, o| SeekTo {
            entry_index: e,
            byte_offset: o,
        };
        assert_eq!(store.seek_to(target(0, 0)).unwrap(), 0);
        // 残缺尾部不可寻址，但属于虚拟流
        assert!(matches!(
            store.seek_to(target(1, 0)),
            Err(StoreError::OutOfRange { .. })
        ));
        assert_eq!(store.total_len().unwrap(), 12);

        let _ = fs::remove_file(path);
    }
}
