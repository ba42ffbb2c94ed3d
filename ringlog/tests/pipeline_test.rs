//! 组装-存储-回读全链路模拟测试
//!
//! 测试流程：
//! 1. 生成一批命令并拼成连续字节流
//! 2. 以不规则的块大小喂给命令组装器（模拟 TCP 分片到达）
//! 3. 完整命令逐条写入内存后端
//! 4. 从偏移 0 回读整个虚拟流，与保留条目的拼接逐字节对比
//! 5. 验证寻址命令的全局偏移换算

use ringlog::{CommandAssembler, LogStore, MemStore, SeekTo};

/// 把字节流按给定块大小序列切片喂入组装器
fn feed_in_chunks(asm: &mut CommandAssembler, stream: &[u8], chunk_sizes: &[usize]) -> Vec<Vec<u8>> {
    let mut commands = Vec::new();
    let mut pos = 0;
    let mut sizes = chunk_sizes.iter().cycle();
    while pos < stream.len() {
        let n = (*sizes.next().unwrap()).min(stream.len() - pos);
        commands.extend(asm.feed(&stream[pos..pos + n]));
        pos += n;
    }
    commands
}

/// 回读整个虚拟流
fn read_all(store: &mut dyn LogStore, from: u64) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pos = from;
    let mut buf = [0u8; 7]; // 非 2 幂的小缓冲，强制跨条目
    loop {
        let n = store.read_at(pos, &mut buf).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
        pos += n as u64;
    }
    out
}

#[test]
fn fragmented_arrival_roundtrip() {
    let capacity = 8;
    let lines: Vec<String> = (0..capacity).map(|i| format!("command number {}\n", i)).collect();
    let stream: Vec<u8> = lines.iter().flat_map(|l| l.bytes()).collect();

    let mut asm = CommandAssembler::new();
    let commands = feed_in_chunks(&mut asm, &stream, &[1, 3, 2, 11, 5]);
    assert_eq!(commands.len(), capacity);
    assert_eq!(asm.pending_len(), 0);

    let mut store = MemStore::new(capacity);
    for cmd in commands {
        assert!(store.append(cmd).unwrap().is_none());
    }

    assert_eq!(read_all(&mut store, 0), stream);
}

#[test]
fn overflow_keeps_most_recent_entries() {
    let capacity = 4;
    let mut store = MemStore::new(capacity);

    let mut evicted = Vec::new();
    for i in 0..10 {
        let line = format!("entry {}\n", i);
        if let Some(old) = store.append(line.into_bytes()).unwrap() {
            evicted.push(String::from_utf8(old).unwrap());
        }
    }

    // 淘汰的恰好是最早的 6 条，各一次
    let expected_evicted: Vec<String> = (0..6).map(|i| format!("entry {}\n", i)).collect();
    assert_eq!(evicted, expected_evicted);

    // 底层缓冲处于满状态，占用数等于容量
    assert!(store.ring().is_full());
    assert_eq!(store.ring().len(), capacity);

    // 留下的是最新 4 条，顺序不变
    let expected: Vec<u8> = (6..10).flat_map(|i| format!("entry {}\n", i).into_bytes()).collect();
    assert_eq!(read_all(&mut store, 0), expected);
}

#[test]
fn seek_addressing_matches_concatenation() {
    let mut store = MemStore::new(8);
    // 条目长度 [5, 3, 7]
    store.append(b"1234\n".to_vec()).unwrap();
    store.append(b"ab\n".to_vec()).unwrap();
    store.append(b"stuvwx\n".to_vec()).unwrap();

    let pos = store
        .seek_to(SeekTo {
            entry_index: 2,
            byte_offset: 0,
        })
        .unwrap();
    assert_eq!(pos, 8);
    assert_eq!(read_all(&mut store, pos), b"stuvwx\n");

    let pos = store
        .seek_to(SeekTo {
            entry_index: 1,
            byte_offset: 1,
        })
        .unwrap();
    assert_eq!(read_all(&mut store, pos), b"b\nstuvwx\n");
}
