//! 连接处理器
//!
//! 每条已接受的连接运行一个处理器任务，直到对端关闭或停机触发：
//! 1. 读字节喂给命令组装器
//! 2. 完整命令要么追加进日志（随后从偏移 0 回传整个虚拟流），
//!    要么解析为寻址命令（成功则从解析出的偏移回传到流末尾）
//! 3. 越界或格式非法的寻址命令记日志后忽略，连接保持打开
//!
//! 整个"写入后回读"/"寻址后回读"周期持有同一把存储锁（粗粒度），
//! 文件后端的游标不允许被其他连接的操作穿插。
//!
//! 处理器内所有可能悬挂的点——读取、取锁、回传写出——都同时
//! 观察停机信号：对端写了命令却不读取回传时，写出会一直堵着，
//! 停机必须能把它打断，按"停止"处理而不是错误。

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use ringlog::{parse_command, CommandAssembler, LogStore, ParsedCommand, StoreError};

use crate::server::SharedStore;
use crate::shutdown::Shutdown;

/// 回传时单次从存储读出的块大小
const STREAM_CHUNK: usize = 1024;

/// 处理一条连接直到结束
pub async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    store: SharedStore,
    mut shutdown: Shutdown,
) {
    if let Err(e) = serve(&mut stream, peer, &store, &mut shutdown).await {
        error!("{}: connection error: {}", peer, e);
    }
    info!("Closed connection from {}", peer);
}

async fn serve(
    stream: &mut TcpStream,
    peer: SocketAddr,
    store: &SharedStore,
    shutdown: &mut Shutdown,
) -> anyhow::Result<()> {
    let mut assembler = CommandAssembler::new();
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        if shutdown.is_shutdown() {
            break;
        }

        buf.clear();
        let n = tokio::select! {
            res = stream.read_buf(&mut buf) => res?,
            _ = shutdown.wait() => break,
        };
        if n == 0 {
            // 对端关闭；组装器中未完成的命令随之丢弃
            if assembler.pending_len() > 0 {
                debug!(
                    "{}: discarding {} unterminated bytes",
                    peer,
                    assembler.pending_len()
                );
            }
            break;
        }

        for cmd in assembler.feed(&buf) {
            if !process_command(stream, peer, store, shutdown, cmd).await? {
                // 停机打断了取锁或回传，连接直接结束
                return Ok(());
            }
        }
    }
    Ok(())
}

/// 处理一条完整命令并回传数据
///
/// 返回 `Ok(false)` 表示被停机信号打断，调用方应结束连接。
async fn process_command(
    stream: &mut TcpStream,
    peer: SocketAddr,
    store: &SharedStore,
    shutdown: &mut Shutdown,
    cmd: Vec<u8>,
) -> anyhow::Result<bool> {
    match parse_command(&cmd) {
        ParsedCommand::Write => {
            let mut store = tokio::select! {
                guard = store.lock() => guard,
                _ = shutdown.wait() => return Ok(false),
            };
            if let Some(evicted) = store.append(cmd)? {
                debug!("{}: evicted oldest entry ({} bytes)", peer, evicted.len());
            }
            // 每次写入都从头回传整个虚拟流
            stream_from(stream, &mut **store, 0, shutdown).await
        }
        ParsedCommand::Seek(target) => {
            let mut store = tokio::select! {
                guard = store.lock() => guard,
                _ = shutdown.wait() => return Ok(false),
            };
            match store.seek_to(target) {
                Ok(pos) => {
                    debug!(
                        "{}: seek to entry {} offset {} -> global {}",
                        peer, target.entry_index, target.byte_offset, pos
                    );
                    stream_from(stream, &mut **store, pos, shutdown).await
                }
                Err(StoreError::OutOfRange { .. }) => {
                    warn!(
                        "{}: seek out of range ({},{}), ignored",
                        peer, target.entry_index, target.byte_offset
                    );
                    Ok(true)
                }
                Err(StoreError::Io(e)) => Err(e.into()),
            }
        }
        ParsedCommand::InvalidSeek => {
            warn!("{}: malformed seek command, ignored", peer);
            Ok(true)
        }
    }
}

/// 从全局偏移回传到虚拟流末尾
///
/// 调用方必须已持有存储锁。对端不读取时写出会无限期悬挂并扣住
/// 存储锁，因此每次写出都同时观察停机信号；被打断时返回
/// `Ok(false)`，此时连接上可能已经发出半截回传，随连接一起废弃。
async fn stream_from(
    stream: &mut TcpStream,
    store: &mut (dyn LogStore + Send),
    mut pos: u64,
    shutdown: &mut Shutdown,
) -> anyhow::Result<bool> {
    let mut chunk = [0u8; STREAM_CHUNK];
    loop {
        let n = store.read_at(pos, &mut chunk)?;
        if n == 0 {
            break;
        }
        tokio::select! {
            res = stream.write_all(&chunk[..n]) => res?,
            _ = shutdown.wait() => return Ok(false),
        }
        pos += n as u64;
    }
    tokio::select! {
        res = stream.flush() => res?,
        _ = shutdown.wait() => return Ok(false),
    }
    Ok(true)
}
