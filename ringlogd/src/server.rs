//! 服务端接受循环与任务登记
//!
//! 服务端持有唯一的共享存储（显式对象，不用全局量），
//! 循环接受连接并为每条连接派生一个处理器任务；任务句柄
//! 登记在一个向量里，每接受一条新连接就收割一次已结束的任务。
//! 停机时停止接受、通知所有处理器并逐个等待其退出。

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use ringlog::LogStore;

use crate::handler;
use crate::shutdown::Shutdown;

/// 所有连接共享的存储后端
///
/// 单把互斥锁覆盖整个"写入后回读"复合操作，见 handler 模块。
pub type SharedStore = Arc<Mutex<Box<dyn LogStore + Send>>>;

/// 命令日志服务端
pub struct Server {
    listener: TcpListener,
    store: SharedStore,
    shutdown: Shutdown,
    handles: Vec<JoinHandle<()>>,
}

impl Server {
    /// 绑定监听地址
    ///
    /// 绑定失败对进程是致命的，由调用方转换为非零退出码。
    pub async fn bind(addr: &str, store: SharedStore, shutdown: Shutdown) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            store,
            shutdown,
            handles: Vec::new(),
        })
    }

    /// 实际绑定的地址（端口 0 时由系统分配）
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// 运行接受循环直到停机
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                res = self.listener.accept() => {
                    // 接受循环内的 I/O 错误无法恢复，直接退出
                    let (stream, peer) = res?;
                    info!("Accepted connection from {}", peer);
                    let store = self.store.clone();
                    let conn_shutdown = self.shutdown.clone();
                    self.handles.push(tokio::spawn(handler::handle_connection(
                        stream,
                        peer,
                        store,
                        conn_shutdown,
                    )));
                    self.reap();
                }
                _ = shutdown.wait() => break,
            }
        }

        // 停止接受新连接，再等所有处理器退出
        drop(self.listener);
        info!("Waiting for {} connection handler(s)", self.handles.len());
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("All connection handlers finished");
        Ok(())
    }

    /// 收割已结束的处理器任务
    fn reap(&mut self) {
        let before = self.handles.len();
        self.handles.retain(|h| !h.is_finished());
        let reaped = before - self.handles.len();
        if reaped > 0 {
            debug!("Reaped {} finished handler(s)", reaped);
        }
    }
}
