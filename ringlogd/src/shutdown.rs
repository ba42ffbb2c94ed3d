//! 协作式停机
//!
//! 一个 watch 通道承载全局停机标志：信号任务触发一次，
//! 接受循环、各连接处理器和定时任务在每个阻塞点观察它，
//! 有界时间内退出。被停机信号打断的阻塞调用按"停止"处理，不算错误。

use tokio::sync::watch;

/// 停机句柄，可克隆后分发给各任务
#[derive(Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// 触发停机（幂等）
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// 是否已触发
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待停机被触发
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return; // 发送端全部消失，同样视为停机
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// 等待进程级停机信号，返回信号名
///
/// SIGINT (Ctrl+C) 和 SIGTERM 都触发同一套停机流程。
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    }
}
