//! 定时时间戳写入
//!
//! 每隔固定间隔往日志追加一条 `timestamp:<RFC 2822>\n`。
//! 对存储而言它只是又一个写入方，走同一个 append 通道，
//! 同样受容量淘汰约束。

use std::time::Duration;

use tracing::{debug, error};

use crate::server::SharedStore;
use crate::shutdown::Shutdown;

/// 周期写入时间戳条目，直到停机
pub async fn run(store: SharedStore, interval: Duration, mut shutdown: Shutdown) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let line = format!("timestamp:{}\n", chrono::Local::now().to_rfc2822());
                let mut store = store.lock().await;
                match store.append(line.into_bytes()) {
                    Ok(evicted) => {
                        if let Some(old) = evicted {
                            debug!("timestamp entry evicted {} bytes", old.len());
                        }
                    }
                    Err(e) => {
                        error!("failed to append timestamp entry: {}", e);
                        break;
                    }
                }
            }
            _ = shutdown.wait() => break,
        }
    }
    debug!("timestamp ticker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringlog::{LogStore, MemStore};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn ticker_appends_timestamp_entries() {
        let store: Box<dyn LogStore + Send> = Box::new(MemStore::new(8));
        let store: SharedStore = Arc::new(Mutex::new(store));
        let shutdown = Shutdown::new();

        let handle = tokio::spawn(run(
            store.clone(),
            Duration::from_millis(20),
            shutdown.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(90)).await;
        shutdown.trigger();
        handle.await.unwrap();

        let mut store = store.lock().await;
        let total = store.total_len().unwrap();
        assert!(total > 0, "at least one timestamp entry expected");

        let mut buf = vec![0u8; 64];
        let n = store.read_at(0, &mut buf).unwrap();
        assert!(n > 10);
        assert!(buf[..n].starts_with(b"timestamp:"));
        assert_eq!(buf[n - 1], b'\n');
    }
}
