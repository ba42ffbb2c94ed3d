//! ringlogd 服务进程
//!
//! 监听 TCP 端口接收换行分隔的命令，写入共享命令日志并回传虚拟流。
//!
//! 使用方法:
//!   ringlogd                       # 前台运行，内存后端，端口 9000
//!   ringlogd -d                    # 后台运行
//!   ringlogd -f /var/tmp/ringlogd.data   # 文件后端
//!   ringlogd -c 16 -t 0            # 容量 16，关闭时间戳写入

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ringlog::constants::{DEFAULT_CAPACITY, DEFAULT_PORT};
use ringlog::{FileStore, LogStore, MemStore};
use ringlogd::shutdown::{self, Shutdown};
use ringlogd::{Server, SharedStore};

/// Concurrent command log server
#[derive(Parser, Debug)]
#[command(name = "ringlogd")]
#[command(about = "Append-mostly command log served over TCP")]
struct Args {
    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Listen port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Ring capacity (entries) for the in-memory backend
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Use a file backend at this path instead of the in-memory ring
    #[arg(short, long)]
    file: Option<String>,

    /// Timestamp entry interval in seconds (0 = disabled)
    #[arg(short, long, default_value_t = 10)]
    timestamp_interval: u64,

    /// Run in the background
    #[arg(short, long)]
    daemon: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.daemon {
        return spawn_background();
    }

    // 设置日志
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(args).await
}

/// 后台模式：重新派生自身（去掉 -d），父进程立即退出
fn spawn_background() -> Result<()> {
    let exe = std::env::current_exe().context("cannot resolve current executable")?;
    let child_args: Vec<String> = std::env::args()
        .skip(1)
        .filter(|a| a != "-d" && a != "--daemon")
        .collect();
    let child = std::process::Command::new(exe)
        .args(child_args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn background process")?;
    println!("ringlogd: started in background, pid {}", child.id());
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    info!("ringlogd: Starting...");

    let store: Box<dyn LogStore + Send> = match &args.file {
        Some(path) => {
            info!("ringlogd: File backend: {}", path);
            Box::new(FileStore::open(path).with_context(|| format!("cannot open {}", path))?)
        }
        None => {
            info!("ringlogd: Memory backend, capacity {} entries", args.capacity);
            Box::new(MemStore::new(args.capacity))
        }
    };
    let store: SharedStore = Arc::new(Mutex::new(store));

    let shutdown = Shutdown::new();

    // 信号任务：SIGINT / SIGTERM 都触发停机
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let name = shutdown::wait_for_signal().await;
            info!("Received {}, shutting down", name);
            shutdown.trigger();
        });
    }

    // 定时时间戳写入
    let ticker = if args.timestamp_interval > 0 {
        info!(
            "ringlogd: Timestamp entry every {} s",
            args.timestamp_interval
        );
        Some(tokio::spawn(ringlogd::ticker::run(
            store.clone(),
            Duration::from_secs(args.timestamp_interval),
            shutdown.clone(),
        )))
    } else {
        None
    };

    let addr = format!("{}:{}", args.bind, args.port);
    let server = Server::bind(&addr, store, shutdown.clone())
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("ringlogd: Listening on {}", server.local_addr()?);

    server.run().await?;

    if let Some(handle) = ticker {
        let _ = handle.await;
    }

    info!("ringlogd: Shutdown complete");
    Ok(())
}
