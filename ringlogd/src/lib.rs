//! ringlogd - 并发命令日志服务
//!
//! 结构：
//! ```text
//!  ┌──────────┐ accept  ┌───────────────────┐
//!  │  Server  │────────▶│ ConnectionHandler │ (每连接一个任务)
//!  └────┬─────┘         └─────────┬─────────┘
//!       │                         │ append / seek / read_at
//!       │               ┌─────────▼─────────┐
//!       │               │  Arc<Mutex<dyn    │
//!       │               │    LogStore>>     │◀── ticker (定时时间戳)
//!       │               └───────────────────┘
//!       │
//!  ┌────▼─────┐
//!  │ Shutdown │  (watch 通道，SIGINT/SIGTERM 触发)
//!  └──────────┘
//! ```

pub mod handler;
pub mod server;
pub mod shutdown;
pub mod ticker;

pub use server::{Server, SharedStore};
pub use shutdown::Shutdown;
