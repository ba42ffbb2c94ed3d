//! 常量定义

/// 命令分隔符 - 一条命令以换行结束
pub const DELIMITER: u8 = b'\n';

/// 寻址命令前缀（与原始字符设备 ioctl 的文本形式一致）
pub const SEEK_PREFIX: &[u8] = b"AESDCHAR_IOCSEEKTO:";

/// 默认环形缓冲容量
pub const DEFAULT_CAPACITY: usize = 10;

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 9000;

/// 默认文件后端路径
pub const DEFAULT_DATA_FILE: &str = "/var/tmp/ringlogd.data";
