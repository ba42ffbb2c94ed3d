//! ringlog 命令行工具
//!
//! 用法：
//!   ringlog write <file> <string>   # 单次写入字符串到文件
//!   ringlog dump [input]            # 按条目打印数据文件内容
//!   ringlog stats [input]           # 显示统计

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ringlog::constants::DEFAULT_DATA_FILE;
use ringlog::CommandAssembler;
use std::fs;
use std::io::Write;

#[derive(Parser)]
#[command(name = "ringlog")]
#[command(about = "Command log inspection and one-shot writer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 单次写入：把字符串写到指定文件（覆盖）
    Write {
        /// 目标文件路径（父目录必须已存在）
        file: String,

        /// 要写入的字符串
        text: String,
    },

    /// 按条目打印数据文件内容
    Dump {
        /// 输入文件路径
        #[arg(default_value = DEFAULT_DATA_FILE)]
        input: String,
    },

    /// 显示统计信息
    Stats {
        /// 输入文件路径
        #[arg(default_value = DEFAULT_DATA_FILE)]
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Write { file, text } => cmd_write(&file, &text),
        Commands::Dump { input } => cmd_dump(&input),
        Commands::Stats { input } => cmd_stats(&input),
    }
}

/// 单次写入
fn cmd_write(file: &str, text: &str) -> Result<()> {
    let mut f = fs::File::create(file)
        .with_context(|| format!("cannot create {} (does its directory exist?)", file))?;
    f.write_all(text.as_bytes())
        .with_context(|| format!("cannot write {}", file))?;
    eprintln!("ringlog: wrote {} bytes to {}", text.len(), file);
    Ok(())
}

/// 把文件按命令条目切分
fn split_entries(input: &str) -> Result<(Vec<Vec<u8>>, usize)> {
    let data = fs::read(input).with_context(|| format!("cannot read {}", input))?;
    let mut asm = CommandAssembler::new();
    let entries = asm.feed(&data);
    Ok((entries, asm.pending_len()))
}

/// 按条目打印
fn cmd_dump(input: &str) -> Result<()> {
    let (entries, pending) = split_entries(input)?;

    let mut offset = 0u64;
    for (i, entry) in entries.iter().enumerate() {
        let text = String::from_utf8_lossy(entry);
        print!("[{:>4}] off={:>8} len={:>6} {}", i, offset, entry.len(), text);
        offset += entry.len() as u64;
    }
    if pending > 0 {
        eprintln!("({} trailing bytes without delimiter)", pending);
    }
    Ok(())
}

/// 显示统计
fn cmd_stats(input: &str) -> Result<()> {
    let (entries, pending) = split_entries(input)?;

    let total: u64 = entries.iter().map(|e| e.len() as u64).sum();
    let max = entries.iter().map(Vec::len).max().unwrap_or(0);
    let min = entries.iter().map(Vec::len).min().unwrap_or(0);

    println!("Command Log Statistics:");
    println!("  Entries: {}", entries.len());
    println!("  Total: {} bytes", total + pending as u64);
    if !entries.is_empty() {
        println!(
            "  Entry size: min {} / avg {} / max {} bytes",
            min,
            total / entries.len() as u64,
            max
        );
    }
    if pending > 0 {
        println!("  Trailing bytes without delimiter: {}", pending);
    }
    Ok(())
}
