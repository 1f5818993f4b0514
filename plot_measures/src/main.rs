use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

mod chart;
mod measures;

/// 把若干条24小时影响曲线画成一张折线图
#[derive(Parser, Debug)]
#[command(
    name = "plot_measures",
    author = "Baisen Qiu <abosen@qq.com>",
    version = "1.0"
)]
struct Opts {
    /// 可选的 JSON 输入，缺省使用内置示例数据
    input: Option<PathBuf>,
}

/* 测试一下
cargo run -- report.json
Saved plot to docs/energy_measures_20240512T093021.png
 */
fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    // 解析失败和提取不到措施都不致命，退回内置数据继续画
    let measures = match &opts.input {
        None => measures::defaults(),
        Some(path) => match measures::from_file(path) {
            Ok(found) if !found.is_empty() => found,
            Ok(_) => {
                println!("No valid measures found in provided JSON; falling back to defaults.");
                measures::defaults()
            }
            Err(e) => {
                println!("Failed to parse JSON input: {:#}", e);
                measures::defaults()
            }
        },
    };
    tracing::debug!("plotting {} measures", measures.len());

    let out_path = chart::save(&measures, Path::new("docs"))?;
    println!("Saved plot to {}", out_path.display());
    Ok(())
}
