use std::path::PathBuf;
use std::process;

use anyhow::{ensure, Context, Result};
use clap::Parser;

mod engine;

use engine::{Bound, Engine, OutputFormat, Raster};

/// 把图片压进边界盒再重新编码，控制 base64 附件的体积
#[derive(Parser, Debug)]
#[command(
    name = "compress_image",
    author = "Baisen Qiu <abosen@qq.com>",
    version = "1.0"
)]
struct Opts {
    /// 输入图片路径
    input: PathBuf,
    /// 输出图片路径，.png 之外的扩展名都按 JPEG 编码
    output: PathBuf,
    #[arg(long, default_value_t = 1200)]
    max_width: u32,
    #[arg(long, default_value_t = 800)]
    max_height: u32,
    #[arg(long, default_value_t = 85, value_parser = parse_quality)]
    jpeg_quality: u8,
}

fn parse_quality(quality: &str) -> Result<u8> {
    let quality: u8 = quality.parse()?;
    ensure!(
        (1..=100).contains(&quality),
        "jpeg quality must be in 1..=100"
    );
    Ok(quality)
}

/* 测试一下
cargo run -- photo.png photo_small.jpg --max-width 1200 --max-height 800
photo_small.jpg
48213
 */
fn main() {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();
    if let Err(e) = run(&opts) {
        eprintln!("ERROR {:#}", e);
        process::exit(2);
    }
}

fn run(opts: &Opts) -> Result<()> {
    let mut img = Raster::open(&opts.input)?;
    let (width, height) = img.dimensions();
    tracing::debug!("decoded {} at {}x{}", opts.input.display(), width, height);

    img.fit(Bound {
        max_width: opts.max_width,
        max_height: opts.max_height,
    });

    let format = OutputFormat::for_path(&opts.output, opts.jpeg_quality);
    tracing::debug!("encoding as {:?}", format);
    let data = img.generate(format)?;

    std::fs::write(&opts.output, &data)
        .with_context(|| format!("failed to write {}", opts.output.display()))?;
    let size = std::fs::metadata(&opts.output)?.len();

    println!("{}", opts.output.display());
    println!("{}", size);
    Ok(())
}
