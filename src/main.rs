//! # KalaKini Booth 命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与命令分发。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kalakini_booth::error::AppError;
use kalakini_booth::photo_strip::{FilterKind, PhotoBooth, PhotoLoader, StripError, apply_filter};
use kalakini_booth::{settings, storage};

#[derive(Parser)]
#[command(name = "kalakini-booth")]
#[command(about = "Photo booth strip generator")]
#[command(version)]
struct Cli {
    /// JSON config file (missing fields use defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Quality profile override: quality / balanced / speed
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a single pixel filter to one image
    Filter {
        /// Filter name: none, vintage, bright, smooth (overlays leave pixels untouched)
        kind: String,
        input: PathBuf,
        output: PathBuf,
    },

    /// Assemble three photos into a 600x1800 strip
    Strip {
        #[arg(num_args = 3, required = true)]
        photos: Vec<PathBuf>,

        /// Filter applied to every slot
        #[arg(short, long, default_value = "none")]
        filter: String,

        /// Output directory (default: ./strips)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Output file name (default: <prefix>-YYYYMMDD-HHMMSS.png)
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ [{}/{}] {}", err.stage(), err.code(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = settings::resolve_config(cli.config.as_deref(), cli.profile.as_deref())?;

    match cli.command {
        Commands::Filter {
            kind,
            input,
            output,
        } => {
            let filter = FilterKind::parse(&kind);
            let decoded = PhotoLoader::new(&config).load_from_file(&input)?.decode()?;
            let filtered = apply_filter(&decoded, filter);
            filtered.save(&output).map_err(|e| {
                StripError::Encode(format!("写入 '{}' 失败：{}", output.display(), e))
            })?;
            log::info!("🎨 滤镜 {} 已应用: {}", filter, output.display());
        }
        Commands::Strip {
            photos,
            filter,
            out_dir,
            name,
        } => {
            let booth = PhotoBooth::with_config(config)?;
            for photo in &photos {
                booth.add_photo_from_file(photo)?;
            }
            booth.set_filter(FilterKind::parse(&filter))?;
            booth.generate_strip().await?;

            let dir = storage::get_output_dir(out_dir.as_deref())?;
            let path = booth.download_strip(&dir, name.as_deref())?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
