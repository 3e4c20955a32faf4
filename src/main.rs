use clap::{Parser, Subcommand};
use dotenv::dotenv;
use reflection::config::{BackupConfig, Credentials};
use reflection::core::{BackupEngine, RunStatus};
use reflection::provider;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

/// 个人云端备份工具：把本地目录镜像到云盘的备份文件夹
#[derive(Parser)]
#[command(name = "reflection", version, about)]
struct Cli {
    /// 配置文件路径，默认为配置目录下的 config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行完整备份（默认）
    Run,
    /// 只对账不上传，打印待上传的文件列表
    Plan,
    /// 检查云端账户是否可达
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(BackupConfig::default_path);

    let config = match BackupConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            // 日志尚未初始化
            eprintln!("配置加载失败: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_dir = config_path
        .parent()
        .map(|p| p.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let _guard = reflection::logging::init(&log_dir, &config.log);

    info!("reflection 启动");

    match run_command(cli.command.unwrap_or(Commands::Run), config, &config_path).await {
        Ok(code) => code,
        Err(e) => {
            error!("运行失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(
    command: Commands,
    config: BackupConfig,
    config_path: &Path,
) -> anyhow::Result<ExitCode> {
    let credentials = Credentials::from_env();
    let provider = provider::connect(&config.provider, &credentials)?;
    let engine = BackupEngine::new(provider, config);

    match command {
        Commands::Check => {
            let account = engine.verify_account_link().await?;
            println!(
                "账户可达: {} ({}, 状态 {})",
                account.id, account.integration, account.status
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Plan => {
            let plan = engine.plan().await?;
            println!(
                "本地 {} 个文件，远端 {} 个，待上传 {} 个",
                plan.local_files.len(),
                plan.remote_files,
                plan.missing.len()
            );
            for file in &plan.missing {
                println!("  {}", file.path.display());
            }
            if !plan.failed_folders.is_empty() {
                println!(
                    "注意: {} 个远端文件夹列举失败，结果可能不完整",
                    plan.failed_folders.len()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run => {
            let report = engine.run().await?;
            if let Some(dir) = config_path.parent() {
                BackupEngine::append_history(&report, dir);
            }

            println!(
                "备份完成: 本地 {} 个文件，缺失 {} 个，上传成功 {} 个，失败 {} 个",
                report.files_scanned,
                report.files_missing,
                report.files_uploaded,
                report.files_failed
            );
            for err in &report.errors {
                println!("  错误: {}", err);
            }

            Ok(if report.status == RunStatus::Completed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
