use anyhow::{Context, Result};
use clap::Parser;
use std::time::Instant;
use tracing::{error, info, warn};

use content_i18n::config::{Cli, Command, I18nConfig};
use content_i18n::project::Project;
use content_i18n::stats::{format_duration, print_build_stats};
use content_i18n::utils::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    // 配置错误在处理任何文档之前终止
    let config = match I18nConfig::load(&cli.project, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("❌ 配置加载失败: {}", e);
            std::process::exit(1);
        }
    };

    if !config.enabled {
        info!("⏸️  国际化已在配置中禁用");
        return Ok(());
    }

    if !cli.quiet {
        info!("🚀 启动内容国际化");
        info!("📂 项目目录: {}", cli.project.display());
    }

    // 开始性能计时
    let total_start = Instant::now();

    let mut project = Project::open(&cli.project, config)
        .with_context(|| format!("无法打开项目 {}", cli.project.display()))?;

    run_command(&mut project, cli.command)?;

    let total_duration = total_start.elapsed();
    if !cli.quiet {
        info!("✅ 处理完成！总耗时: {}", format_duration(total_duration));
    }

    // 显示构建统计
    if cli.stats || cli.verbose {
        print_build_stats(project.stats(), total_duration);
    }

    if project.stats().has_failures() {
        warn!("⚠️  部分文档或翻译目录处理失败，请检查上方日志");
    }

    Ok(())
}

/// 执行子命令
fn run_command(project: &mut Project, command: Command) -> Result<()> {
    match command {
        Command::Extract => {
            project.extract_templates();
            project.analyze_all();
            let path = project.write_merged_template().context("翻译模板写入失败")?;
            info!("📄 模板文件: {}", path.display());
        }
        Command::Rewrite => project.rewrite_all(),
        Command::Catalogs => {
            project.extract_templates();
            project.analyze_all();
            project.write_catalogs().context("翻译目录生成失败")?;
        }
        Command::Build => project.build().context("构建失败")?,
    }
    Ok(())
}
