/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::path::Path;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug 或 info 级别。
/// 重复调用时静默忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scholar_digest={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `mode`: 运行模式
/// - `model`: 使用的模型
pub fn log_startup(mode: &str, model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("🤖 模型: {}", model);
    info!("{}", "=".repeat(60));
}

/// 记录文档扫描结果
///
/// # 参数
/// - `total`: 文档总数
/// - `cooldown`: 任务之间的冷却时间
pub fn log_documents_loaded(total: usize, cooldown: Duration) {
    info!("✓ 找到 {} 个待处理的文档", total);
    info!("📋 将逐个处理，每个任务之间冷却 {} 秒\n", cooldown.as_secs_f32());
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `output_dir`: 输出目录
pub fn print_final_stats(success: usize, failed: usize, total: usize, output_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_dir.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short.pdf", 30), "short.pdf");
        assert_eq!(truncate_text("论文标题很长很长", 4), "论文标题...");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
