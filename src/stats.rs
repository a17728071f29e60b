use std::time::Duration;

/// 构建统计结构
#[derive(Debug, Default, Clone)]
pub struct BuildStats {
    pub schema_time: Duration,
    pub analysis_time: Duration,
    pub catalog_time: Duration,
    pub rewrite_time: Duration,
    pub documents_scanned: usize,
    pub documents_skipped: usize,
    pub documents_failed: usize,
    /// 存在结构问题（内容被跳过）的文档
    pub documents_malformed: usize,
    pub units_extracted: usize,
    pub memory_entries: usize,
    pub memory_locations: usize,
    pub files_rewritten: usize,
    pub files_unchanged: usize,
    pub catalogs_created: usize,
    pub catalogs_updated: usize,
    pub catalogs_failed: usize,
}

impl BuildStats {
    pub fn has_failures(&self) -> bool {
        self.documents_failed > 0 || self.catalogs_failed > 0
    }
}

/// 打印构建统计
pub fn print_build_stats(stats: &BuildStats, total_duration: Duration) {
    println!("\n📊 构建统计报告:");
    println!("═══════════════════════════════════════");

    // 时间分解
    println!("⏱️  时间分解:");
    println!("   模型加载: {}", format_duration(stats.schema_time));
    println!("   文档分析: {}", format_duration(stats.analysis_time));
    println!("   目录生成: {}", format_duration(stats.catalog_time));
    println!("   文档重写: {}", format_duration(stats.rewrite_time));
    println!("   总耗时: {}", format_duration(total_duration));

    // 文档统计
    println!("\n📂 文档统计:");
    println!("   扫描文档: {} 个", stats.documents_scanned);
    println!("   跳过文档: {} 个", stats.documents_skipped);
    println!("   失败文档: {} 个", stats.documents_failed);
    if stats.documents_malformed > 0 {
        println!("   结构异常: {} 个", stats.documents_malformed);
    }

    // 翻译记忆
    println!("\n🔤 翻译记忆:");
    println!("   提交单元: {} 项", stats.units_extracted);
    println!("   模板条目: {} 项", stats.memory_entries);
    println!("   来源位置: {} 处", stats.memory_locations);
    if stats.memory_entries > 0 {
        println!(
            "   平均复用: {:.1} 处/条目",
            stats.memory_locations as f64 / stats.memory_entries as f64
        );
    }

    // 输出统计
    if stats.files_rewritten + stats.files_unchanged > 0 {
        println!("\n📝 重写统计:");
        println!("   写出文件: {} 个", stats.files_rewritten);
        println!("   内容未变: {} 个", stats.files_unchanged);
    }

    if stats.catalogs_created + stats.catalogs_updated + stats.catalogs_failed > 0 {
        println!("\n💾 翻译目录:");
        println!("   新建: {} 个", stats.catalogs_created);
        println!("   更新: {} 个", stats.catalogs_updated);
        println!("   失败: {} 个", stats.catalogs_failed);
    }

    let status = if stats.has_failures() {
        "⚠️  存在失败项"
    } else {
        "✅ 全部成功"
    };
    println!("\n   构建状态: {}", status);
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn test_failures_detected() {
        let mut stats = BuildStats::default();
        assert!(!stats.has_failures());
        stats.documents_malformed = 1;
        assert!(!stats.has_failures());
        stats.catalogs_failed = 1;
        assert!(stats.has_failures());
    }
}
