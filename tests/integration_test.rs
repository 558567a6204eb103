use scholar_digest::config::Config;
use scholar_digest::models::{default_templates, load_document, Language};
use scholar_digest::orchestrator::{BatchOptions, BatchOrchestrator, NoopObserver};
use scholar_digest::services::{DigestExecutor, LlmService};
use scholar_digest::templates::{HttpTemplateStore, TemplateStore};
use scholar_digest::utils::logging;
use scholar_digest::workflow::{DigestSession, LoadingState};
use std::path::Path;
use std::time::Duration;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_digest_single_paper() {
    // 初始化日志
    logging::init(true);

    // 加载配置
    let _ = dotenvy::from_filename(".env.local");
    let config = Config::from_env().expect("加载配置失败");
    config.validate().expect("缺少 GEMINI_API_KEY");

    // 注意：请根据实际情况修改文件路径
    let document = load_document(Path::new("input/sample.pdf"))
        .await
        .expect("加载文档失败");

    let executor = DigestExecutor::new(LlmService::new(&config))
        .with_reasoning_effort(config.reasoning_effort);
    let mut session = DigestSession::new(executor);
    session.set_language(Language::En);

    let template = &default_templates()[0];
    let markdown = session
        .analyze(document, &template.content)
        .await
        .expect("生成摘要失败")
        .to_string();

    println!("\n========== 摘要 ==========\n{}", markdown);
    assert_eq!(session.state(), LoadingState::Success);
    assert!(markdown.starts_with('#') || markdown.contains("##"));
}

#[tokio::test]
#[ignore]
async fn test_batch_with_flash_model() {
    logging::init(true);

    let _ = dotenvy::from_filename(".env.local");
    let config = Config::from_env().expect("加载配置失败");
    config.validate().expect("缺少 GEMINI_API_KEY");

    let client = LlmService::with_model(&config, config.batch_model_name.clone());
    let mut options = BatchOptions::new(
        &config.input_dir,
        &config.output_dir,
        default_templates()[1].content.clone(),
    );
    options.cooldown = Duration::from_secs(config.batch_cooldown_secs);

    let mut orchestrator = BatchOrchestrator::new(DigestExecutor::new(client), options);
    let report = orchestrator
        .run(&mut NoopObserver)
        .await
        .expect("批处理失败");

    println!(
        "成功 {}/{}，失败 {}",
        report.succeeded, report.total, report.failed
    );
    assert_eq!(report.succeeded + report.failed, report.total);
}

#[tokio::test]
#[ignore]
async fn test_template_server_connection() {
    logging::init(true);

    let config = Config::from_env().expect("加载配置失败");
    let store = HttpTemplateStore::new(config.template_store_url.clone()).expect("创建客户端失败");

    let templates = store.list().await.expect("获取模板失败");
    for template in &templates {
        println!("{} - {}", template.id, template.name);
    }
    assert!(!templates.is_empty());
}
