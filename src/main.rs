use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use scholar_digest::config::Config;
use scholar_digest::error::TemplateError;
use scholar_digest::models::{output_file_name, Document, Language};
use scholar_digest::orchestrator::{
    BatchOptions, BatchOrchestrator, ProgressBarObserver, RetryPolicy,
};
use scholar_digest::services::{DigestExecutor, HistoryEntry, HistoryStore, LlmService};
use scholar_digest::templates::{
    DeleteOutcome, DirectoryTemplateStore, FileFallbackStorage, HttpTemplateStore, SaveOutcome,
    TemplateRepository,
};
use scholar_digest::utils::logging;
use scholar_digest::workflow::DigestSession;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "scholar-digest", version, about = "按 Markdown 模板生成论文摘要")]
struct Cli {
    /// 配置文件路径（不存在时使用默认值）
    #[arg(long, short, global = true, default_value = "scholar-digest.toml")]
    config: PathBuf,

    /// 显示详细日志
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 批量处理输入目录中的所有文档
    Batch(BatchArgs),
    /// 处理单个文档并输出摘要
    Digest(DigestArgs),
    /// 管理模板
    #[command(subcommand)]
    Templates(TemplatesCommand),
}

#[derive(Args)]
struct BatchArgs {
    /// 模板名称（模板目录中的文件名，不含 .md）
    #[arg(long, short, default_value = "standard")]
    template: String,
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    /// 任务之间的冷却秒数
    #[arg(long)]
    cooldown: Option<u64>,
    #[arg(long, short, default_value = "en")]
    language: Language,
    /// 传输错误时的重试次数
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[derive(Args)]
struct DigestArgs {
    file: PathBuf,
    /// 模板 id
    #[arg(long, short, default_value = "standard")]
    template: String,
    #[arg(long, short, default_value = "en")]
    language: Language,
    /// 同时写入文件
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// 列出所有模板
    List,
    /// 显示模板内容
    Show { id: String },
    /// 保存模板：指定 --id 修改已有模板，指定 --name 另存为新模板
    Save {
        /// 模板内容所在的文件
        file: PathBuf,
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        name: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// 删除自定义模板
    Delete {
        id: String,
        /// 跳过确认
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env.local 不存在时忽略
    let _ = dotenvy::from_filename(".env.local");

    let config = Config::load(&cli.config)?;
    logging::init(cli.verbose || config.verbose_logging);

    match cli.command {
        Command::Batch(args) => run_batch(config, args).await,
        Command::Digest(args) => run_digest(config, args).await,
        Command::Templates(command) => run_templates(config, command).await,
    }
}

async fn run_batch(mut config: Config, args: BatchArgs) -> Result<()> {
    config.validate()?;
    if let Some(input) = args.input {
        config.input_dir = input;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if let Some(cooldown) = args.cooldown {
        config.batch_cooldown_secs = cooldown;
    }

    logging::log_startup("批量摘要模式", &config.batch_model_name);

    let store = DirectoryTemplateStore::new(&config.templates_dir);
    store.seed_defaults().await?;
    let template = match store.require(&args.template).await {
        Ok(template) => template,
        Err(e) => {
            if let Some(TemplateError::NotFound { name, available }) =
                e.downcast_ref::<TemplateError>()
            {
                error!("❌ 模板 '{}' 不存在", name);
                error!("可用模板: {}", available.join(", "));
            }
            return Err(e);
        }
    };
    info!("📝 使用模板: {} ({})", template.name, template.id);

    let mut options = BatchOptions::new(&config.input_dir, &config.output_dir, template.content);
    options.language = args.language;
    options.cooldown = config.batch_cooldown();
    options.failure_log = config.failure_log_file.clone();
    if args.retries > 0 {
        options.retry = RetryPolicy::Fixed {
            max_retries: args.retries,
            delay: Duration::from_secs(config.batch_cooldown_secs.max(1)),
        };
    }

    let client = LlmService::with_model(&config, config.batch_model_name.clone());
    let executor = DigestExecutor::new(client).with_reasoning_effort(config.reasoning_effort);
    let mut orchestrator = BatchOrchestrator::new(executor, options);

    let report = orchestrator.run(&mut ProgressBarObserver::new()).await?;
    for failure in report.failures() {
        if let Some(e) = failure.error() {
            warn!("  - {}: {}", failure.label, e);
        }
    }
    Ok(())
}

async fn run_digest(config: Config, args: DigestArgs) -> Result<()> {
    config.validate()?;
    logging::log_startup("单篇摘要模式", &config.llm_model_name);

    let mut repository = open_repository(&config)?;
    repository.list_templates().await;
    let Some(template) = repository.select_template(&args.template).cloned() else {
        let available: Vec<_> = repository.templates().iter().map(|t| t.id.clone()).collect();
        return Err(TemplateError::NotFound {
            name: args.template,
            available,
        }
        .into());
    };

    let document: Document = scholar_digest::models::load_document(&args.file).await?;
    let filename = document.name.clone();

    let executor = DigestExecutor::new(LlmService::new(&config))
        .with_reasoning_effort(config.reasoning_effort);
    let mut session = DigestSession::new(executor);
    session.set_language(args.language);

    let markdown = session.analyze(document, &template.content).await?.to_string();

    if let Some(output) = &args.output {
        let path = if output.is_dir() {
            output.join(output_file_name(&filename))
        } else {
            output.clone()
        };
        tokio::fs::write(&path, &markdown)
            .await
            .with_context(|| format!("无法写入: {}", path.display()))?;
        info!("✅ 已保存: {}", path.display());
    }

    let history = HistoryStore::new(&config.history_file);
    if let Err(e) = history.push(HistoryEntry::new(filename, markdown.clone())).await {
        warn!("⚠️ 历史记录写入失败: {}", e);
    }

    println!("{}", markdown);
    Ok(())
}

async fn run_templates(config: Config, command: TemplatesCommand) -> Result<()> {
    let mut repository = open_repository(&config)?;
    repository.list_templates().await;

    match command {
        TemplatesCommand::List => {
            println!("来源: {:?}", repository.source());
            for template in repository.templates() {
                let marker = if template.is_default { " (内置)" } else { "" };
                println!("{:<28} {}{}", template.id, template.name, marker);
            }
        }
        TemplatesCommand::Show { id } => match repository.get(&id) {
            Some(template) => println!("{}", template.content),
            None => bail!("模板 '{}' 不存在", id),
        },
        TemplatesCommand::Save { file, name, id } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("无法读取: {}", file.display()))?;
            match (id, name) {
                (Some(id), _) => match repository.save_existing(&id, &content).await? {
                    SaveOutcome::Saved(persistence) => {
                        info!("✅ 已更新模板 {} ({:?})", id, persistence)
                    }
                    SaveOutcome::Ignored => warn!("⚠️ 内置模板 {} 不可编辑", id),
                    SaveOutcome::NotFound => bail!("模板 '{}' 不存在", id),
                },
                (None, Some(name)) => {
                    let (template, persistence) = repository.save_as_new(&name, &content).await?;
                    info!("✅ 已保存模板 {} ({:?})", template.id, persistence);
                }
                (None, None) => bail!("需要 --id 或 --name"),
            }
        }
        TemplatesCommand::Delete { id, yes } => {
            let outcome = repository.delete_template(&id, |template| yes || confirm(&template.name));
            match outcome {
                DeleteOutcome::Deleted => info!("✅ 已删除模板 {}", id),
                DeleteOutcome::Declined => info!("已取消"),
                DeleteOutcome::Ignored => warn!("⚠️ 内置模板 {} 不可删除", id),
                DeleteOutcome::NotFound => bail!("模板 '{}' 不存在", id),
            }
        }
    }
    Ok(())
}

fn open_repository(config: &Config) -> Result<TemplateRepository> {
    let remote = HttpTemplateStore::new(config.template_store_url.clone())?;
    let fallback = FileFallbackStorage::new(&config.fallback_dir);
    Ok(TemplateRepository::new(Box::new(remote), Box::new(fallback)))
}

fn confirm(name: &str) -> bool {
    print!("确认删除模板 '{}'? [y/N] ", name);
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
