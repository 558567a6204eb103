use scholar_digest::error::DigestError;
use scholar_digest::models::Language;
use scholar_digest::orchestrator::{
    BatchOptions, BatchOrchestrator, BatchReport, BatchState, JobOutcome, NoopObserver, Progress,
    ProgressObserver,
};
use scholar_digest::services::DigestExecutor;
use scholar_digest::testing::ScriptedModelClient;
use std::path::Path;
use std::time::Duration;

/// 记录所有回调的观察者
#[derive(Default)]
struct RecordingObserver {
    started: Vec<Progress>,
    finished: Vec<Progress>,
    cooldowns: Vec<Duration>,
    run_finished: bool,
}

impl ProgressObserver for RecordingObserver {
    fn on_job_started(&mut self, progress: &Progress) {
        self.started.push(progress.clone());
    }

    fn on_job_finished(&mut self, progress: &Progress, _outcome: &JobOutcome) {
        self.finished.push(progress.clone());
    }

    fn on_cooldown(&mut self, duration: Duration) {
        self.cooldowns.push(duration);
    }

    fn on_run_finished(&mut self, _report: &BatchReport) {
        self.run_finished = true;
    }
}

fn write_inputs(dir: &Path, names: &[&str]) {
    let input = dir.join("input");
    std::fs::create_dir_all(&input).unwrap();
    for name in names {
        std::fs::write(input.join(name), b"%PDF-1.7").unwrap();
    }
}

fn options(dir: &Path, cooldown: Duration) -> BatchOptions {
    let mut options = BatchOptions::new(
        dir.join("input"),
        dir.join("output"),
        "# <% tp.file.title %>\n\n## Summary\n",
    );
    options.cooldown = cooldown;
    options
}

#[tokio::test]
async fn test_one_failing_job_does_not_abort_run() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), &["a.pdf", "b.pdf", "c.pdf"]);

    let client = ScriptedModelClient::new()
        .reply_for("a.pdf", "# Paper A\n")
        .fail_for("b.pdf", "429 RESOURCE_EXHAUSTED")
        .reply_for("c.pdf", "# Paper C\n");
    let mut orchestrator = BatchOrchestrator::new(
        DigestExecutor::new(client.clone()),
        options(dir.path(), Duration::ZERO),
    );

    let report = orchestrator.run(&mut NoopObserver).await.unwrap();

    assert_eq!(orchestrator.state(), BatchState::Done);
    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let output = dir.path().join("output");
    assert_eq!(
        std::fs::read_to_string(output.join("a.md")).unwrap(),
        "# Paper A\n"
    );
    assert_eq!(
        std::fs::read_to_string(output.join("c.md")).unwrap(),
        "# Paper C\n"
    );
    assert!(!output.join("b.md").exists());

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].label, "b.pdf");
    assert!(matches!(
        failures[0].error(),
        Some(DigestError::TransportError { .. })
    ));

    // 队列顺序执行，每个文档只调用一次
    let labels: Vec<_> = client.calls().into_iter().map(|c| c.label).collect();
    assert_eq!(labels, vec!["a.pdf", "b.pdf", "c.pdf"]);
}

#[tokio::test]
async fn test_empty_response_is_a_failed_job() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), &["blank.pdf", "good.pdf"]);

    let client = ScriptedModelClient::new().empty_for("blank.pdf");
    let mut orchestrator =
        BatchOrchestrator::new(DigestExecutor::new(client), options(dir.path(), Duration::ZERO));

    let report = orchestrator.run(&mut NoopObserver).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(
        report.outcomes[0].error(),
        Some(&DigestError::EmptyResponse {
            label: "blank.pdf".to_string()
        })
    );
    assert!(dir.path().join("output/good.md").exists());
}

#[tokio::test]
async fn test_progress_is_monotonic_and_reaches_total() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), &["1.pdf", "2.png", "3.jpg", "4.pdf"]);

    let client = ScriptedModelClient::new().fail_for("3.jpg", "boom");
    let mut orchestrator =
        BatchOrchestrator::new(DigestExecutor::new(client), options(dir.path(), Duration::ZERO));
    let mut observer = RecordingObserver::default();

    orchestrator.run(&mut observer).await.unwrap();

    let completed: Vec<_> = observer.finished.iter().map(|p| p.completed).collect();
    assert_eq!(completed, vec![1, 2, 3, 4]);
    assert!(observer.finished.iter().all(|p| p.total == 4));

    let current: Vec<_> = observer
        .started
        .iter()
        .map(|p| p.current_label.clone().unwrap())
        .collect();
    assert_eq!(current, vec!["1.pdf", "2.png", "3.jpg", "4.pdf"]);

    let last = observer.finished.last().unwrap();
    assert!(last.is_finished());
    assert_eq!((last.succeeded, last.failed), (3, 1));
    assert!(observer.run_finished);
    assert_eq!(orchestrator.progress().current_label, None);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_between_jobs_not_after_last() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), &["a.pdf", "b.pdf", "c.pdf"]);

    let cooldown = Duration::from_secs(10);
    let mut orchestrator = BatchOrchestrator::new(
        DigestExecutor::new(ScriptedModelClient::new()),
        options(dir.path(), cooldown),
    );
    let mut observer = RecordingObserver::default();

    let started = tokio::time::Instant::now();
    let report = orchestrator.run(&mut observer).await.unwrap();

    assert_eq!(report.succeeded, 3);
    assert_eq!(observer.cooldowns, vec![cooldown, cooldown]);
    assert!(started.elapsed() >= Duration::from_secs(20));
}

#[tokio::test]
async fn test_empty_input_dir_completes_without_jobs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("input")).unwrap();
    std::fs::write(dir.path().join("input/readme.txt"), b"not a paper").unwrap();

    let client = ScriptedModelClient::new();
    let mut orchestrator = BatchOrchestrator::new(
        DigestExecutor::new(client.clone()),
        options(dir.path(), Duration::from_secs(10)),
    );
    let mut observer = RecordingObserver::default();

    let report = orchestrator.run(&mut observer).await.unwrap();
    assert_eq!(report.total, 0);
    assert!(report.outcomes.is_empty());
    assert!(observer.cooldowns.is_empty());
    assert!(observer.run_finished);
    assert!(client.calls().is_empty());
    assert!(dir.path().join("output").is_dir());
}

#[tokio::test]
async fn test_same_stem_inputs_get_separate_outputs() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), &["paper.pdf", "paper.png"]);

    let client = ScriptedModelClient::new()
        .reply_for("paper.pdf", "# from pdf\n")
        .reply_for("paper.png", "# from png\n");
    let mut orchestrator =
        BatchOrchestrator::new(DigestExecutor::new(client), options(dir.path(), Duration::ZERO));

    let report = orchestrator.run(&mut NoopObserver).await.unwrap();
    assert_eq!(report.succeeded, 2);

    let output = dir.path().join("output");
    let mut written: Vec<_> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["paper.md", "paper.png.md"]);
    assert_eq!(
        std::fs::read_to_string(output.join("paper.md")).unwrap(),
        "# from pdf\n"
    );
    assert_eq!(
        std::fs::read_to_string(output.join("paper.png.md")).unwrap(),
        "# from png\n"
    );
}

#[tokio::test]
async fn test_output_name_and_language_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), &["scan.v2.png"]);

    let client = ScriptedModelClient::new();
    let mut opts = options(dir.path(), Duration::ZERO);
    opts.language = Language::Zh;
    let mut orchestrator = BatchOrchestrator::new(DigestExecutor::new(client.clone()), opts);

    orchestrator.run(&mut NoopObserver).await.unwrap();

    assert!(dir.path().join("output/scan.v2.md").exists());
    let calls = client.calls();
    assert_eq!(calls[0].mime_type, "image/png");
    assert!(calls[0].instruction.contains("Simplified Chinese"));
    assert!(calls[0].instruction.contains("## Summary"));
}
