//! 终端会话端到端测试
//!
//! 用 wiremock 充当后端，用内存输入驱动 `App::run_with`

use std::path::Path;
use std::time::Duration;

use rag_eval_session::models::Evaluation;
use rag_eval_session::orchestrator::Console;
use rag_eval_session::{App, Config, ItemId, Phase};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_assets(dir: &Path) {
    std::fs::write(
        dir.join("introduction.toml"),
        r#"
[[stages]]
title = "Welcome"
body = "Please read carefully."
button_label = "continue"
"#,
    )
    .unwrap();

    let items: Vec<_> = ["qual-1", "qual-2"]
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "query": "What is the capital of France?",
                "context": "Paris is the capital of France.",
                "response": "The capital and largest city of France is Paris."
            })
        })
        .collect();
    std::fs::write(
        dir.join("qualification_items.json"),
        serde_json::to_string(&items).unwrap(),
    )
    .unwrap();

    let answers: Vec<_> = ["qual-1", "qual-2"]
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "faithfulness": true,
                "relevance": true,
                "keywords": ["Paris"],
                "response": "The capital and largest city of France is Paris."
            })
        })
        .collect();
    std::fs::write(
        dir.join("answer_key.json"),
        serde_json::to_string(&answers).unwrap(),
    )
    .unwrap();

    std::fs::write(
        dir.join("control_item.json"),
        r#"{"id": "control", "query": "q", "context": "c", "response": "r"}"#,
    )
    .unwrap();
}

fn config(dir: &TempDir, server: &MockServer) -> Config {
    let assets_dir = dir.path().join("assets");
    std::fs::create_dir_all(&assets_dir).unwrap();
    write_assets(&assets_dir);

    Config {
        api_base_url: server.uri(),
        request_timeout_secs: 5,
        batch_size: 2,
        pass_threshold: 2,
        shuffle_seed: Some(7),
        assets_dir: assets_dir.display().to_string(),
        export_dir: dir.path().join("exports").display().to_string(),
        launch_url: Some("https://survey.example.org/?PROLIFIC_PID=p-123".to_string()),
        output_log_file: dir.path().join("session_log.txt").display().to_string(),
        ..Config::default()
    }
}

async fn mount_backend(server: &MockServer) {
    let pool: Vec<_> = (1..=6)
        .map(|id| json!({"id": id, "query": "q", "context": "c", "response": "r"}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(pool)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/counter/increment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 1})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// 等待后台投递的提交全部到达
async fn wait_for_submissions(server: &MockServer, expected: usize) -> Vec<Evaluation> {
    for _ in 0..100 {
        let received: Vec<Evaluation> = server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/responses")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect();
        if received.len() >= expected {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("后台提交没有在预期时间内到达");
}

/// 走完介绍与资格测试，正式任务跳过第 1 题、作答第 2 题，输入到此为止
fn partial_main_task_input() -> Vec<&'static str> {
    vec![
        // 介绍页
        "",
        // 资格题 1：先漏填理由，再补上
        "y", "y", "", "answers it", "",
        "Paris is named",
        // 资格题 2：尝试跳过被拒绝
        "skip", "y", "yes", "Paris is named", "answers it", "",
        // 正式任务：第 1 题跳过
        "skip",
        // 第 2 题
        "n", "y", "extra facts", "on topic", "hard one",
    ]
}

/// 完整会话：在上面的基础上再作答对照题
fn full_session_input() -> String {
    let mut lines = partial_main_task_input();
    lines.extend(["y", "n", "all in context", "off topic", ""]);
    lines.join("\n") + "\n"
}

fn count_submissions(requests: &[wiremock::Request]) -> usize {
    requests
        .iter()
        .filter(|r| r.url.path() == "/responses")
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_complete_session_over_console() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_backend(&server).await;

    let input = full_session_input();

    let app = App::initialize(config(&dir, &server)).await.unwrap();
    let mut console = Console::new(input.as_bytes(), Vec::new());
    let summary = app.run_with(&mut console).await.unwrap();

    assert_eq!(summary.phase, Phase::Complete);
    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.skipped, 1);

    let export_path = summary.export_path.expect("应当导出结果");
    let exported: Vec<Evaluation> =
        serde_json::from_str(&std::fs::read_to_string(export_path).unwrap()).unwrap();
    let ids: Vec<ItemId> = exported.iter().map(|e| e.item_id.clone()).collect();
    assert_eq!(ids, vec![ItemId::Number(2), ItemId::from("control")]);
    assert_eq!(exported[0].comments, "hard one");
    assert!(!exported[0].is_faithful);
    assert!(exported.iter().all(|e| e.worker_id.as_str() == "p-123"));

    // 资格测试的作答不会发到后端
    let mut submitted = wait_for_submissions(&server, 2).await;
    submitted.sort_by_key(|e| e.item_id.to_string());
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].item_id, ItemId::Number(2));
    assert_eq!(submitted[1].item_id, ItemId::from("control"));

    let output = String::from_utf8(console.into_output()).unwrap();
    assert!(output.contains("[continue] press Enter"));
    assert!(output.contains("Please complete: faithfulness_reasoning"));
    assert!(output.contains("cannot be skipped"));
    assert!(output.contains("Thank you for participating"));
    assert!(std::fs::read_to_string(dir.path().join("session_log.txt"))
        .unwrap()
        .contains("p-123"));
}

#[tokio::test]
async fn test_input_closed_during_introduction() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;

    let app = App::initialize(config(&dir, &server)).await.unwrap();
    let mut console = Console::new("".as_bytes(), Vec::new());
    let summary = app.run_with(&mut console).await.unwrap();

    assert_eq!(summary.phase, Phase::Introduction);
    assert_eq!(summary.submitted, 0);
    assert!(summary.export_path.is_none());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_unreachable_pool_keeps_loading_until_input_ends() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/counter/increment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 3})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let input = [
        "",
        "y", "y", "Paris", "ok", "",
        "y", "y", "Paris", "ok", "",
        // 加载失败后重试一次，然后输入结束
        "",
    ]
    .join("\n")
        + "\n";

    let app = App::initialize(config(&dir, &server)).await.unwrap();
    let mut console = Console::new(input.as_bytes(), Vec::new());
    let summary = app.run_with(&mut console).await.unwrap();

    assert_eq!(summary.phase, Phase::MainTask);
    assert_eq!(summary.submitted, 0);
    assert!(summary.export_path.is_none());

    let output = String::from_utf8(console.into_output()).unwrap();
    assert_eq!(output.matches("still loading").count(), 2);
}

#[tokio::test]
async fn test_input_closed_mid_task_still_delivers_submissions() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_backend(&server).await;

    let input = partial_main_task_input().join("\n") + "\n";

    let app = App::initialize(config(&dir, &server)).await.unwrap();
    let mut console = Console::new(input.as_bytes(), Vec::new());
    let summary = app.run_with(&mut console).await.unwrap();

    assert_eq!(summary.phase, Phase::MainTask);
    assert_eq!(summary.submitted, 1);
    assert_eq!(summary.skipped, 1);
    assert!(summary.export_path.is_none());

    // 返回前已等待后台提交，不需要轮询
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(count_submissions(&requests), 1);
}

#[test]
fn test_submissions_reach_backend_before_runtime_shutdown() {
    let server_rt = tokio::runtime::Runtime::new().unwrap();
    let server = server_rt.block_on(async {
        let server = MockServer::start().await;
        mount_backend(&server).await;
        server
    });
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &server);

    // 与 `#[tokio::main]` 一样：会话结束后运行时立即被丢弃
    let app_rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let summary = app_rt.block_on(async {
        let input = full_session_input();
        let app = App::initialize(config).await.unwrap();
        let mut console = Console::new(input.as_bytes(), Vec::new());
        app.run_with(&mut console).await.unwrap()
    });
    drop(app_rt);

    assert_eq!(summary.phase, Phase::Complete);
    assert_eq!(summary.submitted, 2);

    let delivered = server_rt.block_on(async move {
        let requests = server.received_requests().await.unwrap_or_default();
        count_submissions(&requests)
    });
    assert_eq!(delivered, summary.submitted);
}
