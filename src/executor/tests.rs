use super::*;
use crate::config::RetryConfig;
use crate::producers::{TaskContext, WorkProducer};
use crate::types::{TaskPatch, TaskStatus, TaskType};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Fails a fixed number of times, then returns a fixed document
struct Scripted {
    failures: u32,
    calls: AtomicU32,
}

impl Scripted {
    fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl WorkProducer for Scripted {
    async fn produce(&self, _params: &serde_json::Value, _ctx: &TaskContext) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(Error::Producer(format!("boom {call}")))
        } else {
            Ok("<urlset/>".to_string())
        }
    }

    fn label(&self) -> &'static str {
        "scripted"
    }
}

/// Never finishes on its own; records whether it saw cancellation
#[derive(Default)]
struct Hang {
    saw_cancel: Arc<AtomicBool>,
}

#[async_trait]
impl WorkProducer for Hang {
    async fn produce(&self, _params: &serde_json::Value, ctx: &TaskContext) -> Result<String> {
        let flag = self.saw_cancel.clone();
        let token = ctx.cancellation().clone();
        tokio::spawn(async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });
        std::future::pending::<()>().await;
        Ok(String::new())
    }

    fn label(&self) -> &'static str {
        "hang"
    }
}

/// Rejects its params every time
struct BadInput {
    calls: AtomicU32,
}

#[async_trait]
impl WorkProducer for BadInput {
    async fn produce(&self, _params: &serde_json::Value, _ctx: &TaskContext) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::InvalidInput("urls must be a non-empty array".into()))
    }

    fn label(&self) -> &'static str {
        "manual"
    }
}

fn fast_config() -> ExecutorConfig {
    ExecutorConfig {
        max_attempts: 3,
        task_timeout: Duration::from_secs(10),
        retry: RetryConfig::immediate(),
    }
}

async fn harness(
    producer: Option<Arc<dyn WorkProducer>>,
    config: ExecutorConfig,
) -> (TaskExecutor, Arc<TaskStore>, broadcast::Receiver<Event>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(TaskStore::open(dir.path().join("tasks.json")).await.unwrap());
    let mut producers = ProducerSet::new();
    if let Some(producer) = producer {
        producers = producers.with(TaskType::Manual, producer);
    }
    let (event_tx, event_rx) = broadcast::channel(256);
    let executor = TaskExecutor::new(store.clone(), Arc::new(producers), config, event_tx);
    (executor, store, event_rx, dir)
}

async fn run_to_end(executor: &TaskExecutor, store: &TaskStore) -> TaskId {
    let task = store.create(TaskType::Manual, json!({})).await.unwrap();
    let handle = executor.spawn(task.id.clone()).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run should finish")
        .unwrap();
    task.id
}

fn messages(log: &[String]) -> Vec<&str> {
    log.iter()
        .map(|line| line.split_once("] ").map(|(_, m)| m).unwrap_or(line))
        .collect()
}

#[tokio::test]
async fn always_failing_producer_exhausts_attempts() {
    let (executor, store, _rx, _dir) = harness(Some(Scripted::failing(u32::MAX)), fast_config()).await;

    let id = run_to_end(&executor, &store).await;
    let task = store.get(&id).await.unwrap();

    assert_eq!(task.status, TaskStatus::Fail);
    assert_eq!(task.retry_count, 3);
    assert_eq!(task.progress, 100);
    assert!(task.result.is_none());
    assert_eq!(task.error.as_deref(), Some("producer failed: boom 3"));

    let log = messages(&task.log);
    let failures = log.iter().filter(|m| m.contains(" failed: ")).count();
    assert_eq!(failures, 3);
    assert_eq!(log.first(), Some(&"task started"));
    assert_eq!(log.last(), Some(&"final failure"));
}

#[tokio::test]
async fn success_on_second_attempt_records_one_retry() {
    let (executor, store, _rx, _dir) = harness(Some(Scripted::failing(1)), fast_config()).await;

    let id = run_to_end(&executor, &store).await;
    let task = store.get(&id).await.unwrap();

    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(task.retry_count, 1);
    assert_eq!(task.progress, 100);
    assert_eq!(task.result.as_deref(), Some("<urlset/>"));
    assert_eq!(
        messages(&task.log),
        vec![
            "task started",
            "attempt 1 (scripted)",
            "attempt 1 failed: producer failed: boom 1",
            "attempt 2 (scripted)",
            "completed",
        ]
    );
}

#[tokio::test]
async fn first_attempt_success_has_clean_record() {
    let (executor, store, _rx, _dir) = harness(Some(Scripted::failing(0)), fast_config()).await;

    let id = run_to_end(&executor, &store).await;
    let task = store.get(&id).await.unwrap();

    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(task.retry_count, 0);
    assert!(task.error.is_none());
}

#[tokio::test]
async fn hanging_producer_times_out_and_is_cancelled() {
    let hang = Hang::default();
    let saw_cancel = hang.saw_cancel.clone();
    let config = ExecutorConfig {
        task_timeout: Duration::from_millis(200),
        ..fast_config()
    };
    let (executor, store, _rx, _dir) = harness(Some(Arc::new(hang)), config).await;

    let id = run_to_end(&executor, &store).await;
    let task = store.get(&id).await.unwrap();

    assert_eq!(task.status, TaskStatus::Fail);
    assert_eq!(task.error.as_deref(), Some("timeout"));
    assert_eq!(task.progress, 100);
    assert!(task.result.is_none());
    let log = messages(&task.log);
    assert_eq!(log.last(), Some(&"task timed out"));
    assert!(!log.contains(&"final failure"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(saw_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn invalid_input_is_not_retried() {
    let producer = Arc::new(BadInput {
        calls: AtomicU32::new(0),
    });
    let (executor, store, _rx, _dir) = harness(Some(producer.clone()), fast_config()).await;

    let id = run_to_end(&executor, &store).await;
    let task = store.get(&id).await.unwrap();

    assert_eq!(producer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(task.status, TaskStatus::Fail);
    assert_eq!(task.retry_count, 1);
    assert!(task.error.unwrap().contains("non-empty"));
}

#[tokio::test]
async fn unsupported_type_fails_without_attempts() {
    let (executor, store, _rx, _dir) = harness(None, fast_config()).await;

    let id = run_to_end(&executor, &store).await;
    let task = store.get(&id).await.unwrap();

    assert_eq!(task.status, TaskStatus::Fail);
    assert_eq!(task.retry_count, 0);
    assert_eq!(task.error.as_deref(), Some("unsupported task type: manual"));
    assert!(!messages(&task.log).iter().any(|m| m.starts_with("attempt")));
}

#[tokio::test]
async fn second_spawn_of_running_task_is_rejected() {
    let (executor, store, _rx, _dir) = harness(Some(Arc::new(Hang::default())), fast_config()).await;
    let task = store.create(TaskType::Manual, json!({})).await.unwrap();

    let _handle = executor.spawn(task.id.clone()).await.unwrap();
    assert!(executor.is_active(&task.id).await);

    match executor.spawn(task.id.clone()).await {
        Err(Error::Task(TaskError::InvalidState { operation, .. })) => assert_eq!(operation, "run"),
        Err(e) => panic!("expected invalid state, got {e:?}"),
        Ok(_) => panic!("expected invalid state"),
    }

    executor.cancel_all();
}

#[tokio::test]
async fn terminal_task_is_not_rerun() {
    let producer = Scripted::failing(0);
    let (executor, store, _rx, _dir) = harness(Some(producer.clone()), fast_config()).await;
    let task = store.create(TaskType::Manual, json!({})).await.unwrap();
    store
        .update(&task.id, TaskPatch::fail("earlier"))
        .await
        .unwrap();

    executor.spawn(task.id.clone()).await.unwrap().await.unwrap();

    assert_eq!(producer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        store.get(&task.id).await.unwrap().error.as_deref(),
        Some("earlier")
    );
}

#[tokio::test]
async fn cancel_all_interrupts_runs_and_refuses_new_ones() {
    let (executor, store, _rx, _dir) = harness(Some(Arc::new(Hang::default())), fast_config()).await;
    let task = store.create(TaskType::Manual, json!({})).await.unwrap();
    let handle = executor.spawn(task.id.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    executor.cancel_all();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();

    let stored = store.get(&task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Fail);
    assert_eq!(stored.error.as_deref(), Some("interrupted by shutdown"));
    assert_eq!(executor.active_count().await, 0);

    let other = store.create(TaskType::Manual, json!({})).await.unwrap();
    assert!(matches!(
        executor.spawn(other.id).await,
        Err(Error::ShuttingDown)
    ));
}

#[tokio::test]
async fn backoff_delays_separate_attempts() {
    let config = ExecutorConfig {
        retry: RetryConfig {
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..fast_config()
    };
    let (executor, store, _rx, _dir) = harness(Some(Scripted::failing(2)), config).await;

    let start = Instant::now();
    let id = run_to_end(&executor, &store).await;

    // 50ms before attempt 2, 100ms before attempt 3
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert_eq!(store.get(&id).await.unwrap().status, TaskStatus::Success);
}

#[tokio::test]
async fn events_follow_lifecycle() {
    let (executor, store, mut rx, _dir) = harness(Some(Scripted::failing(1)), fast_config()).await;

    run_to_end(&executor, &store).await;

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(match event {
            Event::Started { .. } => "started",
            Event::AttemptStarted { .. } => "attempt_started",
            Event::AttemptFailed { will_retry, .. } => {
                assert!(will_retry);
                "attempt_failed"
            }
            Event::Completed { .. } => "completed",
            _ => "other",
        });
    }
    assert_eq!(
        kinds,
        vec![
            "started",
            "attempt_started",
            "attempt_failed",
            "attempt_started",
            "completed",
        ]
    );
}

#[tokio::test]
async fn context_reports_are_dropped_after_terminal_commit() {
    let (_executor, store, _rx, _dir) = harness(None, fast_config()).await;
    let task = store.create(TaskType::Manual, json!({})).await.unwrap();
    let (event_tx, _event_rx) = broadcast::channel(8);
    let ctx = TaskContext::new(
        task.id.clone(),
        store.clone(),
        event_tx,
        CancellationToken::new(),
    );

    ctx.report_progress(40).await;
    ctx.log("halfway").await;
    store
        .finish_if_active(&task.id, TaskPatch::fail("timeout"), "task timed out")
        .await
        .unwrap();
    ctx.report_progress(60).await;
    ctx.log("too late").await;

    let stored = store.get(&task.id).await.unwrap();
    assert_eq!(stored.progress, 100);
    assert_eq!(
        messages(&stored.log),
        vec!["halfway", "task timed out"]
    );
}

/// Panics inside the attempt
struct Panics;

#[async_trait]
impl WorkProducer for Panics {
    async fn produce(&self, _params: &serde_json::Value, _ctx: &TaskContext) -> Result<String> {
        panic!("producer bug");
    }

    fn label(&self) -> &'static str {
        "panics"
    }
}

#[tokio::test]
async fn panicking_run_fails_task_and_leaves_active_set() {
    let (executor, store, _rx, _dir) = harness(Some(Arc::new(Panics)), fast_config()).await;

    let id = run_to_end(&executor, &store).await;
    let task = store.get(&id).await.unwrap();

    assert_eq!(task.status, TaskStatus::Fail);
    assert_eq!(task.error.as_deref(), Some("internal error: task run panicked"));
    assert_eq!(messages(&task.log).last(), Some(&"final failure"));
    assert!(!executor.is_active(&id).await);
    assert_eq!(executor.active_count().await, 0);
}

#[tokio::test]
async fn oversized_backoff_waits_for_watchdog_instead_of_panicking() {
    let config = ExecutorConfig {
        max_attempts: 3,
        task_timeout: Duration::from_millis(300),
        retry: RetryConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(u64::MAX),
            backoff_multiplier: 1e20,
            jitter: false,
        },
    };
    let (executor, store, _rx, _dir) = harness(Some(Scripted::failing(u32::MAX)), config).await;

    let id = run_to_end(&executor, &store).await;
    let task = store.get(&id).await.unwrap();

    assert_eq!(task.status, TaskStatus::Fail);
    assert_eq!(task.error.as_deref(), Some("timeout"));
    assert_eq!(task.retry_count, 2);
    assert!(!executor.is_active(&id).await);
}
