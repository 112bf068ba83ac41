//! End-to-end scenarios against the real `procpool-workers` binaries:
//! unknown-pool rejection, balanced dispatch, crash/restart, one-shot
//! lifecycle, and graceful termination.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use procpool::{Manager, PoolConfig, SubmissionError};
use procpool_proc::{NoopMemoryLimit, SysinfoProbe};

fn echo_worker_path() -> &'static str {
    env!("CARGO_BIN_EXE_echo_worker")
}

fn cpu_burn_worker_path() -> &'static str {
    env!("CARGO_BIN_EXE_cpu_burn_worker")
}

fn test_manager() -> Manager {
    Manager::with_backends(Box::new(NoopMemoryLimit), Box::new(SysinfoProbe::new()))
}

async fn wait_ready(manager: &Manager, pool_name: &str, expected: usize) {
    for _ in 0..50 {
        let stats = manager.get_stats(Some(pool_name)).await;
        if stats.workers.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn unknown_pool_is_rejected_synchronously() {
    let manager = test_manager();
    let result = manager
        .submit_pool_task("NOPE", serde_json::json!({}))
        .await;
    assert_eq!(result.unwrap_err(), SubmissionError::UnknownPool("NOPE".into()));
}

#[tokio::test]
async fn empty_pool_is_rejected_synchronously() {
    let manager = test_manager();
    manager
        .init_pools(vec![PoolConfig {
            pool_name: "empty".into(),
            worker_script: echo_worker_path().into(),
            worker_count: 0,
            worker_memory_limit_mb: 64,
        }])
        .await;

    let result = manager
        .submit_pool_task("empty", serde_json::json!({}))
        .await;
    assert_eq!(result.unwrap_err(), SubmissionError::EmptyPool("empty".into()));
}

#[tokio::test]
async fn echoed_task_round_trips_through_two_workers() {
    let manager = test_manager();
    manager
        .init_pools(vec![PoolConfig {
            pool_name: "echo".into(),
            worker_script: echo_worker_path().into(),
            worker_count: 2,
            worker_memory_limit_mb: 64,
        }])
        .await;
    wait_ready(&manager, "echo", 2).await;

    let rx_a = manager
        .submit_pool_task("echo", serde_json::json!({"n": 1}))
        .await
        .unwrap();
    let rx_b = manager
        .submit_pool_task("echo", serde_json::json!({"n": 2}))
        .await
        .unwrap();

    let reply_a = rx_a.await.unwrap();
    let reply_b = rx_b.await.unwrap();
    assert!(reply_a.ok);
    assert!(reply_b.ok);
    assert_eq!(reply_a.data["n"], 1);
    assert_eq!(reply_b.data["n"], 2);

    // Two single-task submissions across two idle workers should land one
    // task per worker rather than stacking both on the same one.
    let stats = manager.get_stats(Some("echo")).await;
    assert_eq!(stats.workers.len(), 2);
    for worker in &stats.workers {
        assert_eq!(worker.running_tasks, 0);
    }
}

#[tokio::test]
async fn one_shot_worker_handles_exactly_one_task_then_exits() {
    let manager = test_manager();
    let rx = manager
        .submit_one_shot_task(echo_worker_path(), serde_json::json!({"x": 1}), None)
        .await
        .unwrap();

    let reply = rx.await.unwrap();
    assert!(reply.ok);
    assert_eq!(reply.data["x"], 1);

    for _ in 0..50 {
        let stats = manager.get_stats(None).await;
        if stats.workers.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("one-shot worker did not exit after completing its task");
}

#[tokio::test]
async fn crashed_worker_resolves_in_flight_callback_with_error_and_is_replaced() {
    let manager = test_manager();
    manager
        .init_pools(vec![PoolConfig {
            pool_name: "burn".into(),
            worker_script: cpu_burn_worker_path().into(),
            worker_count: 1,
            worker_memory_limit_mb: 64,
        }])
        .await;
    wait_ready(&manager, "burn", 1).await;

    let rx = manager
        .submit_pool_task("burn", serde_json::json!({"duration_ms": 5000}))
        .await
        .unwrap();

    let before = manager.get_stats(Some("burn")).await;
    let victim_pid = before.workers[0].pid;
    procpool_proc::kill(victim_pid).expect("signal the worker");

    let reply = rx.await.unwrap();
    assert!(!reply.ok);
    assert!(reply
        .error_message()
        .unwrap_or_default()
        .contains("exited"));

    for _ in 0..100 {
        let stats = manager.get_stats(Some("burn")).await;
        if stats.workers.len() == 1 && stats.workers[0].pid != victim_pid {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("crashed pool worker was not replaced");
}

#[tokio::test]
async fn terminate_drains_pool_to_empty_stats() {
    let manager = test_manager();
    manager
        .init_pools(vec![PoolConfig {
            pool_name: "echo".into(),
            worker_script: echo_worker_path().into(),
            worker_count: 3,
            worker_memory_limit_mb: 64,
        }])
        .await;
    wait_ready(&manager, "echo", 3).await;

    manager.terminate(Some("echo")).await;

    for _ in 0..100 {
        let stats = manager.get_stats(Some("echo")).await;
        if stats.workers.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("terminated pool still reports workers");
}
