use super::*;
use crate::bus::InboundEvent;
use crate::normalize::NormalizedMessage;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

fn job_for(key: &str, text: &str) -> Job {
    Job::new(
        InboundEvent {
            instance: "main".to_string(),
            data: serde_json::json!({}),
        },
        NormalizedMessage {
            conversation_key: key.to_string(),
            text: text.to_string(),
            external_id: String::new(),
            received_at: Utc::now(),
        },
    )
}

#[tokio::test]
async fn test_every_enqueued_job_is_handled() {
    let handled = Arc::new(AtomicUsize::new(0));
    let counter = handled.clone();
    let queue = JobQueue::start(4, move |_job| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    for i in 0..20 {
        queue.enqueue(job_for(&format!("c{}", i), "oi")).unwrap();
    }

    tokio::time::timeout(Duration::from_secs(2), async {
        while handled.load(Ordering::SeqCst) < 20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("all jobs handled");
}

#[tokio::test]
async fn test_same_conversation_is_handled_in_order() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let queue = JobQueue::start(4, move |job: Job| {
        let sink = sink.clone();
        async move {
            // A slow consumer would reveal reordering if two workers ever
            // shared a conversation.
            tokio::time::sleep(Duration::from_millis(2)).await;
            sink.lock().await.push(job.message.text);
        }
    });

    for i in 0..10 {
        queue.enqueue(job_for("c1", &format!("msg {}", i))).unwrap();
    }

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if seen.lock().await.len() == 10 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("all jobs handled");

    let seen = seen.lock().await;
    let expected: Vec<String> = (0..10).map(|i| format!("msg {}", i)).collect();
    assert_eq!(*seen, expected);
}

#[tokio::test]
async fn test_single_worker_queue_still_works() {
    let handled = Arc::new(AtomicUsize::new(0));
    let counter = handled.clone();
    let queue = JobQueue::start(0, move |_job| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    queue.enqueue(job_for("c1", "oi")).unwrap();
    tokio::time::timeout(Duration::from_secs(1), async {
        while handled.load(Ordering::SeqCst) < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job handled");
}

#[test]
fn test_partition_is_stable_for_a_key() {
    let queue = JobQueue {
        senders: (0..4)
            .map(|_| tokio::sync::mpsc::unbounded_channel().0)
            .collect(),
    };
    let first = queue.partition("5511999999999");
    for _ in 0..10 {
        assert_eq!(queue.partition("5511999999999"), first);
    }
}
