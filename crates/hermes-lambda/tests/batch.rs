//! Batch fan-out behaviour of the SQS adapter.

use hermes_core::{FieldDescriptor, MiddlewareConfig};
use hermes_lambda::fixtures::sqs_event;
use hermes_lambda::sqs;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn message_id(event: &hermes_core::CombinedEvent) -> String {
    event
        .get("messageId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_series_continues_after_failure() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    let handler = sqs::series(MiddlewareConfig::<()>::new(), move |event, _ctx| {
        let recorded = Arc::clone(&recorded);
        async move {
            let id = message_id(&event);
            recorded.lock().unwrap().push(id.clone());
            if id == "id_1" {
                anyhow::bail!("Stop");
            }
            Ok(())
        }
    })
    .unwrap();

    let event = sqs_event(&[json!({ "id": 1 }), json!({ "id": 2 }), json!({ "id": 3 })]);
    let response = handler.handle(event, None).await;

    assert_eq!(*calls.lock().unwrap(), ["id_0", "id_1", "id_2"]);
    assert_eq!(response.failed_ids().collect::<Vec<_>>(), ["id_1"]);
}

#[tokio::test]
async fn test_series_runs_one_message_at_a_time() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (in_flight_ref, peak_ref) = (Arc::clone(&in_flight), Arc::clone(&peak));

    let handler = sqs::series(MiddlewareConfig::<()>::new(), move |_event, _ctx| {
        let in_flight = Arc::clone(&in_flight_ref);
        let peak = Arc::clone(&peak_ref);
        async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    let event = sqs_event(&[json!(1), json!(2), json!(3), json!(4)]);
    let response = handler.handle(event, None).await;

    assert!(response.batch_item_failures.is_empty());
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_parallel_runs_messages_concurrently() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (in_flight_ref, peak_ref) = (Arc::clone(&in_flight), Arc::clone(&peak));

    let handler = sqs::parallel(MiddlewareConfig::<()>::new(), move |_event, _ctx| {
        let in_flight = Arc::clone(&in_flight_ref);
        let peak = Arc::clone(&peak_ref);
        async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    let event = sqs_event(&[json!(1), json!(2), json!(3), json!(4)]);
    let response = handler.handle(event, None).await;

    assert!(response.batch_item_failures.is_empty());
    assert_eq!(peak.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_parallel_failures_follow_message_order() {
    let completed = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&completed);

    let handler = sqs::parallel(MiddlewareConfig::<()>::new(), move |event, _ctx| {
        let recorded = Arc::clone(&recorded);
        async move {
            let id = message_id(&event);
            let index: u64 = id.trim_start_matches("id_").parse()?;
            // Later messages settle first.
            tokio::time::sleep(Duration::from_millis(100 - index * 10)).await;
            recorded.lock().unwrap().push(id.clone());
            if id == "id_0" || id == "id_2" {
                anyhow::bail!("failed {id}");
            }
            Ok::<_, anyhow::Error>(())
        }
    })
    .unwrap();

    let event = sqs_event(&[json!(0), json!(1), json!(2), json!(3)]);
    let response = handler.handle(event, None).await;

    assert_eq!(*completed.lock().unwrap(), ["id_3", "id_2", "id_1", "id_0"]);
    assert_eq!(response.failed_ids().collect::<Vec<_>>(), ["id_0", "id_2"]);
}

#[tokio::test]
async fn test_validation_failure_is_an_item_failure() {
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invoked);

    let config = MiddlewareConfig::<()>::new().validator(
        "body",
        FieldDescriptor::from_schema(json!({
            "type": "object",
            "properties": { "id": { "type": "integer" } },
            "required": ["id"]
        })),
    );
    let handler = sqs::parallel(config, move |_event, _ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    })
    .unwrap();

    let event = sqs_event(&[json!({ "id": 1 }), json!({ "id": "two" }), json!({ "id": 3 })]);
    let response = handler.handle(event, None).await;

    assert_eq!(invoked.load(Ordering::SeqCst), 2);
    assert_eq!(response.failed_ids().collect::<Vec<_>>(), ["id_1"]);
}

#[tokio::test]
async fn test_context_is_shared_by_every_message() {
    #[derive(Clone)]
    struct Ctx {
        tenant: &'static str,
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);

    let handler = sqs::series(MiddlewareConfig::<Ctx>::new(), move |_event, ctx: Option<Ctx>| {
        let recorded = Arc::clone(&recorded);
        async move {
            recorded.lock().unwrap().push(ctx.map(|c| c.tenant));
            Ok(())
        }
    })
    .unwrap();

    let event = sqs_event(&[json!(1), json!(2)]);
    handler.handle(event, Some(Ctx { tenant: "acme" })).await;

    assert_eq!(*seen.lock().unwrap(), [Some("acme"), Some("acme")]);
}
