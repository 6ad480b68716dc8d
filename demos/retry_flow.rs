//! Create an event against PostgreSQL and retry it until the budget runs out.
//!
//! `DATABASE_SYNCHRONIZE=true cargo run --example retry_flow`

use nexus_events::event::events_table;
use nexus_events::example::examples_table;
use nexus_events::telemetry::DEFAULT_DIRECTIVE;
use nexus_events::{
    ensure_database_exists, ensure_schema, init_tracing, CreateEvent, Either, EventEmitter, EventService, EventStore,
    ListenerRegistry, PgStore, Settings,
};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(DEFAULT_DIRECTIVE);

    let db = &settings.database;
    let url = db.connection_url();
    ensure_database_exists(&url).await?;
    let pool = db.pool_options().connect(&url).await?;
    if db.synchronize {
        ensure_schema(&pool, &db.schema, &[events_table(), examples_table()]).await?;
    }

    let emitter = ListenerRegistry::new();
    emitter.on("order.shipped", |payload: &Value| {
        tracing::info!(%payload, "order.shipped listener");
    });

    let store = PgStore::new(pool, db.schema.clone()).with_statement_logging(db.log_statements);
    let service = EventService::new(EventStore::new(store), emitter.clone())
        .with_default_max_retries(settings.event_max_retries);

    let event = match service
        .create(CreateEvent {
            name: "order.shipped".into(),
            data: Some(json!({ "orderId": 42 })),
        })
        .await
    {
        Either::Right(event) => event,
        Either::Left(err) => return Err(err.into()),
    };
    let Some(id) = event.id else {
        return Err("created event has no id".into());
    };
    tracing::info!(%id, status = %event.status, "created");

    for attempt in 1..=2 {
        match service.retry(id, Some(1)).await {
            Either::Right(e) => tracing::info!(attempt, retry_count = e.retry_count, status = %e.status, "retried"),
            Either::Left(err) => tracing::warn!(attempt, error = %err, "retry refused"),
        }
    }

    if let Either::Right(stored) = service.find_by_id(id).await {
        tracing::info!(
            status = %stored.status,
            reason = stored.cancellation_reason.as_deref().unwrap_or(""),
            "final state"
        );
    }
    service.execute_event("order.shipped", &json!({ "orderId": 42, "replay": true }));
    emitter.emit("order.shipped", &Value::Null);
    Ok(())
}
