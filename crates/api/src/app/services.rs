use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use parcelhub_core::TenantId;
use parcelhub_events::{EventBus, EventEnvelope, InMemoryEventBus, TenantScoped};
use parcelhub_infra::event_store::{EventStore, InMemoryEventStore};
use parcelhub_infra::warehouses::AGGREGATE_TYPE;
use parcelhub_infra::WarehouseDirectoryService;
use parcelhub_warehouses::WarehouseDirectoryEvent;

use crate::config::{AppConfig, StorageConfig};

/// SSE event name for any committed change to an account's warehouses.
pub const WAREHOUSES_CHANGED: &str = "warehouses.changed";

pub type AppEventBus = InMemoryEventBus<EventEnvelope<JsonValue>>;

pub type DirectoryService = WarehouseDirectoryService<Arc<dyn EventStore>, Arc<AppEventBus>>;

/// Realtime message broadcast to SSE subscribers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub tenant_id: TenantId,
    pub topic: &'static str,
    pub payload: JsonValue,
}

impl TenantScoped for RealtimeMessage {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

pub struct AppServices {
    pub warehouses: DirectoryService,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
    sse_keep_alive: Duration,
}

impl AppServices {
    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }
}

/// Wire the event store, bus, directory service and the SSE relay.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = build_store(&config.storage).await?;
    let bus: Arc<AppEventBus> = Arc::new(InMemoryEventBus::new());

    // Realtime channel (SSE): lossy broadcast, account-filtered per connection.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    // Bus -> realtime relay. Ends once the bus (owned by the service) is dropped.
    {
        let sub = bus.subscribe();
        let realtime_tx = realtime_tx.clone();
        tokio::task::spawn_blocking(move || {
            while let Ok(env) = sub.recv() {
                if env.aggregate_type() != AGGREGATE_TYPE {
                    continue;
                }
                let _ = realtime_tx.send(change_notice(&env));
            }
        });
    }

    Ok(AppServices {
        warehouses: WarehouseDirectoryService::new(store, bus),
        realtime_tx,
        sse_keep_alive: config.sse_keep_alive,
    })
}

async fn build_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn EventStore>> {
    match storage {
        StorageConfig::InMemory => {
            tracing::info!("using in-memory event store");
            Ok(Arc::new(InMemoryEventStore::new()))
        }
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres { database_url } => {
            use anyhow::Context;

            let store = parcelhub_infra::event_store::PostgresEventStore::connect(database_url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            store.ensure_schema().await.context("failed to apply event store schema")?;
            tracing::info!("using postgres event store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => Err(anyhow::anyhow!(
            "USE_PERSISTENT_STORES=true requires building with the `postgres` feature"
        )),
    }
}

fn change_notice(env: &EventEnvelope<JsonValue>) -> RealtimeMessage {
    let warehouse_id = serde_json::from_value::<WarehouseDirectoryEvent>(env.payload().clone())
        .ok()
        .map(|e| e.warehouse_id().to_string());

    RealtimeMessage {
        tenant_id: env.tenant_id(),
        topic: WAREHOUSES_CHANGED,
        payload: serde_json::json!({
            "event_type": env.event_type(),
            "warehouse_id": warehouse_id,
            "sequence_number": env.sequence_number(),
        }),
    }
}

/// Server-sent change notifications for one account.
pub fn account_sse_stream(
    services: Arc<AppServices>,
    tenant_id: TenantId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let keep_alive = services.sse_keep_alive;

    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if TenantScoped::tenant_id(&m) == tenant_id => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(keep_alive))
}
