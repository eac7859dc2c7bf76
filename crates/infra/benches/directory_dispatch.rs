use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::runtime::Runtime;

use parcelhub_core::TenantId;
use parcelhub_events::{EventEnvelope, InMemoryEventBus};
use parcelhub_infra::WarehouseDirectoryService;
use parcelhub_infra::event_store::InMemoryEventStore;
use parcelhub_warehouses::{Address, ContactPerson, WarehouseDetails};

type Service = WarehouseDirectoryService<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

fn service() -> Service {
    WarehouseDirectoryService::new(Arc::new(InMemoryEventStore::new()), Arc::new(InMemoryEventBus::new()))
}

fn details(n: usize) -> WarehouseDetails {
    WarehouseDetails {
        name: format!("wh-{n}"),
        title: format!("Warehouse {n}"),
        contact_person: ContactPerson {
            name: "Bench Contact".to_string(),
            phone: "9876543210".to_string(),
            ..ContactPerson::default()
        },
        address: Address {
            full_address: "1 Bench Street".to_string(),
            landmark: None,
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "400001".to_string(),
            country: "India".to_string(),
        },
        ..WarehouseDetails::default()
    }
}

fn seeded(rt: &Runtime, warehouses: usize) -> (Service, TenantId) {
    let svc = service();
    let tenant_id = TenantId::new();
    rt.block_on(async {
        for n in 0..warehouses {
            svc.create(tenant_id, details(n), false).await.expect("seed warehouse");
        }
    });
    (svc, tenant_id)
}

fn bench_create_latency(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("create_warehouse");

    group.bench_function("empty_account", |b| {
        b.to_async(&rt).iter(|| async {
            let svc = service();
            black_box(svc.create(TenantId::new(), details(0), false).await.expect("create"));
        });
    });

    group.finish();
}

fn bench_set_default_with_history(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("set_default_with_history");

    for size in [10usize, 100, 500] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let (svc, tenant_id) = seeded(&rt, size);
            let ids: Vec<_> = rt
                .block_on(svc.list(tenant_id))
                .expect("list")
                .into_iter()
                .map(|w| w.id)
                .collect();
            let mut next = 0usize;

            b.to_async(&rt).iter(|| {
                next = (next + 1) % ids.len();
                let id = ids[next];
                let svc = &svc;
                async move {
                    black_box(svc.set_default(tenant_id, id).await.expect("set default"));
                }
            });
        });
    }

    group.finish();
}

fn bench_list_rehydration(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("list_rehydration");

    for size in [10usize, 100, 500] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let (svc, tenant_id) = seeded(&rt, size);
            b.to_async(&rt).iter(|| async {
                black_box(svc.list(tenant_id).await.expect("list"));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_create_latency,
    bench_set_default_with_history,
    bench_list_rehydration
);
criterion_main!(benches);
