use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use std::sync::Arc;

use stockroom_core::{ProductId, WarehouseId};
use stockroom_infra::{CatalogService, InMemoryLedgerStore, InventoryService, LedgerStore, WarehouseController};
use stockroom_inventory::{AdjustmentRequest, AdjustmentType, NewInventoryRecord, NewWarehouse, TransferRequest};
use stockroom_products::NewProduct;

struct Fixture {
    controller: WarehouseController,
    product_id: ProductId,
    north: WarehouseId,
    south: WarehouseId,
}

/// One product stocked in two warehouses of an in-memory ledger.
fn setup(rt: &Runtime, stock: i64) -> Fixture {
    rt.block_on(async {
        let store: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new());
        let catalog = CatalogService::new(store.clone());
        let inventory = InventoryService::new(store.clone());

        let product = catalog
            .create_product(NewProduct {
                name: "Bench Widget".into(),
                category: "General".into(),
                sku: "BENCH-1".into(),
                barcode: None,
                description: None,
                unit_price: 100,
                cost_price: None,
                supplier_id: None,
                reorder_level: None,
            })
            .await
            .unwrap();

        let mut warehouses = Vec::new();
        for name in ["North", "South"] {
            let warehouse = catalog
                .create_warehouse(NewWarehouse {
                    name: name.into(),
                    location: format!("{name} dock"),
                    capacity: None,
                    manager_id: None,
                })
                .await
                .unwrap();
            let added = inventory
                .add_inventory(
                    NewInventoryRecord {
                        product_id: product.id,
                        warehouse_id: warehouse.id,
                        quantity: stock,
                        reserved_quantity: None,
                        reorder_level: None,
                        max_stock_level: Some(stock * 4),
                    },
                    None,
                )
                .await;
            assert!(added.success, "{}", added.message);
            warehouses.push(warehouse.id);
        }

        Fixture {
            controller: WarehouseController::new(store),
            product_id: product.id,
            north: warehouses[0],
            south: warehouses[1],
        }
    })
}

fn transfer(f: &Fixture, from: WarehouseId, to: WarehouseId, quantity: i64) -> TransferRequest {
    TransferRequest {
        product_id: f.product_id,
        from_warehouse_id: from,
        to_warehouse_id: to,
        quantity,
        user_id: None,
        notes: None,
    }
}

fn bench_transfer_latency(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("transfer_latency");
    group.sample_size(500);

    group.bench_function("round_trip_pair", |b| {
        let f = setup(&rt, 1_000_000);
        b.iter(|| {
            rt.block_on(async {
                let out = f.controller.transfer(transfer(&f, f.north, f.south, black_box(5))).await;
                assert!(out.success);
                let back = f.controller.transfer(transfer(&f, f.south, f.north, black_box(5))).await;
                assert!(back.success);
            })
        });
    });

    group.bench_function("rejected_overdraw", |b| {
        let f = setup(&rt, 10);
        b.iter(|| {
            rt.block_on(async {
                let out = f.controller.transfer(transfer(&f, f.north, f.south, black_box(11))).await;
                assert!(!out.success);
            })
        });
    });

    group.finish();
}

fn bench_transfer_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("transfer_throughput");

    for batch in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), batch, |b, &batch| {
            let f = setup(&rt, 1_000_000);
            b.iter(|| {
                rt.block_on(async {
                    for i in 0..batch {
                        let (from, to) = if i % 2 == 0 { (f.north, f.south) } else { (f.south, f.north) };
                        f.controller.transfer(transfer(&f, from, to, 1)).await;
                    }
                })
            });
        });
    }

    group.finish();
}

fn bench_adjustments(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("adjustment_latency");
    group.sample_size(500);

    group.bench_function("found_then_loss", |b| {
        let f = setup(&rt, 1_000);
        b.iter(|| {
            rt.block_on(async {
                for (delta, kind) in [(3, AdjustmentType::Found), (-3, AdjustmentType::Loss)] {
                    let out = f
                        .controller
                        .adjust(AdjustmentRequest {
                            product_id: f.product_id,
                            warehouse_id: f.north,
                            delta: black_box(delta),
                            adjustment_type: kind,
                            user_id: None,
                            reason: None,
                        })
                        .await;
                    assert!(out.success);
                }
            })
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_transfer_latency,
    bench_transfer_throughput,
    bench_adjustments
);
criterion_main!(benches);
