//! Capacity and distribution reporting over inventory records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockroom_core::{ProductId, WarehouseId};

use crate::record::InventoryRecord;
use crate::warehouse::Warehouse;

const CRITICAL_UTILIZATION: f64 = 90.0;
const WARNING_UTILIZATION: f64 = 75.0;
const IMBALANCE_FACTOR: f64 = 0.5;
const HIGH_PRIORITY_FACTOR: f64 = 2.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityStatus {
    Normal,
    Warning,
    Critical,
}

impl CapacityStatus {
    pub fn from_utilization(pct: f64) -> Self {
        if pct >= CRITICAL_UTILIZATION {
            CapacityStatus::Critical
        } else if pct >= WARNING_UTILIZATION {
            CapacityStatus::Warning
        } else {
            CapacityStatus::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReportEntry {
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub location: String,
    pub capacity: Option<i64>,
    pub total_items: i64,
    pub unique_products: usize,
    pub low_stock_items: usize,
    pub utilization_percentage: f64,
    pub available_capacity: i64,
    pub capacity_status: CapacityStatus,
}

/// Capacity line for one warehouse. Records of other warehouses are ignored.
pub fn capacity_entry<'a>(
    warehouse: &Warehouse,
    records: impl IntoIterator<Item = &'a InventoryRecord>,
) -> CapacityReportEntry {
    let mut total_items = 0i64;
    let mut unique_products = 0usize;
    let mut low_stock_items = 0usize;
    for r in records.into_iter().filter(|r| r.warehouse_id == warehouse.id) {
        total_items += r.quantity;
        unique_products += 1;
        if r.needs_reorder() {
            low_stock_items += 1;
        }
    }

    let utilization = warehouse.utilization(total_items);
    let available_capacity = match warehouse.capacity {
        Some(cap) if cap > 0 => (cap - total_items).max(0),
        _ => 0,
    };

    CapacityReportEntry {
        warehouse_id: warehouse.id,
        warehouse_name: warehouse.name.clone(),
        location: warehouse.location.clone(),
        capacity: warehouse.capacity,
        total_items,
        unique_products,
        low_stock_items,
        utilization_percentage: round2(utilization),
        available_capacity,
        capacity_status: CapacityStatus::from_utilization(utilization),
    }
}

/// One product's stock at one warehouse, with display names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub product_id: ProductId,
    pub product_name: String,
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub quantity: i64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSuggestion {
    pub product_id: ProductId,
    pub product_name: String,
    pub from_warehouse_id: WarehouseId,
    pub from_warehouse: String,
    pub to_warehouse_id: WarehouseId,
    pub to_warehouse: String,
    pub current_from_quantity: i64,
    pub current_to_quantity: i64,
    pub quantity_difference: i64,
    pub average_quantity: f64,
    pub suggested_transfer: i64,
    pub efficiency_gain: String,
    pub priority: Priority,
}

/// Rebalancing suggestions for products held in more than one warehouse.
///
/// A product is flagged when `max - min > 0.5 * avg`; the suggestion moves
/// `floor((max - min) / 2)` from the largest holder to the smallest, with HIGH
/// priority once the spread exceeds `2 * avg`. Largest spreads come first.
pub fn optimize_distribution(holdings: &[Holding]) -> Vec<DistributionSuggestion> {
    let mut by_product: BTreeMap<ProductId, Vec<&Holding>> = BTreeMap::new();
    for h in holdings {
        by_product.entry(h.product_id).or_default().push(h);
    }

    let mut suggestions: Vec<DistributionSuggestion> = by_product
        .into_values()
        .filter(|group| group.len() > 1)
        .filter_map(|mut group| {
            group.sort_by(|a, b| {
                a.quantity
                    .cmp(&b.quantity)
                    .then_with(|| a.warehouse_name.cmp(&b.warehouse_name))
                    .then_with(|| a.warehouse_id.cmp(&b.warehouse_id))
            });
            let lowest = *group.first()?;
            let highest = *group.last()?;

            let total: i64 = group.iter().map(|h| h.quantity).sum();
            let avg = total as f64 / group.len() as f64;
            let difference = highest.quantity - lowest.quantity;
            if difference as f64 <= avg * IMBALANCE_FACTOR {
                return None;
            }

            let suggested = difference / 2;
            let priority = if difference as f64 > avg * HIGH_PRIORITY_FACTOR {
                Priority::High
            } else {
                Priority::Medium
            };

            Some(DistributionSuggestion {
                product_id: highest.product_id,
                product_name: highest.product_name.clone(),
                from_warehouse_id: highest.warehouse_id,
                from_warehouse: highest.warehouse_name.clone(),
                to_warehouse_id: lowest.warehouse_id,
                to_warehouse: lowest.warehouse_name.clone(),
                current_from_quantity: highest.quantity,
                current_to_quantity: lowest.quantity,
                quantity_difference: difference,
                average_quantity: round2(avg),
                suggested_transfer: suggested,
                efficiency_gain: format!("Reduces imbalance by {suggested} units"),
                priority,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.quantity_difference
            .cmp(&a.quantity_difference)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    suggestions
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn warehouse(capacity: Option<i64>) -> Warehouse {
        Warehouse {
            id: WarehouseId::new(),
            name: "Central".into(),
            location: "Block A".into(),
            capacity,
            manager_id: None,
            created_at: Utc::now(),
        }
    }

    fn record(warehouse_id: WarehouseId, quantity: i64) -> InventoryRecord {
        InventoryRecord {
            product_id: ProductId::new(),
            warehouse_id,
            quantity,
            reserved_quantity: 0,
            reorder_level: 10,
            max_stock_level: 1000,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn capacity_950_of_1000_is_critical() {
        let w = warehouse(Some(1000));
        let records = [record(w.id, 900), record(w.id, 50), record(WarehouseId::new(), 400)];
        let e = capacity_entry(&w, &records);
        assert_eq!(e.total_items, 950);
        assert_eq!(e.unique_products, 2);
        assert_eq!(e.utilization_percentage, 95.0);
        assert_eq!(e.available_capacity, 50);
        assert_eq!(e.capacity_status, CapacityStatus::Critical);
    }

    #[test]
    fn capacity_thresholds_are_inclusive() {
        assert_eq!(CapacityStatus::from_utilization(90.0), CapacityStatus::Critical);
        assert_eq!(CapacityStatus::from_utilization(75.0), CapacityStatus::Warning);
        assert_eq!(CapacityStatus::from_utilization(74.99), CapacityStatus::Normal);
    }

    #[test]
    fn missing_capacity_reports_zero_utilization_and_availability() {
        let w = warehouse(None);
        let e = capacity_entry(&w, &[record(w.id, 5)]);
        assert_eq!(e.utilization_percentage, 0.0);
        assert_eq!(e.available_capacity, 0);
        assert_eq!(e.capacity_status, CapacityStatus::Normal);
        assert_eq!(e.low_stock_items, 1);
    }

    #[test]
    fn overfull_warehouse_has_no_available_capacity() {
        let w = warehouse(Some(100));
        let e = capacity_entry(&w, &[record(w.id, 130)]);
        assert_eq!(e.available_capacity, 0);
        assert_eq!(e.utilization_percentage, 130.0);
    }

    fn holding(product: ProductId, name: &str, warehouse: &str, quantity: i64) -> Holding {
        Holding {
            product_id: product,
            product_name: name.into(),
            warehouse_id: WarehouseId::new(),
            warehouse_name: warehouse.into(),
            quantity,
        }
    }

    #[test]
    fn suggests_half_the_spread_from_max_to_min() {
        let p = ProductId::new();
        let holdings = [
            holding(p, "Lamp", "East", 90),
            holding(p, "Lamp", "West", 10),
            holding(p, "Lamp", "North", 50),
        ];
        let s = optimize_distribution(&holdings);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].from_warehouse, "East");
        assert_eq!(s[0].to_warehouse, "West");
        assert_eq!(s[0].suggested_transfer, 40);
        assert_eq!(s[0].efficiency_gain, "Reduces imbalance by 40 units");
        // spread 80 vs avg 50: flagged, but not above 2x avg
        assert_eq!(s[0].priority, Priority::Medium);
    }

    #[test]
    fn high_priority_when_spread_exceeds_twice_the_average() {
        let p = ProductId::new();
        let holdings = [
            holding(p, "Lamp", "East", 101),
            holding(p, "Lamp", "West", 0),
            holding(p, "Lamp", "North", 0),
        ];
        let s = optimize_distribution(&holdings);
        assert_eq!(s[0].priority, Priority::High);
        assert_eq!(s[0].suggested_transfer, 50);
    }

    #[test]
    fn balanced_and_single_warehouse_products_are_skipped() {
        let balanced = ProductId::new();
        let single = ProductId::new();
        let holdings = [
            holding(balanced, "Cup", "East", 40),
            holding(balanced, "Cup", "West", 50),
            holding(single, "Plate", "East", 500),
        ];
        assert!(optimize_distribution(&holdings).is_empty());
    }

    #[test]
    fn largest_spread_first() {
        let a = ProductId::new();
        let b = ProductId::new();
        let holdings = [
            holding(a, "Cup", "East", 30),
            holding(a, "Cup", "West", 0),
            holding(b, "Bowl", "East", 300),
            holding(b, "Bowl", "West", 0),
        ];
        let s = optimize_distribution(&holdings);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].product_name, "Bowl");
        assert_eq!(s[1].product_name, "Cup");
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Total items and available space always add back up to the capacity
            /// for a warehouse that is not overfull.
            #[test]
            fn capacity_accounts_for_every_unit(
                capacity in 1i64..100_000,
                quantities in proptest::collection::vec(0i64..1_000, 0..20),
            ) {
                let w = warehouse(Some(capacity));
                let records: Vec<_> = quantities.iter().map(|q| record(w.id, *q)).collect();
                let e = capacity_entry(&w, &records);
                let total: i64 = quantities.iter().sum();
                prop_assert_eq!(e.total_items, total);
                prop_assert!(e.available_capacity >= 0);
                if total <= capacity {
                    prop_assert_eq!(e.total_items + e.available_capacity, capacity);
                }
            }

            /// A suggested move never overshoots: after it the former max-holder
            /// still holds at least as much as the former min-holder.
            #[test]
            fn suggestion_never_inverts_the_imbalance(
                quantities in proptest::collection::vec(0i64..10_000, 2..8),
            ) {
                let p = ProductId::new();
                let holdings: Vec<_> = quantities
                    .iter()
                    .enumerate()
                    .map(|(i, q)| holding(p, "Lamp", &format!("W{i}"), *q))
                    .collect();
                for s in optimize_distribution(&holdings) {
                    prop_assert!(s.suggested_transfer >= 0);
                    prop_assert!(
                        s.current_from_quantity - s.suggested_transfer
                            >= s.current_to_quantity + s.suggested_transfer
                    );
                }
            }
        }
    }
}
