//! Pure planning for ledger writes.
//!
//! Every function here takes the current record(s) and returns the complete
//! set of writes a caller must apply atomically: the new record state(s) plus
//! the movement row(s) that explain them. Nothing is written on `Err`.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ProductId, UserId, WarehouseId};

use crate::movement::{MovementKind, NewMovement, ReferencePrefix, is_valid_label, reference_number};
use crate::record::{
    DEFAULT_MAX_STOCK_LEVEL, DEFAULT_REORDER_LEVEL, InventoryPatch, InventoryRecord,
    NewInventoryRecord,
};

// ─────────────────────────────────────────────────────────────────────────────
// Transfers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub product_id: ProductId,
    pub from_warehouse_id: WarehouseId,
    pub to_warehouse_id: WarehouseId,
    pub quantity: i64,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub reference_number: String,
    pub source: InventoryRecord,
    pub destination: InventoryRecord,
    /// TRANSFER_OUT at the source, then TRANSFER_IN at the destination.
    pub movements: [NewMovement; 2],
}

/// Plan a warehouse-to-warehouse transfer.
///
/// Checks, first failure wins: the source holds a record for the product,
/// then the source quantity covers the request. Reserved stock is neither
/// checked nor adjusted, and no destination capacity check is made.
pub fn plan_transfer(
    req: &TransferRequest,
    source: Option<&InventoryRecord>,
    destination: Option<&InventoryRecord>,
    now: DateTime<Utc>,
) -> DomainResult<TransferPlan> {
    if req.quantity <= 0 {
        return Err(DomainError::validation("transfer quantity must be greater than zero"));
    }
    if req.from_warehouse_id == req.to_warehouse_id {
        return Err(DomainError::validation(
            "source and destination warehouse must differ",
        ));
    }

    let source = source.ok_or(DomainError::ProductNotInSource)?;
    if source.quantity < req.quantity {
        return Err(DomainError::InsufficientStock {
            available: source.quantity,
            requested: req.quantity,
        });
    }

    let mut next_source = source.clone();
    next_source.quantity -= req.quantity;
    next_source.last_updated = now;

    let next_destination = match destination {
        Some(existing) => {
            let mut d = existing.clone();
            d.quantity = d.quantity.checked_add(req.quantity).ok_or_else(out_of_range)?;
            d.last_updated = now;
            d
        }
        None => {
            let mut d = InventoryRecord::empty(
                req.product_id,
                req.to_warehouse_id,
                source.reorder_level,
                source.max_stock_level,
                now,
            );
            d.quantity = req.quantity;
            d
        }
    };

    let reference = reference_number(ReferencePrefix::Transfer, now);
    let extra = req.notes.as_deref().map(str::trim).unwrap_or_default();

    let out = NewMovement::new(
        req.product_id,
        req.from_warehouse_id,
        MovementKind::TransferOut,
        req.quantity,
        reference.clone(),
        now,
    )?
    .with_notes(join_notes(format!("Transfer to warehouse {}.", req.to_warehouse_id), extra))
    .by(req.user_id);

    let inbound = NewMovement::new(
        req.product_id,
        req.to_warehouse_id,
        MovementKind::TransferIn,
        req.quantity,
        reference.clone(),
        now,
    )?
    .with_notes(join_notes(format!("Transfer from warehouse {}.", req.from_warehouse_id), extra))
    .by(req.user_id);

    Ok(TransferPlan {
        reference_number: reference,
        source: next_source,
        destination: next_destination,
        movements: [out, inbound],
    })
}

fn out_of_range() -> DomainError {
    DomainError::validation("quantity out of range")
}

fn join_notes(base: String, extra: &str) -> String {
    if extra.is_empty() { base } else { format!("{base} {extra}") }
}

// ─────────────────────────────────────────────────────────────────────────────
// Adjustments
// ─────────────────────────────────────────────────────────────────────────────

/// Reason class of an in-place adjustment.
///
/// Directional classes pin the sign of the delta; `Correction` and custom
/// labels accept either direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AdjustmentType {
    Correction,
    Found,
    Damage,
    Loss,
    Expired,
    Other(String),
}

impl AdjustmentType {
    pub fn label(&self) -> &str {
        match self {
            AdjustmentType::Correction => "CORRECTION",
            AdjustmentType::Found => "FOUND",
            AdjustmentType::Damage => "DAMAGE",
            AdjustmentType::Loss => "LOSS",
            AdjustmentType::Expired => "EXPIRED",
            AdjustmentType::Other(label) => label,
        }
    }

    pub fn expected_sign(&self) -> Option<i64> {
        match self {
            AdjustmentType::Found => Some(1),
            AdjustmentType::Damage | AdjustmentType::Loss | AdjustmentType::Expired => Some(-1),
            AdjustmentType::Correction | AdjustmentType::Other(_) => None,
        }
    }

    fn ensure_consistent(&self, delta: i64) -> DomainResult<()> {
        match self.expected_sign() {
            Some(sign) if delta.signum() != sign => {
                let direction = if sign > 0 { "increase" } else { "decrease" };
                Err(DomainError::validation(format!(
                    "{} adjustments must {} stock (got {delta:+})",
                    self.label(),
                    direction
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AdjustmentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "CORRECTION" => AdjustmentType::Correction,
            "FOUND" => AdjustmentType::Found,
            "DAMAGE" => AdjustmentType::Damage,
            "LOSS" => AdjustmentType::Loss,
            "EXPIRED" => AdjustmentType::Expired,
            label if is_valid_label(label) => AdjustmentType::Other(upper),
            _ => {
                return Err(DomainError::validation(format!(
                    "invalid adjustment type '{s}': use letters, digits and underscores"
                )));
            }
        })
    }
}

impl TryFrom<String> for AdjustmentType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AdjustmentType> for String {
    fn from(value: AdjustmentType) -> Self {
        value.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub delta: i64,
    pub adjustment_type: AdjustmentType,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentPlan {
    pub reference_number: String,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub record: InventoryRecord,
    pub movement: NewMovement,
}

/// Plan an in-place adjustment of one record.
///
/// Checks, first failure wins: the record exists, the delta is non-zero and
/// agrees with the type, the result is not negative. The movement is recorded
/// as `ADJUST_{type}` with magnitude `|delta|`.
pub fn plan_adjustment(
    req: &AdjustmentRequest,
    current: Option<&InventoryRecord>,
    now: DateTime<Utc>,
) -> DomainResult<AdjustmentPlan> {
    let current = current.ok_or_else(|| DomainError::not_found("Inventory record not found"))?;
    if req.delta == 0 {
        return Err(DomainError::validation("adjustment quantity cannot be zero"));
    }
    req.adjustment_type.ensure_consistent(req.delta)?;

    let rejected = DomainError::NegativeResultRejected {
        current: current.quantity,
        adjustment: req.delta,
    };
    let new_quantity = match current.quantity.checked_add(req.delta) {
        Some(q) if q >= 0 => q,
        Some(_) => return Err(rejected),
        None if req.delta < 0 => return Err(rejected),
        None => return Err(out_of_range()),
    };

    let mut record = current.clone();
    record.quantity = new_quantity;
    record.last_updated = now;

    let reference = reference_number(ReferencePrefix::Adjustment, now);
    let notes = match req.reason.as_deref().map(str::trim) {
        Some(reason) if !reason.is_empty() => reason.to_string(),
        _ => format!("{} adjustment", req.adjustment_type),
    };
    let movement = NewMovement::new(
        req.product_id,
        req.warehouse_id,
        MovementKind::Adjust(req.adjustment_type.label().to_string()),
        req.delta.abs(),
        reference.clone(),
        now,
    )?
    .with_notes(notes)
    .by(req.user_id);

    Ok(AdjustmentPlan {
        reference_number: reference,
        previous_quantity: current.quantity,
        new_quantity,
        record,
        movement,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Record lifecycle (add / edit / remove / manual movements)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordWrite {
    Upsert(InventoryRecord),
    Delete(ProductId, WarehouseId),
}

/// A single-record change plus the movement that explains it (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryChange {
    pub write: RecordWrite,
    pub movement: Option<NewMovement>,
    pub previous_quantity: Option<i64>,
}

impl InventoryChange {
    pub fn record(&self) -> Option<&InventoryRecord> {
        match &self.write {
            RecordWrite::Upsert(r) => Some(r),
            RecordWrite::Delete(..) => None,
        }
    }

    pub fn reference_number(&self) -> Option<&str> {
        self.movement.as_ref().map(|m| m.reference_number.as_str())
    }
}

/// First stock for a pair. Records an INITIAL movement when quantity > 0.
pub fn plan_new_record(
    cmd: NewInventoryRecord,
    existing: Option<&InventoryRecord>,
    user_id: Option<UserId>,
    now: DateTime<Utc>,
) -> DomainResult<InventoryChange> {
    if existing.is_some() {
        return Err(DomainError::duplicate(
            "Inventory record already exists for this product and warehouse",
        ));
    }
    let record = cmd.into_record(now)?;
    let movement = if record.quantity > 0 {
        Some(
            NewMovement::new(
                record.product_id,
                record.warehouse_id,
                MovementKind::Initial,
                record.quantity,
                reference_number(ReferencePrefix::Initial, now),
                now,
            )?
            .with_notes("Initial inventory setup")
            .by(user_id),
        )
    } else {
        None
    };
    Ok(InventoryChange {
        write: RecordWrite::Upsert(record),
        movement,
        previous_quantity: None,
    })
}

/// Field edit. A quantity change is logged as ADJUSTMENT_IN / ADJUSTMENT_OUT.
pub fn plan_record_update(
    existing: Option<&InventoryRecord>,
    patch: &InventoryPatch,
    user_id: Option<UserId>,
    now: DateTime<Utc>,
) -> DomainResult<InventoryChange> {
    let current = existing.ok_or_else(|| DomainError::not_found("Inventory record not found"))?;
    if patch.is_empty() {
        return Err(DomainError::validation("no fields to update"));
    }
    let next = patch.applied_to(current, now)?;
    let change = next.quantity - current.quantity;

    let movement = if change != 0 {
        let kind = if change > 0 {
            MovementKind::AdjustmentIn
        } else {
            MovementKind::AdjustmentOut
        };
        Some(
            NewMovement::new(
                next.product_id,
                next.warehouse_id,
                kind,
                change.abs(),
                reference_number(ReferencePrefix::Adjustment, now),
                now,
            )?
            .with_notes(format!("Inventory adjustment via API. Change: {change:+}"))
            .by(user_id),
        )
    } else {
        None
    };

    Ok(InventoryChange {
        write: RecordWrite::Upsert(next),
        movement,
        previous_quantity: Some(current.quantity),
    })
}

/// Explicit removal. The final quantity is captured by a REMOVED movement first.
pub fn plan_removal(
    existing: Option<&InventoryRecord>,
    user_id: Option<UserId>,
    now: DateTime<Utc>,
) -> DomainResult<InventoryChange> {
    let current = existing.ok_or_else(|| DomainError::not_found("Inventory record not found"))?;
    let movement = if current.quantity > 0 {
        Some(
            NewMovement::new(
                current.product_id,
                current.warehouse_id,
                MovementKind::Removed,
                current.quantity,
                reference_number(ReferencePrefix::Removal, now),
                now,
            )?
            .with_notes("Inventory record removed")
            .by(user_id),
        )
    } else {
        None
    };
    Ok(InventoryChange {
        write: RecordWrite::Delete(current.product_id, current.warehouse_id),
        movement,
        previous_quantity: Some(current.quantity),
    })
}

/// Receipts, shipments, returns and write-offs entered by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualMovement {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    #[serde(rename = "movement_type", alias = "kind")]
    pub kind: MovementKind,
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Inbound kinds create the record on first receipt; outbound kinds require
/// one and may not take it below zero.
pub fn plan_manual_movement(
    req: &ManualMovement,
    existing: Option<&InventoryRecord>,
    now: DateTime<Utc>,
) -> DomainResult<InventoryChange> {
    let direction = match req.kind {
        MovementKind::In | MovementKind::Return => 1,
        MovementKind::Out | MovementKind::Damaged => -1,
        ref other => {
            return Err(DomainError::validation(format!(
                "{other} movements are recorded by their own operation"
            )));
        }
    };
    if req.quantity <= 0 {
        return Err(DomainError::validation("quantity must be greater than zero"));
    }

    let current = match existing {
        Some(r) => r.clone(),
        None if direction > 0 => InventoryRecord::empty(
            req.product_id,
            req.warehouse_id,
            DEFAULT_REORDER_LEVEL,
            DEFAULT_MAX_STOCK_LEVEL,
            now,
        ),
        None => return Err(DomainError::not_found("Inventory record not found")),
    };

    if direction < 0 && current.quantity < req.quantity {
        return Err(DomainError::InsufficientStock {
            available: current.quantity,
            requested: req.quantity,
        });
    }

    let mut next = current.clone();
    next.quantity = if direction > 0 {
        current.quantity.checked_add(req.quantity)
    } else {
        current.quantity.checked_sub(req.quantity)
    }
    .ok_or_else(out_of_range)?;
    next.last_updated = now;

    let movement = NewMovement::new(
        req.product_id,
        req.warehouse_id,
        req.kind.clone(),
        req.quantity,
        reference_number(ReferencePrefix::Manual, now),
        now,
    )?
    .with_notes(req.notes.clone().unwrap_or_default())
    .by(req.user_id);

    Ok(InventoryChange {
        write: RecordWrite::Upsert(next),
        movement: Some(movement),
        previous_quantity: existing.map(|r| r.quantity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn record(product_id: ProductId, warehouse_id: WarehouseId, quantity: i64) -> InventoryRecord {
        InventoryRecord {
            product_id,
            warehouse_id,
            quantity,
            reserved_quantity: 0,
            reorder_level: 15,
            max_stock_level: 300,
            last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn transfer(quantity: i64) -> (TransferRequest, InventoryRecord, InventoryRecord) {
        let p = ProductId::new();
        let a = WarehouseId::new();
        let b = WarehouseId::new();
        let req = TransferRequest {
            product_id: p,
            from_warehouse_id: a,
            to_warehouse_id: b,
            quantity,
            user_id: None,
            notes: Some("rebalance".into()),
        };
        (req, record(p, a, 100), record(p, b, 0))
    }

    #[test]
    fn transfer_moves_stock_and_pairs_movements() {
        let (req, src, dst) = transfer(30);
        let plan = plan_transfer(&req, Some(&src), Some(&dst), at()).unwrap();

        assert_eq!(plan.source.quantity, 70);
        assert_eq!(plan.destination.quantity, 30);
        assert_eq!(plan.reference_number, "TRANSFER-20240501093000");

        let [out, inbound] = &plan.movements;
        assert_eq!(out.kind, MovementKind::TransferOut);
        assert_eq!(out.warehouse_id, req.from_warehouse_id);
        assert_eq!(inbound.kind, MovementKind::TransferIn);
        assert_eq!(inbound.warehouse_id, req.to_warehouse_id);
        assert_eq!(out.quantity, 30);
        assert_eq!(inbound.quantity, 30);
        assert_eq!(out.reference_number, inbound.reference_number);
        assert_eq!(
            out.notes.as_deref(),
            Some(format!("Transfer to warehouse {}. rebalance", req.to_warehouse_id).as_str())
        );
        assert_eq!(
            inbound.notes.as_deref(),
            Some(format!("Transfer from warehouse {}. rebalance", req.from_warehouse_id).as_str())
        );
    }

    #[test]
    fn transfer_creates_destination_inheriting_levels() {
        let (req, src, _) = transfer(10);
        let plan = plan_transfer(&req, Some(&src), None, at()).unwrap();
        assert_eq!(plan.destination.quantity, 10);
        assert_eq!(plan.destination.reorder_level, 15);
        assert_eq!(plan.destination.max_stock_level, 300);
        assert_eq!(plan.destination.reserved_quantity, 0);
    }

    #[test]
    fn transfer_without_source_record_fails_first() {
        let (mut req, _, dst) = transfer(10);
        req.quantity = 10_000;
        let err = plan_transfer(&req, None, Some(&dst), at()).unwrap_err();
        assert_eq!(err, DomainError::ProductNotInSource);
    }

    #[test]
    fn transfer_over_quantity_reports_available_and_requested() {
        let (req, src, dst) = transfer(101);
        let err = plan_transfer(&req, Some(&src), Some(&dst), at()).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 100,
                requested: 101
            }
        );
    }

    #[test]
    fn transfer_ignores_reservations() {
        let (req, mut src, dst) = transfer(90);
        src.reserved_quantity = 40;
        let plan = plan_transfer(&req, Some(&src), Some(&dst), at()).unwrap();
        assert_eq!(plan.source.quantity, 10);
        assert_eq!(plan.source.reserved_quantity, 40);
        assert_eq!(plan.source.available(), -30);
    }

    #[test]
    fn transfer_to_same_warehouse_is_invalid() {
        let (mut req, src, _) = transfer(5);
        req.to_warehouse_id = req.from_warehouse_id;
        assert!(matches!(
            plan_transfer(&req, Some(&src), Some(&src), at()),
            Err(DomainError::Validation(_))
        ));
    }

    fn adjustment(delta: i64, kind: &str) -> AdjustmentRequest {
        AdjustmentRequest {
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            delta,
            adjustment_type: kind.parse().unwrap(),
            user_id: None,
            reason: None,
        }
    }

    #[test]
    fn adjustment_records_magnitude_and_label() {
        let req = adjustment(-7, "damage");
        let current = record(req.product_id, req.warehouse_id, 20);
        let plan = plan_adjustment(&req, Some(&current), at()).unwrap();
        assert_eq!(plan.previous_quantity, 20);
        assert_eq!(plan.new_quantity, 13);
        assert_eq!(plan.record.quantity, 13);
        assert_eq!(plan.movement.kind, MovementKind::Adjust("DAMAGE".into()));
        assert_eq!(plan.movement.quantity, 7);
        assert_eq!(plan.movement.notes.as_deref(), Some("DAMAGE adjustment"));
        assert_eq!(plan.reference_number, "ADJ-20240501093000");
    }

    #[test]
    fn adjustment_below_zero_is_rejected() {
        let req = adjustment(-21, "CORRECTION");
        let current = record(req.product_id, req.warehouse_id, 20);
        assert_eq!(
            plan_adjustment(&req, Some(&current), at()).unwrap_err(),
            DomainError::NegativeResultRejected {
                current: 20,
                adjustment: -21
            }
        );
    }

    #[test]
    fn adjustment_label_must_match_sign() {
        let req = adjustment(5, "DAMAGE");
        let current = record(req.product_id, req.warehouse_id, 20);
        assert!(matches!(
            plan_adjustment(&req, Some(&current), at()),
            Err(DomainError::Validation(_))
        ));
        let req = adjustment(-5, "FOUND");
        assert!(plan_adjustment(&req, Some(&current), at()).is_err());
        let req = adjustment(5, "CYCLE_COUNT");
        assert!(plan_adjustment(&req, Some(&current), at()).is_ok());
    }

    #[test]
    fn adjustment_of_missing_record_is_not_found() {
        let req = adjustment(3, "FOUND");
        assert_eq!(
            plan_adjustment(&req, None, at()).unwrap_err(),
            DomainError::not_found("Inventory record not found")
        );
    }

    #[test]
    fn adjustment_of_missing_record_fails_before_delta_checks() {
        for req in [adjustment(0, "CORRECTION"), adjustment(5, "DAMAGE")] {
            assert!(matches!(
                plan_adjustment(&req, None, at()),
                Err(DomainError::NotFound(_))
            ));
        }
    }

    #[test]
    fn adjustment_overflow_is_an_error_not_a_wrap() {
        let req = adjustment(i64::MAX, "CORRECTION");
        let current = record(req.product_id, req.warehouse_id, 1);
        assert_eq!(
            plan_adjustment(&req, Some(&current), at()).unwrap_err(),
            DomainError::validation("quantity out of range")
        );

        let req = adjustment(i64::MIN, "CORRECTION");
        let current = record(req.product_id, req.warehouse_id, 1);
        assert!(matches!(
            plan_adjustment(&req, Some(&current), at()),
            Err(DomainError::NegativeResultRejected { current: 1, .. })
        ));
    }

    #[test]
    fn transfer_into_a_full_destination_is_out_of_range() {
        let (req, src, mut dst) = transfer(10);
        dst.quantity = i64::MAX - 5;
        assert_eq!(
            plan_transfer(&req, Some(&src), Some(&dst), at()).unwrap_err(),
            DomainError::validation("quantity out of range")
        );
    }

    #[test]
    fn manual_receipt_overflow_is_out_of_range() {
        let req = ManualMovement {
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            kind: MovementKind::Return,
            quantity: i64::MAX,
            notes: None,
            user_id: None,
        };
        let current = record(req.product_id, req.warehouse_id, 1);
        assert_eq!(
            plan_manual_movement(&req, Some(&current), at()).unwrap_err(),
            DomainError::validation("quantity out of range")
        );
    }

    #[test]
    fn adjustment_type_rejects_free_text() {
        assert!("water damage".parse::<AdjustmentType>().is_err());
        assert_eq!(
            "cycle_count".parse::<AdjustmentType>().unwrap(),
            AdjustmentType::Other("CYCLE_COUNT".into())
        );
    }

    #[test]
    fn new_record_logs_initial_movement_only_for_stock() {
        let p = ProductId::new();
        let w = WarehouseId::new();
        let cmd = |q| NewInventoryRecord {
            product_id: p,
            warehouse_id: w,
            quantity: q,
            reserved_quantity: None,
            reorder_level: None,
            max_stock_level: None,
        };
        let change = plan_new_record(cmd(25), None, None, at()).unwrap();
        let m = change.movement.unwrap();
        assert_eq!(m.kind, MovementKind::Initial);
        assert_eq!(m.reference_number, "INIT-20240501093000");
        assert!(plan_new_record(cmd(0), None, None, at()).unwrap().movement.is_none());

        let existing = record(p, w, 1);
        assert!(matches!(
            plan_new_record(cmd(5), Some(&existing), None, at()),
            Err(DomainError::DuplicateEntry(_))
        ));
    }

    #[test]
    fn update_logs_signed_change() {
        let current = record(ProductId::new(), WarehouseId::new(), 40);
        let patch = InventoryPatch {
            quantity: Some(33),
            ..InventoryPatch::default()
        };
        let change = plan_record_update(Some(&current), &patch, None, at()).unwrap();
        let m = change.movement.unwrap();
        assert_eq!(m.kind, MovementKind::AdjustmentOut);
        assert_eq!(m.quantity, 7);
        assert_eq!(m.notes.as_deref(), Some("Inventory adjustment via API. Change: -7"));
        assert_eq!(change.previous_quantity, Some(40));

        let levels_only = InventoryPatch {
            reorder_level: Some(5),
            ..InventoryPatch::default()
        };
        let change = plan_record_update(Some(&current), &levels_only, None, at()).unwrap();
        assert!(change.movement.is_none());
        assert_eq!(change.record().unwrap().reorder_level, 5);
    }

    #[test]
    fn removal_captures_final_quantity() {
        let current = record(ProductId::new(), WarehouseId::new(), 12);
        let change = plan_removal(Some(&current), None, at()).unwrap();
        assert_eq!(change.write, RecordWrite::Delete(current.product_id, current.warehouse_id));
        let m = change.movement.unwrap();
        assert_eq!(m.kind, MovementKind::Removed);
        assert_eq!(m.quantity, 12);
        assert_eq!(m.reference_number, "DEL-20240501093000");
    }

    #[test]
    fn manual_receipt_creates_record_shipment_requires_stock() {
        let req = ManualMovement {
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            kind: MovementKind::In,
            quantity: 8,
            notes: None,
            user_id: None,
        };
        let change = plan_manual_movement(&req, None, at()).unwrap();
        assert_eq!(change.record().unwrap().quantity, 8);
        assert_eq!(change.previous_quantity, None);

        let shipped = ManualMovement {
            kind: MovementKind::Out,
            quantity: 9,
            ..req.clone()
        };
        let stocked = change.record().unwrap().clone();
        assert_eq!(
            plan_manual_movement(&shipped, Some(&stocked), at()).unwrap_err(),
            DomainError::InsufficientStock {
                available: 8,
                requested: 9
            }
        );
        assert!(matches!(
            plan_manual_movement(&shipped, None, at()),
            Err(DomainError::NotFound(_))
        ));

        let transfer_kind = ManualMovement {
            kind: MovementKind::TransferIn,
            ..req
        };
        assert!(plan_manual_movement(&transfer_kind, None, at()).is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Transfers conserve the product's total across the two warehouses.
            #[test]
            fn transfer_conserves_stock(src in 0i64..10_000, dst in 0i64..10_000, qty in 1i64..10_000) {
                let (mut req, mut s, mut d) = transfer(qty);
                s.quantity = src;
                d.quantity = dst;
                req.quantity = qty;
                match plan_transfer(&req, Some(&s), Some(&d), at()) {
                    Ok(plan) => {
                        prop_assert!(qty <= src);
                        prop_assert_eq!(plan.source.quantity + plan.destination.quantity, src + dst);
                        prop_assert!(plan.source.quantity >= 0);
                    }
                    Err(e) => {
                        prop_assert!(qty > src);
                        let is_insufficient = matches!(e, DomainError::InsufficientStock { .. });
                        prop_assert!(is_insufficient);
                    }
                }
            }

            /// Adjustments land exactly on previous + delta and log |delta|.
            #[test]
            fn adjustment_is_exact(current in 0i64..10_000, delta in -10_000i64..10_000) {
                prop_assume!(delta != 0);
                let req = adjustment(delta, "CORRECTION");
                let rec = record(req.product_id, req.warehouse_id, current);
                match plan_adjustment(&req, Some(&rec), at()) {
                    Ok(plan) => {
                        prop_assert_eq!(plan.new_quantity, current + delta);
                        prop_assert_eq!(plan.movement.quantity, delta.abs());
                    }
                    Err(e) => {
                        prop_assert!(current + delta < 0);
                        let is_negative = matches!(e, DomainError::NegativeResultRejected { .. });
                        prop_assert!(is_negative);
                    }
                }
            }
        }
    }
}
