//! Stock movements: the append-only audit log behind every quantity change.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, MovementId, ProductId, UserId, WarehouseId};

/// Kind of a stock movement.
///
/// Quantities on movements are always stored as magnitudes; the direction is
/// carried entirely by the kind. `Adjust(label)` is the controller's
/// free-form adjustment kind, persisted as `ADJUST_{label}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MovementKind {
    In,
    Out,
    TransferIn,
    TransferOut,
    AdjustmentIn,
    AdjustmentOut,
    Return,
    Damaged,
    Initial,
    Removed,
    Adjust(String),
}

impl MovementKind {
    pub fn as_str(&self) -> std::borrow::Cow<'static, str> {
        use std::borrow::Cow;
        match self {
            MovementKind::In => Cow::Borrowed("IN"),
            MovementKind::Out => Cow::Borrowed("OUT"),
            MovementKind::TransferIn => Cow::Borrowed("TRANSFER_IN"),
            MovementKind::TransferOut => Cow::Borrowed("TRANSFER_OUT"),
            MovementKind::AdjustmentIn => Cow::Borrowed("ADJUSTMENT_IN"),
            MovementKind::AdjustmentOut => Cow::Borrowed("ADJUSTMENT_OUT"),
            MovementKind::Return => Cow::Borrowed("RETURN"),
            MovementKind::Damaged => Cow::Borrowed("DAMAGED"),
            MovementKind::Initial => Cow::Borrowed("INITIAL"),
            MovementKind::Removed => Cow::Borrowed("REMOVED"),
            MovementKind::Adjust(label) => Cow::Owned(format!("ADJUST_{label}")),
        }
    }

    /// Outbound kinds feed the demand predictor.
    pub fn is_outbound(&self) -> bool {
        matches!(self, MovementKind::Out | MovementKind::TransferOut)
    }

    /// `+1` for kinds that add stock, `-1` for kinds that remove it, `None`
    /// when the kind alone does not say (free-form adjustments).
    pub fn direction(&self) -> Option<i8> {
        match self {
            MovementKind::In
            | MovementKind::TransferIn
            | MovementKind::AdjustmentIn
            | MovementKind::Return
            | MovementKind::Initial => Some(1),
            MovementKind::Out
            | MovementKind::TransferOut
            | MovementKind::AdjustmentOut
            | MovementKind::Damaged
            | MovementKind::Removed => Some(-1),
            MovementKind::Adjust(_) => None,
        }
    }
}

/// Adjustment labels are upper-case ASCII words joined by underscores.
pub(crate) fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "IN" => MovementKind::In,
            "OUT" => MovementKind::Out,
            "TRANSFER_IN" => MovementKind::TransferIn,
            "TRANSFER_OUT" => MovementKind::TransferOut,
            "ADJUSTMENT_IN" => MovementKind::AdjustmentIn,
            "ADJUSTMENT_OUT" => MovementKind::AdjustmentOut,
            "RETURN" => MovementKind::Return,
            "DAMAGED" => MovementKind::Damaged,
            "INITIAL" => MovementKind::Initial,
            "REMOVED" => MovementKind::Removed,
            other => match other.strip_prefix("ADJUST_") {
                Some(label) if is_valid_label(label) => MovementKind::Adjust(label.to_string()),
                _ => {
                    return Err(DomainError::validation(format!("unknown movement type: {other}")));
                }
            },
        };
        Ok(kind)
    }
}

impl TryFrom<String> for MovementKind {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MovementKind> for String {
    fn from(value: MovementKind) -> Self {
        value.as_str().into_owned()
    }
}

/// Prefixes of generated reference numbers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReferencePrefix {
    Transfer,
    Adjustment,
    Initial,
    Removal,
    Manual,
}

impl ReferencePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferencePrefix::Transfer => "TRANSFER",
            ReferencePrefix::Adjustment => "ADJ",
            ReferencePrefix::Initial => "INIT",
            ReferencePrefix::Removal => "DEL",
            ReferencePrefix::Manual => "MOV",
        }
    }
}

/// `{PREFIX}-{YYYYMMDDHHMMSS}`.
///
/// Resolution is one second: two transfers of the same product committed in
/// the same second share a reference number.
pub fn reference_number(prefix: ReferencePrefix, at: DateTime<Utc>) -> String {
    format!("{}-{}", prefix.as_str(), at.format("%Y%m%d%H%M%S"))
}

/// A movement that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reference_number: String,
    pub notes: Option<String>,
    pub user_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

impl NewMovement {
    pub fn new(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        kind: MovementKind,
        quantity: i64,
        reference_number: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("movement quantity must be a non-negative magnitude"));
        }
        let reference_number = reference_number.into();
        if reference_number.trim().is_empty() {
            return Err(DomainError::validation("reference_number is required"));
        }
        Ok(Self {
            product_id,
            warehouse_id,
            kind,
            quantity,
            reference_number,
            notes: None,
            user_id: None,
            occurred_at,
        })
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() { None } else { Some(notes) };
        self
    }

    pub fn by(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn persisted(self, id: MovementId) -> StockMovement {
        StockMovement {
            id,
            product_id: self.product_id,
            warehouse_id: self.warehouse_id,
            kind: self.kind,
            quantity: self.quantity,
            reference_number: self.reference_number,
            notes: self.notes,
            user_id: self.user_id,
            created_at: self.occurred_at,
        }
    }
}

/// Immutable audit row. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    #[serde(rename = "movement_type")]
    pub kind: MovementKind,
    pub quantity: i64,
    pub reference_number: String,
    pub notes: Option<String>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Signed quantity change, when the kind determines it.
    pub fn signed_quantity(&self) -> Option<i64> {
        self.kind.direction().map(|d| i64::from(d) * self.quantity)
    }
}
