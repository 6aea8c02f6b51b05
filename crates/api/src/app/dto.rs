//! Query strings and bodies that are not domain commands.

use serde::Deserialize;

use stockroom_core::{ProductId, WarehouseId};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemandQuery {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderQuery {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferHistoryQuery {
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub days_back: Option<i64>,
}
