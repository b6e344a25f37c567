use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{
    delivery_info, order_adjustments, order_history, order_item_modifiers,
    order_item_pizza_customizations, order_items, orders,
};

// ── System of record (read only) ─────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_type: String,
    pub order_status: String,
    pub notes: Option<String>,
    pub table_id: Option<Uuid>,
    pub subtotal: BigDecimal,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = delivery_info)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryInfoRow {
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub full_address: Option<String>,
    pub delivery_instructions: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub interior_number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub reference: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_variant_id: Option<Uuid>,
    pub quantity: i32,
    pub base_price: BigDecimal,
    pub final_price: BigDecimal,
    pub preparation_status: String,
    pub preparation_notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_item_modifiers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemModifierRow {
    pub order_item_id: Uuid,
    pub modifier_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_item_pizza_customizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemCustomizationRow {
    pub order_item_id: Uuid,
    pub pizza_customization_id: Uuid,
    pub half: String,
    pub action: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_adjustments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderAdjustmentRow {
    pub id: Uuid,
    pub name: String,
    pub is_percentage: bool,
    pub value: BigDecimal,
    pub amount: BigDecimal,
}

// ── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryEntryRow {
    pub id: i64,
    pub order_id: Uuid,
    pub sequence: i64,
    pub operation: String,
    pub changed_by: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
    pub payload: Value,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_history)]
pub struct NewHistoryEntryRow {
    pub order_id: Uuid,
    pub sequence: i64,
    pub operation: String,
    pub changed_by: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub payload: Value,
}

#[derive(Debug, QueryableByName)]
pub struct SequenceSlotRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub last_sequence: i64,
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub last_changed_at: DateTime<Utc>,
}
