use std::collections::HashMap;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::CaptureError;
use crate::domain::ports::SnapshotLoader;
use crate::domain::snapshot::{
    AdjustmentSnapshot, DeliveryInfoSnapshot, ModifierSnapshot, OrderItemSnapshot, OrderSnapshot,
    PizzaCustomizationSnapshot, TableRef,
};
use crate::schema::{
    areas, delivery_info, order_adjustments, order_item_modifiers,
    order_item_pizza_customizations, order_items, orders, pizza_customizations, product_variants,
    products, restaurant_tables,
};

use super::models::{
    DeliveryInfoRow, OrderAdjustmentRow, OrderItemCustomizationRow, OrderItemModifierRow,
    OrderItemRow, OrderRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for CaptureError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => CaptureError::NotFound,
            other => CaptureError::CaptureFailure(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for CaptureError {
    fn from(e: r2d2::Error) -> Self {
        CaptureError::CaptureFailure(e.to_string())
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

/// Reads the last committed state of an order on its own pooled connection,
/// so it never sees a pending write of the caller.
pub struct DieselSnapshotLoader {
    pool: DbPool,
    statement_timeout: Duration,
}

impl DieselSnapshotLoader {
    pub fn new(pool: DbPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }
}

impl SnapshotLoader for DieselSnapshotLoader {
    fn load(&self, order_id: Uuid) -> Result<OrderSnapshot, CaptureError> {
        let mut conn = self.pool.get()?;
        let timeout_ms = self.statement_timeout.as_millis();

        // One repeatable-read transaction: every table is read from the same
        // database snapshot.
        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, CaptureError, _>(|conn| {
                diesel::sql_query(format!("SET LOCAL statement_timeout = {}", timeout_ms))
                    .execute(conn)?;
                load_snapshot(conn, order_id)
            })
    }
}

/// Reads an order through `conn`, i.e. as of whatever transaction the
/// connection is in. Write paths use this to hand the after state to the
/// capture orchestrator directly.
pub fn load_snapshot(conn: &mut PgConnection, order_id: Uuid) -> Result<OrderSnapshot, CaptureError> {
    let order = orders::table
        .filter(orders::id.eq(order_id))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(CaptureError::NotFound)?;

    let table = match order.table_id {
        Some(table_id) => restaurant_tables::table
            .left_join(areas::table)
            .filter(restaurant_tables::id.eq(table_id))
            .select((
                restaurant_tables::id,
                restaurant_tables::name,
                areas::name.nullable(),
            ))
            .first::<(Uuid, String, Option<String>)>(conn)
            .optional()?
            .map(|(id, name, area)| TableRef { id, name, area }),
        None => None,
    };

    let delivery = delivery_info::table
        .filter(delivery_info::order_id.eq(order_id))
        .select(DeliveryInfoRow::as_select())
        .first(conn)
        .optional()?;

    let item_rows = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order((order_items::created_at.asc(), order_items::id.asc()))
        .select(OrderItemRow::as_select())
        .load(conn)?;
    let item_ids: Vec<Uuid> = item_rows.iter().map(|i| i.id).collect();

    let product_ids: Vec<Uuid> = item_rows.iter().map(|i| i.product_id).collect();
    let product_names: HashMap<Uuid, String> = products::table
        .filter(products::id.eq_any(product_ids))
        .select((products::id, products::name))
        .load::<(Uuid, String)>(conn)?
        .into_iter()
        .collect();

    let variant_ids: Vec<Uuid> = item_rows.iter().filter_map(|i| i.product_variant_id).collect();
    let variant_names: HashMap<Uuid, String> = product_variants::table
        .filter(product_variants::id.eq_any(variant_ids))
        .select((product_variants::id, product_variants::name))
        .load::<(Uuid, String)>(conn)?
        .into_iter()
        .collect();

    let modifier_rows = order_item_modifiers::table
        .filter(order_item_modifiers::order_item_id.eq_any(item_ids.clone()))
        .order(order_item_modifiers::id.asc())
        .select(OrderItemModifierRow::as_select())
        .load(conn)?;

    let customization_rows = order_item_pizza_customizations::table
        .filter(order_item_pizza_customizations::order_item_id.eq_any(item_ids))
        .order(order_item_pizza_customizations::id.asc())
        .select(OrderItemCustomizationRow::as_select())
        .load(conn)?;
    let customization_ids: Vec<Uuid> = customization_rows
        .iter()
        .map(|c| c.pizza_customization_id)
        .collect();
    let customization_names: HashMap<Uuid, String> = pizza_customizations::table
        .filter(pizza_customizations::id.eq_any(customization_ids))
        .select((pizza_customizations::id, pizza_customizations::name))
        .load::<(Uuid, String)>(conn)?
        .into_iter()
        .collect();

    let adjustment_rows = order_adjustments::table
        .filter(order_adjustments::order_id.eq(order_id))
        .order(order_adjustments::id.asc())
        .select(OrderAdjustmentRow::as_select())
        .load(conn)?;

    let mut modifiers_by_item: HashMap<Uuid, Vec<ModifierSnapshot>> = HashMap::new();
    for m in modifier_rows {
        modifiers_by_item
            .entry(m.order_item_id)
            .or_default()
            .push(ModifierSnapshot {
                id: m.modifier_id,
                name: m.name,
                price: m.price,
            });
    }

    let mut customizations_by_item: HashMap<Uuid, Vec<PizzaCustomizationSnapshot>> =
        HashMap::new();
    for c in customization_rows {
        let name = customization_names
            .get(&c.pizza_customization_id)
            .cloned()
            .ok_or_else(|| {
                CaptureError::MalformedSnapshot(format!(
                    "unknown pizza customization {}",
                    c.pizza_customization_id
                ))
            })?;
        customizations_by_item
            .entry(c.order_item_id)
            .or_default()
            .push(PizzaCustomizationSnapshot {
                customization_id: c.pizza_customization_id,
                name,
                half: c.half.parse()?,
                action: c.action.parse()?,
            });
    }

    let items = item_rows
        .into_iter()
        .map(|row| {
            let product_name = product_names.get(&row.product_id).cloned().ok_or_else(|| {
                CaptureError::MalformedSnapshot(format!("unknown product {}", row.product_id))
            })?;
            Ok(OrderItemSnapshot {
                id: row.id,
                product_id: row.product_id,
                product_name,
                variant_id: row.product_variant_id,
                variant_name: row
                    .product_variant_id
                    .and_then(|id| variant_names.get(&id).cloned()),
                quantity: row.quantity,
                base_price: row.base_price,
                final_price: row.final_price,
                preparation_status: row.preparation_status.parse()?,
                preparation_notes: row.preparation_notes,
                modifiers: modifiers_by_item.remove(&row.id).unwrap_or_default(),
                pizza_customizations: customizations_by_item.remove(&row.id).unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, CaptureError>>()?;

    let snapshot = OrderSnapshot {
        id: order.id,
        order_type: order.order_type.parse()?,
        order_status: order.order_status.parse()?,
        notes: order.notes,
        table,
        delivery_info: delivery.map(|d| DeliveryInfoSnapshot {
            recipient_name: d.recipient_name,
            recipient_phone: d.recipient_phone,
            full_address: d.full_address,
            delivery_instructions: d.delivery_instructions,
            street: d.street,
            number: d.number,
            interior_number: d.interior_number,
            neighborhood: d.neighborhood,
            city: d.city,
            state: d.state,
            zip_code: d.zip_code,
            reference: d.reference,
            latitude: d.latitude,
            longitude: d.longitude,
        }),
        subtotal: order.subtotal,
        total: order.total,
        items,
        adjustments: adjustment_rows
            .into_iter()
            .map(|a| AdjustmentSnapshot {
                id: a.id,
                name: a.name,
                is_percentage: a.is_percentage,
                value: a.value,
                amount: a.amount,
            })
            .collect(),
    };
    snapshot.validate()?;
    Ok(snapshot)
}
