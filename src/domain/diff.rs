//! Structural diff between two snapshots of the same order.
//!
//! Everything here is pure: no I/O, no clocks. Collections are matched by
//! identity (item id, modifier id, customization tuple), never by position.

use std::collections::{BTreeMap, HashMap, HashSet};

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::snapshot::{
    AdjustmentSnapshot, DeliveryInfoSnapshot, ModifierSnapshot, OrderItemSnapshot, OrderSnapshot,
    PizzaCustomizationSnapshot,
};

/// Tolerance for numeric comparisons; absorbs rounding noise from pricing.
pub const NUMERIC_EPSILON: f64 = 1e-6;

/// A scalar value as it appears in a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(BigDecimal),
    Number(f64),
    Flag(bool),
}

impl FieldValue {
    /// Type-appropriate equality: trimmed text, epsilon-tolerant numbers.
    /// Values of different kinds are never equal.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.trim() == b.trim(),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => decimals_equal(a, b),
            (FieldValue::Number(a), FieldValue::Number(b)) => (a - b).abs() <= NUMERIC_EPSILON,
            (FieldValue::Flag(a), FieldValue::Flag(b)) => a == b,
            _ => false,
        }
    }
}

fn decimals_equal(a: &BigDecimal, b: &BigDecimal) -> bool {
    // |a - b| <= 1e-6, evaluated without leaving exact decimal arithmetic.
    (a - b).abs() * BigDecimal::from(1_000_000) <= BigDecimal::from(1)
}

/// Absence equals absence; absence never equals a present value, even an
/// empty string or zero.
pub fn values_equal(before: &Option<FieldValue>, after: &Option<FieldValue>) -> bool {
    match (before, after) {
        (None, None) => true,
        (Some(b), Some(a)) => b.same_as(a),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: Option<FieldValue>,
    pub after: Option<FieldValue>,
}

/// Changed fields keyed by field name. Ordered so serialized diffs are stable.
pub type FieldChanges = BTreeMap<String, FieldChange>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierPriceChange {
    pub id: Uuid,
    pub name: String,
    pub before: BigDecimal,
    pub after: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifiersDiff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<ModifierSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<ModifierSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub price_changed: Vec<ModifierPriceChange>,
}

impl ModifiersDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.price_changed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomizationsDiff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<PizzaCustomizationSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<PizzaCustomizationSnapshot>,
}

impl CustomizationsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Differences found on one item present in both snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDiff {
    pub item_id: Uuid,
    pub descriptor: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: FieldChanges,
    #[serde(default, skip_serializing_if = "ModifiersDiff::is_empty")]
    pub modifiers_diff: ModifiersDiff,
    #[serde(default, skip_serializing_if = "CustomizationsDiff::is_empty")]
    pub customizations_diff: CustomizationsDiff,
}

impl ItemDiff {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.modifiers_diff.is_empty() && self.customizations_diff.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsDiff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<OrderItemSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<OrderItemSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modified: Vec<ItemDiff>,
}

impl ItemsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of elementary item-level changes.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentChange {
    pub id: Uuid,
    pub name: String,
    pub fields: FieldChanges,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentsDiff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<AdjustmentSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<AdjustmentSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modified: Vec<AdjustmentChange>,
}

impl AdjustmentsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDiff {
    pub order_id: Uuid,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: FieldChanges,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub delivery_info: FieldChanges,
    #[serde(default, skip_serializing_if = "AdjustmentsDiff::is_empty")]
    pub adjustments: AdjustmentsDiff,
    #[serde(default, skip_serializing_if = "ItemsDiff::is_empty")]
    pub items: ItemsDiff,
}

impl OrderDiff {
    pub fn is_empty(&self) -> bool {
        !self.has_order_level_changes() && self.items.is_empty()
    }

    /// Header, delivery or adjustment changes, i.e. anything but items.
    pub fn has_order_level_changes(&self) -> bool {
        !self.fields.is_empty() || !self.delivery_info.is_empty() || !self.adjustments.is_empty()
    }

    /// The same diff with the item section dropped.
    pub fn order_level_only(&self) -> OrderDiff {
        OrderDiff {
            order_id: self.order_id,
            fields: self.fields.clone(),
            delivery_info: self.delivery_info.clone(),
            adjustments: self.adjustments.clone(),
            items: ItemsDiff::default(),
        }
    }
}

// ── Value extraction ─────────────────────────────────────────────────────────

fn text(value: &Option<String>) -> Option<FieldValue> {
    value.as_ref().map(|v| FieldValue::Text(v.clone()))
}

fn code(value: &str) -> Option<FieldValue> {
    Some(FieldValue::Text(value.to_string()))
}

fn decimal(value: &BigDecimal) -> Option<FieldValue> {
    Some(FieldValue::Decimal(value.clone()))
}

fn number(value: Option<f64>) -> Option<FieldValue> {
    value.map(FieldValue::Number)
}

type TrackedFields = Vec<(&'static str, Option<FieldValue>)>;

fn header_fields(s: &OrderSnapshot) -> TrackedFields {
    vec![
        ("order_type", code(s.order_type.as_str())),
        ("order_status", code(s.order_status.as_str())),
        ("notes", text(&s.notes)),
        ("subtotal", decimal(&s.subtotal)),
        ("total", decimal(&s.total)),
    ]
}

fn delivery_fields(d: Option<&DeliveryInfoSnapshot>) -> TrackedFields {
    let empty = DeliveryInfoSnapshot::default();
    let d = d.unwrap_or(&empty);
    vec![
        ("recipient_name", text(&d.recipient_name)),
        ("recipient_phone", text(&d.recipient_phone)),
        ("full_address", text(&d.full_address)),
        ("delivery_instructions", text(&d.delivery_instructions)),
        ("street", text(&d.street)),
        ("number", text(&d.number)),
        ("interior_number", text(&d.interior_number)),
        ("neighborhood", text(&d.neighborhood)),
        ("city", text(&d.city)),
        ("state", text(&d.state)),
        ("zip_code", text(&d.zip_code)),
        ("reference", text(&d.reference)),
        ("latitude", number(d.latitude)),
        ("longitude", number(d.longitude)),
    ]
}

fn item_fields(i: &OrderItemSnapshot) -> TrackedFields {
    vec![
        ("quantity", Some(FieldValue::Integer(i64::from(i.quantity)))),
        ("preparation_status", code(i.preparation_status.as_str())),
        ("preparation_notes", text(&i.preparation_notes)),
        ("base_price", decimal(&i.base_price)),
        ("final_price", decimal(&i.final_price)),
    ]
}

fn adjustment_fields(a: &AdjustmentSnapshot) -> TrackedFields {
    vec![
        ("name", Some(FieldValue::Text(a.name.clone()))),
        ("is_percentage", Some(FieldValue::Flag(a.is_percentage))),
        ("value", decimal(&a.value)),
        ("amount", decimal(&a.amount)),
    ]
}

/// Both lists come from the same extractor, so fields line up by position.
fn diff_tracked(before: TrackedFields, after: TrackedFields, changes: &mut FieldChanges) {
    for ((name, b), (after_name, a)) in before.into_iter().zip(after) {
        debug_assert_eq!(name, after_name);
        if !values_equal(&b, &a) {
            changes.insert(name.to_string(), FieldChange { before: b, after: a });
        }
    }
}

/// Compares a reference by id and reports it by its label.
fn diff_reference(
    changes: &mut FieldChanges,
    name: &str,
    before: Option<(Uuid, String)>,
    after: Option<(Uuid, String)>,
) {
    let before_id = before.as_ref().map(|(id, _)| *id);
    let after_id = after.as_ref().map(|(id, _)| *id);
    if before_id != after_id {
        changes.insert(
            name.to_string(),
            FieldChange {
                before: before.map(|(_, label)| FieldValue::Text(label)),
                after: after.map(|(_, label)| FieldValue::Text(label)),
            },
        );
    }
}

// ── Diff engine ──────────────────────────────────────────────────────────────

/// Compares two snapshots of the same order.
pub fn diff(before: &OrderSnapshot, after: &OrderSnapshot) -> OrderDiff {
    let mut fields = FieldChanges::new();
    diff_tracked(header_fields(before), header_fields(after), &mut fields);
    diff_reference(
        &mut fields,
        "table",
        before.table.as_ref().map(|t| (t.id, t.label())),
        after.table.as_ref().map(|t| (t.id, t.label())),
    );

    let mut delivery_info = FieldChanges::new();
    diff_tracked(
        delivery_fields(before.delivery_info.as_ref()),
        delivery_fields(after.delivery_info.as_ref()),
        &mut delivery_info,
    );

    OrderDiff {
        order_id: after.id,
        fields,
        delivery_info,
        adjustments: diff_adjustments(&before.adjustments, &after.adjustments),
        items: diff_items(&before.items, &after.items),
    }
}

/// Partitions items into added, removed and modified by id.
///
/// An id whose product changed is a substitution: the old item is reported
/// removed and the new one added, since product-specific fields are not
/// comparable across products.
pub fn diff_items(before: &[OrderItemSnapshot], after: &[OrderItemSnapshot]) -> ItemsDiff {
    let before_by_id: HashMap<Uuid, &OrderItemSnapshot> = before.iter().map(|i| (i.id, i)).collect();
    let after_by_id: HashMap<Uuid, &OrderItemSnapshot> = after.iter().map(|i| (i.id, i)).collect();

    let mut result = ItemsDiff::default();

    for item in before {
        match after_by_id.get(&item.id) {
            Some(current) if current.product_id == item.product_id => {}
            _ => result.removed.push(item.clone()),
        }
    }

    for item in after {
        match before_by_id.get(&item.id) {
            Some(previous) if previous.product_id == item.product_id => {
                if let Some(item_diff) = diff_item(previous, item) {
                    result.modified.push(item_diff);
                }
            }
            _ => result.added.push(item.clone()),
        }
    }

    result
}

/// Compares two versions of the same item. Returns `None` when nothing differs,
/// so an unchanged item can never be reported as modified.
pub fn diff_item(before: &OrderItemSnapshot, after: &OrderItemSnapshot) -> Option<ItemDiff> {
    let mut fields = FieldChanges::new();
    diff_reference(
        &mut fields,
        "variant",
        before
            .variant_id
            .map(|id| (id, before.variant_name.clone().unwrap_or_default())),
        after
            .variant_id
            .map(|id| (id, after.variant_name.clone().unwrap_or_default())),
    );
    diff_tracked(item_fields(before), item_fields(after), &mut fields);

    let item_diff = ItemDiff {
        item_id: after.id,
        descriptor: after.descriptor(),
        fields,
        modifiers_diff: diff_modifiers(&before.modifiers, &after.modifiers),
        customizations_diff: diff_customizations(
            &before.pizza_customizations,
            &after.pizza_customizations,
        ),
    };

    (!item_diff.is_empty()).then_some(item_diff)
}

fn diff_modifiers(before: &[ModifierSnapshot], after: &[ModifierSnapshot]) -> ModifiersDiff {
    let before_by_id: HashMap<Uuid, &ModifierSnapshot> = before.iter().map(|m| (m.id, m)).collect();
    let after_ids: HashSet<Uuid> = after.iter().map(|m| m.id).collect();

    let mut result = ModifiersDiff::default();
    for modifier in after {
        match before_by_id.get(&modifier.id) {
            None => result.added.push(modifier.clone()),
            Some(previous) if !decimals_equal(&previous.price, &modifier.price) => {
                result.price_changed.push(ModifierPriceChange {
                    id: modifier.id,
                    name: modifier.name.clone(),
                    before: previous.price.clone(),
                    after: modifier.price.clone(),
                });
            }
            Some(_) => {}
        }
    }
    result.removed = before
        .iter()
        .filter(|m| !after_ids.contains(&m.id))
        .cloned()
        .collect();
    result
}

/// Customizations have no identity finer than (customization, half, action);
/// moving one to another half is a remove plus an add.
fn diff_customizations(
    before: &[PizzaCustomizationSnapshot],
    after: &[PizzaCustomizationSnapshot],
) -> CustomizationsDiff {
    let before_keys: HashSet<_> = before.iter().map(|c| c.key()).collect();
    let after_keys: HashSet<_> = after.iter().map(|c| c.key()).collect();

    CustomizationsDiff {
        added: after
            .iter()
            .filter(|c| !before_keys.contains(&c.key()))
            .cloned()
            .collect(),
        removed: before
            .iter()
            .filter(|c| !after_keys.contains(&c.key()))
            .cloned()
            .collect(),
    }
}

fn diff_adjustments(before: &[AdjustmentSnapshot], after: &[AdjustmentSnapshot]) -> AdjustmentsDiff {
    let before_by_id: HashMap<Uuid, &AdjustmentSnapshot> = before.iter().map(|a| (a.id, a)).collect();
    let after_ids: HashSet<Uuid> = after.iter().map(|a| a.id).collect();

    let mut result = AdjustmentsDiff::default();
    for adjustment in after {
        match before_by_id.get(&adjustment.id) {
            None => result.added.push(adjustment.clone()),
            Some(previous) => {
                let mut fields = FieldChanges::new();
                diff_tracked(adjustment_fields(previous), adjustment_fields(adjustment), &mut fields);
                if !fields.is_empty() {
                    result.modified.push(AdjustmentChange {
                        id: adjustment.id,
                        name: adjustment.name.clone(),
                        fields,
                    });
                }
            }
        }
    }
    result.removed = before
        .iter()
        .filter(|a| !after_ids.contains(&a.id))
        .cloned()
        .collect();
    result
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::fixtures::{customization, item, modifier, order};
    use crate::domain::snapshot::{CustomizationAction, OrderStatus, PizzaHalf, TableRef};

    fn ids(items: &[OrderItemSnapshot]) -> Vec<Uuid> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn identical_snapshots_produce_empty_diff() {
        let snapshot = order(vec![item("Pizza", 2), item("Refresco", 1)]);
        let result = diff(&snapshot, &snapshot.clone());
        assert!(result.is_empty());
        assert!(result.fields.is_empty());
        assert!(result.delivery_info.is_empty());
        assert!(result.items.is_empty());
    }

    #[test]
    fn reordering_items_is_not_a_change() {
        let before = order(vec![item("Pizza", 2), item("Refresco", 1), item("Alitas", 3)]);
        let mut after = before.clone();
        after.items.reverse();
        assert!(diff(&before, &after).items.is_empty());
    }

    #[test]
    fn reordering_modifiers_is_not_a_change() {
        let mut pizza = item("Pizza", 1);
        pizza.modifiers = vec![modifier("Extra queso", "15.00"), modifier("Orilla", "20.00")];
        let before = order(vec![pizza]);
        let mut after = before.clone();
        after.items[0].modifiers.reverse();
        assert!(diff(&before, &after).is_empty());
    }

    #[test]
    fn header_fields_are_reported_with_before_and_after() {
        let before = order(vec![]);
        let mut after = before.clone();
        after.order_status = OrderStatus::InPreparation;
        after.notes = Some("Sin cebolla".to_string());

        let result = diff(&before, &after);
        assert_eq!(result.fields.len(), 2);
        assert_eq!(
            result.fields["order_status"],
            FieldChange {
                before: Some(FieldValue::Text("PENDING".to_string())),
                after: Some(FieldValue::Text("IN_PREPARATION".to_string())),
            }
        );
        assert_eq!(result.fields["notes"].before, None);
    }

    #[test]
    fn price_within_epsilon_is_not_reported() {
        let before = order(vec![]);
        let mut after = before.clone();
        after.total = &before.total + BigDecimal::from_str("0.0000001").expect("decimal");
        assert!(diff(&before, &after).fields.is_empty());
    }

    #[test]
    fn price_beyond_epsilon_is_reported_with_exact_values() {
        let before = order(vec![]);
        let mut after = before.clone();
        after.total = BigDecimal::from_str("250.01").expect("decimal");

        let result = diff(&before, &after);
        let change = &result.fields["total"];
        assert_eq!(change.before, Some(FieldValue::Decimal(before.total.clone())));
        assert_eq!(
            change.after,
            Some(FieldValue::Decimal(BigDecimal::from_str("250.01").expect("decimal")))
        );
    }

    #[test]
    fn text_comparison_trims_but_keeps_absence_distinct_from_empty() {
        let mut before = order(vec![]);
        before.notes = Some("Sin cebolla".to_string());
        let mut after = before.clone();
        after.notes = Some("  Sin cebolla ".to_string());
        assert!(diff(&before, &after).fields.is_empty());

        before.notes = None;
        after.notes = Some(String::new());
        assert!(diff(&before, &after).fields.contains_key("notes"));

        after.notes = None;
        assert!(diff(&before, &after).fields.is_empty());
    }

    #[test]
    fn table_change_is_compared_by_id_and_reported_by_label() {
        let table = TableRef {
            id: Uuid::new_v4(),
            name: "Mesa 1".to_string(),
            area: Some("Terraza".to_string()),
        };
        let mut before = order(vec![]);
        before.table = Some(table.clone());

        let mut renamed = before.clone();
        if let Some(t) = renamed.table.as_mut() {
            t.name = "Mesa Uno".to_string();
        }
        assert!(diff(&before, &renamed).fields.is_empty());

        let mut moved = before.clone();
        moved.table = Some(TableRef {
            id: Uuid::new_v4(),
            name: "Mesa 2".to_string(),
            area: None,
        });
        let change = &diff(&before, &moved).fields["table"];
        assert_eq!(change.before, Some(FieldValue::Text("Terraza - Mesa 1".to_string())));
        assert_eq!(change.after, Some(FieldValue::Text("Mesa 2".to_string())));
    }

    #[test]
    fn delivery_info_appearing_reports_only_present_fields() {
        let before = order(vec![]);
        let mut after = before.clone();
        after.delivery_info = Some(DeliveryInfoSnapshot {
            recipient_phone: Some("555-0100".to_string()),
            ..Default::default()
        });

        let result = diff(&before, &after);
        assert_eq!(result.delivery_info.len(), 1);
        assert_eq!(
            result.delivery_info["recipient_phone"],
            FieldChange {
                before: None,
                after: Some(FieldValue::Text("555-0100".to_string())),
            }
        );
    }

    #[test]
    fn delivery_info_disappearing_reports_fields_to_absence() {
        let mut before = order(vec![]);
        before.delivery_info = Some(DeliveryInfoSnapshot {
            recipient_name: Some("Ana".to_string()),
            latitude: Some(19.4326),
            ..Default::default()
        });
        let mut after = before.clone();
        after.delivery_info = None;

        let result = diff(&before, &after);
        assert_eq!(result.delivery_info.len(), 2);
        assert_eq!(result.delivery_info["latitude"].after, None);
    }

    #[test]
    fn items_are_partitioned_by_id() {
        let kept = item("Pizza", 2);
        let dropped = item("Refresco", 1);
        let changed = item("Alitas", 1);
        let before = order(vec![kept.clone(), dropped.clone(), changed.clone()]);

        let new_item = item("Papas", 1);
        let mut changed_after = changed.clone();
        changed_after.quantity = 3;
        let after = order_like(&before, vec![new_item.clone(), kept.clone(), changed_after]);

        let result = diff(&before, &after).items;
        assert_eq!(ids(&result.added), vec![new_item.id]);
        assert_eq!(ids(&result.removed), vec![dropped.id]);
        assert_eq!(result.modified.len(), 1);
        assert_eq!(result.modified[0].item_id, changed.id);

        let mut all: Vec<Uuid> = ids(&result.added);
        all.extend(ids(&result.removed));
        all.extend(result.modified.iter().map(|m| m.item_id));
        let unique: HashSet<Uuid> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn product_substitution_is_removed_plus_added() {
        let original = item("Pizza", 1);
        let before = order(vec![original.clone()]);
        let mut substituted = original.clone();
        substituted.product_id = Uuid::new_v4();
        substituted.product_name = "Calzone".to_string();
        let after = order_like(&before, vec![substituted]);

        let result = diff(&before, &after).items;
        assert_eq!(ids(&result.removed), vec![original.id]);
        assert_eq!(ids(&result.added), vec![original.id]);
        assert!(result.modified.is_empty());
    }

    #[test]
    fn added_modifier_is_reported_without_touching_quantity() {
        let mut pizza = item("Pizza", 2);
        let m1 = modifier("Extra queso", "15.00");
        pizza.modifiers = vec![m1.clone()];
        let before = order(vec![pizza.clone()]);

        let m2 = modifier("Orilla rellena", "25.00");
        let mut after_pizza = pizza.clone();
        after_pizza.modifiers = vec![m1, m2.clone()];
        let after = order_like(&before, vec![after_pizza]);

        let result = diff(&before, &after);
        let item_diff = &result.items.modified[0];
        let added: Vec<Uuid> = item_diff.modifiers_diff.added.iter().map(|m| m.id).collect();
        assert_eq!(added, vec![m2.id]);
        assert!(item_diff.modifiers_diff.removed.is_empty());
        assert!(!item_diff.fields.contains_key("quantity"));
    }

    #[test]
    fn modifier_price_change_is_reported() {
        let mut pizza = item("Pizza", 1);
        let m1 = modifier("Extra queso", "15.00");
        pizza.modifiers = vec![m1.clone()];
        let before = order(vec![pizza.clone()]);
        let mut after_pizza = pizza;
        after_pizza.modifiers[0].price = BigDecimal::from_str("18.00").expect("decimal");
        let after = order_like(&before, vec![after_pizza]);

        let modifiers = &diff(&before, &after).items.modified[0].modifiers_diff;
        assert_eq!(modifiers.price_changed.len(), 1);
        assert_eq!(modifiers.price_changed[0].id, m1.id);
        assert!(modifiers.added.is_empty());
    }

    #[test]
    fn moving_a_customization_to_another_half_is_remove_plus_add() {
        let mut pizza = item("Pizza", 1);
        let pepperoni = customization("Pepperoni", PizzaHalf::Half1, CustomizationAction::Add);
        pizza.pizza_customizations = vec![pepperoni.clone()];
        let before = order(vec![pizza.clone()]);

        let mut moved = pepperoni.clone();
        moved.half = PizzaHalf::Half2;
        let mut after_pizza = pizza;
        after_pizza.pizza_customizations = vec![moved.clone()];
        let after = order_like(&before, vec![after_pizza]);

        let customizations = &diff(&before, &after).items.modified[0].customizations_diff;
        assert_eq!(customizations.removed, vec![pepperoni]);
        assert_eq!(customizations.added, vec![moved]);
    }

    #[test]
    fn variant_change_is_reported_by_name() {
        let mut pizza = item("Pizza", 1);
        pizza.variant_id = Some(Uuid::new_v4());
        pizza.variant_name = Some("Mediana".to_string());
        let before = order(vec![pizza.clone()]);
        let mut after_pizza = pizza;
        after_pizza.variant_id = Some(Uuid::new_v4());
        after_pizza.variant_name = Some("Grande".to_string());
        let after = order_like(&before, vec![after_pizza]);

        let item_diff = &diff(&before, &after).items.modified[0];
        assert_eq!(
            item_diff.fields["variant"].after,
            Some(FieldValue::Text("Grande".to_string()))
        );
        assert_eq!(item_diff.descriptor, "Pizza (Grande)");
    }

    #[test]
    fn adjustments_are_diffed_by_id() {
        let mut before = order(vec![]);
        before.adjustments = vec![AdjustmentSnapshot {
            id: Uuid::new_v4(),
            name: "Descuento".to_string(),
            is_percentage: true,
            value: BigDecimal::from(10),
            amount: BigDecimal::from(20),
        }];
        let mut after = before.clone();
        after.adjustments[0].value = BigDecimal::from(15);
        after.adjustments[0].amount = BigDecimal::from(30);

        let result = diff(&before, &after);
        assert_eq!(result.adjustments.modified.len(), 1);
        assert_eq!(result.adjustments.modified[0].fields.len(), 2);
        assert!(result.has_order_level_changes());
    }

    #[test]
    fn diff_survives_a_json_round_trip() {
        let before = order(vec![item("Pizza", 1)]);
        let mut after = before.clone();
        after.items[0].quantity = 2;
        after.notes = Some("Para llevar".to_string());
        let result = diff(&before, &after);

        let json = serde_json::to_value(&result).expect("serialize");
        let back: OrderDiff = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, result);
    }

    fn order_like(template: &OrderSnapshot, items: Vec<OrderItemSnapshot>) -> OrderSnapshot {
        OrderSnapshot {
            items,
            ..template.clone()
        }
    }
}
