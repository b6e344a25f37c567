//! Renders history entries into a display model.
//!
//! This is the only place that decides what a reader sees: field names are
//! translated, values formatted by field semantics, long texts stacked, and
//! batch item updates narrowed to the fields staff care about.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::labels::{
    customization_action_label, enum_label, field_label, item_operation_label, operation_label,
    pizza_half_label,
};
use crate::domain::diff::{AdjustmentsDiff, FieldChanges, FieldValue, ItemDiff, OrderDiff};
use crate::domain::history::{
    BatchSubEntry, HistoryEntry, HistoryPayload, Operation, SnapshotSide,
};
use crate::domain::snapshot::{
    ModifierSnapshot, OrderItemSnapshot, OrderSnapshot, PizzaCustomizationSnapshot,
};

pub const DEFAULT_LONG_TEXT_THRESHOLD: usize = 50;

/// Item fields shown for item updates inside a batch. Pricing stays in the
/// stored diff but is left out of the narrative.
pub const BATCH_ITEM_FIELDS: &[&str] = &["quantity", "preparation_notes", "preparation_status"];

const CURRENCY_FIELDS: &[&str] = &[
    "subtotal",
    "total",
    "base_price",
    "final_price",
    "price",
    "amount",
];

const EMPTY_VALUE: &str = "(vacío)";

/// Shown for a batch item update whose changes all fall outside
/// `BATCH_ITEM_FIELDS`.
const OTHER_CHANGES_NOTE: &str = "Cambio de precio o variante";

#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub long_text_threshold: usize,
    pub utc_offset_minutes: i32,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            long_text_threshold: DEFAULT_LONG_TEXT_THRESHOLD,
            utc_offset_minutes: -360,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum DisplayChange {
    /// "before → after" on one line.
    Inline {
        field: String,
        label: String,
        before: String,
        after: String,
    },
    /// Before and then after as separate blocks, for long texts.
    Stacked {
        field: String,
        label: String,
        before: String,
        after: String,
    },
}

impl DisplayChange {
    pub fn field(&self) -> &str {
        match self {
            DisplayChange::Inline { field, .. } | DisplayChange::Stacked { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayField {
    pub field: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub descriptor: String,
    pub changes: Vec<DisplayChange>,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayEntry {
    pub id: i64,
    pub order_id: Uuid,
    pub sequence: i64,
    pub operation: Operation,
    pub title: String,
    pub changed_by: Option<Uuid>,
    pub changed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub summary: Vec<DisplayField>,
    pub changes: Vec<DisplayChange>,
    pub items: Vec<DisplayItem>,
}

pub fn format(entry: &HistoryEntry, options: &FormatOptions) -> DisplayEntry {
    let mut display = DisplayEntry {
        id: entry.id,
        order_id: entry.order_id,
        sequence: entry.sequence,
        operation: entry.operation,
        title: operation_label(entry.operation).to_string(),
        changed_by: entry.changed_by,
        changed_at: format_date(&entry.changed_at, options.utc_offset_minutes),
        note: None,
        summary: vec![],
        changes: vec![],
        items: vec![],
    };

    match &entry.payload {
        HistoryPayload::Snapshot { snapshot } => {
            display.summary = snapshot_summary(snapshot);
            display.items = snapshot.items.iter().map(snapshot_item).collect();
        }
        HistoryPayload::Diff { diff } => {
            display.changes = order_changes(diff, options);
            display.items = diff_items(diff, options);
        }
        HistoryPayload::Batch(batch) => {
            if let Some(summary) = &batch.summary {
                display.changes = order_changes(summary, options);
            }
            display.items = batch
                .operations
                .iter()
                .map(|op| batch_item(op, options))
                .collect();
        }
        HistoryPayload::Partial { side, snapshot } => {
            display.note = Some(
                match side {
                    SnapshotSide::Before => "Solo se conoce el estado previo al cambio",
                    SnapshotSide::After => "Solo se conoce el estado posterior al cambio",
                }
                .to_string(),
            );
            display.summary = snapshot_summary(snapshot);
            display.items = snapshot.items.iter().map(snapshot_item).collect();
        }
    }

    display
}

// ── Values ───────────────────────────────────────────────────────────────────

/// `$1,234.50`, rounded to cents.
pub fn format_currency(amount: &BigDecimal) -> String {
    let text = amount.round(2).with_scale(2).to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (integer, cents) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}.{}", sign, grouped, cents)
}

pub fn format_date(at: &DateTime<Utc>, utc_offset_minutes: i32) -> String {
    (at.naive_utc() + Duration::minutes(i64::from(utc_offset_minutes)))
        .format("%d/%m/%Y %H:%M")
        .to_string()
}

pub fn format_value(field: &str, value: &Option<FieldValue>) -> String {
    match value {
        None => EMPTY_VALUE.to_string(),
        Some(FieldValue::Text(text)) => enum_label(field, text)
            .map(str::to_string)
            .unwrap_or_else(|| text.clone()),
        Some(FieldValue::Integer(n)) => n.to_string(),
        Some(FieldValue::Decimal(d)) if CURRENCY_FIELDS.contains(&field) => format_currency(d),
        Some(FieldValue::Decimal(d)) => d.normalized().to_string(),
        Some(FieldValue::Number(n)) => format!("{:.6}", n),
        Some(FieldValue::Flag(true)) => "Sí".to_string(),
        Some(FieldValue::Flag(false)) => "No".to_string(),
    }
}

fn change(
    field: &str,
    label: String,
    before: &Option<FieldValue>,
    after: &Option<FieldValue>,
    options: &FormatOptions,
) -> DisplayChange {
    let before = format_value(field, before);
    let after = format_value(field, after);
    let field = field.to_string();
    let long = before.chars().count() > options.long_text_threshold
        || after.chars().count() > options.long_text_threshold;
    if long {
        DisplayChange::Stacked {
            field,
            label,
            before,
            after,
        }
    } else {
        DisplayChange::Inline {
            field,
            label,
            before,
            after,
        }
    }
}

fn field_changes(
    fields: &FieldChanges,
    label_prefix: Option<&str>,
    options: &FormatOptions,
) -> Vec<DisplayChange> {
    fields
        .iter()
        .map(|(field, c)| {
            let label = match label_prefix {
                Some(prefix) => format!("{}: {}", prefix, field_label(field)),
                None => field_label(field).to_string(),
            };
            change(field, label, &c.before, &c.after, options)
        })
        .collect()
}

// ── Order level ──────────────────────────────────────────────────────────────

fn order_changes(diff: &OrderDiff, options: &FormatOptions) -> Vec<DisplayChange> {
    let mut changes = field_changes(&diff.fields, None, options);
    changes.extend(field_changes(&diff.delivery_info, Some("Entrega"), options));
    changes.extend(adjustment_changes(&diff.adjustments, options));
    changes
}

fn adjustment_changes(adjustments: &AdjustmentsDiff, options: &FormatOptions) -> Vec<DisplayChange> {
    let mut changes = Vec::new();
    for added in &adjustments.added {
        changes.push(change(
            "amount",
            format!("Ajuste: {}", added.name),
            &None,
            &Some(FieldValue::Decimal(added.amount.clone())),
            options,
        ));
    }
    for modified in &adjustments.modified {
        let prefix = format!("Ajuste {}", modified.name);
        changes.extend(field_changes(&modified.fields, Some(&prefix), options));
    }
    for removed in &adjustments.removed {
        changes.push(change(
            "amount",
            format!("Ajuste: {}", removed.name),
            &Some(FieldValue::Decimal(removed.amount.clone())),
            &None,
            options,
        ));
    }
    changes
}

fn snapshot_summary(snapshot: &OrderSnapshot) -> Vec<DisplayField> {
    let mut fields = vec![
        summary_field("order_type", snapshot.order_type.as_str().to_string()),
        summary_field("order_status", snapshot.order_status.as_str().to_string()),
    ];
    if let Some(table) = &snapshot.table {
        fields.push(summary_field("table", table.label()));
    }
    if let Some(notes) = &snapshot.notes {
        fields.push(summary_field("notes", notes.clone()));
    }
    if let Some(delivery) = &snapshot.delivery_info {
        if let Some(address) = &delivery.full_address {
            fields.push(summary_field("full_address", address.clone()));
        }
    }
    fields.push(DisplayField {
        field: "total".to_string(),
        label: field_label("total").to_string(),
        value: format_currency(&snapshot.total),
    });
    fields
}

fn summary_field(field: &str, raw: String) -> DisplayField {
    DisplayField {
        field: field.to_string(),
        label: field_label(field).to_string(),
        value: format_value(field, &Some(FieldValue::Text(raw))),
    }
}

// ── Items ────────────────────────────────────────────────────────────────────

fn modifier_detail(modifier: &ModifierSnapshot) -> String {
    format!("{} ({})", modifier.name, format_currency(&modifier.price))
}

fn customization_detail(customization: &PizzaCustomizationSnapshot) -> String {
    format!(
        "{}: {} {}",
        pizza_half_label(customization.half),
        customization_action_label(customization.action),
        customization.name
    )
}

fn item_contents(item: &OrderItemSnapshot) -> Vec<String> {
    let mut details: Vec<String> = item
        .modifiers
        .iter()
        .map(|m| format!("+ {}", modifier_detail(m)))
        .collect();
    details.extend(item.pizza_customizations.iter().map(customization_detail));
    if let Some(notes) = &item.preparation_notes {
        details.push(format!("{}: {}", field_label("preparation_notes"), notes));
    }
    details
}

fn snapshot_item(item: &OrderItemSnapshot) -> DisplayItem {
    DisplayItem {
        operation: None,
        label: None,
        descriptor: format!("{} x {}", item.quantity, item.descriptor()),
        changes: vec![],
        details: item_contents(item),
    }
}

fn item_set_entry(operation: Operation, item: &OrderItemSnapshot) -> DisplayItem {
    DisplayItem {
        operation: Some(operation),
        label: Some(item_operation_label(operation).to_string()),
        ..snapshot_item(item)
    }
}

fn modified_item(
    item_diff: &ItemDiff,
    allowed: Option<&[&str]>,
    options: &FormatOptions,
) -> DisplayItem {
    let changes: Vec<DisplayChange> = field_changes(&item_diff.fields, None, options)
        .into_iter()
        .filter(|c| allowed.map_or(true, |fields| fields.contains(&c.field())))
        .collect();

    let modifiers = &item_diff.modifiers_diff;
    let customizations = &item_diff.customizations_diff;
    let mut details = Vec::new();
    details.extend(
        modifiers
            .added
            .iter()
            .map(|m| format!("Modificador agregado: {}", modifier_detail(m))),
    );
    details.extend(
        modifiers
            .removed
            .iter()
            .map(|m| format!("Modificador eliminado: {}", m.name)),
    );
    if allowed.is_none() {
        details.extend(modifiers.price_changed.iter().map(|p| {
            format!(
                "Precio de {}: {} → {}",
                p.name,
                format_currency(&p.before),
                format_currency(&p.after)
            )
        }));
    }
    details.extend(
        customizations
            .added
            .iter()
            .map(|c| format!("Personalización agregada: {}", customization_detail(c))),
    );
    details.extend(
        customizations
            .removed
            .iter()
            .map(|c| format!("Personalización eliminada: {}", customization_detail(c))),
    );
    if changes.is_empty() && details.is_empty() {
        details.push(OTHER_CHANGES_NOTE.to_string());
    }

    DisplayItem {
        operation: Some(Operation::Update),
        label: Some(item_operation_label(Operation::Update).to_string()),
        descriptor: item_diff.descriptor.clone(),
        changes,
        details,
    }
}

fn diff_items(diff: &OrderDiff, options: &FormatOptions) -> Vec<DisplayItem> {
    let items = &diff.items;
    let mut display: Vec<DisplayItem> = items
        .added
        .iter()
        .map(|item| item_set_entry(Operation::Insert, item))
        .collect();
    display.extend(
        items
            .modified
            .iter()
            .map(|item_diff| modified_item(item_diff, None, options)),
    );
    display.extend(
        items
            .removed
            .iter()
            .map(|item| item_set_entry(Operation::Delete, item)),
    );
    display
}

fn batch_item(op: &BatchSubEntry, options: &FormatOptions) -> DisplayItem {
    match op {
        BatchSubEntry::Insert { item } => item_set_entry(Operation::Insert, item),
        BatchSubEntry::Update { item_diff } => {
            modified_item(item_diff, Some(BATCH_ITEM_FIELDS), options)
        }
        BatchSubEntry::Delete { item } => item_set_entry(Operation::Delete, item),
    }
}
