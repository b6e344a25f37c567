//! es-MX display labels.

use crate::domain::history::Operation;
use crate::domain::snapshot::{
    CustomizationAction, OrderStatus, OrderType, PizzaHalf, PreparationStatus,
};

const FIELD_LABELS: &[(&str, &str)] = &[
    // order header
    ("order_type", "Tipo de orden"),
    ("order_status", "Estado de la orden"),
    ("notes", "Notas"),
    ("table", "Mesa"),
    ("subtotal", "Subtotal"),
    ("total", "Total"),
    // delivery
    ("recipient_name", "Nombre del destinatario"),
    ("recipient_phone", "Teléfono del destinatario"),
    ("full_address", "Dirección completa"),
    ("delivery_instructions", "Instrucciones de entrega"),
    ("street", "Calle"),
    ("number", "Número"),
    ("interior_number", "Número interior"),
    ("neighborhood", "Colonia"),
    ("city", "Ciudad"),
    ("state", "Estado"),
    ("zip_code", "Código postal"),
    ("reference", "Referencia"),
    ("latitude", "Latitud"),
    ("longitude", "Longitud"),
    // items
    ("quantity", "Cantidad"),
    ("variant", "Variante"),
    ("preparation_status", "Estado de preparación"),
    ("preparation_notes", "Notas de preparación"),
    ("base_price", "Precio base"),
    ("final_price", "Precio final"),
    // adjustments
    ("name", "Nombre"),
    ("is_percentage", "Es porcentaje"),
    ("value", "Valor"),
    ("amount", "Monto"),
    ("price", "Precio"),
];

/// Translated field name; unknown fields keep their raw name.
pub fn field_label(field: &str) -> &str {
    FIELD_LABELS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, label)| *label)
        .unwrap_or(field)
}

pub fn operation_label(operation: Operation) -> &'static str {
    match operation {
        Operation::Insert => "Orden creada",
        Operation::Update => "Orden actualizada",
        Operation::Delete => "Orden eliminada",
        Operation::Batch => "Cambios múltiples en la orden",
    }
}

pub fn item_operation_label(operation: Operation) -> &'static str {
    match operation {
        Operation::Insert => "Producto agregado",
        Operation::Delete => "Producto eliminado",
        Operation::Update | Operation::Batch => "Producto modificado",
    }
}

fn order_type_label(value: OrderType) -> &'static str {
    match value {
        OrderType::DineIn => "Para comer aquí",
        OrderType::TakeAway => "Para llevar",
        OrderType::Delivery => "A domicilio",
    }
}

fn order_status_label(value: OrderStatus) -> &'static str {
    match value {
        OrderStatus::Pending => "Pendiente",
        OrderStatus::InProgress => "En proceso",
        OrderStatus::InPreparation => "En preparación",
        OrderStatus::Ready => "Lista",
        OrderStatus::InDelivery => "En reparto",
        OrderStatus::Delivered => "Entregada",
        OrderStatus::Completed => "Completada",
        OrderStatus::Cancelled => "Cancelada",
    }
}

fn preparation_status_label(value: PreparationStatus) -> &'static str {
    match value {
        PreparationStatus::Pending => "Pendiente",
        PreparationStatus::InProgress => "En preparación",
        PreparationStatus::Ready => "Listo",
        PreparationStatus::Delivered => "Entregado",
        PreparationStatus::Cancelled => "Cancelado",
    }
}

pub fn pizza_half_label(value: PizzaHalf) -> &'static str {
    match value {
        PizzaHalf::Full => "Completa",
        PizzaHalf::Half1 => "Mitad 1",
        PizzaHalf::Half2 => "Mitad 2",
    }
}

pub fn customization_action_label(value: CustomizationAction) -> &'static str {
    match value {
        CustomizationAction::Add => "con",
        CustomizationAction::Remove => "sin",
    }
}

/// Label of an enum code for the fields that hold one.
pub fn enum_label(field: &str, code: &str) -> Option<&'static str> {
    match field {
        "order_type" => code.parse().ok().map(order_type_label),
        "order_status" => code.parse().ok().map(order_status_label),
        "preparation_status" => code.parse().ok().map(preparation_status_label),
        _ => None,
    }
}
