//! Snapshot builders shared by unit tests.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::snapshot::{
    CustomizationAction, ModifierSnapshot, OrderItemSnapshot, OrderSnapshot, OrderStatus,
    OrderType, PizzaCustomizationSnapshot, PizzaHalf, PreparationStatus,
};

pub fn money(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).expect("valid decimal")
}

pub fn item(product: &str, quantity: i32) -> OrderItemSnapshot {
    OrderItemSnapshot {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        product_name: product.to_string(),
        variant_id: None,
        variant_name: None,
        quantity,
        base_price: money("120.00"),
        final_price: money("120.00"),
        preparation_status: PreparationStatus::Pending,
        preparation_notes: None,
        modifiers: vec![],
        pizza_customizations: vec![],
    }
}

pub fn modifier(name: &str, price: &str) -> ModifierSnapshot {
    ModifierSnapshot {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price: money(price),
    }
}

pub fn customization(
    name: &str,
    half: PizzaHalf,
    action: CustomizationAction,
) -> PizzaCustomizationSnapshot {
    PizzaCustomizationSnapshot {
        customization_id: Uuid::new_v4(),
        name: name.to_string(),
        half,
        action,
    }
}

pub fn order(items: Vec<OrderItemSnapshot>) -> OrderSnapshot {
    OrderSnapshot {
        id: Uuid::new_v4(),
        order_type: OrderType::DineIn,
        order_status: OrderStatus::Pending,
        notes: None,
        table: None,
        delivery_info: None,
        subtotal: money("240.00"),
        total: money("240.00"),
        items,
        adjustments: vec![],
    }
}
