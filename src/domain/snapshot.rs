//! Immutable, fully expanded value representation of an order aggregate.
//!
//! A snapshot holds no reference back into storage: it is read once by the
//! snapshot loader, compared by the diff engine and then either dropped or
//! embedded in a history entry.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::errors::CaptureError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code `{code}`")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

impl From<UnknownCode> for CaptureError {
    fn from(e: UnknownCode) -> Self {
        CaptureError::MalformedSnapshot(e.to_string())
    }
}

/// Declares an enum stored as a fixed upper-case code in the database and in
/// serialized payloads.
macro_rules! code_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err(UnknownCode {
                        kind: stringify!($name),
                        code: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

code_enum!(OrderType {
    DineIn => "DINE_IN",
    TakeAway => "TAKE_AWAY",
    Delivery => "DELIVERY",
});

code_enum!(OrderStatus {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    InPreparation => "IN_PREPARATION",
    Ready => "READY",
    InDelivery => "IN_DELIVERY",
    Delivered => "DELIVERED",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

code_enum!(PreparationStatus {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    Ready => "READY",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

code_enum!(
    /// Which part of a pizza a customization applies to.
    PizzaHalf {
        Full => "FULL",
        Half1 => "HALF_1",
        Half2 => "HALF_2",
    }
);

code_enum!(CustomizationAction {
    Add => "ADD",
    Remove => "REMOVE",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub id: Uuid,
    pub name: String,
    pub area: Option<String>,
}

impl TableRef {
    /// "Area - Table" when the table belongs to an area, the bare name otherwise.
    pub fn label(&self) -> String {
        match &self.area {
            Some(area) => format!("{} - {}", area, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInfoSnapshot {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PizzaCustomizationSnapshot {
    pub customization_id: Uuid,
    pub name: String,
    pub half: PizzaHalf,
    pub action: CustomizationAction,
}

impl PizzaCustomizationSnapshot {
    /// Identity of a customization. There is nothing finer than this tuple.
    pub fn key(&self) -> (Uuid, PizzaHalf, CustomizationAction) {
        (self.customization_id, self.half, self.action)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub variant_id: Option<Uuid>,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub base_price: BigDecimal,
    pub final_price: BigDecimal,
    pub preparation_status: PreparationStatus,
    pub preparation_notes: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<ModifierSnapshot>,
    #[serde(default)]
    pub pizza_customizations: Vec<PizzaCustomizationSnapshot>,
}

impl OrderItemSnapshot {
    /// Human readable "product (variant)" descriptor.
    pub fn descriptor(&self) -> String {
        match &self.variant_name {
            Some(variant) => format!("{} ({})", self.product_name, variant),
            None => self.product_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentSnapshot {
    pub id: Uuid,
    pub name: String,
    pub is_percentage: bool,
    pub value: BigDecimal,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: Uuid,
    pub order_type: OrderType,
    pub order_status: OrderStatus,
    pub notes: Option<String>,
    pub table: Option<TableRef>,
    pub delivery_info: Option<DeliveryInfoSnapshot>,
    pub subtotal: BigDecimal,
    pub total: BigDecimal,
    #[serde(default)]
    pub items: Vec<OrderItemSnapshot>,
    #[serde(default)]
    pub adjustments: Vec<AdjustmentSnapshot>,
}

impl OrderSnapshot {
    /// Rejects shapes the diff engine cannot compare unambiguously.
    pub fn validate(&self) -> Result<(), CaptureError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(CaptureError::MalformedSnapshot(format!(
                    "order {} lists item {} more than once",
                    self.id, item.id
                )));
            }
        }
        let mut seen = HashSet::new();
        for adjustment in &self.adjustments {
            if !seen.insert(adjustment.id) {
                return Err(CaptureError::MalformedSnapshot(format!(
                    "order {} lists adjustment {} more than once",
                    self.id, adjustment.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_from_str() {
        assert_eq!("HALF_1".parse::<PizzaHalf>(), Ok(PizzaHalf::Half1));
        assert_eq!(OrderStatus::InPreparation.as_str(), "IN_PREPARATION");
        assert_eq!(
            "IN_PREPARATION".parse::<OrderStatus>(),
            Ok(OrderStatus::InPreparation)
        );
    }

    #[test]
    fn unknown_code_maps_to_malformed_snapshot() {
        let err = "SOMEWHERE".parse::<OrderType>().unwrap_err();
        assert_eq!(err.kind, "OrderType");
        let capture: CaptureError = err.into();
        assert!(matches!(capture, CaptureError::MalformedSnapshot(_)));
    }

    #[test]
    fn enums_serialize_as_codes() {
        let json = serde_json::to_string(&PizzaHalf::Half2).expect("serialize");
        assert_eq!(json, "\"HALF_2\"");
    }

    #[test]
    fn table_label_includes_area_when_known() {
        let table = TableRef {
            id: Uuid::new_v4(),
            name: "Mesa 4".to_string(),
            area: Some("Terraza".to_string()),
        };
        assert_eq!(table.label(), "Terraza - Mesa 4");
    }

    #[test]
    fn validate_rejects_duplicate_item_ids() {
        let id = Uuid::new_v4();
        let item = OrderItemSnapshot {
            id,
            product_id: Uuid::new_v4(),
            product_name: "Pizza".to_string(),
            variant_id: None,
            variant_name: None,
            quantity: 1,
            base_price: BigDecimal::from(100),
            final_price: BigDecimal::from(100),
            preparation_status: PreparationStatus::Pending,
            preparation_notes: None,
            modifiers: vec![],
            pizza_customizations: vec![],
        };
        let snapshot = OrderSnapshot {
            id: Uuid::new_v4(),
            order_type: OrderType::DineIn,
            order_status: OrderStatus::Pending,
            notes: None,
            table: None,
            delivery_info: None,
            subtotal: BigDecimal::from(200),
            total: BigDecimal::from(200),
            items: vec![item.clone(), item],
            adjustments: vec![],
        };
        assert!(matches!(
            snapshot.validate(),
            Err(CaptureError::MalformedSnapshot(_))
        ));
    }
}
