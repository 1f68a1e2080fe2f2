//! Status enums for orders and payments.
//!
//! Both enums travel as SCREAMING_SNAKE_CASE strings on the wire and in the
//! database (TEXT columns), matching the values the original platform emits.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unrecognized status name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Order lifecycle status.
///
/// `Imported` is the sole initial state, assigned by the order-create webhook
/// handler. The webhook pipeline performs `Imported -> Paid`; every other
/// transition is admin-driven and intentionally unconstrained beyond name
/// validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    #[default]
    Imported,
    Paid,
    Picked,
    Shipped,
    Delivered,
    Returned,
    Cancelled,
}

impl OrderStatus {
    /// The canonical wire name for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Imported => "IMPORTED",
            Self::Paid => "PAID",
            Self::Picked => "PICKED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Returned => "RETURNED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IMPORTED" => Ok(Self::Imported),
            "PAID" => Ok(Self::Paid),
            "PICKED" => Ok(Self::Picked),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "RETURNED" => Ok(Self::Returned),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl ::core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// The canonical wire name for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl ::core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse_known_names() {
        assert_eq!("IMPORTED".parse::<OrderStatus>(), Ok(OrderStatus::Imported));
        assert_eq!("PAID".parse::<OrderStatus>(), Ok(OrderStatus::Paid));
        assert_eq!("CANCELLED".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
    }

    #[test]
    fn test_order_status_parse_rejects_unknown() {
        let err = "SHINY".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("SHINY".to_string()));
    }

    #[test]
    fn test_order_status_parse_is_case_sensitive() {
        assert!("imported".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_round_trip() {
        for status in [
            OrderStatus::Imported,
            OrderStatus::Paid,
            OrderStatus::Picked,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Returned,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_serde_wire_form() {
        let json = serde_json::to_string(&OrderStatus::Imported).expect("serialize");
        assert_eq!(json, "\"IMPORTED\"");
        let json = serde_json::to_string(&PaymentStatus::Paid).expect("serialize");
        assert_eq!(json, "\"PAID\"");
    }
}
