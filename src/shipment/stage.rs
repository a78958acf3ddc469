use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Order, OrderStatus, Shipment};

/// Fulfilment stage, ordered from least to most advanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStage {
    NotCreated,
    Created,
    AwbGenerated,
    Shipped,
    Delivered,
}

impl ShipmentStage {
    /// Most advanced marker wins, even if earlier ones are missing
    pub fn of(order: &Order) -> Self {
        match &order.shipment {
            None => ShipmentStage::NotCreated,
            Some(shipment) => Self::of_shipment(shipment),
        }
    }

    pub fn of_shipment(shipment: &Shipment) -> Self {
        if shipment.is_delivered() {
            ShipmentStage::Delivered
        } else if shipment.is_shipped() {
            ShipmentStage::Shipped
        } else if shipment.has_awb() {
            ShipmentStage::AwbGenerated
        } else {
            ShipmentStage::Created
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStage::NotCreated => "NOT_CREATED",
            ShipmentStage::Created => "CREATED",
            ShipmentStage::AwbGenerated => "AWB_GENERATED",
            ShipmentStage::Shipped => "SHIPPED",
            ShipmentStage::Delivered => "DELIVERED",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ShipmentStage::NotCreated => "Shipment not created",
            ShipmentStage::Created => "Shipment created, awaiting AWB",
            ShipmentStage::AwbGenerated => "AWB generated, awaiting pickup",
            ShipmentStage::Shipped => "Picked up, in transit",
            ShipmentStage::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for ShipmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status that rules out any further carrier processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderBlock(pub OrderStatus);

impl OrderBlock {
    pub fn message(&self) -> &'static str {
        match self.0 {
            OrderStatus::Cancelled => "Order has been cancelled",
            OrderStatus::Refunded => "Order has been refunded",
            OrderStatus::Failed => "Order has failed",
            OrderStatus::Returned => "Order has been returned",
            _ => "Order cannot be processed",
        }
    }
}

impl fmt::Display for OrderBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub fn processing_block(order: &Order) -> Option<OrderBlock> {
    match order.status {
        OrderStatus::Cancelled
        | OrderStatus::Refunded
        | OrderStatus::Failed
        | OrderStatus::Returned => Some(OrderBlock(order.status)),
        _ => None,
    }
}

pub fn can_process_shipment(order: &Order) -> bool {
    processing_block(order).is_none()
}

/// A completion marker present without one of its predecessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderingViolation {
    pub present: &'static str,
    pub missing: &'static str,
}

impl fmt::Display for OrderingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is set but {} is missing", self.present, self.missing)
    }
}

pub fn ordering_violations(shipment: &Shipment) -> Vec<OrderingViolation> {
    let mut violations = Vec::new();

    if shipment.is_delivered() && !shipment.is_shipped() {
        violations.push(OrderingViolation {
            present: "deliveredAt",
            missing: "shippedAt",
        });
    }
    if (shipment.is_delivered() || shipment.is_shipped()) && !shipment.has_awb() {
        violations.push(OrderingViolation {
            present: if shipment.is_shipped() { "shippedAt" } else { "deliveredAt" },
            missing: "awbCode",
        });
    }

    violations
}
