use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::Order;
use crate::shipment::stage::{ordering_violations, processing_block, OrderBlock, ShipmentStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentAction {
    CreateShipment,
    GenerateAwb,
    SchedulePickup,
    DownloadLabel,
    DownloadManifest,
    MarkDelivered,
}

impl ShipmentAction {
    pub const ALL: [ShipmentAction; 6] = [
        ShipmentAction::CreateShipment,
        ShipmentAction::GenerateAwb,
        ShipmentAction::SchedulePickup,
        ShipmentAction::DownloadLabel,
        ShipmentAction::DownloadManifest,
        ShipmentAction::MarkDelivered,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ShipmentAction::CreateShipment => "Create shipment",
            ShipmentAction::GenerateAwb => "Generate AWB",
            ShipmentAction::SchedulePickup => "Schedule pickup",
            ShipmentAction::DownloadLabel => "Download label",
            ShipmentAction::DownloadManifest => "Download manifest",
            ShipmentAction::MarkDelivered => "Mark delivered",
        }
    }
}

impl fmt::Display for ShipmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShipmentAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "create" | "create_shipment" => Ok(ShipmentAction::CreateShipment),
            "awb" | "generate_awb" => Ok(ShipmentAction::GenerateAwb),
            "pickup" | "schedule_pickup" => Ok(ShipmentAction::SchedulePickup),
            "label" | "download_label" => Ok(ShipmentAction::DownloadLabel),
            "manifest" | "download_manifest" => Ok(ShipmentAction::DownloadManifest),
            "deliver" | "mark_delivered" => Ok(ShipmentAction::MarkDelivered),
            _ => Err(format!("unknown shipment action '{}'", s)),
        }
    }
}

/// Why an action is not currently available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Blocked {
    #[error("{0}")]
    Order(OrderBlock),

    #[error("Shipment already created")]
    ShipmentAlreadyCreated,

    #[error("Create shipment first")]
    ShipmentNotCreated,

    #[error("AWB already generated")]
    AwbAlreadyGenerated,

    #[error("Generate AWB first")]
    AwbNotGenerated,

    #[error("No courier selected by customer")]
    NoCourierSelected,

    #[error("Pickup already completed")]
    AlreadyPickedUp,

    #[error("Schedule pickup first")]
    NotPickedUp,

    #[error("Order already delivered")]
    AlreadyDelivered,
}

fn require_processable(order: &Order) -> Result<(), Blocked> {
    match processing_block(order) {
        Some(block) => Err(Blocked::Order(block)),
        None => Ok(()),
    }
}

/// Whether `action` may run now against `order`.
///
/// Label and manifest downloads only need an AWB and stay available on
/// cancelled orders; every other action first requires a processable order.
pub fn eligibility(order: &Order, action: ShipmentAction) -> Result<(), Blocked> {
    let stage = ShipmentStage::of(order);

    match action {
        ShipmentAction::CreateShipment => {
            require_processable(order)?;
            match stage {
                ShipmentStage::NotCreated => Ok(()),
                _ => Err(Blocked::ShipmentAlreadyCreated),
            }
        }
        ShipmentAction::GenerateAwb => {
            require_processable(order)?;
            match stage {
                ShipmentStage::NotCreated => Err(Blocked::ShipmentNotCreated),
                ShipmentStage::Created if order.selected_courier().is_none() => {
                    Err(Blocked::NoCourierSelected)
                }
                ShipmentStage::Created => Ok(()),
                _ => Err(Blocked::AwbAlreadyGenerated),
            }
        }
        ShipmentAction::SchedulePickup => {
            require_processable(order)?;
            match stage {
                ShipmentStage::NotCreated => Err(Blocked::ShipmentNotCreated),
                ShipmentStage::Created => Err(Blocked::AwbNotGenerated),
                ShipmentStage::AwbGenerated => Ok(()),
                ShipmentStage::Shipped => Err(Blocked::AlreadyPickedUp),
                ShipmentStage::Delivered => Err(Blocked::AlreadyDelivered),
            }
        }
        ShipmentAction::DownloadLabel | ShipmentAction::DownloadManifest => match stage {
            ShipmentStage::NotCreated => Err(Blocked::ShipmentNotCreated),
            ShipmentStage::Created => Err(Blocked::AwbNotGenerated),
            _ => Ok(()),
        },
        ShipmentAction::MarkDelivered => {
            require_processable(order)?;
            match stage {
                ShipmentStage::NotCreated => Err(Blocked::ShipmentNotCreated),
                ShipmentStage::Created => Err(Blocked::AwbNotGenerated),
                ShipmentStage::AwbGenerated => Err(Blocked::NotPickedUp),
                ShipmentStage::Shipped => Ok(()),
                ShipmentStage::Delivered => Err(Blocked::AlreadyDelivered),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionState {
    pub action: ShipmentAction,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Everything a view needs to render the shipment panel for one order
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentWorkflow {
    pub order_id: String,
    pub stage: ShipmentStage,
    pub can_process: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    pub actions: Vec<ActionState>,
}

impl ShipmentWorkflow {
    pub fn for_order(order: &Order) -> Self {
        if let Some(shipment) = &order.shipment {
            for violation in ordering_violations(shipment) {
                tracing::warn!(
                    order_id = %order.id,
                    "Inconsistent shipment markers: {}",
                    violation
                );
            }
        }

        let block = processing_block(order);
        let actions = ShipmentAction::ALL
            .iter()
            .map(|&action| {
                let result = eligibility(order, action);
                ActionState {
                    action,
                    eligible: result.is_ok(),
                    reason: result.err().map(|blocked| blocked.to_string()),
                }
            })
            .collect();

        Self {
            order_id: order.id.clone(),
            stage: ShipmentStage::of(order),
            can_process: block.is_none(),
            blocked_reason: block.map(|b| b.message().to_string()),
            actions,
        }
    }

    pub fn eligible_actions(&self) -> Vec<ShipmentAction> {
        self.actions
            .iter()
            .filter(|state| state.eligible)
            .map(|state| state.action)
            .collect()
    }
}
