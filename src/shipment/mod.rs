//! Fulfilment workflow derived from order and shipment markers.
//!
//! Nothing here performs I/O: callers hand in the order record as returned
//! by the API and get back the current stage and which carrier actions are
//! valid, each blocked action carrying its own reason.

pub mod actions;
pub mod stage;

pub use actions::{eligibility, Blocked, ShipmentAction, ShipmentWorkflow};
pub use stage::{
    can_process_shipment, ordering_violations, processing_block, OrderBlock, OrderingViolation,
    ShipmentStage,
};
