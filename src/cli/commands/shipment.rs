use clap::Subcommand;
use serde_json::{json, Value};

use crate::auth::AdminSection;
use crate::cli::context::CliContext;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::models::CrudPermission;
use crate::shipment::{ShipmentAction, ShipmentWorkflow};

#[derive(Subcommand)]
pub enum ShipmentCommands {
    #[command(about = "Show the shipment stage and which actions are available")]
    Status {
        #[arg(help = "Order ID")]
        order: String,
    },

    #[command(about = "Create the carrier shipment")]
    Create {
        #[arg(help = "Order ID")]
        order: String,
    },

    #[command(about = "Generate the AWB with the customer's selected courier")]
    Awb {
        #[arg(help = "Order ID")]
        order: String,
    },

    #[command(about = "Schedule carrier pickup")]
    Pickup {
        #[arg(help = "Order ID")]
        order: String,
    },

    #[command(about = "Generate the shipping label")]
    Label {
        #[arg(help = "Order ID")]
        order: String,
    },

    #[command(about = "Generate the pickup manifest")]
    Manifest {
        #[arg(help = "Order ID")]
        order: String,
    },

    #[command(about = "Mark the shipment delivered")]
    Deliver {
        #[arg(help = "Order ID")]
        order: String,
    },

    #[command(about = "Fetch carrier tracking events")]
    Track {
        #[arg(help = "Order ID")]
        order: String,
    },
}

pub async fn handle(
    cmd: ShipmentCommands,
    ctx: &CliContext,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let (order_id, action) = match cmd {
        ShipmentCommands::Status { order } => return show_status(ctx, &order, output_format).await,
        ShipmentCommands::Track { order } => return track(ctx, &order, output_format).await,
        ShipmentCommands::Create { order } => (order, ShipmentAction::CreateShipment),
        ShipmentCommands::Awb { order } => (order, ShipmentAction::GenerateAwb),
        ShipmentCommands::Pickup { order } => (order, ShipmentAction::SchedulePickup),
        ShipmentCommands::Label { order } => (order, ShipmentAction::DownloadLabel),
        ShipmentCommands::Manifest { order } => (order, ShipmentAction::DownloadManifest),
        ShipmentCommands::Deliver { order } => (order, ShipmentAction::MarkDelivered),
    };

    let permission = match action {
        ShipmentAction::DownloadLabel | ShipmentAction::DownloadManifest => CrudPermission::Read,
        _ => CrudPermission::Update,
    };
    ctx.require(AdminSection::Shipments, Some(permission)).await?;

    let order = ctx.orders.get(&order_id).await?;
    let data = ctx.shipments.perform(&order, action).await?;

    let mut message = format!("{} done for order {}", action, order.display_number());
    if let Some(url) = document_url(action, &data) {
        message.push_str(&format!(": {}", url));
    }
    output_success(
        &output_format,
        &message,
        Some(json!({ "orderId": order.id, "action": action, "data": data })),
    )
}

async fn show_status(
    ctx: &CliContext,
    order_id: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    ctx.require(AdminSection::Shipments, None).await?;
    let order = ctx.orders.get(order_id).await?;
    let workflow = ShipmentWorkflow::for_order(&order);

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "workflow": workflow }))?);
        }
        OutputFormat::Text => {
            println!("Order {} ({})", order.display_number(), order.status);
            println!("Stage: {}", workflow.stage.describe());
            if let Some(reason) = &workflow.blocked_reason {
                println!("Blocked: {}", reason);
            }
            println!();
            for state in &workflow.actions {
                match &state.reason {
                    None => println!("  [x] {}", state.action),
                    Some(reason) => println!("  [ ] {:<18} {}", state.action.to_string(), reason),
                }
            }
        }
    }
    Ok(())
}

async fn track(
    ctx: &CliContext,
    order_id: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    ctx.require(AdminSection::Shipments, None).await?;
    let tracking = ctx.shipments.track(order_id).await?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "tracking": tracking }))?);
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(&tracking)?);
        }
    }
    Ok(())
}

fn document_url(action: ShipmentAction, data: &Value) -> Option<&str> {
    let key = match action {
        ShipmentAction::DownloadLabel => "labelUrl",
        ShipmentAction::DownloadManifest => "manifestUrl",
        _ => return None,
    };
    data.get(key).and_then(Value::as_str)
}
