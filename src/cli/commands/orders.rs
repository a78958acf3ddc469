use clap::Subcommand;
use serde_json::json;

use crate::api::OrderQuery;
use crate::auth::AdminSection;
use crate::cli::context::CliContext;
use crate::cli::utils::{or_dash, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::models::{CrudPermission, Order, OrderStatus};
use crate::shipment::ShipmentStage;

#[derive(Subcommand)]
pub enum OrderCommands {
    #[command(about = "List orders")]
    List {
        #[arg(long, help = "Only orders in this status, e.g. pending or out-for-delivery")]
        status: Option<OrderStatus>,
        #[arg(long, help = "Page number (1-based)")]
        page: Option<u32>,
        #[arg(long, help = "Orders per page")]
        limit: Option<u32>,
    },

    #[command(about = "Show one order with its shipment details")]
    Show {
        #[arg(help = "Order ID")]
        id: String,
    },

    #[command(about = "Change an order's status")]
    SetStatus {
        #[arg(help = "Order ID")]
        id: String,
        #[arg(help = "New status")]
        status: OrderStatus,
    },
}

pub async fn handle(
    cmd: OrderCommands,
    ctx: &CliContext,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        OrderCommands::List { status, page, limit } => {
            ctx.require(AdminSection::Orders, None).await?;

            let result = ctx.orders.list(&OrderQuery { page, limit, status }).await?;
            if result.orders.is_empty() {
                return output_empty_collection(&output_format, "orders", "No orders found");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{:<26} {:<14} {:<18} {:<14} {:>10}",
                        "ID", "NUMBER", "STATUS", "SHIPMENT", "TOTAL"
                    );
                    for order in &result.orders {
                        print_row(order);
                    }
                    if let Some(p) = &result.pagination {
                        println!("\nPage {} of {} ({} orders)", p.page, p.total_pages, p.total);
                    }
                }
            }
            Ok(())
        }
        OrderCommands::Show { id } => {
            ctx.require(AdminSection::Orders, None).await?;
            let order = ctx.orders.get(&id).await?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "order": order }))?);
                }
                OutputFormat::Text => print_detail(&order),
            }
            Ok(())
        }
        OrderCommands::SetStatus { id, status } => {
            ctx.require(AdminSection::Orders, Some(CrudPermission::Update)).await?;
            let order = ctx.orders.update_status(&id, status).await?;

            output_success(
                &output_format,
                &format!("Order {} is now {}", order.display_number(), order.status),
                Some(json!({ "order": order })),
            )
        }
    }
}

fn print_row(order: &Order) {
    let total = order
        .total_amount
        .map(|amount| amount.round_dp(2).to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<26} {:<14} {:<18} {:<14} {:>10}",
        order.id,
        or_dash(order.order_number.as_deref()),
        order.status,
        ShipmentStage::of(order),
        total
    );
}

fn print_detail(order: &Order) {
    println!("Order:    {} ({})", order.display_number(), order.id);
    println!("Status:   {}", order.status);
    if let Some(total) = order.total_amount {
        println!("Total:    {}", total.round_dp(2));
    }
    if let Some(created) = order.created_at {
        println!("Placed:   {}", created.format("%Y-%m-%d %H:%M"));
    }

    let courier = order
        .shipping_info
        .as_ref()
        .and_then(|info| info.selected_courier_name.as_deref());
    println!("Courier:  {}", or_dash(courier));

    let stage = ShipmentStage::of(order);
    println!("Shipment: {}", stage.describe());
    if let Some(shipment) = &order.shipment {
        println!("  AWB:      {}", or_dash(shipment.awb()));
        println!("  Carrier:  {}", or_dash(shipment.courier_name.as_deref()));
        if let Some(url) = shipment.tracking_url.as_deref() {
            println!("  Tracking: {}", url);
        }
    }
}
