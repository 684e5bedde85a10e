//! Back-office commands (admin role required).

use clap::Subcommand;

use souk_client::Souk;
use souk_core::{OrderId, OrderStatus};

use super::CliError;
use super::auth::print_line;

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Dashboard counters
    Stats,
    /// List all orders on the platform
    Orders,
    /// Most recent orders
    Recent,
    /// Change an order's status
    Status {
        /// Order id
        id: i64,
        /// New status (pending, confirmed, processing, shipped, delivered, cancelled)
        status: String,
    },
    /// Monthly revenue series
    Revenue,
    /// Best-selling products
    Top,
}

pub async fn run(souk: &Souk, action: AdminCommand) -> Result<(), CliError> {
    match action {
        AdminCommand::Stats => {
            let stats = souk.orders().stats().await?;
            print_line(&format!(
                "orders {} (pending {}, shipped {}, delivered {})",
                stats.total_orders, stats.pending_orders, stats.shipped_orders, stats.delivered_orders
            ));
            print_line(&format!(
                "revenue {} (this month {})",
                stats.total_revenue, stats.revenue_this_month
            ));
            print_line(&format!(
                "products {}  users {} (+{} this month)",
                stats.total_products, stats.total_users, stats.new_users_this_month
            ));
        }
        AdminCommand::Orders => {
            for order in souk.orders().all_orders().await? {
                print_line(&format!(
                    "#{:<6} {:<16} {:<12} {:>10}  {}",
                    order.id,
                    order.order_number,
                    order.status.label(),
                    order.total_amount,
                    order.client_email.as_deref().unwrap_or("-")
                ));
            }
        }
        AdminCommand::Recent => {
            for order in souk.orders().recent_orders().await? {
                print_line(&format!(
                    "#{:<6} {:<16} {}",
                    order.id,
                    order.order_number,
                    order.status.label()
                ));
            }
        }
        AdminCommand::Status { id, status } => {
            let status = parse_status(&status)?;
            let order = souk.orders().update_status(OrderId::new(id), status).await?;
            print_line(&format!(
                "Order {} is now {}",
                order.order_number,
                order.status.label()
            ));
        }
        AdminCommand::Revenue => {
            for month in souk.orders().revenue().await? {
                print_line(&format!("{}-{:02}: {}", month.year, month.month, month.revenue));
            }
        }
        AdminCommand::Top => {
            for product in souk.orders().top_products().await? {
                print_line(&format!("{:<40} sold {}", product.product_name, product.total_sold));
            }
        }
    }
    Ok(())
}

fn parse_status(raw: &str) -> Result<OrderStatus, CliError> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(OrderStatus::Pending),
        "confirmed" => Ok(OrderStatus::Confirmed),
        "processing" => Ok(OrderStatus::Processing),
        "shipped" => Ok(OrderStatus::Shipped),
        "delivered" => Ok(OrderStatus::Delivered),
        "cancelled" => Ok(OrderStatus::Cancelled),
        other => Err(CliError::Usage(format!("unknown order status: {other}"))),
    }
}
