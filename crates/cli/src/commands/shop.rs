//! Catalog, cart, checkout and order commands.

use clap::Subcommand;
use rust_decimal::Decimal;

use souk_client::Souk;
use souk_client::checkout::{AddressForm, AddressSource, CheckoutStep, StartMode};
use souk_client::models::ProductFilters;
use souk_core::{OrderId, ProductId};

use super::CliError;
use super::auth::print_line;

#[derive(Subcommand)]
pub enum ProductsCommand {
    /// List products
    List {
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
        /// Category filter
        #[arg(short, long)]
        category: Option<i64>,
        /// Page number (0-based)
        #[arg(short, long, default_value_t = 0)]
        page: u32,
        /// Page size
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    /// Show one product
    Show {
        /// Product id
        id: i64,
    },
    /// List categories
    Categories,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product id
        id: i64,
        /// Quantity
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity
    Qty {
        /// Product id
        id: i64,
        /// New quantity
        quantity: u32,
    },
    /// Remove a line
    Rm {
        /// Product id
        id: i64,
    },
    /// Empty the cart
    Clear,
    /// Apply a promo code
    Promo {
        /// The code to apply
        code: String,
    },
    /// Remove the promo code
    Unpromo,
}

#[derive(Subcommand)]
pub enum CheckoutCommand {
    /// Create the order and obtain a payment intent
    Submit {
        /// Recipient full name
        #[arg(long)]
        name: String,
        /// Street address
        #[arg(long)]
        street: String,
        /// City
        #[arg(long)]
        city: String,
        /// Postal code (5 digits)
        #[arg(long)]
        postal: String,
        /// Country
        #[arg(long)]
        country: String,
        /// Phone number
        #[arg(long)]
        phone: String,
        /// Buy this product directly instead of checking out the cart
        #[arg(long)]
        direct: Option<i64>,
        /// Quantity for a direct buy
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Show the resumable in-flight payment, if any
    Status,
    /// Confirm after the payment widget reported success
    Confirm,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// List my orders
    List,
    /// Show one order
    Show {
        /// Order id
        id: i64,
    },
    /// Cancel an order
    Cancel {
        /// Order id
        id: i64,
    },
}

pub async fn run_products(souk: &Souk, action: ProductsCommand) -> Result<(), CliError> {
    match action {
        ProductsCommand::List {
            search,
            category,
            page,
            size,
        } => {
            let filters = ProductFilters {
                search,
                category_id: category.map(Into::into),
                page: Some(page),
                size: Some(size),
                ..ProductFilters::default()
            };
            let result = souk.catalog().products(&filters).await?;
            for product in &result.content {
                print_line(&format!(
                    "#{:<6} {:<40} {:>10}  stock {}",
                    product.id, product.name, product.price, product.stock_quantity
                ));
            }
            print_line(&format!(
                "page {}/{} ({} products)",
                result.number + 1,
                result.total_pages.max(1),
                result.total_elements
            ));
        }
        ProductsCommand::Show { id } => {
            let product = souk.catalog().product(ProductId::new(id)).await?;
            print_line(&format!("{} - {}", product.name, product.price));
            if let Some(category) = &product.category_name {
                print_line(&format!("category: {category}"));
            }
            print_line(&format!("stock: {}", product.stock_quantity));
            print_line(&product.description);
        }
        ProductsCommand::Categories => {
            for category in souk.catalog().categories().await? {
                print_line(&format!("#{:<4} {}", category.id, category.name));
            }
        }
    }
    Ok(())
}

pub async fn run_cart(souk: &Souk, action: CartCommand) -> Result<(), CliError> {
    match action {
        CartCommand::Show => {
            let cart = souk.cart().fetch().await?;
            for item in &cart.items {
                print_line(&format!(
                    "#{:<6} {:<40} {} x{} = {}",
                    item.product_id,
                    item.product_name,
                    item.price,
                    item.quantity,
                    item.line_total()
                ));
            }
            if let Some(promo) = &cart.promo_code {
                print_line(&format!(
                    "promo {} (-{})",
                    promo,
                    cart.discount.unwrap_or(Decimal::ZERO)
                ));
            }
            print_line(&format!(
                "subtotal {}  total {}",
                cart.subtotal, cart.total_amount
            ));
        }
        CartCommand::Add { id, quantity } => {
            let product = souk.catalog().product(ProductId::new(id)).await?;
            let cart = souk.cart().add_product(&product, quantity).await?;
            print_line(&format!("Added; cart now holds {} item(s)", cart.item_count()));
        }
        CartCommand::Qty { id, quantity } => {
            souk.cart()
                .update_quantity(ProductId::new(id), quantity)
                .await?;
            print_line("Quantity updated");
        }
        CartCommand::Rm { id } => {
            souk.cart().remove_item(ProductId::new(id)).await?;
            print_line("Item removed");
        }
        CartCommand::Clear => {
            souk.cart().clear().await?;
            print_line("Cart emptied");
        }
        CartCommand::Promo { code } => {
            let cart = souk.cart().apply_promo(&code).await?;
            print_line(&format!(
                "Promo applied (-{})",
                cart.discount.unwrap_or(Decimal::ZERO)
            ));
        }
        CartCommand::Unpromo => {
            souk.cart().remove_promo().await?;
            print_line("Promo removed");
        }
    }
    Ok(())
}

pub async fn run_checkout(souk: &Souk, action: CheckoutCommand) -> Result<(), CliError> {
    match action {
        CheckoutCommand::Submit {
            name,
            street,
            city,
            postal,
            country,
            phone,
            direct,
            quantity,
        } => {
            let mode = match direct {
                Some(id) => {
                    let product = souk.catalog().product(ProductId::new(id)).await?;
                    souk.cart().stage_direct_buy(&product, quantity);
                    StartMode::Direct
                }
                None => StartMode::Cart,
            };

            let mut flow = souk.checkout(mode).await?;
            if flow.step() == CheckoutStep::Payment {
                return Err(CliError::Usage(
                    "a payment is already in flight; run `souk checkout status` or `souk checkout confirm`"
                        .to_owned(),
                ));
            }
            if flow.step() == CheckoutStep::Cart {
                flow.proceed_to_shipping()?;
            }

            let form = AddressForm {
                full_name: name,
                street,
                city,
                postal_code: postal,
                country,
                phone_number: phone,
            };
            let order_id = flow.submit_order(&form, AddressSource::New).await?;

            print_line(&format!("Order #{order_id} created, payable {}", flow.total()));
            if let Some(secret) = flow.client_secret() {
                print_line(&format!("payment client secret: {secret}"));
            }
            print_line("Complete the payment in the hosted widget, then run `souk checkout confirm`.");
        }
        CheckoutCommand::Status => {
            let flow = souk.checkout(StartMode::Cart).await?;
            if flow.step() == CheckoutStep::Payment {
                print_line(&format!(
                    "Payment in flight for order #{} over {}",
                    flow.order_id().map_or_else(|| "?".to_owned(), |id| id.to_string()),
                    flow.pending_amount().unwrap_or(Decimal::ZERO)
                ));
            } else {
                print_line("No payment in flight");
            }
        }
        CheckoutCommand::Confirm => {
            let mut flow = souk.checkout(StartMode::Cart).await?;
            if flow.step() != CheckoutStep::Payment {
                return Err(CliError::Usage("no payment in flight to confirm".to_owned()));
            }
            let order_id = flow.on_payment_success().await?;
            print_line(&format!("Order #{order_id} confirmed"));
        }
    }
    Ok(())
}

pub async fn run_orders(souk: &Souk, action: OrdersCommand) -> Result<(), CliError> {
    match action {
        OrdersCommand::List => {
            for order in souk.orders().orders().await? {
                print_line(&format!(
                    "#{:<6} {:<16} {:<12} {}",
                    order.id,
                    order.order_number,
                    order.status.label(),
                    order.total_amount
                ));
            }
        }
        OrdersCommand::Show { id } => {
            let order = souk.orders().order(OrderId::new(id)).await?;
            print_line(&format!(
                "{} - {} - {}",
                order.order_number,
                order.status.label(),
                order.total_amount
            ));
            print_line(&format!("ship to: {}", order.shipping_address));
            for item in &order.items {
                print_line(&format!(
                    "  {} x{} @ {}",
                    item.product_name, item.quantity, item.price
                ));
            }
        }
        OrdersCommand::Cancel { id } => {
            let order = souk.orders().cancel(OrderId::new(id)).await?;
            print_line(&format!("Order {} is now {}", order.order_number, order.status.label()));
        }
    }
    Ok(())
}
