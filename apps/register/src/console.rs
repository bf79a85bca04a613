//! # Console Front End
//!
//! A line-oriented register: one command per line on stdin, results on
//! stdout, logs on stderr.
//!
//! ```text
//! stdin ──► parse_line() ──► Command ──► Console::execute() ──► commands::*
//!                                                │
//!                                                ▼
//!                                     text / JSON on stdout
//! ```
//!
//! Typical session:
//! ```text
//! > login amina secret1
//! > scan 6001234 2
//! > scan 6001240
//! > customer Juma
//! > pay cash 5,000
//! ```

use std::str::FromStr;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use duka_core::{Money, Role, ShopInfo, StockUpdate};

use crate::commands::product::SaveProductRequest;
use crate::commands::sale::{CheckoutRequest, CheckoutResponse};
use crate::commands::{cart, product, report, sale, user};
use crate::error::ApiError;
use crate::state::{AppState, CartView};

const HELP: &str = "\
Selling
  scan <barcode> [qty]             add to cart
  undo                             undo last scan
  qty <barcode> <qty>              set quantity of a cart line
  remove <barcode>                 drop a cart line
  cart | clear                     show or empty the cart
  customer [name]                  customer for the next sale
  pay <method> <amount> [ref]      check out (cash, mobile_money, card)
  quick <barcode> [qty]            sell one product immediately
  unquick <barcode>                undo the latest quick sale
Catalog
  find [text]                      search products
  product <barcode>                show one product
  add-product <barcode> <price> <qty> <category> <name...>
  del-product <barcode>
  image <barcode> [path]           set or clear product image
  stock <barcode> <+n|-n|=n> [price]
  lowstock | categories | add-category <name>
Reports
  history [n] | show <id> | reprint <id>
  dashboard | today | sales | activity [n]
  backup <path>
Accounts
  setup <user> <password>          create the first admin
  login <user> <password> [remember]
  logout | passwd <current> <new>
  adduser <user> <password> [admin|employee]
  users | deluser <id>
  shop | set-shop <name> | <tagline> | <address> | <contact>
Other
  help | quit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login {
        username: String,
        password: String,
        remember: bool,
    },
    Logout,
    Setup {
        username: String,
        password: String,
    },
    Scan {
        barcode: String,
        quantity: i64,
    },
    Undo,
    Quantity {
        barcode: String,
        quantity: i64,
    },
    Remove {
        barcode: String,
    },
    ShowCart,
    ClearCart,
    Customer(Option<String>),
    Pay {
        method: String,
        amount: String,
        reference: Option<String>,
    },
    QuickSell {
        barcode: String,
        quantity: i64,
    },
    UndoQuickSell {
        barcode: String,
    },
    Find(String),
    Product(String),
    AddProduct(SaveProductRequest),
    DeleteProduct(String),
    Image {
        barcode: String,
        path: Option<String>,
    },
    Stock {
        barcode: String,
        update: StockUpdate,
    },
    LowStock,
    Categories,
    AddCategory(String),
    History(Option<u32>),
    Show(i64),
    Reprint(i64),
    Dashboard,
    Today,
    Sales,
    Activity(Option<u32>),
    Backup(String),
    AddUser {
        username: String,
        password: String,
        role: Role,
    },
    Users,
    DeleteUser(i64),
    Passwd {
        current: String,
        new: String,
    },
    Shop,
    SetShop(ShopInfo),
    Help,
    Quit,
}

/// Parses one input line. Blank lines are an error the loop ignores.
pub fn parse_line(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.to_lowercase().as_str() {
        "" => return Err("empty line".to_string()),
        "login" => {
            let [username, password] = take_two(&args, "login <user> <password>")?;
            Command::Login {
                username,
                password,
                remember: args.get(2).is_some_and(|a| a.eq_ignore_ascii_case("remember")),
            }
        }
        "logout" => Command::Logout,
        "setup" => {
            let [username, password] = take_two(&args, "setup <user> <password>")?;
            Command::Setup { username, password }
        }
        "scan" => Command::Scan {
            barcode: first(&args, "scan <barcode> [qty]")?,
            quantity: quantity_at(&args, 1)?,
        },
        "undo" => Command::Undo,
        "qty" => {
            let barcode = first(&args, "qty <barcode> <qty>")?;
            if args.len() < 2 {
                return Err("usage: qty <barcode> <qty>".to_string());
            }
            Command::Quantity {
                barcode,
                quantity: quantity_at(&args, 1)?,
            }
        }
        "remove" => Command::Remove {
            barcode: first(&args, "remove <barcode>")?,
        },
        "cart" => Command::ShowCart,
        "clear" => Command::ClearCart,
        "customer" => Command::Customer((!rest.is_empty()).then(|| rest.to_string())),
        "pay" => {
            let [method, amount] = take_two(&args, "pay <method> <amount> [reference]")?;
            Command::Pay {
                method,
                amount,
                reference: args.get(2).map(|r| r.to_string()),
            }
        }
        "quick" => Command::QuickSell {
            barcode: first(&args, "quick <barcode> [qty]")?,
            quantity: quantity_at(&args, 1)?,
        },
        "unquick" => Command::UndoQuickSell {
            barcode: first(&args, "unquick <barcode>")?,
        },
        "find" | "search" => Command::Find(rest.to_string()),
        "product" => Command::Product(first(&args, "product <barcode>")?),
        "add-product" => parse_add_product(&args)?,
        "del-product" => Command::DeleteProduct(first(&args, "del-product <barcode>")?),
        "image" => Command::Image {
            barcode: first(&args, "image <barcode> [path]")?,
            path: args.get(1).map(|p| p.to_string()),
        },
        "stock" => parse_stock(&args)?,
        "lowstock" => Command::LowStock,
        "categories" => Command::Categories,
        "add-category" if !rest.is_empty() => Command::AddCategory(rest.to_string()),
        "add-category" => return Err("usage: add-category <name>".to_string()),
        "history" => Command::History(optional_number(&args, 0)?),
        "show" => Command::Show(id_at(&args, "show <id>")?),
        "reprint" => Command::Reprint(id_at(&args, "reprint <id>")?),
        "dashboard" => Command::Dashboard,
        "today" => Command::Today,
        "sales" => Command::Sales,
        "activity" => Command::Activity(optional_number(&args, 0)?),
        "backup" if !rest.is_empty() => Command::Backup(rest.to_string()),
        "backup" => return Err("usage: backup <path>".to_string()),
        "adduser" => {
            let [username, password] =
                take_two(&args, "adduser <user> <password> [admin|employee]")?;
            let role = match args.get(2) {
                Some(r) => Role::from_str(r).map_err(|e| e.to_string())?,
                None => Role::Employee,
            };
            Command::AddUser {
                username,
                password,
                role,
            }
        }
        "users" => Command::Users,
        "deluser" => Command::DeleteUser(id_at(&args, "deluser <id>")?),
        "passwd" => {
            let [current, new] = take_two(&args, "passwd <current> <new>")?;
            Command::Passwd { current, new }
        }
        "shop" => Command::Shop,
        "set-shop" => {
            let parts: Vec<String> = rest.split('|').map(|p| p.trim().to_string()).collect();
            match <[String; 4]>::try_from(parts) {
                Ok([shop_name, tagline, address, contact]) if !shop_name.is_empty() => {
                    Command::SetShop(ShopInfo {
                        shop_name,
                        tagline,
                        address,
                        contact,
                    })
                }
                _ => {
                    return Err(
                        "usage: set-shop <name> | <tagline> | <address> | <contact>".to_string()
                    )
                }
            }
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };

    Ok(command)
}

fn first(args: &[&str], usage: &str) -> Result<String, String> {
    args.first()
        .map(|a| a.to_string())
        .ok_or_else(|| format!("usage: {}", usage))
}

fn take_two(args: &[&str], usage: &str) -> Result<[String; 2], String> {
    match args {
        [a, b, ..] => Ok([a.to_string(), b.to_string()]),
        _ => Err(format!("usage: {}", usage)),
    }
}

fn quantity_at(args: &[&str], index: usize) -> Result<i64, String> {
    match args.get(index) {
        None => Ok(1),
        Some(raw) => raw
            .parse()
            .map_err(|_| format!("'{}' is not a quantity", raw)),
    }
}

fn optional_number(args: &[&str], index: usize) -> Result<Option<u32>, String> {
    args.get(index)
        .map(|raw| raw.parse().map_err(|_| format!("'{}' is not a number", raw)))
        .transpose()
}

fn id_at(args: &[&str], usage: &str) -> Result<i64, String> {
    let raw = first(args, usage)?;
    raw.parse().map_err(|_| format!("'{}' is not an id", raw))
}

fn parse_add_product(args: &[&str]) -> Result<Command, String> {
    const USAGE: &str = "usage: add-product <barcode> <price> <qty> <category> <name...>";
    let [barcode, price, quantity, category, name @ ..] = args else {
        return Err(USAGE.to_string());
    };
    if name.is_empty() {
        return Err(USAGE.to_string());
    }

    Ok(Command::AddProduct(SaveProductRequest {
        barcode: barcode.to_string(),
        name: name.join(" "),
        price: Money::parse(price).map_err(|e| e.to_string())?,
        quantity: quantity
            .parse()
            .map_err(|_| format!("'{}' is not a quantity", quantity))?,
        category: category.to_string(),
    }))
}

fn parse_stock(args: &[&str]) -> Result<Command, String> {
    const USAGE: &str = "usage: stock <barcode> <+n|-n|=n> [price]";
    let [barcode, amount, rest @ ..] = args else {
        return Err(USAGE.to_string());
    };

    let mut update = if let Some(absolute) = amount.strip_prefix('=') {
        StockUpdate {
            new_quantity: Some(absolute.parse().map_err(|_| USAGE.to_string())?),
            ..Default::default()
        }
    } else {
        StockUpdate::change(amount.parse().map_err(|_| USAGE.to_string())?)
    };

    if let Some(price) = rest.first() {
        update.new_price_cents = Some(Money::parse(price).map_err(|e| e.to_string())?.cents());
    }

    Ok(Command::Stock {
        barcode: barcode.to_string(),
        update,
    })
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

/// Holds per-terminal input that is not register state.
pub struct Console<'a> {
    app: &'a AppState,
    customer: Option<String>,
}

impl<'a> Console<'a> {
    pub fn new(app: &'a AppState) -> Self {
        Console {
            app,
            customer: None,
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<Flow, ApiError> {
        let app = self.app;
        let output = match command {
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Flow::Quit),

            Command::Login {
                username,
                password,
                remember,
            } => {
                let op = user::login(
                    &app.db,
                    &app.session,
                    &app.settings,
                    &username,
                    &password,
                    remember,
                )
                .await?;
                format!("Signed in as {} ({})", op.username, op.role)
            }
            Command::Logout => match user::logout(&app.session, &app.cart)? {
                Some(op) => format!("Goodbye, {}", op.username),
                None => "Nobody was signed in".to_string(),
            },
            Command::Setup { username, password } => {
                let admin = user::setup_admin(&app.db, &username, &password).await?;
                format!("Admin '{}' created. Sign in with: login {} <password>", admin.username, admin.username)
            }

            Command::Scan { barcode, quantity } => {
                let view = cart::scan_item(&app.db, &app.cart, &app.session, &barcode, quantity).await?;
                self.cart_table(&view)
            }
            Command::Undo => {
                let undone = cart::undo_last_item(&app.cart)?;
                format!(
                    "Removed {} x {}\n{}",
                    undone.undone.quantity,
                    undone.undone.barcode,
                    self.cart_table(&undone.cart)
                )
            }
            Command::Quantity { barcode, quantity } => {
                let view = cart::update_cart_quantity(&app.db, &app.cart, &barcode, quantity).await?;
                self.cart_table(&view)
            }
            Command::Remove { barcode } => self.cart_table(&cart::remove_from_cart(&app.cart, &barcode)?),
            Command::ShowCart => self.cart_table(&cart::get_cart(&app.cart)),
            Command::ClearCart => {
                self.customer = None;
                self.cart_table(&cart::clear_cart(&app.cart)?)
            }
            Command::Customer(name) => {
                self.customer = name;
                match &self.customer {
                    Some(name) => format!("Customer: {}", name),
                    None => "Customer: Walk-in".to_string(),
                }
            }
            Command::Pay {
                method,
                amount,
                reference,
            } => {
                let request = CheckoutRequest {
                    method,
                    amount_paid: amount,
                    reference,
                    customer_name: self.customer.clone(),
                };
                let response =
                    sale::checkout(&app.db, &app.cart, &app.session, &app.settings, request).await?;
                self.customer = None;
                self.sale_summary(&response).await
            }
            Command::QuickSell { barcode, quantity } => {
                let line = sale::quick_sell(&app.db, &app.session, &barcode, quantity).await?;
                format!(
                    "Sold {} x {} for {}",
                    line.quantity,
                    line.product_name,
                    app.settings.format_money(line.line_total())
                )
            }
            Command::UndoQuickSell { barcode } => {
                let line = sale::undo_quick_sale(&app.db, &app.session, &barcode).await?;
                format!("Reversed {} x {}", line.quantity, line.product_name)
            }

            Command::Find(query) => {
                let products = product::search_products(&app.db, &query, None).await?;
                self.product_table(&products)
            }
            Command::Product(barcode) => json(&product::get_product(&app.db, &barcode).await?)?,
            Command::AddProduct(request) => {
                let saved = product::save_product(&app.db, &app.session, request).await?;
                format!("Saved {} ({} in stock)", saved.name, saved.quantity)
            }
            Command::DeleteProduct(barcode) => {
                product::delete_product(&app.db, &app.session, &barcode).await?;
                format!("Deleted {}", barcode)
            }
            Command::Image { barcode, path } => {
                product::set_product_image(&app.db, &app.session, &barcode, path.as_deref()).await?;
                "Image updated".to_string()
            }
            Command::Stock { barcode, update } => {
                let p = product::adjust_stock(&app.db, &app.session, &barcode, update).await?;
                format!("{}: {} in stock at {}", p.name, p.quantity, app.settings.format_money(p.price()))
            }
            Command::LowStock => {
                self.product_table(&product::low_stock_products(&app.db, &app.settings).await?)
            }
            Command::Categories => product::list_categories(&app.db).await?.join("\n"),
            Command::AddCategory(name) => {
                if product::add_category(&app.db, &app.session, &name).await? {
                    format!("Added category {}", name)
                } else {
                    format!("Category {} already exists", name)
                }
            }

            Command::History(limit) => {
                let rows = sale::transaction_history(&app.db, limit).await?;
                let settings = &app.settings;
                rows.iter()
                    .map(|t| {
                        format!(
                            "#{:<6} {}  {:<12} {:>16}  {}",
                            t.id,
                            t.created_at.format("%Y-%m-%d %H:%M"),
                            t.operator_name,
                            settings.format_money(t.total()),
                            t.payment_method
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Command::Show(id) => json(&sale::transaction_detail(&app.db, id).await?)?,
            Command::Reprint(id) => {
                let response = sale::reprint_receipt(&app.db, &app.settings, id).await?;
                self.sale_summary(&response).await
            }
            Command::Dashboard => json(&report::dashboard(&app.db, &app.settings).await?)?,
            Command::Today => {
                let today = report::today_summary(&app.db).await?;
                format!(
                    "Today: {} items, {}",
                    today.items_sold,
                    app.settings.format_money(Money::from_cents(today.total_cents))
                )
            }
            Command::Sales => json(&report::todays_sales(&app.db).await?)?,
            Command::Activity(limit) => json(&report::recent_activity(&app.db, limit).await?)?,
            Command::Backup(path) => {
                let written =
                    report::backup_database(&app.db, &app.session, std::path::Path::new(&path)).await?;
                format!("Backup written to {}", written.display())
            }

            Command::AddUser {
                username,
                password,
                role,
            } => {
                let created = user::create_user(&app.db, &app.session, &username, &password, role).await?;
                format!("Created {} ({}) with id {}", created.username, created.role, created.id)
            }
            Command::Users => user::list_employees(&app.db, &app.session)
                .await?
                .iter()
                .map(|u| format!("{:<4} {}", u.id, u.username))
                .collect::<Vec<_>>()
                .join("\n"),
            Command::DeleteUser(id) => {
                user::delete_employee(&app.db, &app.session, id).await?;
                format!("Removed user {}", id)
            }
            Command::Passwd { current, new } => {
                user::change_password(&app.db, &app.session, &current, &new).await?;
                "Password changed".to_string()
            }
            Command::Shop => json(&user::get_shop_info(&app.db).await?)?,
            Command::SetShop(info) => json(&user::update_shop_info(&app.db, &app.session, info).await?)?,
        };

        Ok(Flow::Continue(output))
    }

    fn cart_table(&self, view: &CartView) -> String {
        if view.rows.is_empty() {
            return "Cart is empty".to_string();
        }

        let settings = &self.app.settings;
        let mut lines: Vec<String> = view
            .rows
            .iter()
            .map(|row| {
                format!(
                    "{:>2}. {:<24} {:>4} x {:>12} {:>16}",
                    row.position,
                    row.name,
                    row.quantity,
                    row.unit_price.to_string(),
                    settings.format_money(row.subtotal)
                )
            })
            .collect();
        lines.push(format!(
            "{} items, total {}",
            view.totals.total_quantity,
            settings.format_money(view.totals.total)
        ));
        lines.join("\n")
    }

    fn product_table(&self, products: &[duka_core::Product]) -> String {
        if products.is_empty() {
            return "No products".to_string();
        }
        products
            .iter()
            .map(|p| {
                format!(
                    "{:<14} {:<28} {:>14} {:>6}  {}",
                    p.barcode,
                    p.name,
                    self.app.settings.format_money(p.price()),
                    p.quantity,
                    p.category
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn sale_summary(&self, response: &CheckoutResponse) -> String {
        let settings = &self.app.settings;
        let mut out = format!(
            "Receipt {}: total {}, paid {}, change {}",
            response.receipt_number,
            settings.format_money(response.total),
            settings.format_money(response.paid),
            settings.format_money(response.change),
        );
        if response.discount.is_positive() {
            out.push_str(&format!(", discount {}", settings.format_money(response.discount)));
        }

        match &response.receipt_path {
            Some(path) => {
                out.push_str(&format!("\nReceipt saved to {}", path.display()));
                if settings.get().open_receipt_after_save {
                    match tokio::fs::read_to_string(path).await {
                        Ok(body) => {
                            out.push('\n');
                            out.push_str(&body);
                        }
                        Err(e) => warn!(?path, "Could not open receipt: {}", e),
                    }
                }
            }
            None => out.push_str("\nReceipt could not be saved; use 'reprint' to retry"),
        }
        out
    }
}

fn json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(app: &AppState) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut console = Console::new(app);

    let greeting = if app.db.inner().users().count().await? == 0 {
        "No accounts yet. Create the admin with: setup <user> <password>".to_string()
    } else {
        match app.settings.get().remembered_username {
            Some(name) => format!("Welcome back. Sign in with: login {} <password>", name),
            None => "Sign in with: login <user> <password>".to_string(),
        }
    };
    stdout.write_all(format!("{}\n", greeting).as_bytes()).await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match parse_line(&line) {
            Ok(command) => {
                debug!(command = line.split_whitespace().next().unwrap_or(""), "console command");
                match console.execute(command).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue(text)) => text,
                    Err(e) => e.to_string(),
                }
            }
            Err(usage) => usage,
        };

        if !reply.is_empty() {
            stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{register, stock};

    #[test]
    fn test_parse_selling_commands() {
        assert_eq!(
            parse_line("scan A001").unwrap(),
            Command::Scan {
                barcode: "A001".into(),
                quantity: 1
            }
        );
        assert_eq!(
            parse_line("  SCAN a001 3 ").unwrap(),
            Command::Scan {
                barcode: "a001".into(),
                quantity: 3
            }
        );
        assert_eq!(
            parse_line("pay mobile_money 5,000 MP123").unwrap(),
            Command::Pay {
                method: "mobile_money".into(),
                amount: "5,000".into(),
                reference: Some("MP123".into())
            }
        );
        assert_eq!(
            parse_line("customer Juma Ali").unwrap(),
            Command::Customer(Some("Juma Ali".into()))
        );
        assert_eq!(parse_line("customer").unwrap(), Command::Customer(None));
        assert!(parse_line("scan A001 two").is_err());
        assert!(parse_line("qty A001").is_err());
    }

    #[test]
    fn test_parse_catalog_commands() {
        match parse_line("add-product A001 1,000 12 Grocery Sugar 1kg").unwrap() {
            Command::AddProduct(req) => {
                assert_eq!(req.name, "Sugar 1kg");
                assert_eq!(req.price, Money::from_major(1000));
                assert_eq!(req.quantity, 12);
            }
            other => panic!("unexpected {:?}", other),
        }

        match parse_line("stock A001 =20 1500").unwrap() {
            Command::Stock { update, .. } => {
                assert_eq!(update.new_quantity, Some(20));
                assert_eq!(update.new_price_cents, Some(150_000));
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse_line("stock A001 -2").unwrap() {
            Command::Stock { update, .. } => assert_eq!(update.quantity_change, Some(-2)),
            other => panic!("unexpected {:?}", other),
        }

        assert!(parse_line("add-product A001 1000 12 Grocery").is_err());
        assert!(parse_line("set-shop Mama Duka").is_err());
        assert!(matches!(
            parse_line("set-shop Mama Duka | | Moshi Road | 0712").unwrap(),
            Command::SetShop(_)
        ));
    }

    #[test]
    fn test_parse_account_commands() {
        assert_eq!(
            parse_line("login amina secret1 remember").unwrap(),
            Command::Login {
                username: "amina".into(),
                password: "secret1".into(),
                remember: true
            }
        );
        assert_eq!(
            parse_line("adduser baraka secret1 admin").unwrap(),
            Command::AddUser {
                username: "baraka".into(),
                password: "secret1".into(),
                role: Role::Admin
            }
        );
        assert!(parse_line("adduser baraka secret1 manager").is_err());
        assert!(parse_line("frobnicate").is_err());
        assert_eq!(parse_line("exit").unwrap(), Command::Quit);
    }

    #[tokio::test]
    async fn test_console_stock_overflow_is_rejected() {
        let app = register().await;
        stock(&app, "A001", "Sugar 1kg", 1000, 5).await;
        let mut console = Console::new(&app);

        let err = console
            .execute(parse_line("stock A001 +9223372036854775807").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);

        let flow = console
            .execute(parse_line("stock A001 +3").unwrap())
            .await
            .unwrap();
        assert!(matches!(flow, Flow::Continue(_)));
    }

    #[tokio::test]
    async fn test_console_sale() {
        let app = register().await;
        stock(&app, "A001", "Sugar 1kg", 1000, 10).await;
        let mut console = Console::new(&app);

        for line in ["scan A001 2", "customer Juma"] {
            let flow = console.execute(parse_line(line).unwrap()).await.unwrap();
            assert!(matches!(flow, Flow::Continue(_)));
        }

        let err = console
            .execute(parse_line("pay cash lots").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::PaymentError);

        let dir = tempfile::tempdir().unwrap();
        app.settings
            .update(|s| {
                s.receipts_dir = Some(dir.path().to_path_buf());
                s.open_receipt_after_save = false;
            })
            .unwrap();

        let Flow::Continue(text) = console
            .execute(parse_line("pay cash 2,000").unwrap())
            .await
            .unwrap()
        else {
            panic!("expected output");
        };
        assert!(text.contains("Receipt saved to"));
        assert!(console.customer.is_none());
        assert_eq!(
            console.execute(Command::ShowCart).await.unwrap(),
            Flow::Continue("Cart is empty".to_string())
        );
        assert_eq!(console.execute(Command::Quit).await.unwrap(), Flow::Quit);
    }
}
