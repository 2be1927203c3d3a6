//! Output formatting for the catalog commands
//!
//! Every formatter renders either a comfy-table (human) or pretty JSON.

use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use serde::Serialize;
use soundstore_core::cache::{EntryState, EntryStatus};
use soundstore_core::models::RatingRecord;
use soundstore_core::{CacheStatus, CacheTtl, Category, Deal, Pagination, Product, ProductView};
use std::collections::HashMap;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    NoResults { query: String, scanned: usize },
    NotFound { id: String, scanned: usize },
    InvalidRating { average: f64 },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NoResults { query, scanned } => write!(
                f,
                "No products match '{}' ({} products scanned)",
                query, scanned
            ),
            CliError::NotFound { id, scanned } => {
                write!(f, "Product '{}' not found ({} products loaded)", id, scanned)
            }
            CliError::InvalidRating { average } => {
                write!(f, "Average rating must be between 0 and 5, got {}", average)
            }
        }
    }
}

impl std::error::Error for CliError {}

// ============================================================================
// Listings
// ============================================================================

fn header(labels: &[&str], no_color: bool) -> Vec<Cell> {
    labels
        .iter()
        .map(|l| {
            let cell = Cell::new(l);
            if no_color {
                cell
            } else {
                cell.fg(Color::Cyan)
            }
        })
        .collect()
}

fn new_table(labels: &[&str], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(labels, no_color));
    table
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
}

/// Format plain products as table or JSON
pub fn format_product_table(products: &[Product], json: bool, no_color: bool) -> String {
    if json {
        return to_json(products, "[]");
    }
    if products.is_empty() {
        return "No products found.".to_string();
    }

    let mut table = new_table(
        &["ID", "Name", "Category", "Brand", "Price", "Stock", "Rating"],
        no_color,
    );
    for p in products {
        table.add_row(Row::from(vec![
            short_id(&p.id),
            truncate(&p.name, 32),
            truncate(p.category_label(), 18),
            truncate(&p.brand, 16),
            format_price(p.price),
            p.stock.to_string(),
            format_rating(p.average_rating, p.total_reviews),
        ]));
    }
    table.to_string()
}

/// Format products with deal pricing; deal rows also show the list price
pub fn format_view_table(views: &[ProductView], json: bool, no_color: bool) -> String {
    if json {
        return to_json(views, "[]");
    }
    if views.is_empty() {
        return "No products found.".to_string();
    }

    let mut table = new_table(
        &["ID", "Name", "Category", "Price", "Was", "Deal", "Rating"],
        no_color,
    );
    for v in views {
        let p = &v.product;
        let was = if v.has_active_deal {
            p.original_price.map(format_price).unwrap_or_default()
        } else {
            String::new()
        };
        let deal = match (v.has_active_deal, p.discount) {
            (true, Some(d)) => format!("-{:.0}%", d),
            (true, None) => "yes".to_string(),
            (false, _) => String::new(),
        };
        let deal_cell = if v.has_active_deal && !no_color {
            Cell::new(deal).fg(Color::Green)
        } else {
            Cell::new(deal)
        };
        table.add_row(vec![
            Cell::new(short_id(&p.id)),
            Cell::new(truncate(&p.name, 32)),
            Cell::new(truncate(p.category_label(), 18)),
            Cell::new(format_price(p.price)),
            Cell::new(was),
            deal_cell,
            Cell::new(format_rating(p.average_rating, p.total_reviews)),
        ]);
    }
    table.to_string()
}

pub fn format_deal_table(deals: &[Deal], json: bool, no_color: bool) -> String {
    if json {
        return to_json(deals, "[]");
    }
    if deals.is_empty() {
        return "No active deals.".to_string();
    }

    let mut table = new_table(&["Product", "Name", "Price", "Was", "Discount", "Saves"], no_color);
    for d in deals {
        table.add_row(Row::from(vec![
            short_id(&d.id),
            truncate(&d.name, 32),
            format_price(d.price),
            d.original_price.map(format_price).unwrap_or_default(),
            d.discount.map(|x| format!("{:.0}%", x)).unwrap_or_default(),
            d.savings().map(format_price).unwrap_or_default(),
        ]));
    }
    table.to_string()
}

pub fn format_category_table(categories: &[Category], json: bool, no_color: bool) -> String {
    if json {
        return to_json(categories, "[]");
    }
    if categories.is_empty() {
        return "No categories found.".to_string();
    }

    let mut table = new_table(&["ID", "Name", "Slug", "Products"], no_color);
    for c in categories {
        table.add_row(Row::from(vec![
            c.id.clone(),
            c.name.clone(),
            c.slug.clone().unwrap_or_else(|| "-".to_string()),
            c.product_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]));
    }
    table.to_string()
}

/// "Page 2/3 - 72 products" footer for category listings
pub fn format_pagination(pagination: &Pagination) -> String {
    let mut line = format!(
        "Page {}/{} - {} products",
        pagination.current_page,
        pagination.total_pages.max(1),
        pagination.total_products
    );
    if pagination.has_next_page {
        line.push_str(&format!(" (next: --page {})", pagination.current_page + 1));
    }
    line
}

// ============================================================================
// Single product
// ============================================================================

pub fn format_product_info(product: &Product, json: bool) -> String {
    if json {
        return to_json(product, "{}");
    }

    let mut lines = vec![];
    lines.push(format!("Product ID:       {}", product.id));
    lines.push(format!("Name:             {}", product.name));
    lines.push(format!("Brand:            {}", or_dash(&product.brand)));
    lines.push(format!("Category:         {}", product.category_label()));
    lines.push(format!("Price:            {}", format_price(product.price)));
    if let Some(original) = product.original_price {
        lines.push(format!("Original price:   {}", format_price(original)));
    }
    if let Some(discount) = product.discount {
        lines.push(format!("Discount:         {:.0}%", discount));
    }
    lines.push(format!(
        "Stock:            {}{}",
        product.stock,
        if product.in_stock() { "" } else { " (out of stock)" }
    ));
    lines.push(format!(
        "Rating:           {}",
        format_rating(product.average_rating, product.total_reviews)
    ));
    lines.push(format!("Description:      {}", or_dash(&product.description)));

    lines.join("\n")
}

// ============================================================================
// Status
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    api_base_url: &'a str,
    ttl: &'a CacheTtl,
    cache: &'a CacheStatus,
    journal: &'a HashMap<String, RatingRecord>,
}

pub fn format_status(
    api_base_url: &str,
    ttl: &CacheTtl,
    status: &CacheStatus,
    journal: &HashMap<String, RatingRecord>,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        let report = StatusReport {
            api_base_url,
            ttl,
            cache: status,
            journal,
        };
        return to_json(&report, "{}");
    }

    let mut table = new_table(&["Entry", "State", "Items", "Fresh", "Age", "TTL", "Error"], no_color);
    let rows = [
        ("products", &status.products, ttl.products_secs),
        ("deals", &status.deals, ttl.deals_secs),
        ("categories", &status.categories, ttl.categories_secs),
    ];
    for (name, entry, ttl_secs) in rows {
        table.add_row(status_row(name, entry, ttl_secs, no_color));
    }
    for (category, entry) in &status.category_buckets {
        let name = format!("category/{}", category);
        table.add_row(status_row(&name, entry, ttl.category_products_secs, no_color));
    }

    let mut out = vec![
        format!("API: {}", api_base_url),
        table.to_string(),
        format!("Rating overrides in session: {}", status.rating_overrides),
    ];

    let mut records: Vec<_> = journal.iter().collect();
    records.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
    for (id, record) in records {
        out.push(format!(
            "  {}  {}  {}",
            short_id(id),
            format_rating(record.average_rating, record.total_reviews),
            format_timestamp(&record.timestamp)
        ));
    }

    out.join("\n")
}

fn status_row(name: &str, entry: &EntryStatus, ttl_secs: u64, no_color: bool) -> Vec<Cell> {
    let state = Cell::new(state_label(entry.state));
    let state = match (no_color, entry.state) {
        (true, _) => state,
        (false, EntryState::Ready) => state.fg(Color::Green),
        (false, EntryState::Error) => state.fg(Color::Red),
        (false, EntryState::Loading) => state.fg(Color::Yellow),
        (false, EntryState::Empty) => state.fg(Color::DarkGrey),
    };
    vec![
        Cell::new(name),
        state,
        Cell::new(entry.items),
        Cell::new(if entry.fresh { "yes" } else { "no" }),
        Cell::new(format_age(entry.age_secs)),
        Cell::new(format!("{}s", ttl_secs)),
        Cell::new(entry.error.as_deref().map(|e| truncate(e, 40)).unwrap_or_default()),
    ]
}

fn state_label(state: EntryState) -> &'static str {
    match state {
        EntryState::Empty => "empty",
        EntryState::Loading => "loading",
        EntryState::Ready => "ready",
        EntryState::Error => "error",
    }
}

// ============================================================================
// Utilities
// ============================================================================

pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

pub fn format_rating(average: f64, reviews: u32) -> String {
    if reviews == 0 {
        "-".to_string()
    } else {
        format!("{:.1} ({})", average, reviews)
    }
}

fn format_age(age_secs: Option<i64>) -> String {
    match age_secs {
        None => "-".to_string(),
        Some(s) if s < 60 => format!("{}s", s.max(0)),
        Some(s) if s < 3600 => format!("{}m", s / 60),
        Some(s) => format!("{}h", s / 3600),
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn short_id(id: &str) -> String {
    truncate(id, 12)
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        // Char-based so multi-byte names never split
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
