//! Product command handlers.

use anyhow::{Context, Result, bail};
use catalog_core::models::Product;
use catalog_core::views::{CatalogView, DeleteOutcome, FormError, LoadOutcome, SubmitOutcome};
use comfy_table::{CellAlignment, ContentArrangement, Table};

use super::{confirm, print_notice};
use crate::cli::AppContext;

/// Fields to replace on `products edit`; `None` keeps the current value.
pub struct Changes {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

pub async fn list(ctx: &AppContext, filter: Option<&str>) -> Result<()> {
    let mut view = ctx.catalog_view();
    if view.load().await == LoadOutcome::Failed {
        bail!("{}", notice_text(&mut view));
    }
    let notice = view.take_notice();

    if let Some(filter) = filter {
        view.set_filter(filter);
    }
    let shown = view.filtered();
    if shown.is_empty() {
        println!("No products found.");
    } else {
        println!("{}", render_table(&shown));
    }

    println!(
        "Products: {}  Stock: {}  Value: {:.2}",
        view.total_count(),
        view.total_stock(),
        view.total_value()
    );
    print_notice(notice);
    Ok(())
}

pub async fn show(ctx: &AppContext, id: i64) -> Result<()> {
    let product = ctx
        .products()
        .get(id)
        .await
        .with_context(|| format!("fetch product {id}"))?;

    println!("{}", product.name);
    if let Some(id) = product.id {
        println!("  ID:    {id}");
    }
    println!("  Price: {:.2}", product.price);
    println!("  Stock: {}", product.stock);
    println!("  Value: {:.2}", product.value());
    Ok(())
}

pub async fn add(ctx: &AppContext, name: String, price: f64, stock: i64) -> Result<()> {
    let mut view = ctx.catalog_view();
    view.open_create();
    let form = view.form_mut();
    form.name = name;
    form.price = price;
    form.stock = stock;

    finish_submit(&mut view).await
}

pub async fn edit(ctx: &AppContext, id: i64, changes: Changes) -> Result<()> {
    let current = ctx
        .products()
        .get(id)
        .await
        .with_context(|| format!("fetch product {id}"))?;

    let mut view = ctx.catalog_view();
    view.edit(&current);
    let form = view.form_mut();
    if let Some(name) = changes.name {
        form.name = name;
    }
    if let Some(price) = changes.price {
        form.price = price;
    }
    if let Some(stock) = changes.stock {
        form.stock = stock;
    }

    finish_submit(&mut view).await
}

pub async fn delete(ctx: &AppContext, id: i64, yes: bool) -> Result<()> {
    let mut view = ctx.catalog_view();
    let mut ask = |question: &str| yes || confirm(question);

    match view.delete(Some(id), &mut ask).await {
        DeleteOutcome::Deleted => {
            print_notice(view.take_notice());
            Ok(())
        }
        DeleteOutcome::Cancelled | DeleteOutcome::Skipped => {
            println!("Delete cancelled.");
            Ok(())
        }
        DeleteOutcome::Failed => bail!("{}", notice_text(&mut view)),
    }
}

async fn finish_submit(view: &mut CatalogView) -> Result<()> {
    match view.submit().await {
        SubmitOutcome::Invalid(errors) => bail!(
            "{}: {}",
            notice_text(view),
            errors
                .iter()
                .map(FormError::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        SubmitOutcome::Failed => bail!("{}", notice_text(view)),
        SubmitOutcome::Created | SubmitOutcome::Updated => {
            print_notice(view.take_notice());
            Ok(())
        }
    }
}

fn notice_text(view: &mut CatalogView) -> String {
    view.take_notice().map(|n| n.text).unwrap_or_default()
}

fn render_table(products: &[Product]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Price", "Stock", "Value"]);

    for product in products {
        let id = product.id.map(|id| id.to_string()).unwrap_or_default();
        table.add_row(vec![
            id,
            product.name.clone(),
            format!("{:.2}", product.price),
            product.stock.to_string(),
            format!("{:.2}", product.value()),
        ]);
    }

    for column in 2..5 {
        if let Some(column) = table.column_mut(column) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table
}
