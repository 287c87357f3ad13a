//! Document generation - invoice and report snapshots plus their rendering.
//!
//! Snapshot builders read the database and produce a [`Document`], a
//! format-neutral layout of header, key/value blocks, tables and totals. A
//! [`DocumentRenderer`] turns that layout into bytes; [`PlainTextRenderer`] is
//! the built-in one.

use crate::{
    config::settings::BusinessInfo,
    core::{
        client, ingredient, invoice,
        order::{self, OrderFilter},
    },
    entities::{OrderLine, Product, StatusKind, order_line},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

/// One block of document content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Titled list of `label: value` pairs
    Fields {
        heading: Option<String>,
        fields: Vec<(String, String)>,
    },
    /// Titled table with a header row
    Table {
        heading: Option<String>,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Right-aligned summary lines such as subtotal and total
    Totals(Vec<(String, String)>),
    /// Free text
    Paragraph(String),
}

/// Format-neutral document snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Base file name without extension
    pub slug: String,
    pub title: String,
    pub business: BusinessInfo,
    pub generated_at: DateTime<Utc>,
    pub blocks: Vec<Block>,
}

impl Document {
    fn new(slug: impl Into<String>, title: impl Into<String>, business: &BusinessInfo) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            business: business.clone(),
            generated_at: Utc::now(),
            blocks: Vec::new(),
        }
    }
}

/// Turns a [`Document`] into bytes of some concrete format.
pub trait DocumentRenderer: Send + Sync {
    /// MIME type of the rendered output
    fn content_type(&self) -> &'static str;

    /// File extension, without the dot
    fn extension(&self) -> &'static str;

    /// Renders the document.
    fn render(&self, document: &Document) -> Result<Vec<u8>>;

    /// File name offered for download
    fn file_name(&self, document: &Document) -> String {
        format!("{}.{}", document.slug, self.extension())
    }
}

/// Renders documents as aligned UTF-8 text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl DocumentRenderer for PlainTextRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, document: &Document) -> Result<Vec<u8>> {
        Ok(render_text(document).into_bytes())
    }
}

/// Formats a money amount like `$20.00` or `-$3.50`.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${:.2}", rounded.abs())
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or("N/A").to_string()
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn render_table(out: &mut String, columns: &[String], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| pad(cell, w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let _ = writeln!(out, "{}", line(columns));
    let total_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let _ = writeln!(out, "{}", "-".repeat(total_width));
    if rows.is_empty() {
        let _ = writeln!(out, "(sin registros)");
    }
    for row in rows {
        let _ = writeln!(out, "{}", line(row));
    }
}

/// Lays out a document as plain text.
#[must_use]
pub fn render_text(document: &Document) -> String {
    let mut out = String::new();
    let business = &document.business;
    let _ = writeln!(out, "{}", business.name);
    for extra in [&business.address, &business.phone, &business.email]
        .into_iter()
        .flatten()
    {
        let _ = writeln!(out, "{extra}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", document.title);
    let _ = writeln!(out, "{}", "=".repeat(document.title.chars().count()));
    let _ = writeln!(out, "Generado el: {}", format_date(document.generated_at));

    for block in &document.blocks {
        let _ = writeln!(out);
        match block {
            Block::Fields { heading, fields } => {
                if let Some(heading) = heading {
                    let _ = writeln!(out, "{heading}:");
                }
                for (label, value) in fields {
                    let _ = writeln!(out, "  {label}: {value}");
                }
            }
            Block::Table {
                heading,
                columns,
                rows,
            } => {
                if let Some(heading) = heading {
                    let _ = writeln!(out, "{heading}");
                }
                render_table(&mut out, columns, rows);
            }
            Block::Totals(lines) => {
                let width = lines
                    .iter()
                    .map(|(label, _)| label.chars().count())
                    .max()
                    .unwrap_or(0);
                for (label, value) in lines {
                    let _ = writeln!(out, "{:>40} {value:>12}", pad(label, width));
                }
            }
            Block::Paragraph(text) => {
                let _ = writeln!(out, "{text}");
            }
        }
    }
    out
}

/// Builds the printable snapshot of an invoice.
pub async fn invoice_document(
    db: &DatabaseConnection,
    business: &BusinessInfo,
    invoice_id: i64,
) -> Result<Document> {
    let detail = invoice::get_invoice_detail(db, invoice_id).await?;
    let factura = &detail.factura;

    let mut document = Document::new(
        format!("factura-{}", factura.numero_factura),
        "FACTURA",
        business,
    );
    document.blocks.push(Block::Fields {
        heading: None,
        fields: vec![
            ("Número".into(), factura.numero_factura.clone()),
            ("Fecha Emisión".into(), format_date(factura.fecha_emision)),
            (
                "Fecha Vencimiento".into(),
                format_date(factura.fecha_vencimiento),
            ),
            ("Estado".into(), factura.estado.as_str().into()),
        ],
    });

    let cliente = detail.pedido.as_ref().and_then(|p| p.cliente.as_ref());
    document.blocks.push(Block::Fields {
        heading: Some("Cliente".into()),
        fields: vec![
            (
                "Nombre".into(),
                cliente.map_or_else(|| "Consumidor final".into(), |c| c.nombre.clone()),
            ),
            ("DUI".into(), or_na(cliente.and_then(|c| c.dui.as_deref()))),
            (
                "Dirección".into(),
                or_na(cliente.and_then(|c| c.direccion.as_deref())),
            ),
            (
                "Teléfono".into(),
                or_na(cliente.and_then(|c| c.telefono.as_deref())),
            ),
        ],
    });

    document.blocks.push(Block::Table {
        heading: Some("Detalles de la Factura".into()),
        columns: ["Descripción", "Cantidad", "Precio Unit.", "Subtotal"]
            .map(String::from)
            .to_vec(),
        rows: detail
            .detalles
            .iter()
            .map(|line| {
                vec![
                    line.descripcion.clone(),
                    line.cantidad.to_string(),
                    format_money(line.precio_unitario),
                    format_money(line.subtotal),
                ]
            })
            .collect(),
    });

    let mut totals = vec![
        ("Subtotal:".to_string(), format_money(factura.subtotal)),
        ("Impuestos (13%):".to_string(), format_money(factura.impuestos)),
    ];
    if factura.descuento > Decimal::ZERO {
        totals.push(("Descuento:".into(), format_money(-factura.descuento)));
    }
    totals.push(("Total:".into(), format_money(factura.total)));
    document.blocks.push(Block::Totals(totals));

    let notas = detail
        .pedido
        .as_ref()
        .and_then(|p| p.pedido.notas.clone())
        .unwrap_or_else(|| "Ninguna".into());
    document.blocks.push(Block::Paragraph(format!("Notas: {notas}")));
    document
        .blocks
        .push(Block::Paragraph("Gracias por su compra!".into()));
    Ok(document)
}

/// Client listing, newest first.
pub async fn clients_report(db: &DatabaseConnection, business: &BusinessInfo) -> Result<Document> {
    let clients = client::get_all_clients(db).await?;
    let mut document = Document::new("reporte-clientes", "Reporte de Clientes", business);
    document.blocks.push(Block::Table {
        heading: None,
        columns: ["ID", "Nombre", "DUI", "Teléfono", "Dirección"]
            .map(String::from)
            .to_vec(),
        rows: clients
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.nombre.clone(),
                    or_na(c.dui.as_deref()),
                    or_na(c.telefono.as_deref()),
                    or_na(c.direccion.as_deref()),
                ]
            })
            .collect(),
    });
    document
        .blocks
        .push(Block::Paragraph(format!("Total de clientes: {}", clients.len())));
    Ok(document)
}

/// Orders in the filter range with their status and totals.
pub async fn orders_report(
    db: &DatabaseConnection,
    business: &BusinessInfo,
    filter: OrderFilter,
) -> Result<Document> {
    let orders = order::list_orders(db, filter).await?;
    let mut document = Document::new("reporte-pedidos", "Reporte de Pedidos", business);

    let mut billed = Decimal::ZERO;
    let rows = orders
        .iter()
        .map(|o| {
            let cancelled = o
                .estado
                .as_ref()
                .is_some_and(|e| e.kind == StatusKind::Cancelled);
            if !cancelled {
                billed += o.pedido.total;
            }
            vec![
                o.pedido.id.to_string(),
                format_date(o.pedido.fecha_pedido),
                o.cliente
                    .as_ref()
                    .map_or_else(|| "Consumidor final".into(), |c| c.nombre.clone()),
                o.estado
                    .as_ref()
                    .map_or_else(|| "N/A".into(), |e| e.nombre.clone()),
                o.pedido.metodo_pago.clone(),
                format_money(o.pedido.total),
            ]
        })
        .collect();

    document.blocks.push(Block::Table {
        heading: None,
        columns: ["ID", "Fecha", "Cliente", "Estado", "Pago", "Total"]
            .map(String::from)
            .to_vec(),
        rows,
    });
    document.blocks.push(Block::Totals(vec![
        ("Pedidos:".into(), orders.len().to_string()),
        ("Total (sin cancelados):".into(), format_money(billed)),
    ]));
    Ok(document)
}

/// Ingredient stock on hand and its value at unit cost.
pub async fn inventory_report(db: &DatabaseConnection, business: &BusinessInfo) -> Result<Document> {
    let ingredients = ingredient::list_ingredients(db).await?;
    let mut document = Document::new("reporte-inventario", "Reporte de Inventario", business);

    let mut value = Decimal::ZERO;
    let rows = ingredients
        .iter()
        .map(|i| {
            let line_value = i.stock * i.costo_por_unidad;
            value += line_value;
            vec![
                i.nombre.clone(),
                format!("{} {}", i.stock.normalize(), i.unidad_medida),
                format_money(i.costo_por_unidad),
                format_money(line_value),
            ]
        })
        .collect();

    document.blocks.push(Block::Table {
        heading: None,
        columns: ["Ingrediente", "Stock", "Costo Unit.", "Valor"]
            .map(String::from)
            .to_vec(),
        rows,
    });
    document
        .blocks
        .push(Block::Totals(vec![("Valor total:".into(), format_money(value))]));
    Ok(document)
}

/// Units sold and revenue per product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSales {
    pub producto_id: i64,
    pub nombre: String,
    pub unidades: i64,
    pub ingresos: Decimal,
}

/// Aggregates order lines per product, ignoring cancelled orders.
///
/// Sorted by units sold, descending, then by name.
pub async fn product_sales(db: &DatabaseConnection, filter: OrderFilter) -> Result<Vec<ProductSales>> {
    let orders = order::list_orders(db, filter).await?;
    let counted: HashSet<i64> = orders
        .iter()
        .filter(|o| {
            o.estado
                .as_ref()
                .is_none_or(|e| e.kind != StatusKind::Cancelled)
        })
        .map(|o| o.pedido.id)
        .collect();

    let lines = OrderLine::find()
        .order_by_asc(order_line::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    let mut totals: BTreeMap<i64, ProductSales> = BTreeMap::new();
    for (line, product) in lines {
        if !counted.contains(&line.pedido_id) {
            continue;
        }
        let entry = totals
            .entry(line.producto_id)
            .or_insert_with(|| ProductSales {
                producto_id: line.producto_id,
                nombre: product
                    .map_or_else(|| format!("Producto {}", line.producto_id), |p| p.nombre),
                unidades: 0,
                ingresos: Decimal::ZERO,
            });
        entry.unidades += i64::from(line.cantidad);
        entry.ingresos += line.subtotal;
    }

    let mut sales: Vec<ProductSales> = totals.into_values().collect();
    sales.sort_by(|a, b| b.unidades.cmp(&a.unidades).then_with(|| a.nombre.cmp(&b.nombre)));
    Ok(sales)
}

/// Products sold report over the filter range.
pub async fn products_sold_report(
    db: &DatabaseConnection,
    business: &BusinessInfo,
    filter: OrderFilter,
) -> Result<Document> {
    let sales = product_sales(db, filter).await?;
    let mut document = Document::new(
        "reporte-productos-vendidos",
        "Reporte de Productos Vendidos",
        business,
    );
    let revenue: Decimal = sales.iter().map(|s| s.ingresos).sum();
    document.blocks.push(Block::Table {
        heading: None,
        columns: ["Producto", "Unidades", "Ingresos"]
            .map(String::from)
            .to_vec(),
        rows: sales
            .iter()
            .map(|s| {
                vec![
                    s.nombre.clone(),
                    s.unidades.to_string(),
                    format_money(s.ingresos),
                ]
            })
            .collect(),
    });
    document
        .blocks
        .push(Block::Totals(vec![("Ingresos totales:".into(), format_money(revenue))]));
    Ok(document)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::transition::transition_order;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(22.6)), "$22.60");
        assert_eq!(format_money(dec!(0)), "$0.00");
        assert_eq!(format_money(dec!(-3.5)), "-$3.50");
        assert_eq!(format_money(dec!(1.005)), "$1.00");
    }

    #[test]
    fn test_render_text_layout() {
        let mut document = Document::new("demo", "Demo", &BusinessInfo::default());
        document.blocks.push(Block::Table {
            heading: None,
            columns: vec!["A".into(), "Nombre".into()],
            rows: vec![vec!["1".into(), "Ana".into()]],
        });
        document.blocks.push(Block::Paragraph("fin".into()));

        let text = render_text(&document);
        assert!(text.starts_with("Comanda\n"));
        assert!(text.contains("Demo\n====\n"));
        assert!(text.contains("A  Nombre\n"));
        assert!(text.contains("1  Ana\n"));
        assert!(text.ends_with("fin\n"));
        assert_eq!(PlainTextRenderer.file_name(&document), "demo.txt");
    }

    #[test]
    fn test_empty_table_is_marked() {
        let mut document = Document::new("empty", "Vacío", &BusinessInfo::default());
        document.blocks.push(Block::Table {
            heading: None,
            columns: vec!["ID".into()],
            rows: Vec::new(),
        });
        assert!(render_text(&document).contains("(sin registros)"));
    }

    #[tokio::test]
    async fn test_invoice_document() -> Result<()> {
        let ctx = setup_order_context().await?;
        let cliente = create_test_client(&ctx.db, "María López", Some("012345678")).await?;
        let detail = create_test_order(
            &ctx.db,
            ctx.seller.id,
            Some(cliente.id),
            &[(ctx.product.id, 2)],
        )
        .await?;
        let factura = invoice::emit_invoice(&ctx.db, detail.pedido.id).await?;

        let document = invoice_document(&ctx.db, &BusinessInfo::default(), factura.id).await?;
        assert_eq!(document.slug, format!("factura-{}", factura.numero_factura));

        let text = render_text(&document);
        assert!(text.contains(&factura.numero_factura));
        assert!(text.contains("María López"));
        assert!(text.contains("01234567-8"));
        assert!(text.contains("$22.60"));
        assert!(text.contains("Estado: Pagada"));
        Ok(())
    }

    #[tokio::test]
    async fn test_product_sales_skip_cancelled_orders() -> Result<()> {
        let ctx = setup_order_context().await?;
        create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 2)]).await?;
        let cancelled =
            create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 5)]).await?;
        let cancel = status_by_kind(&ctx.db, StatusKind::Cancelled).await?;
        transition_order(&ctx.db, cancelled.pedido.id, cancel.id).await?;

        let sales = product_sales(&ctx.db, OrderFilter::default()).await?;
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].unidades, 2);
        assert_eq!(sales[0].ingresos, dec!(20.00));

        let document =
            products_sold_report(&ctx.db, &BusinessInfo::default(), OrderFilter::default()).await?;
        assert!(render_text(&document).contains("$20.00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_inventory_report_values_stock() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ingredient(&db, "Queso", dec!(4)).await?;
        let document = inventory_report(&db, &BusinessInfo::default()).await?;
        let text = render_text(&document);
        assert!(text.contains("Queso"));
        assert!(text.contains("Valor total:"));
        Ok(())
    }
}
