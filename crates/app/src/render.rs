//! Cart table output.

use std::io;

use cartsync::{CartSnapshot, CartState, cart::money};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};

/// Write the displayed cart as a table followed by its totals.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_cart(out: &mut impl io::Write, state: &CartState) -> io::Result<()> {
    match state.cart.as_deref() {
        Some(cart) => {
            writeln!(out, "Cart {} ({})", cart.id, cart.currency.iso_alpha_code)?;

            if cart.is_empty() {
                writeln!(out, "\nCart is empty")?;
            } else {
                writeln!(out, "\n{}", line_table(cart, state))?;
            }

            write_totals(out, cart)?;
        }
        None => writeln!(out, "No cart")?,
    }

    if let Some(error) = &state.last_error {
        writeln!(out, "\nError: {error}")?;
    }

    Ok(())
}

fn line_table(cart: &CartSnapshot, state: &CartState) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Line", "Item", "Qty", "Unit Price", "Total", ""]);

    for line in &cart.line_items {
        let status = if state.is_removing(&line.id) {
            "removing"
        } else if line.is_temporary() {
            "pending"
        } else {
            ""
        };

        builder.push_record([
            line.id.clone(),
            line.title.clone(),
            line.quantity.to_string(),
            money(line.unit_price, cart.currency).to_string(),
            money(line.total, cart.currency).to_string(),
            status.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(2..5), Alignment::right());
    table.modify(Rows::first(), Alignment::center());

    table.to_string()
}

fn write_totals(out: &mut impl io::Write, cart: &CartSnapshot) -> io::Result<()> {
    let rows = [
        ("Items:", cart.item_count().to_string()),
        ("Subtotal:", cart.item_subtotal_money().to_string()),
        ("Shipping:", cart.shipping_money().to_string()),
        ("Tax:", cart.tax_money().to_string()),
        ("Total:", cart.total_money().to_string()),
    ];

    let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

    for (label, value) in rows {
        writeln!(out, " {label:<10}{value:>value_width$}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, sync::Arc};

    use cartsync::{LineItem, Metadata};
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    fn render(state: &CartState) -> TestResult<String> {
        let mut out = Vec::new();

        write_cart(&mut out, state)?;

        Ok(String::from_utf8(out)?)
    }

    fn cart() -> CartSnapshot {
        let line = LineItem {
            id: "li_1".to_string(),
            variant_id: "var_1".to_string(),
            product_id: "prod_1".to_string(),
            title: "Scarf".to_string(),
            thumbnail: None,
            quantity: 2,
            unit_price: 2_500,
            total: 5_000,
            original_total: 5_000,
            metadata: Metadata::new(),
        };

        CartSnapshot {
            id: "cart_1".to_string(),
            line_items: vec![Arc::new(line)],
            item_subtotal: 5_000,
            subtotal: 5_000,
            total: 5_000,
            ..CartSnapshot::empty(iso::EUR)
        }
    }

    #[test]
    fn renders_lines_and_totals() -> TestResult {
        let state = CartState {
            cart: Some(Arc::new(cart())),
            removing_line_ids: BTreeSet::from(["li_1".to_string()]),
            ..CartState::default()
        };

        let output = render(&state)?;

        assert!(output.contains("Cart cart_1 (EUR)"), "header missing: {output}");
        assert!(output.contains("Scarf"), "line title missing: {output}");
        assert!(output.contains("removing"), "removal flag missing: {output}");
        assert!(
            output.contains(&cart().total_money().to_string()),
            "total missing: {output}"
        );

        Ok(())
    }

    #[test]
    fn renders_missing_cart_and_error() -> TestResult {
        let state = CartState {
            last_error: Some("offline".to_string()),
            ..CartState::default()
        };

        assert_eq!(render(&state)?, "No cart\n\nError: offline\n");

        Ok(())
    }
}
