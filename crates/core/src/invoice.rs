//! Invoices
//!
//! The invoice is the artifact attached to the order confirmation sent to a customer. It is
//! rendered as a plain-text table.

use std::io;

use jiff::Timestamp;
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

/// Errors that can occur when rendering an invoice.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// A single line on an invoice.
#[derive(Debug, Clone)]
pub struct InvoiceLine<'a> {
    /// Product name, including the selected variant if there is one
    pub description: String,

    /// Units purchased
    pub quantity: u32,

    /// Tax-inclusive price charged per unit
    pub unit_price: Money<'a, Currency>,

    /// `unit_price * quantity`
    pub line_total: Money<'a, Currency>,
}

/// Invoice for a materialized order.
#[derive(Debug, Clone)]
pub struct Invoice<'a> {
    number: String,
    customer_name: String,
    issued_at: Timestamp,
    lines: SmallVec<[InvoiceLine<'a>; 8]>,
    total: Money<'a, Currency>,
}

impl<'a> Invoice<'a> {
    /// Create an invoice. `total` is the amount actually charged, after any coupon.
    pub fn new(
        number: impl Into<String>,
        customer_name: impl Into<String>,
        issued_at: Timestamp,
        lines: impl IntoIterator<Item = InvoiceLine<'a>>,
        total: Money<'a, Currency>,
    ) -> Self {
        Self {
            number: number.into(),
            customer_name: customer_name.into(),
            issued_at,
            lines: lines.into_iter().collect(),
            total,
        }
    }

    /// Invoice (order) number
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Lines on the invoice
    pub fn lines(&self) -> &[InvoiceLine<'a>] {
        &self.lines
    }

    /// Amount charged
    pub fn total(&self) -> &Money<'a, Currency> {
        &self.total
    }

    /// Sum of the line totals, before any coupon.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the lines use different currencies.
    pub fn lines_total(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.lines
            .iter()
            .try_fold(Money::from_minor(0, self.total.currency()), |acc, line| {
                acc.add(line.line_total)
            })
    }

    /// Amount taken off the line totals by a coupon, zero if none was applied.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the lines and total use different currencies.
    pub fn discount(&self) -> Result<Money<'a, Currency>, MoneyError> {
        if self.lines.is_empty() {
            return Ok(Money::from_minor(0, self.total.currency()));
        }

        let discount = self.lines_total()?.sub(self.total)?;

        if discount.to_minor_units() < 0 {
            Ok(Money::from_minor(0, self.total.currency()))
        } else {
            Ok(discount)
        }
    }

    /// Renders the invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the totals cannot be calculated or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), InvoiceError> {
        writeln!(out, "Invoice {}", self.number).map_err(|_err| InvoiceError::IO)?;
        writeln!(out, "Issued {}", self.issued_at.strftime("%Y-%m-%d"))
            .map_err(|_err| InvoiceError::IO)?;
        writeln!(out, "Customer {}", self.customer_name).map_err(|_err| InvoiceError::IO)?;

        write_invoice_table(&mut out, self.lines())?;
        write_invoice_summary(&mut out, self)?;

        Ok(())
    }
}

fn write_invoice_table(
    out: &mut impl io::Write,
    lines: &[InvoiceLine<'_>],
) -> Result<(), InvoiceError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Qty", "Unit Price", "Line Total"]);

    for line in lines {
        builder.push_record([
            line.description.clone(),
            line.quantity.to_string(),
            line.unit_price.to_string(),
            line.line_total.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Theme::from(Style::modern_rounded()));
    table.modify(Columns::new(1..4), Alignment::right());
    table.modify(Rows::first(), Alignment::center());

    writeln!(out, "\n{table}").map_err(|_err| InvoiceError::IO)
}

fn write_invoice_summary(
    out: &mut impl io::Write,
    invoice: &Invoice<'_>,
) -> Result<(), InvoiceError> {
    let discount = invoice.discount()?;

    if discount.to_minor_units() > 0 {
        writeln!(out, " Discount: -{discount}").map_err(|_err| InvoiceError::IO)?;
    }

    writeln!(out, " Total (incl. tax): {}", invoice.total).map_err(|_err| InvoiceError::IO)
}
