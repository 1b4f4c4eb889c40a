//! Labels command - pack a seller's label order into sheets of six.

use anyhow::{Context, Result};
use clap::Args;

use flohmarkt_core::labels::{pack, LabelRequest, LabelValue};
use flohmarkt_core::validation::{validate_label_count, validate_seller_id};
use flohmarkt_core::SellerId;

use super::{open_database, print_json};
use crate::config::AppConfig;
use crate::{render, OutputFormat};

/// Arguments for the labels command.
#[derive(Debug, Args)]
pub struct LabelsArgs {
    /// Seller the labels are printed for.
    #[arg(long)]
    pub seller: i64,

    /// One order line as PRICE=COUNT, price in cents or `blank`
    /// (e.g. `--label 50=13 --label blank=2`).
    #[arg(long = "label", value_name = "PRICE=COUNT")]
    pub labels: Vec<String>,

    /// The whole order form: 46 comma-separated counts, one per ladder
    /// price from 0,50 € upwards, the blank count last.
    #[arg(long, value_delimiter = ',', conflicts_with = "labels")]
    pub form: Option<Vec<i64>>,
}

/// Execute the labels command.
///
/// # Errors
///
/// Returns an error if the seller is not registered, an order line is
/// malformed or off the price ladder. An empty order prints a plan with
/// no sheets.
pub async fn execute(args: LabelsArgs, config: &AppConfig) -> Result<()> {
    let seller_id = validate_seller_id(args.seller)?;

    let db = open_database(config).await?;
    db.sellers()
        .find_by_seller_id(seller_id)
        .await?
        .with_context(|| format!("Seller {seller_id} is not registered"))?;

    let request = build_request(seller_id, &args)?;
    let plan = pack(&request);

    match config.format {
        OutputFormat::Json => print_json(&plan),
        OutputFormat::Text => {
            println!("{}", render::label_sheets(&plan));
            Ok(())
        }
    }
}

/// Turns the order lines or the order form into a request.
pub fn build_request(seller_id: SellerId, args: &LabelsArgs) -> Result<LabelRequest> {
    if let Some(form) = &args.form {
        let counts = form
            .iter()
            .map(|&count| validate_label_count(count))
            .collect::<Result<Vec<u32>, _>>()?;
        return Ok(LabelRequest::from_form_counts(seller_id, &counts)?);
    }

    let mut request = LabelRequest::new(seller_id);
    for line in &args.labels {
        let (value, count) = parse_label_line(line)?;
        let merged = validate_label_count(i64::from(request.count(value)) + i64::from(count))?;
        request.set(value, merged);
    }
    Ok(request)
}

/// Parses `PRICE=COUNT`.
fn parse_label_line(line: &str) -> Result<(LabelValue, u32)> {
    let (price, count) = line
        .split_once('=')
        .with_context(|| format!("'{line}' is not PRICE=COUNT"))?;

    let value = match price.trim() {
        "blank" => LabelValue::Blank,
        cents => {
            let cents: u32 = cents
                .parse()
                .with_context(|| format!("'{cents}' is not a price in cents"))?;
            LabelValue::from_cents(cents)?
        }
    };

    let count: i64 = count
        .trim()
        .parse()
        .with_context(|| format!("'{count}' is not a label count"))?;

    Ok((value, validate_label_count(count)?))
}
