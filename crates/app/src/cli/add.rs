use cartsync::{AddToCart, CartSynchronizer, Metadata, Product, Variant};
use clap::Args;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    config::{AppConfig, ConfigError, sync::currency},
    errors::AppError,
};

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Variant to add
    #[arg(long)]
    variant_id: String,

    /// Product the variant belongs to
    #[arg(long)]
    product_id: String,

    /// Product title shown until the server confirms the line
    #[arg(long)]
    title: Option<String>,

    /// Variant title
    #[arg(long)]
    variant_title: Option<String>,

    /// Unit price in minor units, for the optimistic line
    #[arg(long)]
    unit_price: Option<u64>,

    /// Currency of `--unit-price`; the default currency when omitted
    #[arg(long, requires = "unit_price")]
    currency: Option<String>,

    /// Units to add
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Country used to price the line
    #[arg(long)]
    country_code: Option<String>,

    /// Line metadata as `key=value`; values are parsed as JSON when possible
    #[arg(long = "meta", value_parser = parse_meta)]
    meta: Vec<(String, Value)>,
}

impl AddArgs {
    fn to_request(&self, config: &AppConfig) -> Result<AddToCart, ConfigError> {
        let title = self.title.clone().unwrap_or_else(|| self.product_id.clone());
        let product = Product::new(self.product_id.as_str(), title.as_str());

        let mut variant = Variant::new(
            self.variant_id.as_str(),
            self.variant_title.clone().unwrap_or(title),
        );

        if let Some(amount) = self.unit_price {
            let code = self
                .currency
                .as_deref()
                .unwrap_or(&config.sync.default_currency_code);

            variant = variant.with_price(amount, currency(code)?);
        }

        let mut request = AddToCart::new(product, variant, self.quantity)
            .with_metadata(self.meta.iter().cloned().collect::<Metadata>());

        if let Some(country_code) = &self.country_code {
            request = request.with_country_code(country_code.to_lowercase());
        }

        Ok(request)
    }
}

pub(crate) async fn run(
    sync: &CartSynchronizer,
    args: AddArgs,
    config: &AppConfig,
) -> Result<(), AppError> {
    let request = args.to_request(config)?;

    match sync.optimistic_add(request).await {
        Ok(()) => info!(variant_id = %args.variant_id, "added to cart"),
        Err(error) => debug!("add settled with error: {error}"),
    }

    Ok(())
}

fn parse_meta(raw: &str) -> Result<(String, Value), String> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(format!("expected key=value, got `{raw}`"));
    };

    let key = key.trim();

    if key.is_empty() {
        return Err(format!("metadata key missing in `{raw}`"));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rusty_money::iso;
    use serde_json::json;
    use testresult::TestResult;

    use crate::cli::Cli;

    use super::*;

    fn parse_add(args: &[&str]) -> Result<(AddArgs, AppConfig), clap::Error> {
        let mut argv = vec!["cartsync", "--default-currency-code", "EUR", "add"];
        argv.extend_from_slice(args);

        let cli = Cli::try_parse_from(argv)?;

        match cli.command {
            super::super::Commands::Add(add) => Ok((add, cli.config)),
            _ => Err(clap::Error::new(clap::error::ErrorKind::InvalidSubcommand)),
        }
    }

    #[test]
    fn metadata_values_parse_as_json_or_text() -> TestResult {
        assert_eq!(parse_meta("gift=true")?, ("gift".to_string(), json!(true)));
        assert_eq!(parse_meta("qty=3")?, ("qty".to_string(), json!(3)));
        assert_eq!(
            parse_meta("note=hello there")?,
            ("note".to_string(), json!("hello there"))
        );

        Ok(())
    }

    #[test]
    fn metadata_requires_a_key() {
        assert!(parse_meta("=1").is_err(), "empty key accepted");
        assert!(parse_meta("gift").is_err(), "missing separator accepted");
    }

    #[test]
    fn builds_a_priced_request_in_the_default_currency() -> TestResult {
        let (args, config) = parse_add(&[
            "--variant-id",
            "var_1",
            "--product-id",
            "prod_1",
            "--title",
            "Scarf",
            "--unit-price",
            "2500",
            "--quantity",
            "2",
            "--country-code",
            "FR",
            "--meta",
            "gift=true",
        ])?;

        let request = args.to_request(&config)?;

        assert_eq!(request.product.title, "Scarf");
        assert_eq!(request.variant.currency(), Some(iso::EUR));
        assert_eq!(request.quantity, 2);
        assert_eq!(request.country_code.as_deref(), Some("fr"));
        assert_eq!(request.metadata, Metadata::new().with("gift", true));

        Ok(())
    }

    #[test]
    fn unpriced_request_has_no_calculated_price() -> TestResult {
        let (args, config) = parse_add(&["--variant-id", "var_1", "--product-id", "prod_1"])?;

        let request = args.to_request(&config)?;

        assert_eq!(request.variant.calculated_price, None);
        assert_eq!(request.product.title, "prod_1");
        assert_eq!(request.country_code, None);

        Ok(())
    }

    #[test]
    fn currency_without_price_is_rejected() {
        let parsed = parse_add(&[
            "--variant-id",
            "var_1",
            "--product-id",
            "prod_1",
            "--currency",
            "GBP",
        ]);

        assert!(parsed.is_err(), "currency accepted without a unit price");
    }
}
