use super::ui;
use crate::core::converter::ConversionResult;
use crate::service::{ConversionRequest, RateService};
use anyhow::Result;

pub fn format_result(result: &ConversionResult) -> String {
    format!(
        "{} {}",
        ui::style_text(&result.amount.to_string(), ui::StyleType::TotalValue),
        ui::style_text(&result.currency, ui::StyleType::TotalLabel)
    )
}

pub async fn run(service: &RateService, request: &ConversionRequest, json: bool) -> Result<()> {
    let spinner = ui::new_spinner("Loading rates...");
    let result = service.convert(request).await;
    spinner.finish_and_clear();

    let result = result?;
    if json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("{}", format_result(&result));
    }
    Ok(())
}
