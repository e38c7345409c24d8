use super::ui;
use crate::core::money::BASE_CURRENCY;
use crate::core::rates::RateSet;
use crate::service::RateService;
use anyhow::Result;
use comfy_table::Cell;

impl RateSet {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell(&format!("Per 1 {BASE_CURRENCY}")),
            ui::header_cell(&format!("{BASE_CURRENCY} per unit")),
        ]);

        for (code, rate) in self.iter() {
            table.add_row(vec![
                Cell::new(code),
                ui::number_cell(rate, 4),
                ui::number_cell(1.0 / rate, 6),
            ]);
        }

        let mut output = format!(
            "Reference date: {}\n\n",
            ui::style_text(&self.reference_date().to_string(), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!("{} currencies quoted against {BASE_CURRENCY}", self.len()),
                ui::StyleType::Subtle
            )
        ));
        output
    }
}

pub async fn run(service: &RateService, reference_date: Option<&str>) -> Result<()> {
    let spinner = ui::new_spinner("Loading rates...");
    let rates = service.rates_for(reference_date).await;
    spinner.finish_and_clear();

    println!("{}", rates?.display_as_table());
    Ok(())
}

pub async fn list_dates(service: &RateService) -> Result<()> {
    let dates = service.available_dates().await?;
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Reference date")]);
    for date in &dates {
        table.add_row(vec![Cell::new(date)]);
    }
    println!("{table}");
    Ok(())
}
