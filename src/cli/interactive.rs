use super::ui::{self, StyleType};
use crate::core::investment::{Field, parse_date};
use crate::core::{InvestmentCalculator, InvestmentRequest, Outcome};
use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use tracing::debug;

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "{}: ", ui::style_text(label, StyleType::Prompt))?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("Input closed before {} was entered", label.to_lowercase());
    }
    Ok(line.trim().to_string())
}

/// Asks for the investment parameters, one line each.
pub fn prompt_request<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<InvestmentRequest> {
    let ticker = prompt(input, output, "Ticker symbol")?;
    let start_date = prompt(input, output, "Start date (YYYY-MM-DD)")?;
    let shares = prompt(input, output, "Number of shares")?;
    let starting_balance = prompt(input, output, "Starting balance")?;
    let end_date = prompt(input, output, "End date (YYYY-MM-DD, blank for latest)")?;

    let request = InvestmentRequest::parse(&ticker, &start_date, &shares, &starting_balance)?;
    if end_date.is_empty() {
        return Ok(request);
    }
    Ok(request.with_end_date(parse_date(&end_date, Field::EndDate)?))
}

pub fn render_outcome(ticker: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::InsufficientFunds {
            start_date,
            start_price,
            required,
            available,
        } => {
            let headline = ui::style_text("Insufficient funds", StyleType::Error);
            let detail = ui::style_text(
                &format!(
                    "{ticker} closed at {start_price:.2} on {start_date}; the purchase needs {required:.2} but the balance is {available:.2}"
                ),
                StyleType::Subtle,
            );
            format!("{headline}\n{detail}")
        }
        Outcome::Completed(valuation) => {
            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell(""),
                ui::header_cell("Date"),
                ui::header_cell("Close"),
                ui::header_cell("Value"),
            ]);
            table.add_row(vec![
                ui::label_cell("Start"),
                comfy_table::Cell::new(valuation.start_date),
                ui::amount_cell(valuation.start_price),
                ui::amount_cell(valuation.result.initial_investment),
            ]);
            table.add_row(vec![
                ui::label_cell("End"),
                comfy_table::Cell::new(valuation.end_date),
                ui::amount_cell(valuation.end_price),
                ui::amount_cell(valuation.result.final_investment),
            ]);
            table.add_row(vec![
                ui::label_cell("Profit/Loss"),
                comfy_table::Cell::new(""),
                comfy_table::Cell::new(""),
                ui::change_cell(valuation.result.profit()),
            ]);
            table.add_row(vec![
                ui::label_cell("New balance"),
                comfy_table::Cell::new(""),
                comfy_table::Cell::new(""),
                ui::amount_cell(valuation.result.new_balance),
            ]);

            format!("{}\n{table}", ui::style_text(ticker, StyleType::Title))
        }
    }
}

/// Interactive console session. The first fetch failure ends the command.
pub async fn run(calculator: &InvestmentCalculator) -> Result<()> {
    let request = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        prompt_request(&mut input, &mut output)?
    };
    debug!(?request, "Collected request");

    let pb = ui::new_spinner(&format!("Fetching prices for {}", request.ticker));
    let result = calculator.compute(&request).await;
    pb.finish_and_clear();

    let outcome = result?;
    println!("{}", render_outcome(&request.ticker, &outcome));
    Ok(())
}
