pub mod environment;

use anyhow::Result;
use serde_json::json;
use sir_capacity::{CategoryTable, LogSink, SirModel};

use environment::Environment;

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new().env().init()?;

    let env = Environment::load()?;
    let model = SirModel::simulate_with(&env.parameters, &LogSink)?;

    env.write_csv(
        "sim_sir.csv",
        &["day", "date", "susceptible", "infected", "recovered"],
        &trajectory_rows(&model),
    )?;
    write_category_table(&env, "dispositions.csv", &model.dispositions, model.dispositions.len())?;
    write_category_table(&env, "admissions.csv", &model.admissions, model.admissions.len())?;
    write_category_table(&env, "census.csv", &model.census, model.census.complete_len())?;

    let rates = json!({
        "rates": model.rates,
        "outcome": model.outcome,
        "anchor_state": {
            "susceptible": model.susceptible,
            "infected": model.infected,
            "recovered": model.recovered,
        },
    });
    env.write("rates.json", serde_json::to_string_pretty(&rates)?.as_bytes())?;

    Ok(())
}

fn trajectory_rows(model: &SirModel) -> Vec<Vec<String>> {
    (0..model.trajectory.len())
        .map(|row| {
            vec![
                model.trajectory.day[row].to_string(),
                model.trajectory.date[row].to_string(),
                model.trajectory.susceptible[row].to_string(),
                model.trajectory.infected[row].to_string(),
                model.trajectory.recovered[row].to_string(),
            ]
        })
        .collect()
}

/// Census columns can be shorter than the table; `rows` caps the output to
/// fully defined rows.
fn write_category_table(
    env: &Environment,
    filename: &str,
    table: &CategoryTable,
    rows: usize,
) -> Result<()> {
    let mut headers = vec!["day".to_string(), "date".to_string()];
    headers.extend(table.columns.keys().cloned());
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();

    let body: Vec<Vec<String>> = (0..rows)
        .map(|row| {
            let mut record = vec![table.day[row].to_string(), table.date[row].to_string()];
            for column in table.columns.values() {
                record.push(column[row].to_string());
            }
            record
        })
        .collect();

    env.write_csv(filename, &header_refs, &body)
}
