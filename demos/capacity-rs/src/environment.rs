use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sir_capacity::Parameters;

/// One parameter document: the model inputs plus an optional output target.
#[derive(Debug, Deserialize)]
pub struct Document {
    pub parameters: Parameters,
    #[serde(default)]
    pub output: Output,
}

#[derive(Debug, Default, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Where the parameters came from and where results go. Without an output
/// directory, tables stream to stdout.
pub struct Environment {
    pub parameters: Parameters,
    output_dir: Option<PathBuf>,
}

impl Environment {
    pub fn from_json(raw: &str) -> Result<Self> {
        let document: Document =
            serde_json::from_str(raw).context("failed to parse JSON parameter document")?;
        Ok(Self::from_document(document))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let document: Document =
            toml::from_str(raw).context("failed to parse TOML scenario")?;
        Ok(Self::from_document(document))
    }

    pub fn from_stdin() -> Result<Self> {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read stdin")?;
        anyhow::ensure!(!raw.trim().is_empty(), "no input on stdin");
        Self::from_json(&raw)
    }

    /// Load from the scenario file named on the command line, or JSON on
    /// stdin when no file is given.
    pub fn load() -> Result<Self> {
        match std::env::args().nth(1) {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read scenario file {path}"))?;
                Self::from_toml(&raw)
            }
            None => Self::from_stdin(),
        }
    }

    fn from_document(document: Document) -> Self {
        Self {
            parameters: document.parameters,
            output_dir: document.output.dir,
        }
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn write(&self, filename: &str, data: &[u8]) -> Result<()> {
        if let Some(dir) = self.output_dir() {
            fs::create_dir_all(dir).context("failed to create output directory")?;
            fs::write(dir.join(filename), data)
                .with_context(|| format!("failed to write {filename}"))?;
        } else {
            io::stdout()
                .write_all(data)
                .context("failed to write to stdout")?;
        }
        Ok(())
    }

    pub fn write_csv(&self, filename: &str, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
        if let Some(dir) = self.output_dir() {
            fs::create_dir_all(dir).context("failed to create output directory")?;
            let file = fs::File::create(dir.join(filename))
                .with_context(|| format!("failed to create {filename}"))?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(headers)?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        } else {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(headers)?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_JSON: &str = r#"{
        "parameters": {
            "population": 1000000.0,
            "current_hospitalized": 10.0,
            "market_share": 0.15,
            "current_date": "2020-03-28",
            "doubling_time": 4.0,
            "relative_contact_rate": 0.3,
            "infectious_days": 14.0,
            "n_days": 60,
            "dispositions": {
                "hospitalized": { "rate": 0.025, "length_of_stay": 7 }
            }
        },
        "output": { "dir": "/tmp/capacity-output" }
    }"#;

    #[test]
    fn parses_a_json_document() {
        let env = Environment::from_json(SCENARIO_JSON).unwrap();
        assert_eq!(env.parameters.population, 1_000_000.0);
        assert_eq!(env.parameters.doubling_time, Some(4.0));
        assert_eq!(env.parameters.date_first_hospitalized, None);
        assert_eq!(
            env.parameters.dispositions["hospitalized"].length_of_stay,
            7
        );
        assert_eq!(
            env.output_dir(),
            Some(Path::new("/tmp/capacity-output"))
        );
    }

    #[test]
    fn parses_a_toml_scenario() {
        let raw = r#"
            [parameters]
            population = 1000000.0
            current_hospitalized = 10.0
            market_share = 0.15
            current_date = "2020-03-28"
            date_first_hospitalized = "2020-03-18"
            relative_contact_rate = 0.3
            infectious_days = 14.0
            n_days = 60

            [parameters.dispositions.hospitalized]
            rate = 0.025
            length_of_stay = 7
        "#;
        let env = Environment::from_toml(raw).unwrap();
        assert_eq!(env.parameters.doubling_time, None);
        assert!(env.parameters.date_first_hospitalized.is_some());
        assert_eq!(env.output_dir(), None);
    }

    #[test]
    fn missing_required_fields_fail() {
        let err = Environment::from_json(r#"{ "parameters": { "population": 1.0 } }"#);
        assert!(err.is_err());
    }

    #[test]
    fn writes_csv_into_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = Environment::from_json(SCENARIO_JSON).unwrap();
        env.output_dir = Some(dir.path().join("results"));

        env.write_csv(
            "census.csv",
            &["day", "hospitalized"],
            &[
                vec!["1".to_string(), "3".to_string()],
                vec!["2".to_string(), "6".to_string()],
            ],
        )
        .unwrap();

        let written = fs::read_to_string(dir.path().join("results/census.csv")).unwrap();
        assert_eq!(written, "day,hospitalized\n1,3\n2,6\n");
    }
}
