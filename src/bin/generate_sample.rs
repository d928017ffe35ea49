use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use dashkit::data::model::DevelopmentOption;
use parquet::arrow::ArrowWriter;

/// Site 1 options: (name, BNG, habitat units, habitat cost £, share of total)
const SITE_1: [(&str, &str, f64, f64, &str); 5] = [
    ("Option A", "5%", 12.34, 50_000.0, "10%"),
    ("Option B", "10%", 14.10, 86_500.0, "12%"),
    ("Option C", "15%", 16.72, 142_000.0, "15%"),
    ("Option D", "20%", 18.05, 210_750.0, "18%"),
    ("Option E", "30%", 21.60, 325_000.0, "22%"),
];

fn sample_options() -> Vec<DevelopmentOption> {
    SITE_1
        .iter()
        .map(|&(name, bng, units, cost, pct)| DevelopmentOption {
            name: name.to_string(),
            bng: bng.to_string(),
            habitat_units: units,
            cost_of_habitats: cost,
            cost_percentage: pct.to_string(),
        })
        .collect()
}

fn write_csv(options: &[DevelopmentOption], path: &str) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for option in options {
        writer.serialize(option).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(options: &[DevelopmentOption], path: &str) -> anyhow::Result<()> {
    let text = |f: fn(&DevelopmentOption) -> &str| {
        StringArray::from(options.iter().map(f).collect::<Vec<_>>())
    };
    let number = |f: fn(&DevelopmentOption) -> f64| {
        Float64Array::from(options.iter().map(f).collect::<Vec<_>>())
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Option_Name", DataType::Utf8, false),
        Field::new("BNG", DataType::Utf8, false),
        Field::new("Habitat_Units", DataType::Float64, false),
        Field::new("Cost_of_Habitats", DataType::Float64, false),
        Field::new("Cost_Percentage", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text(|o| o.name.as_str())),
            Arc::new(text(|o| o.bng.as_str())),
            Arc::new(number(|o| o.habitat_units)),
            Arc::new(number(|o| o.cost_of_habitats)),
            Arc::new(text(|o| o.cost_percentage.as_str())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let options = sample_options();

    write_csv(&options, "economic_data.csv")?;
    write_parquet(&options, "economic_data.parquet")?;

    println!(
        "Wrote {} development options to economic_data.csv and economic_data.parquet",
        options.len()
    );
    Ok(())
}
