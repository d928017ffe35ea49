use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DevelopmentOption, OptionTable};

const NAME: &str = "Option_Name";
const BNG: &str = "BNG";
const HABITAT_UNITS: &str = "Habitat_Units";
const COST: &str = "Cost_of_Habitats";
const COST_PERCENTAGE: &str = "Cost_Percentage";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the option table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `Option_Name,BNG,Habitat_Units,Cost_of_Habitats,Cost_Percentage`
/// * `.json`    – `[{ "Option_Name": "...", "BNG": ..., ... }, ...]`
/// * `.parquet` – one column per field, string or numeric
pub fn load_file(path: &Path) -> Result<OptionTable> {
    if !path.exists() {
        bail!(
            "'{}' not found. Please make sure the data file exists or pass its path \
             as the first argument.",
            path.display()
        );
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let options = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    OptionTable::new(options).with_context(|| format!("validating {}", path.display()))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<DevelopmentOption>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;
    read_csv_records(&mut reader)
}

fn read_csv_records<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
) -> Result<Vec<DevelopmentOption>> {
    reader
        .deserialize::<DevelopmentOption>()
        .enumerate()
        .map(|(row_no, record)| record.with_context(|| format!("CSV row {}", row_no + 1)))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`).  `BNG` and
/// `Cost_Percentage` may be numbers or strings.
fn load_json(path: &Path) -> Result<Vec<DevelopmentOption>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<Vec<DevelopmentOption>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            let text_field = |key: &str| -> Result<String> {
                match obj.get(key) {
                    Some(JsonValue::String(s)) => Ok(s.clone()),
                    Some(JsonValue::Number(n)) => Ok(n.to_string()),
                    _ => bail!("Row {i}: missing or invalid '{key}'"),
                }
            };
            let number_field = |key: &str| -> Result<f64> {
                obj.get(key)
                    .and_then(json_as_f64)
                    .with_context(|| format!("Row {i}: '{key}' is not a number"))
            };
            Ok(DevelopmentOption {
                name: text_field(NAME)?,
                bng: text_field(BNG)?,
                habitat_units: number_field(HABITAT_UNITS)?,
                cost_of_habitats: number_field(COST)?,
                cost_percentage: text_field(COST_PERCENTAGE)?,
            })
        })
        .collect()
}

fn json_as_f64(val: &JsonValue) -> Option<f64> {
    match val {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
fn load_parquet(path: &Path) -> Result<Vec<DevelopmentOption>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut options = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        options.extend(options_from_batch(&batch)?);
    }
    Ok(options)
}

fn options_from_batch(batch: &RecordBatch) -> Result<Vec<DevelopmentOption>> {
    let name_col = column(batch, NAME)?;
    let bng_col = column(batch, BNG)?;
    let units_col = column(batch, HABITAT_UNITS)?;
    let cost_col = column(batch, COST)?;
    let pct_col = column(batch, COST_PERCENTAGE)?;

    (0..batch.num_rows())
        .map(|row| {
            Ok(DevelopmentOption {
                name: cell_to_string(name_col, row)
                    .with_context(|| format!("Row {row}: failed to read '{NAME}'"))?,
                bng: cell_to_string(bng_col, row)
                    .with_context(|| format!("Row {row}: failed to read '{BNG}'"))?,
                habitat_units: cell_to_f64(units_col, row)
                    .with_context(|| format!("Row {row}: failed to read '{HABITAT_UNITS}'"))?,
                cost_of_habitats: cell_to_f64(cost_col, row)
                    .with_context(|| format!("Row {row}: failed to read '{COST}'"))?,
                cost_percentage: cell_to_string(pct_col, row)
                    .with_context(|| format!("Row {row}: failed to read '{COST_PERCENTAGE}'"))?,
            })
        })
        .collect()
}

// -- Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

fn cell_to_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        _ => cell_to_f64(col, row).map(|v| v.to_string()),
    }
}

fn cell_to_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value");
    }
    let value = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row) as f64,
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row) as f64,
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row) as f64,
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = cell_to_string(col, row)?;
            text.trim()
                .parse()
                .with_context(|| format!("'{text}' is not a number"))?
        }
        other => bail!("Unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_CSV: &str = "\
Option_Name,BNG,Habitat_Units,Cost_of_Habitats,Cost_Percentage
Option A,5%,12.34,50000,10%
Option B,12%,20.5,125000.5,15%
";

    fn temp_with(suffix: &str, contents: &str) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn csv_rows_become_options() {
        let path = temp_with(".csv", SAMPLE_CSV);
        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        let a = table.select("Option A").unwrap();
        assert_eq!(a.bng, "5%");
        assert_eq!(a.habitat_units, 12.34);
        assert_eq!(a.cost_of_habitats, 50_000.0);
        assert_eq!(a.cost_percentage, "10%");
    }

    #[test]
    fn json_accepts_numeric_bng() {
        let path = temp_with(
            ".json",
            r#"[{"Option_Name":"Option A","BNG":5,"Habitat_Units":12.34,
                "Cost_of_Habitats":50000,"Cost_Percentage":"10%"}]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.first().bng, "5");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_file(Path::new("/definitely/not/here/economic_data.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn duplicate_rows_fail_validation() {
        let path = temp_with(
            ".csv",
            "Option_Name,BNG,Habitat_Units,Cost_of_Habitats,Cost_Percentage\n\
             A,1%,1,1,1%\nA,2%,2,2,2%\n",
        );
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate option name 'A'"));
    }

    #[test]
    fn bad_number_names_the_row() {
        let path = temp_with(
            ".csv",
            "Option_Name,BNG,Habitat_Units,Cost_of_Habitats,Cost_Percentage\n\
             A,1%,lots,1,1%\n",
        );
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"));
    }

    #[test]
    fn parquet_columns_of_mixed_types_load() {
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new(NAME, DataType::Utf8, false),
            Field::new(BNG, DataType::Float64, false),
            Field::new(HABITAT_UNITS, DataType::Float32, false),
            Field::new(COST, DataType::Int64, false),
            Field::new(COST_PERCENTAGE, DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Option A", "Option B"])),
                Arc::new(Float64Array::from(vec![5.0, 12.5])),
                Arc::new(Float32Array::from(vec![12.5_f32, 20.25])),
                Arc::new(Int64Array::from(vec![50_000_i64, 125_000])),
                Arc::new(StringArray::from(vec!["10%", "15%"])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        let b = table.select("Option B").unwrap();
        assert_eq!(b.bng, "12.5");
        assert_eq!(b.habitat_units, 20.25);
        assert_eq!(b.cost_of_habitats, 125_000.0);
        assert_eq!(b.cost_percentage, "15%");
        assert_eq!(table.first().bng, "5");
    }

    #[test]
    fn parquet_without_a_required_column_is_rejected() {
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![Field::new(NAME, DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["Option A"]))],
        )
        .unwrap();
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'BNG' column"));
    }

    #[test]
    fn non_finite_costs_load_but_never_chart() {
        use crate::data::cost::{CostBreakdown, ValidationError};

        let path = temp_with(
            ".csv",
            "Option_Name,BNG,Habitat_Units,Cost_of_Habitats,Cost_Percentage\n\
             N,1%,1,NaN,10%\nI,1%,1,inf,10%\nH,1%,1,1e308,0.5%\n",
        );
        let table = load_file(&path).unwrap();
        for option in table.options() {
            let err = CostBreakdown::derive(option).unwrap_err();
            assert!(
                matches!(
                    err,
                    ValidationError::InvalidCost { .. } | ValidationError::TotalOverflow { .. }
                ),
                "{} gave {err:?}",
                option.name
            );
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "whatever").unwrap();
        let path = file.into_temp_path();
        assert!(load_file(&path).is_err());
    }
}
