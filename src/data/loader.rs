use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{parse_flag, Dataset, Record};

/// Column headers of the analytics export, in [`Record`] field order.
pub const COLUMNS: [&str; 11] = [
    "City",
    "Gender",
    "Price",
    "Customer_ID",
    "Browsing_Time_mins",
    "Cart_Abandonment_Flag",
    "Product_Category",
    "Discount_Applied",
    "Loyalty_Points_Earned",
    "Age",
    "Payment_Method",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the transaction table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the [`COLUMNS`] names (extra columns ignored)
/// * `.parquet` – same column names, scalar columns
/// * `.json`    – `[{ "City": "...", "Price": 499.0, ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading dataset from {}", path.display()))?;

    log::info!(
        "Loaded {} records ({} cities, {} genders) from {}",
        dataset.len(),
        dataset.cities.len(),
        dataset.genders.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Cells are read by header position so identifiers keep their exact text
/// (leading zeros included) and flags accept both `0/1` and `true/false`.
fn load_csv(path: &Path) -> Result<Dataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Dataset> {
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let mut idx = [0usize; COLUMNS.len()];
    for (slot, name) in idx.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("CSV missing '{name}' column"))?;
    }

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |i: usize| row.get(idx[i]).unwrap_or("").trim();

        let number = |i: usize| -> Result<f64> {
            cell(i).parse::<f64>().with_context(|| {
                format!("Row {row_no}, {}: '{}' is not a number", COLUMNS[i], cell(i))
            })
        };

        let cart_abandoned = parse_flag(cell(5)).with_context(|| {
            format!("Row {row_no}, {}: '{}' is not a flag", COLUMNS[5], cell(5))
        })?;

        records.push(Record {
            city: cell(0).to_string(),
            gender: cell(1).to_string(),
            price: number(2)?,
            customer_id: cell(3).to_string(),
            browsing_time_mins: number(4)?,
            cart_abandoned,
            product_category: cell(6).to_string(),
            discount_applied: number(7)?,
            loyalty_points: number(8)?,
            age: to_age(number(9)?).with_context(|| format!("Row {row_no}"))?,
            payment_method: cell(10).to_string(),
        });
    }

    Ok(Dataset::from_records(records))
}

fn to_age(value: f64) -> Result<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        bail!("Age {value} is not a whole number of years");
    }
    Ok(value as u32)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<Record> = serde_json::from_str(&text).context("parsing JSON records")?;
    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per [`COLUMNS`] entry.
///
/// Numeric columns may be any of Int32/Int64/Float32/Float64; the flag
/// column may be Boolean or integer; `Customer_ID` may be text or integer.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let mut cols: Vec<&Arc<dyn Array>> = Vec::with_capacity(COLUMNS.len());
        for name in COLUMNS {
            let i = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            cols.push(batch.column(i));
        }

        for row in 0..batch.num_rows() {
            let ctx = |i: usize| format!("Row {row}, {}", COLUMNS[i]);
            let age = cell_f64(cols[9], row).with_context(|| ctx(9))?;

            records.push(Record {
                city: cell_text(cols[0], row).with_context(|| ctx(0))?,
                gender: cell_text(cols[1], row).with_context(|| ctx(1))?,
                price: cell_f64(cols[2], row).with_context(|| ctx(2))?,
                customer_id: cell_text(cols[3], row).with_context(|| ctx(3))?,
                browsing_time_mins: cell_f64(cols[4], row).with_context(|| ctx(4))?,
                cart_abandoned: cell_flag(cols[5], row).with_context(|| ctx(5))?,
                product_category: cell_text(cols[6], row).with_context(|| ctx(6))?,
                discount_applied: cell_f64(cols[7], row).with_context(|| ctx(7))?,
                loyalty_points: cell_f64(cols[8], row).with_context(|| ctx(8))?,
                age: to_age(age).with_context(|| ctx(9))?,
                payment_method: cell_text(cols[10], row).with_context(|| ctx(10))?,
            });
        }
    }

    Ok(Dataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn downcast<T: 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array for {:?}", col.data_type()))
}

/// Extract a text cell; integer columns are rendered as their decimal text.
fn cell_text(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => Ok(downcast::<LargeStringArray>(col)?.value(row).to_string()),
        DataType::Int32 => Ok(downcast::<Int32Array>(col)?.value(row).to_string()),
        DataType::Int64 => Ok(downcast::<Int64Array>(col)?.value(row).to_string()),
        other => bail!("expected a text column, got {other:?}"),
    }
}

fn cell_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Float64 => Ok(downcast::<Float64Array>(col)?.value(row)),
        DataType::Float32 => Ok(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Int32 => Ok(downcast::<Int32Array>(col)?.value(row) as f64),
        DataType::Int64 => Ok(downcast::<Int64Array>(col)?.value(row) as f64),
        other => bail!("expected a numeric column, got {other:?}"),
    }
}

fn cell_flag(col: &Arc<dyn Array>, row: usize) -> Result<bool> {
    match col.data_type() {
        DataType::Boolean => {
            if col.is_null(row) {
                bail!("null value");
            }
            Ok(downcast::<BooleanArray>(col)?.value(row))
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = cell_text(col, row)?;
            parse_flag(&text).with_context(|| format!("'{text}' is not a flag"))
        }
        _ => Ok(cell_f64(col, row)? != 0.0),
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::ArrayRef;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "Customer_ID,Age,Gender,City,Product_Category,Price,Discount_Applied,\
Payment_Method,Browsing_Time_mins,Cart_Abandonment_Flag,Loyalty_Points_Earned,Rating\n";

    fn csv_reader(body: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(body.as_bytes())
    }

    #[test]
    fn csv_columns_are_found_by_name() {
        let text = format!(
            "{HEADER}007,34,F,Delhi,Tops,1200.5,100,UPI,12.5,1,40,4\n\
             C-9,51,M,Mumbai,Footwear,800,0,Card,3,false,8,5\n"
        );
        let ds = read_csv(csv_reader(&text)).unwrap();
        assert_eq!(ds.len(), 2);

        let first = &ds.records[0];
        assert_eq!(first.customer_id, "007");
        assert_eq!(first.city, "Delhi");
        assert_eq!(first.price, 1200.5);
        assert!(first.cart_abandoned);
        assert_eq!(first.age, 34);
        assert_eq!(first.loyalty_points, 40.0);

        let second = &ds.records[1];
        assert!(!second.cart_abandoned);
        assert_eq!(second.payment_method, "Card");
    }

    #[test]
    fn csv_missing_column_is_an_error() {
        let err = read_csv(csv_reader("City,Gender\nDelhi,F\n")).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'Price' column"));
    }

    #[test]
    fn csv_bad_number_reports_row() {
        let text = format!("{HEADER}1,34,F,Delhi,Tops,abc,0,UPI,1,0,0,0\n");
        let err = read_csv(csv_reader(&text)).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Row 0"), "{msg}");
        assert!(msg.contains("Price"), "{msg}");
    }

    #[test]
    fn fractional_age_is_rejected() {
        assert!(to_age(33.5).is_err());
        assert!(to_age(-1.0).is_err());
        assert_eq!(to_age(42.0).unwrap(), 42);
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("data.csv");
        std::fs::write(&csv_path, format!("{HEADER}1,20,M,Pune,Tops,10,0,UPI,1,0,0,0\n")).unwrap();
        assert_eq!(load_file(&csv_path).unwrap().len(), 1);

        let json_path = dir.path().join("data.json");
        std::fs::write(
            &json_path,
            r#"[{"City":"Pune","Gender":"M","Price":10,"Customer_ID":"1",
                "Browsing_Time_mins":1,"Cart_Abandonment_Flag":0,
                "Product_Category":"Tops","Discount_Applied":0,
                "Loyalty_Points_Earned":0,"Age":20,"Payment_Method":"UPI"}]"#,
        )
        .unwrap();
        let ds = load_file(&json_path).unwrap();
        assert_eq!(ds.records[0].price, 10.0);

        let err = load_file(&dir.path().join("data.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    fn parquet_columns(city: StringArray) -> Vec<(&'static str, ArrayRef)> {
        vec![
            ("City", Arc::new(city) as ArrayRef),
            ("Gender", Arc::new(StringArray::from(vec!["M", "F"]))),
            ("Price", Arc::new(Float64Array::from(vec![1200.5, 300.0]))),
            ("Customer_ID", Arc::new(Int64Array::from(vec![7, 8]))),
            ("Browsing_Time_mins", Arc::new(Float32Array::from(vec![12.5, 3.0]))),
            ("Cart_Abandonment_Flag", Arc::new(BooleanArray::from(vec![true, false]))),
            ("Product_Category", Arc::new(StringArray::from(vec!["Tops", "Jeans"]))),
            ("Discount_Applied", Arc::new(Float64Array::from(vec![100.0, 0.0]))),
            ("Loyalty_Points_Earned", Arc::new(Int32Array::from(vec![40, 0]))),
            ("Age", Arc::new(Int64Array::from(vec![30, 41]))),
            ("Payment_Method", Arc::new(StringArray::from(vec!["UPI", "Card"]))),
        ]
    }

    fn write_parquet(path: &Path, columns: Vec<(&'static str, ArrayRef)>) {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn parquet_records_load_through_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        write_parquet(&path, parquet_columns(StringArray::from(vec!["Delhi", "Pune"])));

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);

        let first = &ds.records[0];
        assert_eq!(first.customer_id, "7");
        assert!(first.cart_abandoned);
        assert_eq!(first.city, "Delhi");
        assert_eq!(first.price, 1200.5);
        assert_eq!(first.browsing_time_mins, 12.5);
        assert_eq!(first.loyalty_points, 40.0);
        assert_eq!(first.age, 30);

        let second = &ds.records[1];
        assert_eq!(second.customer_id, "8");
        assert!(!second.cart_abandoned);
        assert_eq!(second.payment_method, "Card");

        // `.pq` goes down the same path.
        let pq_path = dir.path().join("data.pq");
        std::fs::copy(&path, &pq_path).unwrap();
        assert_eq!(load_file(&pq_path).unwrap().len(), 2);
    }

    #[test]
    fn parquet_missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        let mut columns = parquet_columns(StringArray::from(vec!["Delhi", "Pune"]));
        columns.retain(|(name, _)| *name != "Payment_Method");
        write_parquet(&path, columns);

        let err = load_file(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("missing 'Payment_Method' column"), "{msg}");
    }

    #[test]
    fn parquet_null_cell_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        write_parquet(&path, parquet_columns(StringArray::from(vec![Some("Delhi"), None])));

        let err = load_file(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Row 1, City"), "{msg}");
        assert!(msg.contains("null value"), "{msg}");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("absent.csv")).is_err());
    }
}
