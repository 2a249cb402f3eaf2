//! Writes a synthetic transaction table for trying the dashboard.
//!
//! ```text
//! cargo run --bin generate_sample [OUTPUT.csv|OUTPUT.parquet] [ROWS]
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const CITIES: [&str; 6] = ["Delhi", "Mumbai", "Bangalore", "Chennai", "Kolkata", "Pune"];
const GENDERS: [&str; 2] = ["Male", "Female"];
const PAYMENT_METHODS: [&str; 5] = ["UPI", "Credit Card", "Debit Card", "Net Banking", "COD"];
/// (category, typical price in INR)
const CATEGORIES: [(&str, f64); 6] = [
    ("Tops", 799.0),
    ("Jeans", 1499.0),
    ("Footwear", 2199.0),
    ("Ethnic Wear", 2599.0),
    ("Accessories", 499.0),
    ("Sportswear", 1299.0),
];

#[derive(Debug, Serialize)]
struct Row {
    #[serde(rename = "Customer_ID")]
    customer_id: String,
    #[serde(rename = "Age")]
    age: i64,
    #[serde(rename = "Gender")]
    gender: &'static str,
    #[serde(rename = "City")]
    city: &'static str,
    #[serde(rename = "Product_Category")]
    category: &'static str,
    #[serde(rename = "Price")]
    price: f64,
    #[serde(rename = "Discount_Applied")]
    discount: f64,
    #[serde(rename = "Payment_Method")]
    payment_method: &'static str,
    #[serde(rename = "Browsing_Time_mins")]
    browsing_time: f64,
    #[serde(rename = "Cart_Abandonment_Flag")]
    abandoned: u8,
    #[serde(rename = "Loyalty_Points_Earned")]
    loyalty_points: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.below(items.len())]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn generate(rows: usize, rng: &mut SimpleRng) -> Vec<Row> {
    // Roughly one returning customer per three transactions.
    let customers = (rows / 3).max(1);

    (0..rows)
        .map(|_| {
            let (category, base_price) = rng.pick(&CATEGORIES);
            let price = round2(rng.gauss(base_price, base_price * 0.25).max(99.0));
            let discount = round2(price * rng.pick(&[0.0, 0.05, 0.1, 0.2, 0.3]));
            let age = rng.gauss(32.0, 9.0).clamp(18.0, 65.0).round() as i64;
            let browsing_time = round2(rng.gauss(18.0, 8.0).max(0.5));

            // Younger shoppers and short sessions abandon more often.
            let p_abandon =
                (0.55 - (age as f64 - 18.0) * 0.006 - browsing_time * 0.004).clamp(0.05, 0.9);
            let abandoned = rng.next_f64() < p_abandon;
            let loyalty_points = if abandoned {
                0.0
            } else {
                round2(price * 0.02 + discount * 0.1)
            };

            Row {
                customer_id: format!("C{:05}", rng.below(customers) + 1),
                age,
                gender: rng.pick(&GENDERS),
                city: rng.pick(&CITIES),
                category,
                price,
                discount,
                payment_method: rng.pick(&PAYMENT_METHODS),
                browsing_time,
                abandoned: u8::from(abandoned),
                loyalty_points,
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let number = |f: fn(&Row) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Customer_ID", DataType::Utf8, false),
        Field::new("Age", DataType::Int64, false),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("City", DataType::Utf8, false),
        Field::new("Product_Category", DataType::Utf8, false),
        Field::new("Price", DataType::Float64, false),
        Field::new("Discount_Applied", DataType::Float64, false),
        Field::new("Payment_Method", DataType::Utf8, false),
        Field::new("Browsing_Time_mins", DataType::Float64, false),
        Field::new("Cart_Abandonment_Flag", DataType::Boolean, false),
        Field::new("Loyalty_Points_Earned", DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        text(|r| r.customer_id.as_str()),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.age).collect::<Vec<_>>())),
        text(|r| r.gender),
        text(|r| r.city),
        text(|r| r.category),
        number(|r| r.price),
        number(|r| r.discount),
        text(|r| r.payment_method),
        number(|r| r.browsing_time),
        Arc::new(BooleanArray::from(
            rows.iter().map(|r| r.abandoned == 1).collect::<Vec<_>>(),
        )),
        number(|r| r.loyalty_points),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output = args
        .next()
        .unwrap_or_else(|| "Myntra_Analytics_Dataset.csv".to_string());
    let rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count '{n}'"))?,
        None => 5000,
    };

    let mut rng = SimpleRng::new(42);
    let data = generate(rows, &mut rng);

    let path = Path::new(&output);
    if output.ends_with(".parquet") {
        write_parquet(path, &data)?;
    } else {
        write_csv(path, &data)?;
    }

    println!("Wrote {} transactions to {output}", data.len());
    Ok(())
}
