use std::collections::BTreeSet;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Record – one transaction row
// ---------------------------------------------------------------------------

/// A single e-commerce transaction (one row of the source table).
///
/// Serde names follow the column headers of the analytics export; the
/// JSON loader goes through them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    /// Sale price in INR.
    #[serde(rename = "Price")]
    pub price: f64,
    /// Opaque customer key; numeric IDs are kept as text.
    #[serde(rename = "Customer_ID", deserialize_with = "deserialize_key")]
    pub customer_id: String,
    /// Minutes spent browsing before the cart event.
    #[serde(rename = "Browsing_Time_mins")]
    pub browsing_time_mins: f64,
    #[serde(rename = "Cart_Abandonment_Flag", deserialize_with = "deserialize_flag")]
    pub cart_abandoned: bool,
    #[serde(rename = "Product_Category")]
    pub product_category: String,
    #[serde(rename = "Discount_Applied")]
    pub discount_applied: f64,
    #[serde(rename = "Loyalty_Points_Earned")]
    pub loyalty_points: f64,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Payment_Method")]
    pub payment_method: String,
}

impl Record {
    /// The abandonment flag as the 0/1 value the aggregates work with.
    pub fn abandonment_value(&self) -> f64 {
        if self.cart_abandoned {
            1.0
        } else {
            0.0
        }
    }
}

// -- Lenient cell decoding shared by the CSV, JSON and Parquet paths --

/// Interpret a textual flag cell: `0`/`1`, `true`/`false` (any case).
pub fn parse_flag(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    s.parse::<f64>().ok().map(|v| v != 0.0)
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a 0/1 or true/false flag")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
            Ok(v != 0.0)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            parse_flag(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

fn deserialize_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct KeyVisitor;

    impl Visitor<'_> for KeyVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a customer identifier")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(KeyVisitor)
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// All loaded transactions plus the facet values observed in them.
/// Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Sorted distinct `City` values.
    pub cities: BTreeSet<String>,
    /// Sorted distinct `Gender` values.
    pub genders: BTreeSet<String>,
}

impl Dataset {
    /// Build the facet indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let cities = records.iter().map(|r| r.city.clone()).collect();
        let genders = records.iter().map(|r| r.gender.clone()).collect();
        Dataset {
            records,
            cities,
            genders,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::three_rows;
    use super::*;

    #[test]
    fn facets_are_sorted_and_distinct() {
        let ds = three_rows();
        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.cities.iter().cloned().collect::<Vec<_>>(),
            vec!["Delhi", "Mumbai"]
        );
        assert_eq!(
            ds.genders.iter().cloned().collect::<Vec<_>>(),
            vec!["F", "M"]
        );
    }

    #[test]
    fn flag_text_forms() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(" True "), Some(true));
        assert_eq!(parse_flag("FALSE"), Some(false));
        assert_eq!(parse_flag("1.0"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn json_record_accepts_numeric_id_and_bool_flag() {
        let json = r#"{
            "City": "Pune", "Gender": "F", "Price": 499.0, "Customer_ID": 1042,
            "Browsing_Time_mins": 12.5, "Cart_Abandonment_Flag": true,
            "Product_Category": "Footwear", "Discount_Applied": 50.0,
            "Loyalty_Points_Earned": 20.0, "Age": 27, "Payment_Method": "Card",
            "Extra_Column": "ignored"
        }"#;
        let rec: Record = serde_json::from_str(json).unwrap();
        assert_eq!(rec.customer_id, "1042");
        assert!(rec.cart_abandoned);
        assert_eq!(rec.abandonment_value(), 1.0);
        assert_eq!(rec.age, 27);
    }

    #[test]
    fn empty_dataset() {
        let ds = Dataset::from_records(Vec::new());
        assert!(ds.is_empty());
        assert!(ds.cities.is_empty());
    }
}
