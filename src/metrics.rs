//! Aggregate statistics over a [`FilteredView`].

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::data::filter::FilteredView;

/// Placeholder shown for statistics that are undefined on an empty view.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeAbandonment {
    pub age: u32,
    /// Percentage of carts abandoned by customers of this age.
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentCount {
    pub method: String,
    pub count: usize,
}

/// Everything the dashboard derives from one filtered view.
///
/// `avg_browsing_time` and `abandonment_rate` are `None` when the view is
/// empty; the UI and the narrative prompt render that as [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub row_count: usize,
    pub total_sales: f64,
    pub total_customers: usize,
    pub avg_browsing_time: Option<f64>,
    /// Percentage in `[0, 100]`.
    pub abandonment_rate: Option<f64>,
    /// Ordered by category name.
    pub sales_by_category: Vec<CategorySales>,
    /// Ordered by age.
    pub abandonment_by_age: Vec<AgeAbandonment>,
    /// Ordered by count (descending), then method name.
    pub payment_methods: Vec<PaymentCount>,
}

impl MetricsSnapshot {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let mut total_sales = 0.0;
        let mut browsing_sum = 0.0;
        let mut abandoned = 0.0;
        let mut customers: HashSet<&str> = HashSet::new();
        let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
        let mut by_age: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
        let mut by_method: BTreeMap<&str, usize> = BTreeMap::new();

        for rec in view.records() {
            total_sales += rec.price;
            browsing_sum += rec.browsing_time_mins;
            abandoned += rec.abandonment_value();
            customers.insert(&rec.customer_id);
            *by_category.entry(&rec.product_category).or_default() += rec.price;
            let age = by_age.entry(rec.age).or_default();
            age.0 += rec.abandonment_value();
            age.1 += 1;
            *by_method.entry(&rec.payment_method).or_default() += 1;
        }

        let n = view.len();
        let mean = |sum: f64| (!view.is_empty()).then(|| sum / n as f64);

        let mut payment_methods: Vec<PaymentCount> = by_method
            .into_iter()
            .map(|(method, count)| PaymentCount {
                method: method.to_string(),
                count,
            })
            .collect();
        // Stable sort keeps the name order among equal counts.
        payment_methods.sort_by(|a, b| b.count.cmp(&a.count));

        MetricsSnapshot {
            row_count: n,
            total_sales,
            total_customers: customers.len(),
            avg_browsing_time: mean(browsing_sum),
            abandonment_rate: mean(abandoned).map(|r| r * 100.0),
            sales_by_category: by_category
                .into_iter()
                .map(|(category, sales)| CategorySales {
                    category: category.to_string(),
                    sales,
                })
                .collect(),
            abandonment_by_age: by_age
                .into_iter()
                .map(|(age, (flags, count))| AgeAbandonment {
                    age,
                    rate: flags / count as f64 * 100.0,
                })
                .collect(),
            payment_methods,
        }
    }

    /// Stable 64-bit digest of every field, used to key cached narratives.
    pub fn fingerprint(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.row_count.hash(&mut h);
        self.total_sales.to_bits().hash(&mut h);
        self.total_customers.hash(&mut h);
        self.avg_browsing_time.map(f64::to_bits).hash(&mut h);
        self.abandonment_rate.map(f64::to_bits).hash(&mut h);
        for c in &self.sales_by_category {
            c.category.hash(&mut h);
            c.sales.to_bits().hash(&mut h);
        }
        for a in &self.abandonment_by_age {
            a.age.hash(&mut h);
            a.rate.to_bits().hash(&mut h);
        }
        for p in &self.payment_methods {
            p.method.hash(&mut h);
            p.count.hash(&mut h);
        }
        h.finish()
    }

    /// Label / value pairs for the four headline cards.
    pub fn cards(&self) -> [(&'static str, String); 4] {
        [
            ("Total Sales (INR)", format_currency(self.total_sales)),
            ("Total Customers", self.total_customers.to_string()),
            (
                "Avg. Browsing Time (mins)",
                format_optional(self.avg_browsing_time),
            ),
            (
                "Cart Abandonment Rate (%)",
                format_optional(self.abandonment_rate),
            ),
        ]
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Two decimals with `,` thousands separators: `1234567.891` → `1,234,567.89`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && !fixed.trim_matches(&['0', '.'][..]).is_empty() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

/// Two decimals, or [`NOT_AVAILABLE`].
pub fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => NOT_AVAILABLE.to_string(),
    }
}
