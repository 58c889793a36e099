//! Category breakdown of child-code records.

use crate::{CategorySummary, TradeRecord};

/// Label used for rows that carry neither a product name nor a code.
pub const UNLABELED: &str = "unknown";

/// Sums record values per product label, keeping first-appearance order.
///
/// Records without a `product_name` fall back to their `product_code`.
pub fn summarize(records: &[TradeRecord]) -> CategorySummary {
    let mut summary = CategorySummary::new();
    for record in records {
        let label = record
            .product_name
            .as_deref()
            .or(record.product_code.as_deref())
            .unwrap_or(UNLABELED);
        summary.add(label, record.value);
    }
    summary
}
