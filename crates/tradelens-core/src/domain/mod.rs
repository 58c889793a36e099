//! # Domain Models
//!
//! Canonical domain types for U.S. trade statistics.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HsCode`] | Validated Harmonized System code |
//! | [`Flow`] | Trade direction (imports, exports) |
//! | [`YearMonth`] | Month-granular date |
//! | [`Country`] | Trading partner |
//! | [`RawRecord`] | Row as produced by the trade client |
//! | [`TradeRecord`] | Normalized monthly observation |
//! | [`TimeSeries`] | Month → value series |
//! | [`CodeNode`] | Code with description and children |
//! | [`CategorySummary`] | Per-product totals |
//!
//! All types enforce their invariants at construction time and serialize
//! with serde.

mod flow;
mod hs_code;
mod models;
mod month;

pub use flow::Flow;
pub use hs_code::{HsCode, TERMINAL_CODE_LEN};
pub use models::{
    CategorySummary, CategoryTotal, CodeNode, Country, RawRecord, TimeSeries, TradeRecord,
};
pub use month::YearMonth;
