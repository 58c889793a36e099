mod catalog;
mod census;

pub use catalog::Catalog;
pub use census::CensusAdapter;
