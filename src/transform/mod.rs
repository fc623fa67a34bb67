//! Table-level transformations that turn raw exports into scorable rows

pub mod aggregate;
pub mod currency;
pub mod reference;

pub use aggregate::{aggregate_users, UserAggregates};
pub use currency::CurrencyNormalizer;
pub use reference::CountryCodeMap;
