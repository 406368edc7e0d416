//! Data ingestion: CSV files, Binance klines, and synthetic bars.

pub mod binance;
pub mod canonicalize;
pub mod csv_file;
pub mod provider;
pub mod synthetic;

pub use binance::BinanceProvider;
pub use canonicalize::{canonicalize, Canonicalized};
pub use csv_file::{read_bars_csv, write_bars_csv};
pub use provider::{BarProvider, DataError, DataSource};
pub use synthetic::{generate_synthetic_bars, SyntheticConfig};
