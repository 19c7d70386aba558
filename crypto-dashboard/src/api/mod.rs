pub mod coingecko;

pub use coingecko::{filter_stablecoins, is_stablecoin, CoinGeckoClient, STABLECOINS};
