pub mod error;
pub mod fee;
pub mod gateway;
pub mod providers;
pub mod types;
pub mod units;

#[cfg(test)]
mod test_util;

pub use error::{CoreError, GatewayError};
pub use gateway::{HttpGateway, RequestGateway};
pub use providers::{build_provider, ExplorerProvider, ListQuery, ProviderConfig, ProviderKind};
pub use types::{Broadcast, Listing, Transaction, Utxo};
