/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! Clients for the services Shillzzz depends on: the SOL/USD price feed, a Solana RPC node
//! for payment verification and the Telegram bot API for announcements.

pub mod error;
pub mod notify;
pub mod price;
pub mod verifier;

pub use error::HuginError;
pub use notify::WebhookNotifier;
pub use price::CoinGeckoSource;
pub use verifier::SolanaRpcVerifier;

pub type Result<T> = std::result::Result<T, HuginError>;
