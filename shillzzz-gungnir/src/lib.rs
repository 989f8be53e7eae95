/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/

#[macro_use]
extern crate diesel;

pub mod ads;
pub mod boosters;
pub mod clock;
pub mod engine;
pub mod error;
pub mod models;
pub mod notify;
pub mod payments;
pub mod pot;
pub mod price;
pub mod schema;
pub mod shills;
pub mod store;

pub use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{Engine, EngineConfig};
pub use error::*;
pub use models::*;
pub use notify::{Notifier, NullNotifier};
pub use payments::{PaymentConfig, PaymentVerifier, VerifiedPayment};
pub use pot::{RankingBasis, PotConfig, WeeklyPot, WeekWindow};
pub use price::{PriceCache, PriceSource};
pub use store::{MemStore, PgStore, Store};
