pub mod calendar;
pub mod clock;
pub mod config;
pub mod error;
pub mod flight;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ExhibitConfig;
pub use error::{AotaError, Rejection, Result};
pub use flight::{FlightPermit, SingleFlight};
pub use types::{StatCode, StatDeltas, Stats};
