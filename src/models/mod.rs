pub mod booking;
pub mod rate;

pub use booking::{BookingForm, BookingRecord, Fare, Passenger, Trip};
pub use rate::{CategoryRates, RateTable, RateTableError, Route};
