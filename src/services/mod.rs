pub mod pricing;
pub mod record;
pub mod ticket;
pub mod validation;

pub use ticket::{BookingTicketService, TicketServiceBuilder};
