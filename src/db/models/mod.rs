mod ticket;
mod user;

pub use ticket::{Ticket, TicketView, STATUS_CALLED, STATUS_WAITING};
pub use user::{Session, User, ROLE_DOCTOR, ROLE_PATIENT};
