pub mod bookings;
pub mod chat;
pub mod notifications;
pub mod ticket_pass;
pub mod tickets;
pub mod upload;
