pub mod booking;
pub mod catalog;
pub mod chat;
pub mod notification;
pub mod page;
pub mod ticket;
pub mod user;

pub use booking::{
    Booking, BookingAction, BookingParty, BookingStatus, ClientTab, PaymentStatus,
    RescheduleDecision, RescheduleStatus, VendorApproval, VendorRef, VendorTab,
};
pub use catalog::{
    ActiveStatus, ApplicationStatus, Category, Event, EventStatus, GeoPoint, Service,
    VendorApplication,
};
pub use chat::{Chat, ChatMessage, Participant, ParticipantModel, TypingEvent, UserJoined};
pub use notification::Notification;
pub use page::{ApiEnvelope, Page, PageRequest};
pub use ticket::{EventDetails, Ticket, TicketStatus, TicketTab};
pub use user::{Role, Session};

/// A backend record that can be held in an entity cache.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}
