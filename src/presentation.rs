//! Status to badge mapping, shared by every view that shows a status pill.

use serde::Serialize;

use crate::models::{
    ActiveStatus, ApplicationStatus, BookingStatus, EventStatus, PaymentStatus, RescheduleStatus,
    TicketStatus, VendorApproval,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Gray,
    Yellow,
    Green,
    Blue,
    Purple,
    Red,
    Orange,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeIcon {
    Clock,
    Check,
    CheckCircle,
    Cross,
    Calendar,
    Refund,
    Ticket,
    Ban,
    Alert,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BadgeStyle {
    pub label: &'static str,
    pub color: BadgeColor,
    pub icon: BadgeIcon,
}

const fn style(label: &'static str, color: BadgeColor, icon: BadgeIcon) -> BadgeStyle {
    BadgeStyle { label, color, icon }
}

pub trait Badge {
    fn badge(&self) -> BadgeStyle;
}

impl Badge for BookingStatus {
    fn badge(&self) -> BadgeStyle {
        use BadgeColor::*;
        match self {
            BookingStatus::Pending => style("Pending", Yellow, BadgeIcon::Clock),
            BookingStatus::Confirmed => style("Confirmed", Blue, BadgeIcon::Check),
            BookingStatus::Completed => style("Completed", Green, BadgeIcon::CheckCircle),
            BookingStatus::Cancelled => style("Cancelled", Red, BadgeIcon::Cross),
            BookingStatus::Rescheduled => style("Rescheduled", Purple, BadgeIcon::Calendar),
        }
    }
}

impl Badge for PaymentStatus {
    fn badge(&self) -> BadgeStyle {
        use BadgeColor::*;
        match self {
            PaymentStatus::Pending => style("Payment pending", Yellow, BadgeIcon::Clock),
            PaymentStatus::Successfull => style("Paid", Green, BadgeIcon::CheckCircle),
            PaymentStatus::Failed => style("Payment failed", Red, BadgeIcon::Alert),
            PaymentStatus::AdvancePaid => style("Advance paid", Blue, BadgeIcon::Check),
        }
    }
}

impl Badge for VendorApproval {
    fn badge(&self) -> BadgeStyle {
        use BadgeColor::*;
        match self {
            VendorApproval::Pending => style("Awaiting approval", Yellow, BadgeIcon::Clock),
            VendorApproval::Approved => style("Approved", Green, BadgeIcon::Check),
            VendorApproval::Rejected => style("Rejected", Red, BadgeIcon::Cross),
        }
    }
}

impl Badge for RescheduleStatus {
    fn badge(&self) -> BadgeStyle {
        use BadgeColor::*;
        match self {
            RescheduleStatus::Pending | RescheduleStatus::Requested => {
                style("Reschedule requested", Orange, BadgeIcon::Calendar)
            }
            RescheduleStatus::Approved => style("Reschedule approved", Green, BadgeIcon::Check),
            RescheduleStatus::Rejected => style("Reschedule declined", Red, BadgeIcon::Cross),
        }
    }
}

impl Badge for TicketStatus {
    fn badge(&self) -> BadgeStyle {
        use BadgeColor::*;
        match self {
            TicketStatus::Unused | TicketStatus::Active => style("Valid", Green, BadgeIcon::Ticket),
            TicketStatus::Used => style("Used", Gray, BadgeIcon::CheckCircle),
            TicketStatus::Cancelled => style("Cancelled", Red, BadgeIcon::Cross),
            TicketStatus::PartiallyRefunded => style("Partially refunded", Orange, BadgeIcon::Refund),
        }
    }
}

impl Badge for ActiveStatus {
    fn badge(&self) -> BadgeStyle {
        match self {
            ActiveStatus::Active => style("Active", BadgeColor::Green, BadgeIcon::Check),
            ActiveStatus::Inactive => style("Inactive", BadgeColor::Gray, BadgeIcon::Ban),
        }
    }
}

impl Badge for EventStatus {
    fn badge(&self) -> BadgeStyle {
        match self {
            EventStatus::Upcoming => style("Upcoming", BadgeColor::Blue, BadgeIcon::Calendar),
            EventStatus::Completed => style("Completed", BadgeColor::Green, BadgeIcon::CheckCircle),
            EventStatus::Cancelled => style("Cancelled", BadgeColor::Red, BadgeIcon::Cross),
        }
    }
}

impl Badge for ApplicationStatus {
    fn badge(&self) -> BadgeStyle {
        match self {
            ApplicationStatus::Pending => style("Pending review", BadgeColor::Yellow, BadgeIcon::Clock),
            ApplicationStatus::Approved => style("Approved", BadgeColor::Green, BadgeIcon::Check),
            ApplicationStatus::Rejected => style("Rejected", BadgeColor::Red, BadgeIcon::Cross),
            ApplicationStatus::Blocked => style("Blocked", BadgeColor::Gray, BadgeIcon::Ban),
        }
    }
}
