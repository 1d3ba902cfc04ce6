use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub title: String,
    #[serde(default)]
    pub date: Vec<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub ticket_id: String,
    pub ticket_status: TicketStatus,
    pub event_details: EventDetails,
    #[serde(default)]
    pub qr_code_link: Option<String>,
    pub total_amount: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub refund_amount: Option<f64>,
}

fn default_quantity() -> u32 {
    1
}

impl Record for Ticket {
    fn id(&self) -> &str {
        &self.ticket_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Unused,
    Active,
    Used,
    Cancelled,
    PartiallyRefunded,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Unused => "unused",
            TicketStatus::Active => "active",
            TicketStatus::Used => "used",
            TicketStatus::Cancelled => "cancelled",
            TicketStatus::PartiallyRefunded => "partially_refunded",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "active" => TicketStatus::Active,
            "used" => TicketStatus::Used,
            "cancelled" => TicketStatus::Cancelled,
            "partially_refunded" => TicketStatus::PartiallyRefunded,
            _ => TicketStatus::Unused,
        }
    }

    pub fn tab(&self) -> TicketTab {
        match self {
            TicketStatus::Unused | TicketStatus::Active | TicketStatus::PartiallyRefunded => {
                TicketTab::Unused
            }
            TicketStatus::Used => TicketTab::Used,
            TicketStatus::Cancelled => TicketTab::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketTab {
    Unused,
    Used,
    Cancelled,
}

impl TicketTab {
    pub const ALL: [TicketTab; 3] = [TicketTab::Unused, TicketTab::Used, TicketTab::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketTab::Unused => "unused",
            TicketTab::Used => "used",
            TicketTab::Cancelled => "cancelled",
        }
    }
}

impl Ticket {
    pub fn tab(&self) -> TicketTab {
        self.ticket_status.tab()
    }

    /// Only tickets still waiting to be used can be cancelled. `used` is
    /// terminal and set by the scan service.
    pub fn is_cancellable(&self) -> bool {
        self.tab() == TicketTab::Unused
    }
}

#[cfg(test)]
pub(crate) fn sample_ticket(id: &str, status: TicketStatus) -> Ticket {
    Ticket {
        ticket_id: id.to_string(),
        ticket_status: status,
        event_details: EventDetails {
            title: "Summer Jazz Night".to_string(),
            date: vec!["2025-07-12".to_string()],
            start_time: Some("19:00".to_string()),
            end_time: Some("23:00".to_string()),
            venue: Some("Riverside Hall".to_string()),
        },
        qr_code_link: Some("https://cdn.example.com/qr/abc.png".to_string()),
        total_amount: 45.0,
        quantity: 2,
        refund_amount: None,
    }
}
