use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingParty {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VendorRef {
    pub name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: String,
    pub date: String,
    pub client: BookingParty,
    pub vendor: VendorRef,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub vendor_approval: VendorApproval,
    #[serde(default)]
    pub reschedule_status: Option<RescheduleStatus>,
    #[serde(default)]
    pub requested_date: Option<String>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub balance_amount: f64,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl Record for Booking {
    fn id(&self) -> &str {
        &self.booking_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Rescheduled => "Rescheduled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Confirmed" => BookingStatus::Confirmed,
            "Completed" => BookingStatus::Completed,
            "Cancelled" => BookingStatus::Cancelled,
            "Rescheduled" => BookingStatus::Rescheduled,
            _ => BookingStatus::Pending,
        }
    }
}

/// Wire spelling of `Successfull` is what the backend sends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Successfull,
    Failed,
    AdvancePaid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VendorApproval {
    Pending,
    Approved,
    Rejected,
}

impl VendorApproval {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorApproval::Pending => "Pending",
            VendorApproval::Approved => "Approved",
            VendorApproval::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RescheduleStatus {
    Pending,
    Approved,
    Rejected,
    Requested,
}

/// Client answer to a vendor-initiated reschedule request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RescheduleDecision {
    Approved,
    Rejected,
}

impl RescheduleDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RescheduleDecision::Approved => "Approved",
            RescheduleDecision::Rejected => "Rejected",
        }
    }
}

// ── Tabs ──

/// Vendor dashboard partition. Cancelled bookings share the rejected tab
/// since neither will go ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorTab {
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl VendorTab {
    pub const ALL: [VendorTab; 4] = [
        VendorTab::Pending,
        VendorTab::Approved,
        VendorTab::Completed,
        VendorTab::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorTab::Pending => "pending",
            VendorTab::Approved => "approved",
            VendorTab::Completed => "completed",
            VendorTab::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientTab {
    Upcoming,
    Rescheduled,
    Completed,
    Cancelled,
}

impl ClientTab {
    pub const ALL: [ClientTab; 4] = [
        ClientTab::Upcoming,
        ClientTab::Rescheduled,
        ClientTab::Completed,
        ClientTab::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientTab::Upcoming => "upcoming",
            ClientTab::Rescheduled => "rescheduled",
            ClientTab::Completed => "completed",
            ClientTab::Cancelled => "cancelled",
        }
    }
}

// ── Actions ──

#[derive(Debug, Clone, PartialEq)]
pub enum BookingAction {
    Approve,
    Reject { reason: String },
    Complete,
    Cancel { reason: String },
}

impl BookingAction {
    pub fn name(&self) -> &'static str {
        match self {
            BookingAction::Approve => "approve",
            BookingAction::Reject { .. } => "reject",
            BookingAction::Complete => "complete",
            BookingAction::Cancel { .. } => "cancel",
        }
    }

    /// Free-text reason, trimmed. `None` for actions that carry none.
    pub fn reason(&self) -> Option<&str> {
        match self {
            BookingAction::Reject { reason } | BookingAction::Cancel { reason } => {
                Some(reason.trim())
            }
            _ => None,
        }
    }
}

impl Booking {
    pub fn vendor_tab(&self) -> VendorTab {
        if self.vendor_approval == VendorApproval::Rejected
            || self.status == BookingStatus::Cancelled
        {
            VendorTab::Rejected
        } else if self.is_complete || self.status == BookingStatus::Completed {
            VendorTab::Completed
        } else if self.vendor_approval == VendorApproval::Approved {
            VendorTab::Approved
        } else {
            VendorTab::Pending
        }
    }

    /// First matching predicate wins, in the order
    /// pending-or-confirmed, rescheduled, completed, cancelled.
    pub fn client_tab(&self) -> ClientTab {
        let predicates: [(ClientTab, fn(&Booking) -> bool); 3] = [
            (ClientTab::Upcoming, |b| {
                matches!(b.status, BookingStatus::Pending | BookingStatus::Confirmed)
                    && b.vendor_approval != VendorApproval::Rejected
                    && !b.is_complete
            }),
            (ClientTab::Rescheduled, |b| b.status == BookingStatus::Rescheduled),
            (ClientTab::Completed, |b| {
                b.is_complete || b.status == BookingStatus::Completed
            }),
        ];

        predicates
            .iter()
            .find(|(_, pred)| pred(self))
            .map(|(tab, _)| *tab)
            .unwrap_or(ClientTab::Cancelled)
    }

    /// Checks whether `action` is allowed from the current state. The error
    /// is a short human-readable reason.
    pub fn check(&self, action: &BookingAction) -> Result<(), &'static str> {
        match action {
            BookingAction::Approve => {
                if self.vendor_approval != VendorApproval::Pending {
                    return Err("booking is not awaiting vendor approval");
                }
            }
            BookingAction::Reject { .. } => {
                if self.vendor_approval != VendorApproval::Pending {
                    return Err("booking is not awaiting vendor approval");
                }
            }
            BookingAction::Complete => {
                if self.vendor_approval != VendorApproval::Approved {
                    return Err("booking has not been approved");
                }
                if self.is_complete {
                    return Err("booking is already complete");
                }
                if self.status == BookingStatus::Cancelled {
                    return Err("booking is cancelled");
                }
            }
            BookingAction::Cancel { .. } => {
                if self.vendor_approval != VendorApproval::Approved {
                    return Err("booking has not been approved");
                }
                if self.is_complete
                    || matches!(
                        self.status,
                        BookingStatus::Cancelled | BookingStatus::Completed
                    )
                {
                    return Err("booking is already cancelled or completed");
                }
            }
        }
        Ok(())
    }

    /// The expected post-success state, used as the optimistic patch.
    pub fn apply(&mut self, action: &BookingAction) {
        match action {
            BookingAction::Approve => {
                self.vendor_approval = VendorApproval::Approved;
            }
            BookingAction::Reject { reason } => {
                self.vendor_approval = VendorApproval::Rejected;
                self.rejection_reason = Some(reason.trim().to_string());
            }
            BookingAction::Complete => {
                self.is_complete = true;
                self.status = BookingStatus::Completed;
            }
            BookingAction::Cancel { reason } => {
                self.status = BookingStatus::Cancelled;
                self.cancellation_reason = Some(reason.trim().to_string());
            }
        }
    }

    pub fn has_open_reschedule(&self) -> bool {
        matches!(
            self.reschedule_status,
            Some(RescheduleStatus::Requested | RescheduleStatus::Pending)
        )
    }

    /// Local equivalent of the server applying a reschedule answer.
    pub fn apply_reschedule(&mut self, decision: RescheduleDecision) {
        match decision {
            RescheduleDecision::Approved => {
                self.reschedule_status = Some(RescheduleStatus::Approved);
                if let Some(date) = self.requested_date.take() {
                    self.date = date;
                }
            }
            RescheduleDecision::Rejected => {
                self.reschedule_status = Some(RescheduleStatus::Rejected);
                self.requested_date = None;
            }
        }
        self.status = BookingStatus::Confirmed;
    }
}

#[cfg(test)]
pub(crate) fn sample_booking(
    id: &str,
    status: BookingStatus,
    vendor_approval: VendorApproval,
    is_complete: bool,
) -> Booking {
    Booking {
        booking_id: id.to_string(),
        date: "2025-06-16".to_string(),
        client: BookingParty {
            name: "Alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
        },
        vendor: VendorRef {
            name: "Bloom Florals".to_string(),
            user_id: "vendor-1".to_string(),
        },
        status,
        payment_status: PaymentStatus::AdvancePaid,
        vendor_approval,
        reschedule_status: None,
        requested_date: None,
        is_complete,
        balance_amount: 120.0,
        cancellation_reason: None,
        rejection_reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_tab_table() {
        let cases = [
            (BookingStatus::Pending, VendorApproval::Pending, false, VendorTab::Pending),
            (BookingStatus::Confirmed, VendorApproval::Pending, false, VendorTab::Pending),
            (BookingStatus::Confirmed, VendorApproval::Approved, false, VendorTab::Approved),
            (BookingStatus::Rescheduled, VendorApproval::Approved, false, VendorTab::Approved),
            (BookingStatus::Cancelled, VendorApproval::Rejected, false, VendorTab::Rejected),
            (BookingStatus::Pending, VendorApproval::Rejected, false, VendorTab::Rejected),
            (BookingStatus::Cancelled, VendorApproval::Approved, false, VendorTab::Rejected),
            (BookingStatus::Completed, VendorApproval::Approved, true, VendorTab::Completed),
            (BookingStatus::Confirmed, VendorApproval::Approved, true, VendorTab::Completed),
        ];

        for (status, approval, complete, expected) in cases {
            let b = sample_booking("b", status, approval, complete);
            assert_eq!(
                b.vendor_tab(),
                expected,
                "({status:?}, {approval:?}, {complete})"
            );
        }
    }

    #[test]
    fn test_client_tab_order() {
        let upcoming = sample_booking("b", BookingStatus::Confirmed, VendorApproval::Approved, false);
        assert_eq!(upcoming.client_tab(), ClientTab::Upcoming);

        let mut rescheduled = upcoming.clone();
        rescheduled.status = BookingStatus::Rescheduled;
        assert_eq!(rescheduled.client_tab(), ClientTab::Rescheduled);

        let done = sample_booking("b", BookingStatus::Completed, VendorApproval::Approved, true);
        assert_eq!(done.client_tab(), ClientTab::Completed);

        // Inconsistent tuple: completed predicate runs before cancelled.
        let odd = sample_booking("b", BookingStatus::Cancelled, VendorApproval::Approved, true);
        assert_eq!(odd.client_tab(), ClientTab::Completed);

        let rejected = sample_booking("b", BookingStatus::Pending, VendorApproval::Rejected, false);
        assert_eq!(rejected.client_tab(), ClientTab::Cancelled);
    }

    #[test]
    fn test_guards() {
        let pending = sample_booking("b", BookingStatus::Pending, VendorApproval::Pending, false);
        assert!(pending.check(&BookingAction::Approve).is_ok());
        assert!(pending.check(&BookingAction::Complete).is_err());
        assert!(pending
            .check(&BookingAction::Cancel { reason: "x".into() })
            .is_err());

        let approved = sample_booking("b", BookingStatus::Confirmed, VendorApproval::Approved, false);
        assert!(approved.check(&BookingAction::Approve).is_err());
        assert!(approved.check(&BookingAction::Complete).is_ok());
        assert!(approved
            .check(&BookingAction::Cancel { reason: "x".into() })
            .is_ok());

        let cancelled = sample_booking("b", BookingStatus::Cancelled, VendorApproval::Approved, false);
        assert!(cancelled.check(&BookingAction::Complete).is_err());
        assert!(cancelled
            .check(&BookingAction::Cancel { reason: "x".into() })
            .is_err());
    }

    #[test]
    fn test_apply_moves_tab() {
        let mut b = sample_booking("b", BookingStatus::Pending, VendorApproval::Pending, false);
        b.apply(&BookingAction::Approve);
        assert_eq!(b.vendor_tab(), VendorTab::Approved);

        b.apply(&BookingAction::Complete);
        assert!(b.is_complete);
        assert_eq!(b.vendor_tab(), VendorTab::Completed);
    }

    #[test]
    fn test_reschedule_approval_adopts_requested_date() {
        let mut b = sample_booking("b", BookingStatus::Rescheduled, VendorApproval::Approved, false);
        b.reschedule_status = Some(RescheduleStatus::Requested);
        b.requested_date = Some("2025-07-01".to_string());
        assert!(b.has_open_reschedule());

        b.apply_reschedule(RescheduleDecision::Approved);
        assert_eq!(b.date, "2025-07-01");
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert!(!b.has_open_reschedule());
    }

    #[test]
    fn test_deserialize_wire_booking() {
        let json = r#"{
            "bookingId": "BKG-1",
            "date": "2025-06-16",
            "client": {"name": "Alice", "email": "a@example.com", "phone": "+1555"},
            "vendor": {"name": "Bloom", "userId": "v-1"},
            "status": "Pending",
            "paymentStatus": "Successfull",
            "vendorApproval": "Pending",
            "isComplete": false,
            "balanceAmount": 50.5
        }"#;
        let b: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(b.booking_id, "BKG-1");
        assert_eq!(b.payment_status, PaymentStatus::Successfull);
        assert_eq!(b.reschedule_status, None);
        assert_eq!(b.vendor_tab(), VendorTab::Pending);
    }
}
