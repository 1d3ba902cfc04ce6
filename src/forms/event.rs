use chrono::NaiveTime;
use serde::Serialize;
use validator::{Validate, ValidationError};

use super::images::{non_empty_images, remote_paths, stage_images, ImageRef};
use super::{locked_error, required, EditLocks, StepForm};
use crate::errors::{self, FieldError};
use crate::models::{Event, GeoPoint};
use crate::services::upload::ImageHost;

fn clock_time(value: &str) -> Result<(), ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| ValidationError::new("time"))
}

fn calendar_dates(values: &[String]) -> Result<(), ValidationError> {
    if values
        .iter()
        .all(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
    {
        Ok(())
    } else {
        Err(ValidationError::new("date"))
    }
}

/// Schedule and price as they were when the edit started.
#[derive(Debug, Clone, PartialEq)]
struct Baseline {
    dates: Vec<String>,
    start_time: String,
    end_time: String,
    price: f64,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct EventForm {
    #[validate(
        custom(function = "required", message = "Title is required"),
        length(max = 100, message = "Title must not exceed 100 characters")
    )]
    pub title: String,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    #[validate(custom(function = "required", message = "Please select a category"))]
    pub category_id: String,

    #[validate(
        length(min = 1, message = "Pick at least one date"),
        custom(function = "calendar_dates", message = "Dates must be YYYY-MM-DD")
    )]
    pub dates: Vec<String>,

    #[validate(custom(function = "clock_time", message = "Start time must be HH:MM"))]
    pub start_time: String,

    #[validate(custom(function = "clock_time", message = "End time must be HH:MM"))]
    pub end_time: String,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    #[validate(range(min = 1, message = "At least one ticket must be offered"))]
    pub quantity: u32,

    #[validate(custom(function = "required", message = "Venue is required"))]
    pub venue: String,

    pub location: Option<GeoPoint>,

    #[validate(custom(function = "non_empty_images", message = "Add at least one poster image"))]
    pub poster_image: Vec<ImageRef>,

    pub locks: EditLocks,
    baseline: Option<Baseline>,
}

impl EventForm {
    /// Prefills from an existing event. Schedule and price lock once tickets
    /// have sold.
    pub fn for_edit(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            category_id: event.category_id.clone().unwrap_or_default(),
            dates: event.dates.clone(),
            start_time: event.start_time.clone(),
            end_time: event.end_time.clone(),
            price: event.price,
            quantity: event.quantity,
            venue: event
                .location
                .as_ref()
                .and_then(|l| l.address.clone())
                .unwrap_or_default(),
            location: event.location.clone(),
            poster_image: event
                .poster_image
                .iter()
                .map(|p| ImageRef::Remote(p.clone()))
                .collect(),
            locks: EditLocks::for_sold(event.sold_count),
            baseline: Some(Baseline {
                dates: event.dates.clone(),
                start_time: event.start_time.clone(),
                end_time: event.end_time.clone(),
                price: event.price,
            }),
        }
    }

    /// Uploads pending posters and produces the request body.
    pub async fn into_payload(mut self, host: &dyn ImageHost) -> errors::Result<EventPayload> {
        stage_images(&mut self.poster_image, host).await?;
        Ok(EventPayload {
            poster_image: remote_paths(&self.poster_image)?,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category_id: self.category_id,
            dates: self.dates,
            start_time: self.start_time,
            end_time: self.end_time,
            price: self.price,
            quantity: self.quantity,
            venue: self.venue.trim().to_string(),
            location: self.location,
        })
    }
}

impl StepForm for EventForm {
    const STEPS: &'static [&'static [&'static str]] = &[
        &["title", "description", "category_id"],
        &["dates", "start_time", "end_time", "price", "quantity"],
        &["venue", "poster_image"],
    ];

    fn cross_checks(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        // An end time before the start time runs past midnight.
        if let (Ok(start), Ok(end)) = (
            NaiveTime::parse_from_str(&self.start_time, "%H:%M"),
            NaiveTime::parse_from_str(&self.end_time, "%H:%M"),
        ) {
            if end == start {
                errors.push(FieldError {
                    field: "end_time".to_string(),
                    message: "End time must differ from the start time".to_string(),
                });
            }
        }

        if self.quantity < self.locks.min_quantity {
            errors.push(FieldError {
                field: "quantity".to_string(),
                message: format!(
                    "Quantity cannot be lower than the {} tickets already sold",
                    self.locks.min_quantity
                ),
            });
        }

        if let Some(base) = &self.baseline {
            if self.locks.schedule_locked {
                if self.dates != base.dates {
                    errors.push(locked_error("dates"));
                }
                if self.start_time != base.start_time {
                    errors.push(locked_error("start_time"));
                }
                if self.end_time != base.end_time {
                    errors.push(locked_error("end_time"));
                }
            }
            if self.locks.price_locked && self.price != base.price {
                errors.push(locked_error("price"));
            }
        }

        errors
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub dates: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub quantity: u32,
    pub venue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub poster_image: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ClientError;
    use crate::forms::images::testing::MockHost;
    use crate::forms::{LocalImage, Wizard};
    use crate::models::EventStatus;

    fn valid_form() -> EventForm {
        EventForm {
            title: "Summer Jazz Night".to_string(),
            description: "Live jazz on the rooftop terrace".to_string(),
            category_id: "cat-music".to_string(),
            dates: vec!["2025-07-04".to_string()],
            start_time: "19:00".to_string(),
            end_time: "23:00".to_string(),
            price: 25.0,
            quantity: 100,
            venue: "Harbour Hall".to_string(),
            poster_image: vec![ImageRef::Remote("events/jazz.jpg".to_string())],
            ..Default::default()
        }
    }

    fn sold_event(sold: u32) -> Event {
        Event {
            id: "EVT-1".to_string(),
            vendor_id: "v1".to_string(),
            category_id: Some("cat-music".to_string()),
            title: "Summer Jazz Night".to_string(),
            description: Some("Live jazz on the rooftop terrace".to_string()),
            dates: vec!["2025-07-04".to_string()],
            start_time: "19:00".to_string(),
            end_time: "23:00".to_string(),
            price: 25.0,
            quantity: 100,
            sold_count: sold,
            poster_image: vec!["events/jazz.jpg".to_string()],
            location: Some(GeoPoint {
                lat: 1.0,
                lng: 2.0,
                address: Some("Harbour Hall".to_string()),
            }),
            status: EventStatus::Upcoming,
        }
    }

    #[test]
    fn test_next_validates_only_current_step() {
        let mut form = valid_form();
        form.price = -1.0;
        form.poster_image.clear();
        let mut wizard = Wizard::new(form);

        // Step one is fine even though later steps are not.
        assert_eq!(wizard.next().unwrap(), 1);

        let err = wizard.next().unwrap_err();
        match err {
            ClientError::Form(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "price");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(wizard.step(), 1);
    }

    #[test]
    fn test_posters_required_on_last_step() {
        let mut form = valid_form();
        form.poster_image.clear();
        let mut wizard = Wizard::new(form);
        assert_eq!(wizard.next().unwrap(), 1);
        assert_eq!(wizard.next().unwrap(), 2);

        assert!(wizard.submit().is_err());
        assert_eq!(wizard.step(), 2);
        assert_eq!(
            wizard.error_for("poster_image"),
            Some("Add at least one poster image")
        );
    }

    #[test]
    fn test_submit_jumps_to_first_invalid_step() {
        let mut form = valid_form();
        form.title = "   ".to_string();
        form.end_time = "19:00".to_string();
        let mut wizard = Wizard::new(form);
        wizard.next().ok();

        assert!(wizard.submit().is_err());
        assert_eq!(wizard.step(), 0);
        assert_eq!(wizard.error_for("title"), Some("Title is required"));
        assert_eq!(
            wizard.error_for("end_time"),
            Some("End time must differ from the start time")
        );
    }

    #[test]
    fn test_overnight_event_allowed() {
        let mut form = valid_form();
        form.start_time = "22:00".to_string();
        form.end_time = "02:00".to_string();
        assert!(crate::forms::collect_errors(&form).is_empty());
    }

    #[test]
    fn test_sold_event_locks_schedule_and_price() {
        let mut form = EventForm::for_edit(&sold_event(40));
        assert!(Wizard::new(form.clone()).submit().is_ok());

        form.price = 30.0;
        form.dates = vec!["2025-07-05".to_string()];
        form.quantity = 39;
        let errors = crate::forms::collect_errors(&form);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["dates", "price", "quantity"]);

        // Raising quantity above the sold floor is allowed.
        form = EventForm::for_edit(&sold_event(40));
        form.quantity = 150;
        assert!(crate::forms::collect_errors(&form).is_empty());
    }

    #[test]
    fn test_unsold_event_is_fully_editable() {
        let mut form = EventForm::for_edit(&sold_event(0));
        form.price = 30.0;
        form.start_time = "18:00".to_string();
        assert!(crate::forms::collect_errors(&form).is_empty());
    }

    #[tokio::test]
    async fn test_payload_replaces_local_posters() {
        let mut form = valid_form();
        form.poster_image.push(ImageRef::Local(LocalImage::from_bytes(
            "crowd.jpg",
            "image/jpeg",
            vec![0xff, 0xd8],
        )));
        let host = MockHost::default();

        let payload = form.into_payload(&host).await.unwrap();
        assert_eq!(
            payload.poster_image,
            vec!["events/jazz.jpg", "uploads/1-crowd.jpg"]
        );
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["posterImage"][1], "uploads/1-crowd.jpg");
        assert_eq!(body["startTime"], "19:00");
    }
}
