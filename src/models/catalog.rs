use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    Active,
    Inactive,
}

impl ActiveStatus {
    pub fn toggled(&self) -> Self {
        match self {
            ActiveStatus::Active => ActiveStatus::Inactive,
            ActiveStatus::Inactive => ActiveStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Blocked,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub status: ActiveStatus,
}

impl Record for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(alias = "_id")]
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    pub category_id: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub status: ActiveStatus,
}

impl Record for Service {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: String,
    pub vendor_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub dates: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub sold_count: u32,
    #[serde(default)]
    pub poster_image: Vec<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub status: EventStatus,
}

impl Record for Event {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VendorApplication {
    pub vendor_id: String,
    pub business_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub status: ApplicationStatus,
}

impl Record for VendorApplication {
    fn id(&self) -> &str {
        &self.vendor_id
    }
}
