use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require, InputError};

/// A physical location (store, building, clinic, hotel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub site_id: String,
    pub name: String,
    pub location: String,
    /// retail, healthcare, hospitality, commercial
    pub site_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default = "default_active")]
    pub status: String,
}

fn default_active() -> String {
    "active".to_string()
}

impl Site {
    pub fn validate(&self) -> Result<(), InputError> {
        require("site", &self.site_id, "site_id", &self.site_id)?;
        require("site", &self.site_id, "name", &self.name)?;
        require("site", &self.site_id, "location", &self.location)?;
        require("site", &self.site_id, "site_type", &self.site_type)?;
        Ok(())
    }
}

/// A maintenance or service task assigned against a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub work_order_id: String,
    pub site_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    /// pending, in_progress, completed, late, cancelled
    pub status: String,
    pub created_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<f64>,
}

fn default_priority() -> String {
    "medium".to_string()
}

impl WorkOrder {
    pub const COMPLETED: &'static str = "completed";

    pub fn is_completed(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(Self::COMPLETED)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        let id = &self.work_order_id;
        require("work order", id, "work_order_id", id)?;
        require("work order", id, "site_id", &self.site_id)?;
        require("work order", id, "title", &self.title)?;
        require("work order", id, "status", &self.status)?;
        if self.due_date < self.created_date {
            return Err(InputError::OutOfRange {
                kind: "work order",
                id: id.clone(),
                field: "due_date",
                reason: "due before it was created".to_string(),
            });
        }
        Ok(())
    }
}

/// A site visit, audit or checklist event with free-text notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub inspection_id: String,
    pub site_id: String,
    pub inspector_name: String,
    pub inspection_date: DateTime<Utc>,
    pub notes: String,
    /// completed, incomplete, missed, scheduled
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_type: Option<String>,
}

impl Inspection {
    pub fn validate(&self) -> Result<(), InputError> {
        let id = &self.inspection_id;
        require("inspection", id, "inspection_id", id)?;
        require("inspection", id, "site_id", &self.site_id)?;
        require("inspection", id, "inspector_name", &self.inspector_name)?;
        require("inspection", id, "status", &self.status)?;
        Ok(())
    }
}

/// An external service provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: String,
    pub name: String,
    /// HVAC, plumbing, electrical, cleaning, landscaping
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla_response_time_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_rating: Option<f64>,
}

impl Vendor {
    pub fn validate(&self) -> Result<(), InputError> {
        let id = &self.vendor_id;
        require("vendor", id, "vendor_id", id)?;
        require("vendor", id, "name", &self.name)?;
        require("vendor", id, "service_type", &self.service_type)?;
        if let Some(rating) = self.performance_rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(InputError::OutOfRange {
                    kind: "vendor",
                    id: id.clone(),
                    field: "performance_rating",
                    reason: format!("{} is outside 0.0-5.0", rating),
                });
            }
        }
        Ok(())
    }
}
