use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Product,
    Tool,
}

/// A substitute listing for an item, usually from a different store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alternative {
    pub name: String,
    pub price: String,
    pub store: String,
    pub description: String,
    pub availability: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A single planned product or tool with its current store/price snapshot.
///
/// `price` is the display string; the numeric value is always derived via
/// `price::parse_price`, never cached. `store` may carry an embedded geo tag
/// (`"Name (City lat:<f> lng:<f>)"`) consumed only by display code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: String,
    pub store: String,
    pub category: Category,
    pub description: String,
    pub availability: String,
    #[serde(default)]
    pub owned: bool,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

/// Parsed planner response: items with ids assigned "1".."N" in response
/// order, plus the informational top-level fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub items: Vec<Item>,
    pub total_cost: f64,
    pub estimated_time: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRequest {
    pub request_id: Uuid,
    pub text: String,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl SavedRequest {
    pub fn new(text: String, total: f64) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            text,
            total,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedResult {
    pub result_id: Uuid,
    pub request_id: Uuid,
    pub items: Vec<Item>,
    pub method: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SavedResult {
    pub fn new(request_id: Uuid, items: Vec<Item>, method: String, title: Option<String>) -> Self {
        Self {
            result_id: Uuid::new_v4(),
            request_id,
            items,
            method,
            created_at: Utc::now(),
            title,
        }
    }
}
