use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::config::ShopData;
use crate::data::{Alternative, Category, Item, PlanResponse};

/// External planning service. Implementations return the raw response JSON;
/// `parse_plan_response` is the strict boundary that turns it into items.
pub trait PlannerProvider: Send + Sync {
    fn generate_plan(&self, request: &str, shops: &[ShopData]) -> Result<Value>;
}

/// Prompt sent to a real planning service: the user's request plus the shop
/// catalog and the exact JSON answer format.
pub fn build_prompt(request: &str, shops: &[ShopData]) -> String {
    let mut catalog = String::new();
    for shop in shops {
        let _ = writeln!(catalog, "- {}: {}", shop.name, shop.categories.join(", "));
    }

    format!(
        r#"You are a helpful assistant that creates detailed shopping lists for DIY projects.

User Request: "{request}"

Provide a shopping list with name, price estimate ($XX.XX), store recommendation, category ("product" or "tool"), a brief description, and availability for each item. For each item also suggest alternatives from other stores where sensible.

Consider these stores and their specialties:
{catalog}
Respond with a JSON object in this exact format:
{{
  "products": [
    {{
      "name": "Product name",
      "price": "$XX.XX",
      "store": "Store name",
      "category": "product",
      "description": "Brief description",
      "availability": "In Stock",
      "alternatives": [
        {{
          "name": "Alternative name",
          "price": "$XX.XX",
          "store": "Other store",
          "description": "Brief description",
          "availability": "In Stock"
        }}
      ]
    }}
  ],
  "totalCost": XX.XX,
  "estimatedTime": "X hours",
  "difficulty": "Easy"
}}

Include both the materials and the tools needed for the project."#
    )
}

/// Deterministic provider for tests and offline runs.
pub struct MockPlannerProvider;

impl PlannerProvider for MockPlannerProvider {
    fn generate_plan(&self, request: &str, shops: &[ShopData]) -> Result<Value> {
        let store_a = shops.first().map(|s| s.name.as_str()).unwrap_or("Home Depot");
        let store_b = shops.get(1).map(|s| s.name.as_str()).unwrap_or("Amazon");

        Ok(serde_json::json!({
            "products": [
                {
                    "name": format!("Materials for: {}", request),
                    "price": "$24.99",
                    "store": store_a,
                    "category": "product",
                    "description": "Primary materials",
                    "availability": "In Stock",
                    "alternatives": [
                        {
                            "name": format!("Budget materials for: {}", request),
                            "price": "$19.99",
                            "store": store_b,
                            "description": "Lower-cost substitute",
                            "availability": "In Stock"
                        }
                    ]
                },
                {
                    "name": "Basic tool kit",
                    "price": "$34.50",
                    "store": store_b,
                    "category": "tool",
                    "description": "Hammer, screwdrivers, tape measure",
                    "availability": "In Stock",
                    "alternatives": []
                }
            ],
            "totalCost": 59.49,
            "estimatedTime": "2-4 hours",
            "difficulty": "Medium"
        }))
    }
}

/// Provider that replays a pre-captured response JSON from disk, so the
/// actual network call can live entirely outside this crate.
pub struct FileResponseProvider {
    path: PathBuf,
}

impl FileResponseProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PlannerProvider for FileResponseProvider {
    fn generate_plan(&self, _request: &str, _shops: &[ShopData]) -> Result<Value> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read planner response: {:?}", self.path))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Planner response is not valid JSON: {:?}", self.path))?;
        Ok(value)
    }
}

/// Parse a planner response into items with ids "1".."N".
///
/// This is the one place that fails loudly: a missing `products` array or a
/// product with missing or mis-typed required fields is an error, never a
/// silent default. Unparseable *prices* inside a well-shaped product are not
/// errors; the price policy handles those downstream.
pub fn parse_plan_response(value: &Value) -> Result<PlanResponse> {
    let products = value
        .get("products")
        .and_then(|v| v.as_array())
        .context("Expected 'products' array in planner response")?;

    let mut items = Vec::with_capacity(products.len());
    for (index, product) in products.iter().enumerate() {
        let item = parse_product(product, index)
            .with_context(|| format!("Invalid product at index {}", index))?;
        items.push(item);
    }

    // Top-level summary fields are informational only.
    let total_cost = value.get("totalCost").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let estimated_time = value
        .get("estimatedTime")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let difficulty = value
        .get("difficulty")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Ok(PlanResponse {
        items,
        total_cost,
        estimated_time,
        difficulty,
    })
}

fn parse_product(product: &Value, index: usize) -> Result<Item> {
    let category = match required_str(product, "category")? {
        "product" => Category::Product,
        "tool" => Category::Tool,
        other => bail!("Unknown category {:?} (expected 'product' or 'tool')", other),
    };

    let mut alternatives = Vec::new();
    if let Some(alts) = product.get("alternatives") {
        let alts = alts
            .as_array()
            .context("'alternatives' must be an array")?;
        for (alt_index, alt) in alts.iter().enumerate() {
            let alternative = parse_alternative(alt)
                .with_context(|| format!("Invalid alternative at index {}", alt_index))?;
            alternatives.push(alternative);
        }
    }

    Ok(Item {
        id: (index + 1).to_string(),
        name: required_str(product, "name")?.to_string(),
        price: required_str(product, "price")?.to_string(),
        store: required_str(product, "store")?.to_string(),
        category,
        description: required_str(product, "description")?.to_string(),
        availability: required_str(product, "availability")?.to_string(),
        owned: false,
        alternatives,
    })
}

fn parse_alternative(alt: &Value) -> Result<Alternative> {
    Ok(Alternative {
        name: required_str(alt, "name")?.to_string(),
        price: required_str(alt, "price")?.to_string(),
        store: required_str(alt, "store")?.to_string(),
        description: required_str(alt, "description")?.to_string(),
        availability: required_str(alt, "availability")?.to_string(),
        url: alt.get("url").and_then(|v| v.as_str()).map(str::to_string),
    })
}

fn required_str<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .with_context(|| format!("Missing or non-string field '{}'", field))
}
