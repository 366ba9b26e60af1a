use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A shop the planner may recommend, with the categories it is known for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopData {
    pub name: String,
    pub url: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Directory holding saved requests and results.
    pub data_dir: String,
    /// Label recorded as the `method` of saved results.
    pub method: String,
    /// Shop catalog handed to the planner.
    pub shops: Vec<ShopData>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            data_dir: "plans".to_string(),
            method: "mock".to_string(),
            shops: default_shops(),
        }
    }
}

impl PlannerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: PlannerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config: {:?}", path))?;
        Ok(config)
    }
}

fn shop(name: &str, url: &str, categories: &[&str]) -> ShopData {
    ShopData {
        name: name.to_string(),
        url: url.to_string(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn default_shops() -> Vec<ShopData> {
    vec![
        shop(
            "Home Depot",
            "https://homedepot.com",
            &["tools", "hardware", "lumber", "paint", "electrical"],
        ),
        shop(
            "Lowe's",
            "https://lowes.com",
            &["tools", "hardware", "lumber", "paint", "appliances"],
        ),
        shop(
            "Amazon",
            "https://amazon.com",
            &["general", "electronics", "tools", "fast delivery"],
        ),
        shop(
            "Michaels",
            "https://michaels.com",
            &["crafts", "art supplies", "tools"],
        ),
        shop(
            "IKEA",
            "https://ikea.com",
            &["furniture", "home organization", "simple tools"],
        ),
    ]
}
