use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::data::{Item, SavedRequest, SavedResult};

pub trait Storage: Send + Sync {
    fn save_request(&self, request: &SavedRequest) -> Result<()>;
    fn save_result(&self, result: &SavedResult) -> Result<()>;
    fn load_result(&self, result_id: &Uuid) -> Result<SavedResult>;
    fn update_result_items(&self, result_id: &Uuid, items: &[Item]) -> Result<()>;
    fn list_results(&self) -> Result<Vec<SavedResult>>;
}

/// JSON documents under a data directory: `requests/<uuid>.json` and
/// `results/<uuid>.json`.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn requests_dir(&self) -> PathBuf {
        self.base_dir.join("requests")
    }

    fn results_dir(&self) -> PathBuf {
        self.base_dir.join("results")
    }

    fn request_path(&self, request_id: &Uuid) -> PathBuf {
        self.requests_dir().join(format!("{}.json", request_id))
    }

    fn result_path(&self, result_id: &Uuid) -> PathBuf {
        self.results_dir().join(format!("{}.json", result_id))
    }
}

impl Storage for FileStorage {
    fn save_request(&self, request: &SavedRequest) -> Result<()> {
        let dir = self.requests_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create requests directory: {:?}", dir))?;

        let path = self.request_path(&request.request_id);
        let json = serde_json::to_string_pretty(request)?;
        fs::write(&path, json).with_context(|| format!("Failed to write request: {:?}", path))?;
        Ok(())
    }

    fn save_result(&self, result: &SavedResult) -> Result<()> {
        let dir = self.results_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create results directory: {:?}", dir))?;

        let path = self.result_path(&result.result_id);
        let json = serde_json::to_string_pretty(result)?;
        fs::write(&path, json).with_context(|| format!("Failed to write result: {:?}", path))?;
        Ok(())
    }

    fn load_result(&self, result_id: &Uuid) -> Result<SavedResult> {
        let path = self.result_path(result_id);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read result: {:?}", path))?;
        let result: SavedResult = serde_json::from_str(&content)
            .with_context(|| format!("Invalid result document: {:?}", path))?;
        Ok(result)
    }

    fn update_result_items(&self, result_id: &Uuid, items: &[Item]) -> Result<()> {
        let mut result = self.load_result(result_id)?;
        result.items = items.to_vec();
        self.save_result(&result)
    }

    fn list_results(&self) -> Result<Vec<SavedResult>> {
        let dir = self.results_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for entry in
            fs::read_dir(&dir).with_context(|| format!("Failed to list results: {:?}", dir))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read result: {:?}", path))?;
            let result: SavedResult = serde_json::from_str(&content)
                .with_context(|| format!("Invalid result document: {:?}", path))?;
            results.push(result);
        }

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }
}
