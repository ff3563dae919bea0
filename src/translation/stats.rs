/*!
 * Run statistics.
 *
 * Cumulative token estimates, request counts and a cost estimate, kept across
 * runs in a small JSON snapshot. These numbers are for observability only and
 * never influence what gets translated.
 */

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::app_config::PricingConfig;

/// Rough token estimate, about four characters per token
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(4)
}

/// Persisted counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunStatistics {
    #[serde(default)]
    pub total_input_tokens: u64,

    #[serde(default)]
    pub total_output_tokens: u64,

    #[serde(default)]
    pub total_requests: u64,

    /// Estimated cost in USD
    #[serde(default)]
    pub total_cost: f64,

    #[serde(default)]
    pub last_updated: Option<String>,
}

impl RunStatistics {
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }

    fn add(&mut self, input_tokens: u64, output_tokens: u64, cost: f64) {
        self.total_input_tokens += input_tokens;
        self.total_output_tokens += output_tokens;
        self.total_requests += 1;
        self.total_cost += cost;
    }
}

/// Shared statistics handle: the persisted totals plus this run's share
#[derive(Debug, Clone)]
pub struct StatsStore {
    totals: Arc<Mutex<RunStatistics>>,
    session: Arc<Mutex<RunStatistics>>,
    pricing: PricingConfig,
}

impl StatsStore {
    /// Start from zero
    pub fn new(pricing: PricingConfig) -> Self {
        Self::from_snapshot(RunStatistics::default(), pricing)
    }

    fn from_snapshot(totals: RunStatistics, pricing: PricingConfig) -> Self {
        Self {
            totals: Arc::new(Mutex::new(totals)),
            session: Arc::new(Mutex::new(RunStatistics::default())),
            pricing,
        }
    }

    /// Read the snapshot file; absent or unreadable files start from zero
    pub fn load<P: AsRef<Path>>(path: P, pricing: PricingConfig) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::new(pricing);
        }

        match read_snapshot(path) {
            Ok(totals) => Self::from_snapshot(totals, pricing),
            Err(e) => {
                warn!("Ignoring unreadable statistics file {}: {}", path.display(), e);
                Self::new(pricing)
            }
        }
    }

    /// Overwrite the snapshot file with the current totals
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create statistics directory: {}", parent.display()))?;
        }

        let mut totals = self.totals.lock();
        totals.last_updated = Some(Local::now().to_rfc3339());
        let json = serde_json::to_string_pretty(&*totals).context("Failed to serialize statistics")?;
        fs::write(path, json).with_context(|| format!("Failed to write statistics file: {}", path.display()))?;

        debug!("Saved run statistics to {}", path.display());
        Ok(())
    }

    /// Record one backend call
    pub fn record(&self, input: &str, output: &str) {
        let input_tokens = estimate_tokens(input);
        let output_tokens = estimate_tokens(output);
        let cost = self.cost_of(input_tokens, output_tokens);

        self.totals.lock().add(input_tokens, output_tokens, cost);
        self.session.lock().add(input_tokens, output_tokens, cost);
    }

    fn cost_of(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        input_tokens as f64 / 1000.0 * self.pricing.input_cost_per_1k
            + output_tokens as f64 / 1000.0 * self.pricing.output_cost_per_1k
    }

    /// Cumulative totals including this run
    pub fn totals(&self) -> RunStatistics {
        self.totals.lock().clone()
    }

    /// Counters for this run only
    pub fn session(&self) -> RunStatistics {
        self.session.lock().clone()
    }

    /// Human-readable report of the cumulative totals
    pub fn report(&self) -> String {
        let totals = self.totals();
        let input_cost = totals.total_input_tokens as f64 / 1000.0 * self.pricing.input_cost_per_1k;
        let output_cost = totals.total_output_tokens as f64 / 1000.0 * self.pricing.output_cost_per_1k;

        format!(
            "Translation statistics\n\
             Requests:      {}\n\
             Input tokens:  {} (${:.4} at ${}/1K)\n\
             Output tokens: {} (${:.4} at ${}/1K)\n\
             Total tokens:  {}\n\
             Total cost:    ${:.4}\n\
             Last updated:  {}",
            totals.total_requests,
            totals.total_input_tokens,
            input_cost,
            self.pricing.input_cost_per_1k,
            totals.total_output_tokens,
            output_cost,
            self.pricing.output_cost_per_1k,
            totals.total_tokens(),
            totals.total_cost,
            totals.last_updated.as_deref().unwrap_or("never"),
        )
    }
}

fn read_snapshot(path: &Path) -> Result<RunStatistics> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read statistics file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse statistics file: {}", path.display()))
}
