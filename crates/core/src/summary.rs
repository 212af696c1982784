// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-facing summary of a finished run
//!
//! Collects the bits of a run that notification channels care about: which
//! pipeline ran, with what variables, for how long, and any attributes the
//! user attached through [`ATTRIBUTES_ANNOTATION`].

use crate::run::{WatchedRun, ATTRIBUTES_ANNOTATION};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Label prefix used by Pipelines-as-Code
pub const PAC_LABEL_PREFIX: &str = "pipelinesascode.tekton.dev";

/// PaC label key carrying the original pipeline run name
const PAC_ORIGINAL_NAME: &str = "original-prname";

/// Fallback when no pipeline name can be derived
pub const UNKNOWN_PIPELINE_NAME: &str = "cannot-determine-pipeline-name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub namespace: String,
    pub run_name: String,
    pub pipeline_name: String,
    pub variables: BTreeMap<String, String>,
    pub pac_labels: BTreeMap<String, String>,
    pub start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
    pub total_time: String,
    pub attributes: BTreeMap<String, String>,
}

/// Problems found while summarising; the summary is still usable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryWarning {
    /// The attributes annotation is not a JSON object of strings
    InvalidAttributes(String),
}

impl SummaryWarning {
    pub fn message(&self) -> String {
        match self {
            SummaryWarning::InvalidAttributes(err) => format!(
                "Error unmarshalling the contents of the '{}' annotation. Ensure the contents are valid JSON: {}",
                ATTRIBUTES_ANNOTATION, err
            ),
        }
    }
}

impl RunSummary {
    pub fn from_run(run: &WatchedRun) -> (Self, Vec<SummaryWarning>) {
        let mut warnings = Vec::new();
        let pac_labels = labels_with_prefix(run, PAC_LABEL_PREFIX);
        let attributes = match attributes(run) {
            Ok(attributes) => attributes,
            Err(warning) => {
                warnings.push(warning);
                BTreeMap::new()
            }
        };

        let summary = Self {
            namespace: run.namespace().to_string(),
            run_name: run.name().to_string(),
            pipeline_name: pipeline_name(run, &pac_labels),
            variables: variables(run),
            start_time: run.status.start_time,
            completion_time: run.status.completion_time,
            total_time: total_time(run.status.start_time, run.status.completion_time),
            pac_labels,
            attributes,
        };
        (summary, warnings)
    }
}

/// Run params, falling back to the pipeline's declared defaults
pub fn variables(run: &WatchedRun) -> BTreeMap<String, String> {
    let mut variables: BTreeMap<String, String> = run
        .spec
        .params
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect();

    for param in &run.status.pipeline_params {
        if let Some(default) = &param.default {
            variables
                .entry(param.name.clone())
                .or_insert_with(|| default.clone());
        }
    }
    variables
}

/// Labels under `prefix/`, keyed without the prefix
pub fn labels_with_prefix(run: &WatchedRun, prefix: &str) -> BTreeMap<String, String> {
    let qualified = format!("{}/", prefix);
    run.labels
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(&qualified)
                .map(|short| (short.to_string(), value.clone()))
        })
        .collect()
}

/// Best-effort name of the pipeline the run executed
pub fn pipeline_name(run: &WatchedRun, pac_labels: &BTreeMap<String, String>) -> String {
    if let Some(name) = pac_labels.get(PAC_ORIGINAL_NAME) {
        return name.clone();
    }

    if let Some(pipeline_ref) = &run.spec.pipeline_ref {
        if let Some(name) = pipeline_ref.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(param) = pipeline_ref.resolver_params.iter().find(|p| p.name == "name") {
            return param.value.clone();
        }
    }

    if run.spec.inline_pipeline {
        // Generated run names are `<pipeline>-<suffix>`
        let name = run.name();
        return match name.rfind('-') {
            Some(idx) => name[..idx].to_string(),
            None => name.to_string(),
        };
    }

    UNKNOWN_PIPELINE_NAME.to_string()
}

/// Wall-clock duration of the run, `Unknown` until both ends are known
pub fn total_time(start: Option<DateTime<Utc>>, completion: Option<DateTime<Utc>>) -> String {
    match (start, completion) {
        (Some(start), Some(completion)) => match (completion - start).to_std() {
            Ok(elapsed) => format_elapsed(elapsed),
            Err(_) => "Unknown".to_string(),
        },
        _ => "Unknown".to_string(),
    }
}

fn format_elapsed(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}

fn attributes(run: &WatchedRun) -> Result<BTreeMap<String, String>, SummaryWarning> {
    match run.annotations.get(ATTRIBUTES_ANNOTATION) {
        None => Ok(BTreeMap::new()),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| SummaryWarning::InvalidAttributes(e.to_string())),
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
