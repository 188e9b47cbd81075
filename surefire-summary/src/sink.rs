// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{output::StdoutStyles, resolver::SourceArtifact};
use itertools::Itertools;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;
use surefire_index::{Metric, MetricSink};
use swrite::{SWrite, swrite, swriteln};

/// The metrics published for one class.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ClassSummary {
    pub(crate) artifact: SourceArtifact,
    pub(crate) measures: Vec<(Metric, f64)>,
    pub(crate) details: Option<String>,
}

impl ClassSummary {
    fn get(&self, metric: Metric) -> Option<f64> {
        self.measures
            .iter()
            .find_map(|(m, value)| (*m == metric).then_some(*value))
    }
}

/// Collects published metrics, grouped by artifact in publishing order.
#[derive(Debug, Default)]
pub(crate) struct SummarySink {
    classes: Vec<ClassSummary>,
}

impl SummarySink {
    pub(crate) fn into_classes(self) -> Vec<ClassSummary> {
        self.classes
    }

    fn entry(&mut self, artifact: &SourceArtifact) -> &mut ClassSummary {
        // The publisher emits all values for a class before moving on to the next one.
        let is_new = self
            .classes
            .last()
            .is_none_or(|last| &last.artifact != artifact);
        if is_new {
            self.classes.push(ClassSummary {
                artifact: artifact.clone(),
                measures: Vec::new(),
                details: None,
            });
        }
        let last = self.classes.len() - 1;
        &mut self.classes[last]
    }
}

impl MetricSink<SourceArtifact> for SummarySink {
    fn record(&mut self, artifact: &SourceArtifact, metric: Metric, value: f64) {
        self.entry(artifact).measures.push((metric, value));
    }

    fn record_details(&mut self, artifact: &SourceArtifact, details: &str) {
        self.entry(artifact).details = Some(details.to_owned());
    }
}

/// Writes one line per class.
pub(crate) fn write_human(classes: &[ClassSummary], styles: &StdoutStyles) -> String {
    let mut out = String::new();

    for class in classes {
        match &class.artifact {
            SourceArtifact::Resolved(path) => swrite!(out, "{}", path.style(styles.artifact)),
            SourceArtifact::Placeholder(identity) => swrite!(
                out,
                "{} {}",
                identity.style(styles.artifact),
                "(unresolved)".style(styles.unresolved)
            ),
        }

        let count = |metric| class.get(metric).unwrap_or_default();
        let failed = count(Metric::TestErrors) + count(Metric::TestFailures);
        let mut parts = vec![
            format!("{} tests", count(Metric::Tests)),
            format!("{} skipped", count(Metric::SkippedTests).style(styles.skip)),
            format!("{} errors", count(Metric::TestErrors)),
            format!("{} failures", count(Metric::TestFailures)),
            format!("{}ms", count(Metric::TestExecutionTime)),
        ];
        if let Some(density) = class.get(Metric::TestSuccessDensity) {
            let style = if failed > 0.0 {
                styles.fail
            } else {
                styles.pass
            };
            parts.push(format!("{}", format!("{density}% passed").style(style)));
        }
        swriteln!(out, ": {}", parts.iter().join(", "));

        if let Some(details) = &class.details {
            swriteln!(out, "  {details}");
        }
    }

    out
}

#[derive(Serialize)]
struct JsonClass<'a> {
    artifact: String,
    resolved: bool,
    metrics: BTreeMap<&'static str, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

/// Writes one JSON object per line, per class.
pub(crate) fn write_json(classes: &[ClassSummary]) -> Result<String, serde_json::Error> {
    let mut out = String::new();

    for class in classes {
        let json = JsonClass {
            artifact: class.artifact.to_string(),
            resolved: class.artifact.is_resolved(),
            metrics: class
                .measures
                .iter()
                .map(|(metric, value)| (metric.key(), *value))
                .collect(),
            details: class.details.as_deref(),
        };
        out.push_str(&serde_json::to_string(&json)?);
        out.push('\n');
    }

    Ok(out)
}
