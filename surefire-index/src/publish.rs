// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishing metrics for a sanitized [`TestIndex`].
//!
//! Where metrics end up is up to the caller: [`ArtifactResolver`] maps a class identity to
//! whatever the caller attaches metrics to (a source file, a database row), and [`MetricSink`]
//! receives the values.

use crate::{
    config::MetricsConfig,
    errors::{ResourceNotFoundError, SerializeDetailsError},
    index::TestIndex,
    metrics::{ClassMetrics, Metric},
};
use tracing::{debug, warn};

/// Maps class identities to the artifacts metrics are attached to.
pub trait ArtifactResolver {
    /// The artifact type.
    type Artifact;

    /// Resolves `identity` to an artifact, given the file name suffix of source files.
    fn resolve(
        &mut self,
        identity: &str,
        suffix: &str,
    ) -> Result<Self::Artifact, ResourceNotFoundError>;

    /// Returns an artifact for an identity that could not be resolved.
    fn placeholder(&mut self, identity: &str) -> Self::Artifact;
}

/// Receives computed metrics.
pub trait MetricSink<A> {
    /// Records `value` for `metric` on `artifact`.
    ///
    /// Never called with NaN.
    fn record(&mut self, artifact: &A, metric: Metric, value: f64);

    /// Records the rendered test details for `artifact`.
    ///
    /// Only called if [`MetricsConfig::publish_details`] is set. The default implementation does
    /// nothing.
    fn record_details(&mut self, artifact: &A, details: &str) {
        let _ = (artifact, details);
    }
}

/// Computes metrics for each class in an index and hands them to a sink.
#[derive(Clone, Debug)]
pub struct MetricPublisher<'cfg> {
    config: &'cfg MetricsConfig,
    source_suffix: &'cfg str,
}

impl<'cfg> MetricPublisher<'cfg> {
    /// Creates a new publisher.
    ///
    /// `source_suffix` is passed to [`ArtifactResolver::resolve`].
    pub fn new(config: &'cfg MetricsConfig, source_suffix: &'cfg str) -> Self {
        Self {
            config,
            source_suffix,
        }
    }

    /// Publishes metrics for every class in `index` with at least one test, in identity order.
    ///
    /// Classes that can't be resolved are published against a placeholder artifact.
    pub fn publish<R, S>(
        &self,
        index: &TestIndex,
        resolver: &mut R,
        sink: &mut S,
    ) -> Result<PublishSummary, SerializeDetailsError>
    where
        R: ArtifactResolver,
        S: MetricSink<R::Artifact>,
    {
        let mut summary = PublishSummary::default();

        for (identity, report) in index {
            let Some(metrics) = ClassMetrics::compute(report, self.config.density_precision) else {
                debug!("skipping class {identity}: no tests");
                summary.skipped_empty += 1;
                continue;
            };

            let artifact = match resolver.resolve(identity, self.source_suffix) {
                Ok(artifact) => artifact,
                Err(error) => {
                    warn!("{error}, publishing against a placeholder");
                    summary.unresolved.push(identity.to_owned());
                    resolver.placeholder(identity)
                }
            };

            for (metric, value) in metrics.measures() {
                sink.record(&artifact, metric, value);
            }
            if self.config.publish_details {
                sink.record_details(&artifact, &report.details_xml()?);
            }
            summary.published += 1;
        }

        Ok(summary)
    }
}

/// The result of [`MetricPublisher::publish`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PublishSummary {
    /// The number of classes metrics were published for.
    pub published: usize,

    /// The number of classes skipped because they had no tests.
    pub skipped_empty: usize,

    /// Identities that were published against a placeholder, in identity order.
    pub unresolved: Vec<String>,
}
