//! Fan-out/fan-in over the steps of one include call.
//!
//! Every step is planned before anything is fetched: relation lookup and key
//! grouping happen up front, so an undefined relation fails the call with no
//! fetch issued. Planned steps then run concurrently on the caller's task.
//! The coordinator loop is the only writer of the record slice and merges
//! each step as it completes. The first failure ends the call; steps still
//! in flight are dropped with it.

use std::fmt;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, trace, warn};

use super::group::{KeyGroup, key_string};
use super::include::{IncludeSpec, IncludeStep, normalize};
use super::loader::{IncludeStats, RelationLoader};
use super::merge::merge;
use super::spec::RelationDescriptor;
use crate::error::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::record::{Record, RelationValue};
use crate::traits::QueryEngine;

/// Lifecycle of one include call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Nothing dispatched yet.
    Idle,
    /// Steps are being planned and dispatched.
    Dispatching,
    /// The given number of steps are outstanding.
    Waiting(usize),
    /// Every step merged.
    Done,
    /// A step failed; the call's result is that failure.
    Failed,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Dispatching => f.write_str("dispatching"),
            Self::Waiting(n) => write!(f, "waiting({})", n),
            Self::Done => f.write_str("done"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

struct Progress<'a> {
    model: &'a str,
    state: CoordinatorState,
}

impl<'a> Progress<'a> {
    fn new(model: &'a str) -> Self {
        Self {
            model,
            state: CoordinatorState::Idle,
        }
    }

    fn enter(&mut self, next: CoordinatorState) {
        trace!(model = %self.model, from = %self.state, to = %next, "Include state changed");
        self.state = next;
    }
}

struct PlannedStep {
    step: IncludeStep,
    descriptor: Arc<RelationDescriptor>,
    group: KeyGroup,
}

#[derive(Default)]
struct StepFetch {
    related: Vec<(String, Arc<Record>)>,
    stats: IncludeStats,
}

/// Resolve `spec` on `records` of `model`, in place.
pub(crate) async fn resolve<E: QueryEngine>(
    loader: &RelationLoader<E>,
    model: &str,
    records: &mut [Record],
    spec: &IncludeSpec,
) -> QueryResult<IncludeStats> {
    let mut progress = Progress::new(model);
    let steps = normalize(spec);
    if steps.is_empty() {
        progress.enter(CoordinatorState::Done);
        return Ok(IncludeStats::default());
    }

    progress.enter(CoordinatorState::Dispatching);
    debug!(model = %model, records = records.len(), steps = steps.len(), "Resolving includes");

    let planned = match plan(loader, model, records, steps) {
        Ok(planned) => planned,
        Err(err) => {
            progress.enter(CoordinatorState::Failed);
            return Err(err);
        }
    };

    let max = loader.config().max_concurrent_steps;
    let limiter = (max > 0).then(|| Semaphore::new(max));
    let limiter = limiter.as_ref();

    let mut pending = FuturesUnordered::new();
    for (index, step) in planned.iter().enumerate() {
        pending.push(async move { (index, fetch_step(loader, step, limiter).await) });
    }

    let mut stats = IncludeStats {
        steps: planned.len(),
        ..IncludeStats::default()
    };
    progress.enter(CoordinatorState::Waiting(pending.len()));

    while let Some((index, result)) = pending.next().await {
        let step = &planned[index];
        match result {
            Ok(fetched) => {
                let merged = merge(
                    records,
                    &step.descriptor.name,
                    step.descriptor.multiple,
                    &step.group,
                    fetched.related,
                );
                stats.absorb(&fetched.stats);
                stats.merged += merged.assigned;
                progress.enter(CoordinatorState::Waiting(pending.len()));
            }
            Err(err) => {
                warn!(
                    model = %model,
                    relation = %step.descriptor.name,
                    outstanding = pending.len(),
                    error = %err,
                    "Include step failed"
                );
                progress.enter(CoordinatorState::Failed);
                return Err(err);
            }
        }
    }

    progress.enter(CoordinatorState::Done);
    crate::tether_debug!(
        model = %model,
        steps = stats.steps,
        fetches = stats.fetches,
        merged = stats.merged,
        "Includes resolved"
    );
    Ok(stats)
}

fn plan<E: QueryEngine>(
    loader: &RelationLoader<E>,
    model: &str,
    records: &[Record],
    steps: Vec<IncludeStep>,
) -> QueryResult<Vec<PlannedStep>> {
    let key_mode = loader.config().key_mode;
    steps
        .into_iter()
        .map(|step| {
            let descriptor = loader
                .schema()
                .relations()
                .lookup(model, &step.relation_name)
                .cloned()
                .ok_or_else(|| QueryError::undefined_relation(model, &step.relation_name))?;
            let group = KeyGroup::build(records, &descriptor.key_from, key_mode);
            Ok(PlannedStep {
                step,
                descriptor,
                group,
            })
        })
        .collect()
}

async fn fetch_step<E: QueryEngine>(
    loader: &RelationLoader<E>,
    planned: &PlannedStep,
    limiter: Option<&Semaphore>,
) -> QueryResult<StepFetch> {
    let descriptor = &planned.descriptor;
    if planned.group.is_empty() {
        trace!(relation = %descriptor.name, "No keys to fetch");
        return Ok(StepFetch::default());
    }

    let _permit = match limiter {
        Some(semaphore) => Some(
            semaphore
                .acquire()
                .await
                .map_err(|e| QueryError::internal(format!("step limiter closed: {}", e)))?,
        ),
        None => None,
    };

    debug!(
        model = %descriptor.model_from,
        relation = %descriptor.name,
        kind = %descriptor.kind,
        target = %descriptor.fetch_model(),
        keys = planned.group.len(),
        "Dispatching include step"
    );

    let key_to = descriptor.key_to.as_str();
    let filter = Filter::member_of(key_to, planned.group.predicate_values());

    let (related, mut stats) = match &descriptor.through {
        None => {
            let (rows, stats) = loader
                .fetch_rows(&descriptor.model_to, filter, &planned.step.sub_spec)
                .await?;
            let related = rows
                .into_iter()
                .map(|row| (key_string(row.get(key_to)), Arc::new(row)))
                .collect();
            (related, stats)
        }
        Some(through) => {
            let include = IncludeSpec::nested(through.collect.as_str(), planned.step.sub_spec.clone());
            let (joins, stats) = loader.fetch_rows(&through.model, filter, &include).await?;
            let related = joins
                .iter()
                .filter_map(|join| match join.relation(&through.collect) {
                    Some(RelationValue::One(target)) => {
                        Some((key_string(join.get(key_to)), Arc::clone(target)))
                    }
                    _ => None,
                })
                .collect();
            (related, stats)
        }
    };
    stats.fetches += 1;

    Ok(StepFetch { related, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(CoordinatorState::Waiting(3).to_string(), "waiting(3)");
        assert_eq!(CoordinatorState::Failed.to_string(), "failed");
    }
}
