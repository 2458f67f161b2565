//! Export chains and staleness planning
//!
//! A resource's steps are partitioned into chains of consecutive steps
//! linked output-to-input. A chain whose final output is older than the
//! reference date (usually the resource's config file) forces a full
//! re-export; otherwise only chains whose source is newer than their final
//! output are re-run. Missing files count as the oldest possible date.

use std::path::Path;
use std::time::SystemTime;

use gem_core::{is_newer, FileClock};

use crate::converter::{ConverterInvoker, ConverterRegistry};
use crate::error::ExportError;
use crate::export::ExportStep;

/// Split `steps` into maximal chains
pub fn partition(steps: &[ExportStep]) -> Vec<&[ExportStep]> {
    let mut chains = Vec::new();
    let mut start = 0;

    for i in 1..steps.len() {
        if steps[i].input_filename != steps[i - 1].output_filename {
            chains.push(&steps[start..i]);
            start = i;
        }
    }
    if start < steps.len() {
        chains.push(&steps[start..]);
    }
    chains
}

/// Which steps need to run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportPlan {
    /// Every chain had a resolvable source and output
    pub complete: bool,
    pub remaining: Vec<ExportStep>,
    /// Some final output predates the reference date
    pub forced: bool,
}

impl ExportPlan {
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Decide which chains must be re-run
pub fn plan_export(
    chains: &[&[ExportStep]],
    reference_date: Option<SystemTime>,
    registry: &ConverterRegistry,
    clock: &dyn FileClock,
) -> ExportPlan {
    let mut plan = ExportPlan {
        complete: true,
        ..ExportPlan::default()
    };

    plan.forced = chains.iter().any(|chain| {
        chain
            .last()
            .and_then(|last| registry.output_filename(last))
            .map(|output| is_newer(reference_date, clock.modified(Path::new(&output))))
            .unwrap_or(false)
    });

    if plan.forced {
        plan.remaining = chains.iter().flat_map(|chain| chain.iter().cloned()).collect();
        return plan;
    }

    for chain in chains {
        let (Some(first), Some(last)) = (chain.first(), chain.last()) else {
            log::warn!("Found an empty export chain");
            continue;
        };

        match (registry.input_filename(first), registry.output_filename(last)) {
            (Some(source), Some(output)) => {
                if is_newer(clock.modified(Path::new(&source)), clock.modified(Path::new(&output))) {
                    plan.remaining.extend(chain.iter().cloned());
                }
            }
            _ => plan.complete = false,
        }
    }

    plan
}

/// Run the planned steps; `true` if every step succeeded or was current
pub fn execute_plan(
    plan: &ExportPlan,
    registry: &ConverterRegistry,
    clock: &dyn FileClock,
    invoker: &dyn ConverterInvoker,
) -> bool {
    let mut success = true;

    for step in &plan.remaining {
        let invocation = match registry.invocation(step) {
            Ok(invocation) => invocation,
            Err(e) => {
                log::warn!("Skipping {}: {}", step, e);
                success = false;
                continue;
            }
        };

        let source_date = clock.modified(&invocation.input);
        if source_date.is_none() {
            log::warn!("{}", ExportError::MissingSource(invocation.input.clone()));
            success = false;
            continue;
        }

        let target_date = clock.modified(&invocation.output);
        if !plan.forced && target_date.is_some() && !is_newer(source_date, target_date) {
            log::debug!("{} is up to date", invocation.output.display());
            continue;
        }

        if !invoker.invoke(&invocation) {
            log::error!("Export failed: {}", invocation.command_line());
            success = false;
        }
    }

    success
}
