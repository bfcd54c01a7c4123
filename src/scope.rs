//! Per-scope run: entity metadata -> plan -> commands -> tally -> report.
use crate::client::{sharedspace_entities_path, workspace_entities_path, MetadataApi};
use crate::config::OctaneConfig;
use crate::gather::gather_commands;
use crate::plan::{build_plan, EntitiesMetadata};
use crate::report::write_report_logged;
use crate::tally::Tally;
use crate::util::{truncate_string, MAX_LOGGED_BODY_BYTES};
use std::path::Path;

/// Organizational level the metadata is queried at; one report each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    SharedSpace,
    Workspace,
}

impl Scope {
    /// Run order: shared space first, then workspace.
    pub const ALL: [Scope; 2] = [Scope::SharedSpace, Scope::Workspace];

    pub fn label(self) -> &'static str {
        match self {
            Scope::SharedSpace => "sharedspace",
            Scope::Workspace => "workspace",
        }
    }

    pub fn report_name(self) -> &'static str {
        match self {
            Scope::SharedSpace => "sharedspaceCommands.json",
            Scope::Workspace => "workspaceCommands.json",
        }
    }

    pub fn metadata_path(self, octane: &OctaneConfig) -> String {
        match self {
            Scope::SharedSpace => sharedspace_entities_path(&octane.shared_space),
            Scope::Workspace => workspace_entities_path(&octane.shared_space, &octane.workspace),
        }
    }
}

/// How far a scope got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOutcome {
    Reported,
    /// The tally was built but the report file could not be written.
    ReportFailed,
    /// Entity metadata could not be fetched, so nothing ran for this scope.
    MetadataUnavailable,
}

/// Report destination and echo switch shared by both scopes.
pub struct RunOptions<'a> {
    pub out_dir: &'a Path,
    pub echo: bool,
}

/// Outcome per scope, in run order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(Scope, ScopeOutcome)>,
}

impl RunSummary {
    /// False when any scope lost its entity metadata.
    pub fn prerequisites_met(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| *outcome != ScopeOutcome::MetadataUnavailable)
    }
}

pub fn run_all<A>(api: &A, octane: &OctaneConfig, options: &RunOptions<'_>) -> RunSummary
where
    A: MetadataApi + ?Sized,
{
    let mut summary = RunSummary::default();
    for scope in Scope::ALL {
        let outcome = run_scope(api, scope, octane, options);
        summary.outcomes.push((scope, outcome));
    }
    summary
}

pub fn run_scope<A>(
    api: &A,
    scope: Scope,
    octane: &OctaneConfig,
    options: &RunOptions<'_>,
) -> ScopeOutcome
where
    A: MetadataApi + ?Sized,
{
    let Some(metadata) = fetch_entities(api, scope, &scope.metadata_path(octane)) else {
        return ScopeOutcome::MetadataUnavailable;
    };
    tracing::info!(
        scope = scope.label(),
        entities = metadata.data.len(),
        "fetched entity metadata"
    );

    let plan = build_plan(&metadata.data);
    let gathered = gather_commands(api, &plan);
    let tally = Tally::from_gathered(&gathered);
    log_duplicates(scope, &tally);

    if write_report_logged(&tally, options.out_dir, scope.report_name(), options.echo) {
        ScopeOutcome::Reported
    } else {
        ScopeOutcome::ReportFailed
    }
}

fn fetch_entities<A>(api: &A, scope: Scope, path: &str) -> Option<EntitiesMetadata>
where
    A: MetadataApi + ?Sized,
{
    let value = match api.get_json(path) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(
                scope = scope.label(),
                status = ?err.status(),
                body = %truncate_string(err.body().unwrap_or_default().trim(), MAX_LOGGED_BODY_BYTES),
                error = %err,
                "could not fetch entity metadata; skipping scope"
            );
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(metadata) => Some(metadata),
        Err(err) => {
            tracing::error!(
                scope = scope.label(),
                error = %err,
                "entity metadata has an unexpected shape; skipping scope"
            );
            None
        }
    }
}

fn log_duplicates(scope: Scope, tally: &Tally) {
    let duplicates = tally.duplicates();
    for duplicate in &duplicates {
        tracing::info!(
            scope = scope.label(),
            entity = %duplicate.entity,
            service = %duplicate.service,
            command = %duplicate.command,
            count = duplicate.count,
            "duplicate command"
        );
    }
    tracing::info!(
        scope = scope.label(),
        entities = tally.entities().len(),
        duplicates = duplicates.len(),
        "tally complete"
    );
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
