//! Tick callback that logs population reports.
//!
//! Every tick's counts are accumulated; every `report_interval` ticks a
//! snapshot of the population (role mix, mean trust, pending goals) is
//! logged at `info`. Role mutations are logged as they happen.

use std::collections::BTreeMap;

use somnium_core::runner::TickCallback;
use somnium_core::tick::{SimulationState, TickSummary};
use tracing::info;

/// Point-in-time view of the population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationReport {
    /// Number of agents.
    pub agents: usize,
    /// Agents per role.
    pub roles: BTreeMap<String, usize>,
    /// Mean trust across agents (0 for an empty population).
    pub mean_trust: f64,
    /// Pending temporary goals across all agents.
    pub temporary_goals: usize,
    /// Pending permanent goals across all agents.
    pub permanent_goals: usize,
}

impl PopulationReport {
    /// Take a snapshot of `state`.
    pub fn from_state(state: &SimulationState) -> Self {
        let mut report = Self::default();
        let mut trust_sum = 0.0_f64;

        for agent in state.agents() {
            report.agents = report.agents.saturating_add(1);
            trust_sum += agent.trust();
            let count = report.roles.entry(agent.role().to_string()).or_insert(0);
            *count = count.saturating_add(1);
            for goal in agent.goals() {
                if goal.is_temporary() {
                    report.temporary_goals = report.temporary_goals.saturating_add(1);
                } else {
                    report.permanent_goals = report.permanent_goals.saturating_add(1);
                }
            }
        }

        let divisor = u32::try_from(report.agents).unwrap_or(u32::MAX);
        if divisor > 0 {
            report.mean_trust = trust_sum / f64::from(divisor);
        }
        report
    }
}

/// Running totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Role reversals queued.
    pub doubts: usize,
    /// Dreams injected.
    pub dreams: usize,
    /// Role mutations applied.
    pub mutations: usize,
    /// Temporary goals expired.
    pub faded: usize,
}

/// Callback that accumulates totals and logs periodic reports.
#[derive(Debug)]
pub struct ReportCallback {
    report_interval: u64,
    totals: RunTotals,
}

impl ReportCallback {
    /// Log a report every `report_interval` ticks (0 = never).
    pub const fn new(report_interval: u64) -> Self {
        Self {
            report_interval,
            totals: RunTotals {
                doubts: 0,
                dreams: 0,
                mutations: 0,
                faded: 0,
            },
        }
    }

    /// Totals so far.
    pub const fn totals(&self) -> RunTotals {
        self.totals
    }

    /// Log the run totals.
    pub fn log_totals(&self) {
        info!(
            doubts = self.totals.doubts,
            dreams = self.totals.dreams,
            mutations = self.totals.mutations,
            faded = self.totals.faded,
            "Run totals"
        );
    }

    fn report_due(&self, tick: u64) -> bool {
        tick.checked_rem(self.report_interval) == Some(0)
    }
}

impl TickCallback for ReportCallback {
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
        self.totals.doubts = self.totals.doubts.saturating_add(summary.doubts);
        self.totals.dreams = self.totals.dreams.saturating_add(summary.dreams);
        self.totals.faded = self.totals.faded.saturating_add(summary.expired.len());

        if let Some(mutation) = &summary.mutation {
            self.totals.mutations = self.totals.mutations.saturating_add(1);
            info!(
                tick = summary.tick,
                entropy = summary.entropy,
                agent = %mutation.agent,
                from = %mutation.from,
                to = %mutation.to,
                "Role mutation"
            );
        }

        if self.report_due(summary.tick) {
            let report = PopulationReport::from_state(state);
            info!(
                tick = summary.tick,
                entropy = summary.entropy,
                agents = report.agents,
                eidolons = summary.eidolons,
                mean_trust = report.mean_trust,
                roles = ?report.roles,
                temporary_goals = report.temporary_goals,
                permanent_goals = report.permanent_goals,
                events = state.event_log().recorded_count(),
                "Population report"
            );
        }
    }
}
