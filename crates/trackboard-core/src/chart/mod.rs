//! Chart specifications and the slots that own drawn charts.
//!
//! A [`ChartSpec`] is plain data; a [`ChartBackend`] turns it into something
//! visible. [`ChartRegistry`] guarantees at most one live chart per target.

pub mod registry;
pub mod spec;

pub use registry::{ChartBackend, ChartRegistry, RetainedBackend};
pub use spec::{ChartSpec, ControlChart, metric_charts};

/// Named render targets of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Service,
    Status,
    CycleTime,
    LeadTime,
    Gantt,
    EpicTable,
}

impl Target {
    /// Metric targets in the order [`metric_charts`] returns them.
    pub const METRICS: [Self; 4] = [Self::Service, Self::Status, Self::CycleTime, Self::LeadTime];

    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Service => "serviceChart",
            Self::Status => "statusChart",
            Self::CycleTime => "cycleTimeChart",
            Self::LeadTime => "leadTimeChart",
            Self::Gantt => "ganttChart",
            Self::EpicTable => "epicTable",
        }
    }

    /// `"<prefix>-<slug>"`, e.g. `serviceChart-general`.
    #[must_use]
    pub fn id(self, slug: &str) -> String {
        format!("{}-{slug}", self.prefix())
    }
}
