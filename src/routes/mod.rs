//! View-facing data types and flows.
//!
//! One submodule per UI state, mirroring the pipeline views: `list`,
//! `detail` and `new`, plus the chart shaping shared by the read flows.
//! The route table below is plain data handed to the host router; no
//! routing is implemented here.

use serde::{Deserialize, Serialize};

use crate::api::{Consumer, Pipeline, PipelineId, StatisticSample};
use crate::routes::chart::{chart_series, ChartSeries};

pub mod chart;
pub mod detail;
pub mod list;
pub mod new;

/// Suffix the host page-title mechanism appends to every state title.
pub const PAGE_TITLE_SUFFIX: &str = "turbine.io";

/// One named navigation state: view identifier, URL pattern, display title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteState {
    pub name: &'static str,
    pub url: &'static str,
    pub page_title: &'static str,
}

/// The three pipeline states exposed to the router collaborator.
pub const ROUTES: [RouteState; 3] = [
    RouteState {
        name: list::STATE,
        url: "/pipeline",
        page_title: "Pipelines",
    },
    RouteState {
        name: detail::STATE,
        url: "/pipeline/{pipelineId}",
        page_title: "Pipelines",
    },
    RouteState {
        name: new::STATE,
        url: "/pipeline/new",
        page_title: "Pipelines",
    },
];

/// Look up a route state by name.
pub fn route(name: &str) -> Option<&'static RouteState> {
    ROUTES.iter().find(|r| r.name == name)
}

/// Format the document title for a state, e.g. `"Pipelines | turbine.io"`.
pub fn page_title(state: &RouteState) -> String {
    format!("{} | {}", state.page_title, PAGE_TITLE_SUFFIX)
}

/// Path parameters the detail state is activated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    pub pipeline_id: PipelineId,
}

/// Rendering-ready statistic: the raw samples plus the transformed
/// single-series `values` field the chart binds to.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticView {
    pub today: i64,
    pub change_rate: f64,
    pub statistics: Vec<StatisticSample>,
    pub values: Vec<ChartSeries>,
}

/// View model for one pipeline, rebuilt on every fetch.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineView {
    pub id: PipelineId,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub statistic: StatisticView,
    pub consumers: Vec<Consumer>,
}

impl From<Pipeline> for PipelineView {
    fn from(pipeline: Pipeline) -> Self {
        let values = chart_series(&pipeline.statistic.statistics);
        PipelineView {
            id: pipeline.id,
            name: pipeline.name,
            description: pipeline.description,
            active: pipeline.active,
            statistic: StatisticView {
                today: pipeline.statistic.today,
                change_rate: pipeline.statistic.change_rate,
                statistics: pipeline.statistic.statistics,
                values,
            },
            consumers: pipeline.consumers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_lookup_by_state_name() {
        assert_eq!(route("pipeline.detail").unwrap().url, "/pipeline/{pipelineId}");
        assert!(route("pipeline.unknown").is_none());
    }

    #[test]
    fn page_title_appends_host_suffix() {
        let state = route("pipeline.list").unwrap();
        assert_eq!(page_title(state), "Pipelines | turbine.io");
    }
}
