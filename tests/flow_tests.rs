//! View-flow tests against a mocked resource client.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;

use turbined::api::{
    NewPipeline, Pipeline, PipelineId, PipelineStatistic, StatisticSample, DATAPOINTS_KEY,
};
use turbined::client::{ClientError, PipelineApi};
use turbined::routes::{detail, list, new, RouteParams};

#[derive(Default)]
struct MockApi {
    pipelines: Vec<Pipeline>,
    created: Mutex<Vec<NewPipeline>>,
}

#[async_trait]
impl PipelineApi for MockApi {
    async fn list(&self) -> Result<Vec<Pipeline>, ClientError> {
        Ok(self.pipelines.clone())
    }

    async fn get(&self, id: &PipelineId) -> Result<Pipeline, ClientError> {
        self.pipelines
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.clone()))
    }

    async fn create(&self, pipeline: &NewPipeline) -> Result<(), ClientError> {
        self.created.lock().unwrap().push(pipeline.clone());
        Ok(())
    }

    async fn statistics(&self, id: &PipelineId) -> Result<PipelineStatistic, ClientError> {
        self.get(id).await.map(|p| p.statistic)
    }
}

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, n).unwrap()
}

fn pipeline(id: &str, samples: Vec<StatisticSample>) -> Pipeline {
    Pipeline {
        id: PipelineId::new(id),
        name: format!("{} name", id),
        description: String::new(),
        active: true,
        statistic: PipelineStatistic {
            today: samples.first().map(|s| s.intake).unwrap_or(0),
            change_rate: 0.0,
            statistics: samples,
        },
        consumers: Vec::new(),
    }
}

#[tokio::test]
async fn list_flow_shapes_every_statistic() {
    let api = MockApi {
        pipelines: vec![
            pipeline("p1", vec![StatisticSample::new(day(1), 5)]),
            pipeline("p2", vec![]),
        ],
        ..Default::default()
    };

    let views = list::load(&api).await.unwrap();
    assert_eq!(views.len(), 2);

    let first = &views[0].statistic.values;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].key, DATAPOINTS_KEY);
    assert_eq!(first[0].values, vec![(day(1), 5)]);

    let second = &views[1].statistic.values;
    assert_eq!(second.len(), 1);
    assert!(second[0].values.is_empty());
}

#[tokio::test]
async fn list_flow_values_serialize_in_chart_shape() {
    let api = MockApi {
        pipelines: vec![pipeline("p1", vec![StatisticSample::new(day(1), 5)])],
        ..Default::default()
    };

    let views = list::load(&api).await.unwrap();
    let json = serde_json::to_value(&views[0].statistic.values).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{"key": "Datapoints", "values": [["2020-01-01", 5]]}])
    );
}

#[tokio::test]
async fn detail_flow_reads_the_id_from_route_state() {
    let api = MockApi {
        pipelines: vec![
            pipeline("p1", vec![]),
            pipeline("p2", vec![StatisticSample::new(day(2), 3)]),
        ],
        ..Default::default()
    };
    let params = RouteParams {
        pipeline_id: PipelineId::new("p2"),
    };

    let view = detail::load(&api, &params).await.unwrap();
    assert_eq!(view.id, PipelineId::new("p2"));
    assert_eq!(view.statistic.values[0].values, vec![(day(2), 3)]);
}

#[tokio::test]
async fn detail_flow_propagates_not_found() {
    let api = MockApi::default();
    let params = RouteParams {
        pipeline_id: PipelineId::new("missing"),
    };

    let err = detail::load(&api, &params).await.unwrap_err();
    match err {
        ClientError::NotFound(id) => assert_eq!(id, PipelineId::new("missing")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn creation_flow_submits_exactly_the_three_form_fields() {
    let api = MockApi::default();
    let form = new::PipelineForm {
        name: "A".to_string(),
        description: "B".to_string(),
        active: true,
    };

    new::submit(&api, form).await.unwrap();

    let created = api.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    let json = serde_json::to_value(&created[0]).unwrap();
    let fields = json.as_object().unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields["name"], "A");
    assert_eq!(fields["description"], "B");
    assert_eq!(fields["active"], true);
}
