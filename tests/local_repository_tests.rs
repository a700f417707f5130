//! Repository-level tests with pinned dates.

use chrono::NaiveDate;

use turbined::api::PipelineId;
use turbined::db::repositories::LocalRepository;
use turbined::db::repository::{
    DatapointRepository, PipelineRecord, PipelineRepository, RepositoryError,
    STATISTICS_WINDOW_DAYS,
};

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, n).unwrap()
}

fn record(id: &str) -> PipelineRecord {
    PipelineRecord {
        id: PipelineId::new(id),
        name: id.to_string(),
        description: String::new(),
        active: true,
    }
}

#[tokio::test]
async fn statistics_window_reports_zeros_for_missing_days() {
    let repo = LocalRepository::new();
    let id = PipelineId::new("orders");
    repo.insert_pipeline(&record("orders")).await.unwrap();

    repo.push_datapoint(&id, "a", day(15)).await.unwrap();
    repo.push_datapoint(&id, "b", day(15)).await.unwrap();
    repo.push_datapoint(&id, "c", day(14)).await.unwrap();
    // Outside the ten-day window ending on day 15.
    repo.push_datapoint(&id, "d", day(5)).await.unwrap();

    let stat = repo.retrieve_statistics(&id, day(15)).await.unwrap();
    assert_eq!(stat.today, 2);
    assert_eq!(stat.statistics.len(), STATISTICS_WINDOW_DAYS as usize);
    assert_eq!(stat.statistics[0].date, day(15));
    assert_eq!(stat.statistics[0].intake, 2);
    assert_eq!(stat.statistics[1].intake, 1);
    // Days without intake read as zero.
    assert!(stat.statistics[2..].iter().all(|s| s.intake == 0));
    assert_eq!(stat.statistics[9].date, day(6));
}

#[tokio::test]
async fn change_rate_follows_the_yesterday_rule() {
    let repo = LocalRepository::new();
    let id = PipelineId::new("orders");

    repo.push_datapoint(&id, "y", day(14)).await.unwrap();
    repo.push_datapoint(&id, "t1", day(15)).await.unwrap();
    repo.push_datapoint(&id, "t2", day(15)).await.unwrap();
    repo.push_datapoint(&id, "t3", day(15)).await.unwrap();

    let stat = repo.retrieve_statistics(&id, day(15)).await.unwrap();
    assert!((stat.change_rate - 200.0).abs() < f64::EPSILON);

    // No intake yesterday pins the rate at zero.
    let stat = repo.retrieve_statistics(&id, day(20)).await.unwrap();
    assert_eq!(stat.change_rate, 0.0);
}

#[tokio::test]
async fn statistics_of_an_idle_pipeline_are_empty_counts() {
    let repo = LocalRepository::new();
    let id = PipelineId::new("orders");
    repo.insert_pipeline(&record("orders")).await.unwrap();

    let stat = repo.retrieve_statistics(&id, day(15)).await.unwrap();
    assert_eq!(stat.today, 0);
    assert!(stat.statistics.iter().all(|s| s.intake == 0));
}

#[tokio::test]
async fn pop_on_an_empty_queue_registers_the_consumer() {
    let repo = LocalRepository::new();
    let id = PipelineId::new("orders");

    let values = repo.pop_datapoints(&id, "alpha").await.unwrap();
    assert!(values.is_empty());

    let consumers = repo.list_consumers(&id).await.unwrap();
    assert_eq!(consumers.len(), 1);
    assert_eq!(consumers[0].id, "alpha");
    assert_eq!(consumers[0].unread_elements, 0);
}

#[tokio::test]
async fn delete_clears_queue_state() {
    let repo = LocalRepository::new();
    let id = PipelineId::new("orders");
    repo.insert_pipeline(&record("orders")).await.unwrap();
    repo.push_datapoint(&id, "a", day(15)).await.unwrap();
    repo.pop_datapoints(&id, "alpha").await.unwrap();

    assert!(repo.delete_pipeline(&id).await.unwrap());
    assert!(matches!(
        repo.get_pipeline(&id).await.unwrap_err(),
        RepositoryError::NotFound { .. }
    ));
    assert!(repo.list_consumers(&id).await.unwrap().is_empty());

    // A re-created pipeline starts a fresh queue.
    let index = repo.push_datapoint(&id, "a", day(16)).await.unwrap();
    assert_eq!(index, 1);
}

#[tokio::test]
async fn insert_overwrites_an_existing_record() {
    let repo = LocalRepository::new();
    let id = PipelineId::new("orders");
    repo.insert_pipeline(&record("orders")).await.unwrap();

    let mut replacement = record("orders");
    replacement.name = "renamed".to_string();
    repo.insert_pipeline(&replacement).await.unwrap();

    assert_eq!(repo.pipeline_count(), 1);
    assert_eq!(repo.get_pipeline(&id).await.unwrap().name, "renamed");
}
