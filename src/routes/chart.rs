//! Chart series shaping for the statistics widget.
//!
//! The charting directive consumes a list of named series, each holding
//! `[date, intake]` pairs. The statistics endpoint delivers raw daily
//! samples; this module reshapes them without sorting or aggregating.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::StatisticSample;

/// Label of the single series every statistic is rendered as.
pub const DATAPOINTS_KEY: &str = "Datapoints";

/// One chart point, serialized as a `[date, intake]` pair.
pub type ChartPoint = (NaiveDate, i64);

/// A named point series in the shape the charting widget expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub key: String,
    pub values: Vec<ChartPoint>,
}

/// Reshape raw statistic samples into the single-series chart format.
///
/// The output always contains exactly one series labeled
/// [`DATAPOINTS_KEY`], with points in input order. An empty sample list
/// yields an empty series, not an error.
pub fn chart_series(samples: &[StatisticSample]) -> Vec<ChartSeries> {
    vec![ChartSeries {
        key: DATAPOINTS_KEY.to_string(),
        values: samples.iter().map(|s| (s.date, s.intake)).collect(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, n).unwrap()
    }

    #[test]
    fn empty_input_yields_single_empty_series() {
        let series = chart_series(&[]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].key, DATAPOINTS_KEY);
        assert!(series[0].values.is_empty());
    }

    #[test]
    fn points_preserve_input_order() {
        let samples = vec![
            StatisticSample::new(day(3), 7),
            StatisticSample::new(day(1), 5),
            StatisticSample::new(day(2), 0),
        ];
        let series = chart_series(&samples);
        assert_eq!(
            series[0].values,
            vec![(day(3), 7), (day(1), 5), (day(2), 0)]
        );
    }

    #[test]
    fn series_serializes_as_date_intake_pairs() {
        let series = chart_series(&[StatisticSample::new(day(1), 5)]);
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"key": "Datapoints", "values": [["2020-01-01", 5]]}])
        );
    }

    fn arb_samples() -> impl Strategy<Value = Vec<StatisticSample>> {
        prop::collection::vec(
            (1u32..=28, 1u32..=12, 0i64..1_000_000).prop_map(|(d, m, intake)| {
                StatisticSample::new(NaiveDate::from_ymd_opt(2020, m, d).unwrap(), intake)
            }),
            0..64,
        )
    }

    proptest! {
        #[test]
        fn always_exactly_one_datapoints_series(samples in arb_samples()) {
            let series = chart_series(&samples);
            prop_assert_eq!(series.len(), 1);
            prop_assert_eq!(series[0].key.as_str(), DATAPOINTS_KEY);
        }

        #[test]
        fn output_pairs_equal_input_samples(samples in arb_samples()) {
            let series = chart_series(&samples);
            prop_assert_eq!(series[0].values.len(), samples.len());
            for (point, sample) in series[0].values.iter().zip(&samples) {
                prop_assert_eq!(*point, (sample.date, sample.intake));
            }
        }
    }
}
