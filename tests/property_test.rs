//! Property tests for the deriver and the formula evaluator.

mod common;

use common::*;
use covid_explorer::domain::deriver::derive_series;
use covid_explorer::domain::formula_eval::{CompiledFormula, MetricValues};
use proptest::prelude::*;

fn counts() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..5_000, 1..40)
}

proptest! {
    #[test]
    fn first_record_has_zero_rates(confirmed in counts()) {
        let series = derive_series("X", &make_records(&confirmed), 200).unwrap();
        prop_assert_eq!(series[0].confirmed_rate, 0);
        prop_assert_eq!(series[0].deaths_rate, 0);
        prop_assert_eq!(series[0].recovered_rate, 0);
    }

    #[test]
    fn rates_are_day_over_day_differences(confirmed in counts()) {
        let series = derive_series("X", &make_records(&confirmed), 200).unwrap();
        for pair in series.windows(2) {
            prop_assert_eq!(
                pair[1].confirmed_rate,
                pair[1].confirmed as i64 - pair[0].confirmed as i64
            );
            prop_assert_eq!(
                pair[1].deaths_rate,
                pair[1].deaths as i64 - pair[0].deaths as i64
            );
        }
    }

    #[test]
    fn relative_days_count_from_first_crossing(
        confirmed in counts(),
        threshold in 1u64..6_000,
    ) {
        let series = derive_series("X", &make_records(&confirmed), threshold).unwrap();
        match confirmed.iter().position(|&c| c >= threshold) {
            None => prop_assert!(series
                .iter()
                .all(|r| r.relative_days_after_n_confirmed.is_none())),
            Some(c) => {
                for (i, r) in series.iter().enumerate() {
                    let expected = if i < c { None } else { Some((i - c) as u32) };
                    prop_assert_eq!(r.relative_days_after_n_confirmed, expected);
                }
            }
        }
    }

    #[test]
    fn derivation_is_deterministic(confirmed in counts()) {
        let raw = make_records(&confirmed);
        prop_assert_eq!(
            derive_series("X", &raw, 200).unwrap(),
            derive_series("X", &raw, 200).unwrap()
        );
    }

    #[test]
    fn evaluation_is_always_finite(
        confirmed in -1e6f64..1e6,
        deaths in -1e6f64..1e6,
        op in prop::sample::select(vec!["+", "-", "*", "/"]),
    ) {
        let formula = CompiledFormula::compile(&format!("confirmed {} deaths", op)).unwrap();
        let values = MetricValues {
            confirmed,
            deaths,
            ..MetricValues::default()
        };
        prop_assert!(formula.evaluate(&values).is_finite());
    }

    #[test]
    fn division_by_zero_yields_zero(confirmed in -1e6f64..1e6) {
        let formula = CompiledFormula::compile("confirmed / deaths").unwrap();
        let values = MetricValues {
            confirmed,
            ..MetricValues::default()
        };
        prop_assert_eq!(formula.evaluate(&values), 0.0);
    }

    #[test]
    fn normalised_form_reparses_to_same_value(
        a in 0u32..1000,
        b in 1u32..1000,
        c in 0u32..1000,
    ) {
        let source = format!("({} - confirmed) * {} / ({} + deaths)", a, b, c);
        let formula = CompiledFormula::compile(&source).unwrap();
        let again = CompiledFormula::compile(&formula.to_string()).unwrap();
        let values = MetricValues {
            confirmed: 3.0,
            deaths: 2.0,
            ..MetricValues::default()
        };
        prop_assert_eq!(formula.evaluate(&values), again.evaluate(&values));
    }
}
