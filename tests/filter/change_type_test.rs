//! Switching filters between variants of a family.

use chrono::NaiveDate;
use composer::filter::{
    boolean_filter_change_type, number_filter_change_type, string_filter_change_type,
    time_filter_change_type, BooleanFilter, BooleanFilterType, NumberFilter, NumberFilterType,
    StringFilter, StringFilterType, TimeFilter, TimeFilterType, TimeGranularity,
};

#[test]
fn test_number_bound_moves_into_values() {
    let filter = NumberFilter::IsGreaterThan { value: 7.0 };
    assert_eq!(
        number_filter_change_type(&filter, NumberFilterType::IsNotEqualTo),
        NumberFilter::IsNotEqualTo { values: vec![7.0] }
    );
}

#[test]
fn test_number_values_become_bound() {
    let filter = NumberFilter::IsEqualTo {
        values: vec![3.0, 4.0],
    };
    assert_eq!(
        number_filter_change_type(&filter, NumberFilterType::IsLessThanOrEqualTo),
        NumberFilter::IsLessThanOrEqualTo { value: 3.0 }
    );
    assert_eq!(
        number_filter_change_type(&filter, NumberFilterType::IsBetween),
        NumberFilter::IsBetween {
            lower_bound: 3.0,
            upper_bound: 0.0
        }
    );
}

#[test]
fn test_number_custom_keeps_nothing_from_other_variants() {
    let filter = NumberFilter::IsGreaterThan { value: 7.0 };
    assert_eq!(
        number_filter_change_type(&filter, NumberFilterType::Custom),
        NumberFilter::Custom {
            partial: String::new()
        }
    );
}

#[test]
fn test_string_null_drops_values() {
    let filter = StringFilter::IsEqualTo {
        values: vec!["a".into()],
    };
    assert_eq!(
        string_filter_change_type(&filter, StringFilterType::IsNull),
        StringFilter::IsNull
    );
    assert_eq!(
        string_filter_change_type(&StringFilter::IsNull, StringFilterType::Contains),
        StringFilter::Contains { values: vec![] }
    );
}

#[test]
fn test_boolean_custom_keeps_partial() {
    let filter = BooleanFilter::Custom {
        partial: "flag".into(),
    };
    assert_eq!(
        boolean_filter_change_type(&filter, BooleanFilterType::Custom),
        filter
    );
    assert_eq!(
        boolean_filter_change_type(&filter, BooleanFilterType::IsTrueOrNull),
        BooleanFilter::IsTrueOrNull
    );
}

#[test]
fn test_time_date_carries_over() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let filter = TimeFilter::IsOn {
        date,
        granularity: TimeGranularity::Month,
    };
    assert_eq!(
        time_filter_change_type(&filter, TimeFilterType::IsBetween),
        TimeFilter::IsBetween {
            start: date,
            end: date,
            granularity: TimeGranularity::Month
        }
    );
    assert_eq!(
        time_filter_change_type(&filter, TimeFilterType::IsLast),
        TimeFilter::IsLast {
            granularity: TimeGranularity::Month
        }
    );
}

#[test]
fn test_time_relative_defaults() {
    assert_eq!(
        time_filter_change_type(&TimeFilter::IsNull, TimeFilterType::IsInThePast),
        TimeFilter::IsInThePast {
            amount: 1,
            unit: TimeGranularity::Day
        }
    );

    let past = TimeFilter::IsInThePast {
        amount: 6,
        unit: TimeGranularity::Week,
    };
    assert_eq!(
        time_filter_change_type(&past, TimeFilterType::IsInTheNext),
        TimeFilter::IsInTheNext {
            amount: 6,
            unit: TimeGranularity::Week
        }
    );
}

#[test]
fn test_time_date_defaults_to_today() {
    match time_filter_change_type(&TimeFilter::IsNotNull, TimeFilterType::IsAfter) {
        TimeFilter::IsAfter { date, granularity } => {
            assert_eq!(granularity, TimeGranularity::Day);
            assert_eq!(date.time(), chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        }
        other => panic!("expected is_after, got {:?}", other),
    }
}
