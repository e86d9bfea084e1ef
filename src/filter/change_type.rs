//! Switching a filter to another variant of its family.
//!
//! Compatible operands carry over; the rest fall back to defaults (`0` for
//! numeric bounds, today for dates, one day for relative windows).

use super::literal::today;
use super::types::{
    BooleanFilter, BooleanFilterType, NumberFilter, NumberFilterType, StringFilter,
    StringFilterType, TimeFilter, TimeFilterType, TimeGranularity,
};

pub fn string_filter_change_type(filter: &StringFilter, to: StringFilterType) -> StringFilter {
    let values = filter.values().map(|v| v.to_vec()).unwrap_or_default();

    match to {
        StringFilterType::IsEqualTo => StringFilter::IsEqualTo { values },
        StringFilterType::IsNotEqualTo => StringFilter::IsNotEqualTo { values },
        StringFilterType::StartsWith => StringFilter::StartsWith { values },
        StringFilterType::DoesNotStartWith => StringFilter::DoesNotStartWith { values },
        StringFilterType::Contains => StringFilter::Contains { values },
        StringFilterType::DoesNotContain => StringFilter::DoesNotContain { values },
        StringFilterType::EndsWith => StringFilter::EndsWith { values },
        StringFilterType::DoesNotEndWith => StringFilter::DoesNotEndWith { values },
        StringFilterType::IsBlank => StringFilter::IsBlank,
        StringFilterType::IsNotBlank => StringFilter::IsNotBlank,
        StringFilterType::IsNull => StringFilter::IsNull,
        StringFilterType::IsNotNull => StringFilter::IsNotNull,
        StringFilterType::Custom => StringFilter::Custom {
            partial: match filter {
                StringFilter::Custom { partial } => partial.clone(),
                _ => String::new(),
            },
        },
    }
}

pub fn number_filter_change_type(filter: &NumberFilter, to: NumberFilterType) -> NumberFilter {
    let values: Vec<f64> = match filter {
        NumberFilter::IsEqualTo { values } | NumberFilter::IsNotEqualTo { values } => {
            values.clone()
        }
        NumberFilter::IsGreaterThan { value }
        | NumberFilter::IsLessThan { value }
        | NumberFilter::IsGreaterThanOrEqualTo { value }
        | NumberFilter::IsLessThanOrEqualTo { value } => vec![*value],
        NumberFilter::IsBetween { lower_bound, .. } => vec![*lower_bound],
        _ => vec![],
    };
    let value = values.first().copied().unwrap_or(0.0);

    match to {
        NumberFilterType::IsEqualTo => NumberFilter::IsEqualTo { values },
        NumberFilterType::IsNotEqualTo => NumberFilter::IsNotEqualTo { values },
        NumberFilterType::IsGreaterThan => NumberFilter::IsGreaterThan { value },
        NumberFilterType::IsLessThan => NumberFilter::IsLessThan { value },
        NumberFilterType::IsGreaterThanOrEqualTo => NumberFilter::IsGreaterThanOrEqualTo { value },
        NumberFilterType::IsLessThanOrEqualTo => NumberFilter::IsLessThanOrEqualTo { value },
        NumberFilterType::IsBetween => match filter {
            NumberFilter::IsBetween { .. } => filter.clone(),
            _ => NumberFilter::IsBetween {
                lower_bound: value,
                upper_bound: 0.0,
            },
        },
        NumberFilterType::IsNull => NumberFilter::IsNull,
        NumberFilterType::IsNotNull => NumberFilter::IsNotNull,
        NumberFilterType::Custom => NumberFilter::Custom {
            partial: match filter {
                NumberFilter::Custom { partial } => partial.clone(),
                _ => String::new(),
            },
        },
    }
}

pub fn boolean_filter_change_type(filter: &BooleanFilter, to: BooleanFilterType) -> BooleanFilter {
    match to {
        BooleanFilterType::IsTrue => BooleanFilter::IsTrue,
        BooleanFilterType::IsFalse => BooleanFilter::IsFalse,
        BooleanFilterType::IsTrueOrNull => BooleanFilter::IsTrueOrNull,
        BooleanFilterType::IsFalseOrNull => BooleanFilter::IsFalseOrNull,
        BooleanFilterType::IsNull => BooleanFilter::IsNull,
        BooleanFilterType::IsNotNull => BooleanFilter::IsNotNull,
        BooleanFilterType::Custom => BooleanFilter::Custom {
            partial: match filter {
                BooleanFilter::Custom { partial } => partial.clone(),
                _ => String::new(),
            },
        },
    }
}

pub fn time_filter_change_type(filter: &TimeFilter, to: TimeFilterType) -> TimeFilter {
    let (date, end, granularity) = match filter {
        TimeFilter::IsOn { date, granularity }
        | TimeFilter::IsAfter { date, granularity }
        | TimeFilter::IsBefore { date, granularity } => (Some(*date), None, Some(*granularity)),
        TimeFilter::IsBetween {
            start,
            end,
            granularity,
        } => (Some(*start), Some(*end), Some(*granularity)),
        TimeFilter::IsLast { granularity }
        | TimeFilter::IsThis { granularity }
        | TimeFilter::IsNext { granularity } => (None, None, Some(*granularity)),
        TimeFilter::IsInThePast { unit, .. } | TimeFilter::IsInTheNext { unit, .. } => {
            (None, None, Some(*unit))
        }
        _ => (None, None, None),
    };
    let amount = match filter {
        TimeFilter::IsInThePast { amount, .. } | TimeFilter::IsInTheNext { amount, .. } => *amount,
        _ => 1,
    };
    let date = date.unwrap_or_else(today);
    let granularity = granularity.unwrap_or(TimeGranularity::Day);

    match to {
        TimeFilterType::IsNull => TimeFilter::IsNull,
        TimeFilterType::IsNotNull => TimeFilter::IsNotNull,
        TimeFilterType::IsInThePast => TimeFilter::IsInThePast {
            amount,
            unit: granularity,
        },
        TimeFilterType::IsInTheNext => TimeFilter::IsInTheNext {
            amount,
            unit: granularity,
        },
        TimeFilterType::IsLast => TimeFilter::IsLast { granularity },
        TimeFilterType::IsThis => TimeFilter::IsThis { granularity },
        TimeFilterType::IsNext => TimeFilter::IsNext { granularity },
        TimeFilterType::IsOn => TimeFilter::IsOn { date, granularity },
        TimeFilterType::IsAfter => TimeFilter::IsAfter { date, granularity },
        TimeFilterType::IsBefore => TimeFilter::IsBefore { date, granularity },
        TimeFilterType::IsBetween => TimeFilter::IsBetween {
            start: date,
            end: end.unwrap_or(date),
            granularity,
        },
        TimeFilterType::Custom => TimeFilter::Custom {
            partial: match filter {
                TimeFilter::Custom { partial } => partial.clone(),
                _ => String::new(),
            },
        },
    }
}
