//! Filter codec.
//!
//! Converts between typed filters and the predicate text stored
//! in filter conditions:
//!
//! - [`encode`] - typed filter → predicate text
//! - [`decode`] - predicate text → typed filter (best effort)
//! - [`change_type`] - switch a filter to another variant
//! - [`literal`] - quoting and literal rules shared by both directions

pub mod change_type;
pub mod decode;
pub mod encode;
pub mod literal;
pub mod types;

pub use change_type::{
    boolean_filter_change_type, number_filter_change_type, string_filter_change_type,
    time_filter_change_type,
};
pub use decode::{decode_filter, DecodedFilter};
pub use encode::{
    boolean_filter_to_string, filter_to_string, number_filter_to_string, string_filter_to_string,
    time_filter_to_string,
};
pub use types::{
    BooleanFilter, BooleanFilterType, Filter, FilterFamily, GenericFilter, NumberFilter,
    NumberFilterType, StringFilter, StringFilterType, TimeFilter, TimeFilterType,
    TimeGranularity,
};
