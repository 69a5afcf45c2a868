//! Property-Based Test Generators
//!
//! Provides proptest strategies for CRM field metadata, metadata flags and
//! datetimes in the shapes the CRM actually produces.

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use serde_json::{json, Value};

use core_kernel::Timezone;
use domain_entity::{CrmTypeCode, RawFieldMetadata};

/// Every numeric type code the CRM defines, plus Date+Time
pub const KNOWN_TYPE_CODES: [u64; 15] = [
    CrmTypeCode::T_INT,
    CrmTypeCode::T_STRING,
    CrmTypeCode::T_DATE,
    CrmTypeCode::T_TIME,
    CrmTypeCode::T_DATE + CrmTypeCode::T_TIME,
    CrmTypeCode::T_BOOLEAN,
    CrmTypeCode::T_TEXT,
    CrmTypeCode::T_BLOB,
    CrmTypeCode::T_TIMESTAMP,
    CrmTypeCode::T_FLOAT,
    CrmTypeCode::T_MONEY,
    CrmTypeCode::T_EMAIL,
    CrmTypeCode::T_URL,
    CrmTypeCode::T_CCNUM,
    CrmTypeCode::T_MEDIUMBLOB,
];

/// Strategy for field names that are never the identifier
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,20}".prop_filter("identifier", |name| name != "id")
}

/// Strategy for metadata flag values, truthy or not, in any CRM encoding
pub fn flag_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(json!(true))),
        Just(Some(json!(false))),
        Just(Some(json!(1))),
        Just(Some(json!(0))),
        Just(Some(json!("1"))),
        Just(Some(json!("0"))),
        Just(Some(json!(""))),
        Just(Some(json!({"optionGroupName": "options"}))),
    ]
}

/// Strategy for type values: known codes as numbers or strings, names, junk
pub fn type_value_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        prop::sample::select(KNOWN_TYPE_CODES.to_vec()).prop_map(|code| Some(json!(code))),
        prop::sample::select(KNOWN_TYPE_CODES.to_vec()).prop_map(|code| Some(json!(code.to_string()))),
        prop::sample::select(vec!["Int", "Boolean", "LongText", "Enum", "Email", "Link"])
            .prop_map(|name| Some(json!(name))),
        (3u64..100_000).prop_map(|code| Some(json!(code))),
    ]
}

/// Strategy for arbitrary field metadata entries
pub fn raw_field_metadata_strategy() -> impl Strategy<Value = RawFieldMetadata> {
    (
        field_name_strategy(),
        type_value_strategy(),
        flag_strategy(),
        flag_strategy(),
        flag_strategy(),
        proptest::option::of("[A-Za-z ]{1,30}"),
    )
        .prop_map(|(name, type_code, pseudoconstant, required, serialize, title)| RawFieldMetadata {
            name,
            type_code,
            pseudoconstant,
            required,
            serialize,
            title,
            description: None,
        })
}

/// Strategy for boolean field metadata carrying any `required` flag
pub fn boolean_metadata_strategy() -> impl Strategy<Value = RawFieldMetadata> {
    (
        field_name_strategy(),
        prop_oneof![
            Just(json!(CrmTypeCode::T_BOOLEAN)),
            Just(json!(CrmTypeCode::T_BOOLEAN.to_string())),
            Just(json!("Boolean")),
        ],
        flag_strategy(),
    )
        .prop_map(|(name, type_code, required)| RawFieldMetadata {
            type_code: Some(type_code),
            required,
            ..RawFieldMetadata::new(name)
        })
}

/// Strategy for second-precision datetimes between 1971 and 2099
pub fn naive_datetime_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (1971i32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_filter_map(
        "valid datetime",
        |(y, m, d, h, min, s)| NaiveDate::from_ymd_opt(y, m, d).and_then(|date| date.and_hms_opt(h, min, s)),
    )
}

/// Strategy for site timezones, with and without daylight saving
pub fn timezone_strategy() -> impl Strategy<Value = Timezone> {
    prop_oneof![
        Just(Timezone::default()),
        Just(Timezone::new(chrono_tz::Europe::Berlin)),
        Just(Timezone::new(chrono_tz::America::New_York)),
        Just(Timezone::new(chrono_tz::Asia::Kolkata)),
        Just(Timezone::new(chrono_tz::Australia::Sydney)),
    ]
}
