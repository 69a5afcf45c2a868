//! Pre-built Test Fixtures
//!
//! Provides ready-to-use CRM data for the entity kinds used across the test
//! suite. Field metadata follows what the CRM's `getfields` action returns
//! for contacts and events, trimmed to a representative subset.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

use core_kernel::{EntityTypeDefinition, Timezone};
use domain_entity::{AllowedValues, CrmTypeCode, RawFieldMetadata, RawRecord};

use crate::builders::RawFieldMetadataBuilder;

/// Fixture for framework entity types
pub struct EntityTypeFixtures;

impl EntityTypeFixtures {
    pub fn contact() -> EntityTypeDefinition {
        EntityTypeDefinition::new("crm_contact", "Contact").with_label("CRM Contact")
    }

    pub fn event() -> EntityTypeDefinition {
        EntityTypeDefinition::new("crm_event", "Event").with_label("CRM Event")
    }
}

/// Fixture for CRM field metadata
pub struct MetadataFixtures;

impl MetadataFixtures {
    /// Contact fields, in the CRM's order
    pub fn contact_fields() -> Vec<RawFieldMetadata> {
        vec![
            RawFieldMetadataBuilder::new("id")
                .with_type(CrmTypeCode::T_INT)
                .with_title("Contact ID")
                .required()
                .build(),
            RawFieldMetadataBuilder::new("contact_type")
                .with_type(CrmTypeCode::T_STRING)
                .with_title("Contact Type")
                .build(),
            RawFieldMetadataBuilder::new("prefix_id")
                .with_type(CrmTypeCode::T_INT)
                .with_title("Individual Prefix")
                .pseudoconstant()
                .build(),
            RawFieldMetadataBuilder::new("first_name")
                .with_type(CrmTypeCode::T_STRING)
                .with_title("First Name")
                .build(),
            RawFieldMetadataBuilder::new("last_name")
                .with_type(CrmTypeCode::T_STRING)
                .with_title("Last Name")
                .build(),
            RawFieldMetadataBuilder::new("do_not_email")
                .with_type(CrmTypeCode::T_BOOLEAN)
                .with_title("Do Not Email")
                .required()
                .build(),
            RawFieldMetadataBuilder::new("birth_date")
                .with_type(CrmTypeCode::T_DATE)
                .with_title("Birth Date")
                .build(),
            RawFieldMetadataBuilder::new("email")
                .with_type(CrmTypeCode::T_EMAIL)
                .with_title("Email")
                .build(),
            RawFieldMetadataBuilder::new("group_ids")
                .with_type(CrmTypeCode::T_INT)
                .with_title("Groups")
                .serialized()
                .build(),
            RawFieldMetadataBuilder::new("created_date")
                .with_type(CrmTypeCode::T_TIMESTAMP)
                .with_title("Created Date")
                .build(),
        ]
    }

    /// Event fields, in the CRM's order
    pub fn event_fields() -> Vec<RawFieldMetadata> {
        vec![
            RawFieldMetadataBuilder::new("id")
                .with_type(CrmTypeCode::T_INT)
                .with_title("Event ID")
                .build(),
            RawFieldMetadataBuilder::new("title")
                .with_type(CrmTypeCode::T_STRING)
                .with_title("Event Title")
                .required()
                .build(),
            RawFieldMetadataBuilder::new("summary")
                .with_type(CrmTypeCode::T_TEXT)
                .with_title("Event Summary")
                .build(),
            RawFieldMetadataBuilder::new("start_date")
                .with_type(CrmTypeCode::T_DATE + CrmTypeCode::T_TIME)
                .with_title("Event Start Date")
                .build(),
            RawFieldMetadataBuilder::new("end_date")
                .with_type(CrmTypeCode::T_DATE + CrmTypeCode::T_TIME)
                .with_title("Event End Date")
                .build(),
            RawFieldMetadataBuilder::new("is_public")
                .with_type(CrmTypeCode::T_BOOLEAN)
                .with_title("Is Event Public")
                .build(),
            RawFieldMetadataBuilder::new("fee_amount")
                .with_type(CrmTypeCode::T_MONEY)
                .with_title("Fee Amount")
                .build(),
            RawFieldMetadataBuilder::new("event_type_id")
                .with_type(CrmTypeCode::T_INT)
                .with_title("Event Type")
                .pseudoconstant()
                .build(),
        ]
    }

    /// Option list of `prefix_id`
    pub fn prefix_options() -> AllowedValues {
        vec![("1", "Mrs."), ("2", "Ms."), ("3", "Mr."), ("4", "Dr.")]
            .into_iter()
            .collect()
    }

    /// Option list of `event_type_id`
    pub fn event_type_options() -> AllowedValues {
        vec![("1", "Conference"), ("2", "Exhibition"), ("3", "Fundraiser")]
            .into_iter()
            .collect()
    }
}

/// Fixture for raw CRM records, shaped as the CRM returns them
pub struct RecordFixtures;

impl RecordFixtures {
    pub fn contact_jane() -> RawRecord {
        record(json!({
            "id": "1",
            "contact_type": "Individual",
            "prefix_id": "2",
            "first_name": "Jane",
            "last_name": "Smith",
            "do_not_email": "0",
            "birth_date": "1982-08-20",
            "email": "jane.smith@example.org",
            "group_ids": ["2", "5"],
            "created_date": "2020-01-05 10:30:00"
        }))
    }

    pub fn contact_john() -> RawRecord {
        record(json!({
            "id": "2",
            "contact_type": "Individual",
            "first_name": "John",
            "last_name": "Smith",
            "do_not_email": "1",
            "birth_date": "",
            "group_ids": []
        }))
    }

    pub fn event_conference() -> RawRecord {
        record(json!({
            "id": "7",
            "title": "Annual Conference",
            "start_date": "2024-06-01 09:00:00",
            "end_date": "2024-06-03 17:30:00",
            "is_public": "1",
            "fee_amount": "150.00",
            "event_type_id": "1"
        }))
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// 2020-01-05 10:30:00 UTC
    pub const TIMESTAMP: i64 = 1_578_220_200;

    pub fn utc() -> Timezone {
        Timezone::default()
    }

    pub fn berlin() -> Timezone {
        Timezone::new(chrono_tz::Europe::Berlin)
    }

    /// The local datetime of `TIMESTAMP` in UTC
    pub fn datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 5)
            .and_then(|date| date.and_hms_opt(10, 30, 0))
            .unwrap_or_default()
    }
}

/// Converts a JSON object literal into a raw record
///
/// Non-object values yield an empty record.
pub fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}
