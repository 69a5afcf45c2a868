//! Field schema derivation tests
//!
//! Runs the deriver against the mock CRM with realistic contact and event
//! metadata, and checks the descriptor invariants over arbitrary metadata.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use core_kernel::{EntityKind, PortError};
use domain_entity::{
    Cardinality, CrmOperation, FieldSchemaDeriver, FieldSchemaProvider, MockCrmApi, RawFieldMetadata, SemanticType,
};
use test_utils::{
    assert_booleans_optional, assert_field_type, assert_identifier_descriptor, boolean_metadata_strategy,
    init_test_tracing, raw_field_metadata_strategy, EntityTypeFixtures, MetadataFixtures, RawFieldMetadataBuilder,
};

async fn deriver_for(entity: &str, fields: Vec<RawFieldMetadata>) -> (FieldSchemaDeriver, Arc<MockCrmApi>) {
    let crm = Arc::new(MockCrmApi::new().with_fields(entity, fields).await);
    (FieldSchemaDeriver::new(crm.clone()), crm)
}

#[tokio::test]
async fn test_contact_schema() {
    init_test_tracing();
    let crm = Arc::new(
        MockCrmApi::new()
            .with_fields("Contact", MetadataFixtures::contact_fields())
            .await
            .with_options("Contact", "prefix_id", MetadataFixtures::prefix_options())
            .await,
    );
    let deriver = FieldSchemaDeriver::new(crm.clone());

    let fields = deriver
        .base_field_definitions(&EntityTypeFixtures::contact())
        .await
        .unwrap();

    let names: Vec<_> = fields.names().collect();
    assert_eq!(
        names,
        vec![
            "id",
            "contact_type",
            "prefix_id",
            "first_name",
            "last_name",
            "do_not_email",
            "birth_date",
            "email",
            "group_ids",
            "created_date",
        ]
    );

    assert_identifier_descriptor(fields.get("id").unwrap());
    assert!(!fields.get("id").unwrap().is_required());

    let prefix = assert_field_type(&fields, "prefix_id", SemanticType::EnumeratedInteger);
    assert_eq!(prefix.allowed_values(), Some(&MetadataFixtures::prefix_options()));
    assert_eq!(prefix.field_type(), "list_integer");

    assert_field_type(&fields, "first_name", SemanticType::ShortText);
    assert_field_type(&fields, "birth_date", SemanticType::Date);
    assert_field_type(&fields, "created_date", SemanticType::Timestamp);

    let email = assert_field_type(&fields, "email", SemanticType::Email);
    assert_eq!(email.max_length(), Some(255));
    assert_eq!(email.label(), "Email");

    let groups = assert_field_type(&fields, "group_ids", SemanticType::Integer);
    assert_eq!(groups.cardinality(), Cardinality::Multiple);

    let do_not_email = assert_field_type(&fields, "do_not_email", SemanticType::Boolean);
    assert!(!do_not_email.is_required());

    assert_eq!(crm.calls_of(CrmOperation::GetFields).await.len(), 1);
    assert_eq!(crm.calls_of(CrmOperation::GetOptions).await.len(), 1);
}

#[tokio::test]
async fn test_event_schema() {
    let crm = Arc::new(
        MockCrmApi::new()
            .with_fields("Event", MetadataFixtures::event_fields())
            .await
            .with_options("Event", "event_type_id", MetadataFixtures::event_type_options())
            .await,
    );
    let fields = FieldSchemaDeriver::new(crm)
        .base_field_definitions(&EntityTypeFixtures::event())
        .await
        .unwrap();

    let title = assert_field_type(&fields, "title", SemanticType::ShortText);
    assert!(title.is_required());
    assert_eq!(title.label(), "Event Title");

    assert_field_type(&fields, "summary", SemanticType::ShortText);
    let start = assert_field_type(&fields, "start_date", SemanticType::DateTime);
    assert_eq!(start.datetime_type(), Some("datetime"));
    assert_field_type(&fields, "fee_amount", SemanticType::Float);
    assert_field_type(&fields, "event_type_id", SemanticType::EnumeratedInteger);
}

#[tokio::test]
async fn test_identifier_without_type_code() {
    let (deriver, _) = deriver_for("Contact", vec![RawFieldMetadata::new("id")]).await;
    let fields = deriver.derive_fields(&EntityKind::from("Contact")).await.unwrap();

    assert_identifier_descriptor(fields.get("id").unwrap());
}

#[tokio::test]
async fn test_identifier_ignores_type_metadata() {
    let (deriver, crm) = deriver_for(
        "Contact",
        vec![RawFieldMetadataBuilder::new("id")
            .with_type_name("String")
            .pseudoconstant()
            .serialized()
            .build()],
    )
    .await;
    let fields = deriver.derive_fields(&EntityKind::from("Contact")).await.unwrap();

    assert_identifier_descriptor(fields.get("id").unwrap());
    assert!(crm.calls_of(CrmOperation::GetOptions).await.is_empty());
}

#[tokio::test]
async fn test_identifier_present_when_metadata_omits_it() {
    let (deriver, _) = deriver_for(
        "Activity",
        vec![
            RawFieldMetadataBuilder::new("subject").with_type(2).build(),
            RawFieldMetadataBuilder::new("is_test").with_type(16).build(),
        ],
    )
    .await;
    let fields = deriver.derive_fields(&EntityKind::from("Activity")).await.unwrap();

    let names: Vec<_> = fields.names().collect();
    assert_eq!(names, vec!["id", "subject", "is_test"]);
    assert_identifier_descriptor(fields.get("id").unwrap());
}

#[tokio::test]
async fn test_money_is_float() {
    let (deriver, _) = deriver_for(
        "Contribution",
        vec![RawFieldMetadataBuilder::new("amount").with_type(1024).build()],
    )
    .await;
    let fields = deriver.derive_fields(&EntityKind::from("Contribution")).await.unwrap();

    assert_field_type(&fields, "amount", SemanticType::Float);
}

#[tokio::test]
async fn test_pseudoconstant_triggers_one_option_call() {
    let crm = Arc::new(
        MockCrmApi::new()
            .with_fields(
                "Contact",
                vec![RawFieldMetadataBuilder::new("contact_type")
                    .with_type(1)
                    .with_pseudoconstant(json!(true))
                    .build()],
            )
            .await
            .with_options(
                "Contact",
                "contact_type",
                vec![("1", "Individual"), ("2", "Household"), ("3", "Organization")]
                    .into_iter()
                    .collect(),
            )
            .await,
    );
    let fields = FieldSchemaDeriver::new(crm.clone())
        .derive_fields(&EntityKind::from("Contact"))
        .await
        .unwrap();

    let contact_type = assert_field_type(&fields, "contact_type", SemanticType::EnumeratedInteger);
    let labels: Vec<_> = contact_type.allowed_values().unwrap().iter().collect();
    assert_eq!(labels, vec![("1", "Individual"), ("2", "Household"), ("3", "Organization")]);

    let option_calls = crm.calls_of(CrmOperation::GetOptions).await;
    assert_eq!(option_calls.len(), 1);
}

#[tokio::test]
async fn test_pseudoconstant_on_non_integer_is_ignored() {
    let (deriver, crm) = deriver_for(
        "Contact",
        vec![RawFieldMetadataBuilder::new("preferred_language")
            .with_type(2)
            .pseudoconstant()
            .build()],
    )
    .await;
    let fields = deriver.derive_fields(&EntityKind::from("Contact")).await.unwrap();

    assert_field_type(&fields, "preferred_language", SemanticType::ShortText);
    assert!(crm.calls_of(CrmOperation::GetOptions).await.is_empty());
}

#[tokio::test]
async fn test_metadata_failure_propagates() {
    let crm = Arc::new(MockCrmApi::new());
    crm.fail_on(CrmOperation::GetFields, "Authorization failed").await;

    let result = FieldSchemaDeriver::new(crm)
        .derive_fields(&EntityKind::from("Contact"))
        .await;

    match result {
        Err(PortError::Remote { message, .. }) => assert_eq!(message, "Authorization failed"),
        other => panic!("Expected remote error, got {:?}", other.map(|fields| fields.len())),
    }
}

#[tokio::test]
async fn test_duplicate_names_keep_first_position() {
    let (deriver, _) = deriver_for(
        "Contact",
        vec![
            RawFieldMetadata::new("id"),
            RawFieldMetadataBuilder::new("nick_name").with_type(2).build(),
            RawFieldMetadataBuilder::new("source").with_type(2).build(),
            RawFieldMetadataBuilder::new("nick_name").with_type_name("LongText").build(),
        ],
    )
    .await;
    let fields = deriver.derive_fields(&EntityKind::from("Contact")).await.unwrap();

    let names: Vec<_> = fields.names().collect();
    assert_eq!(names, vec!["id", "nick_name", "source"]);
    assert_field_type(&fields, "nick_name", SemanticType::LongText);
}

#[tokio::test]
async fn test_schema_is_rederived_on_every_call() {
    let (deriver, crm) = deriver_for("Contact", vec![RawFieldMetadata::new("id")]).await;
    let kind = EntityKind::from("Contact");

    deriver.derive_fields(&kind).await.unwrap();
    deriver.derive_fields(&kind).await.unwrap();

    assert_eq!(crm.calls_of(CrmOperation::GetFields).await.len(), 2);
}

fn derive_blocking(fields: Vec<RawFieldMetadata>) -> domain_entity::FieldSet {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let (deriver, _) = deriver_for("Contact", fields).await;
        deriver.derive_fields(&EntityKind::from("Contact")).await.unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn booleans_are_never_required(meta in boolean_metadata_strategy()) {
        let fields = derive_blocking(vec![meta]);
        assert_booleans_optional(&fields);
    }

    #[test]
    fn identifier_invariant_holds_for_any_metadata(
        id_meta in raw_field_metadata_strategy(),
        others in prop::collection::vec(raw_field_metadata_strategy(), 0..8),
    ) {
        let id_meta = RawFieldMetadata { name: "id".to_string(), ..id_meta };
        let mut metadata = others;
        metadata.push(id_meta);

        let fields = derive_blocking(metadata);
        assert_identifier_descriptor(fields.get("id").unwrap());
        assert_booleans_optional(&fields);
    }

    #[test]
    fn derivation_never_fails_on_unknown_types(metadata in prop::collection::vec(raw_field_metadata_strategy(), 0..12)) {
        let mut expected: std::collections::BTreeSet<_> = metadata.iter().map(|meta| meta.name.clone()).collect();
        expected.insert("id".to_string());
        let fields = derive_blocking(metadata);
        let actual: std::collections::BTreeSet<_> = fields.names().map(str::to_string).collect();
        prop_assert_eq!(actual, expected);
    }
}
