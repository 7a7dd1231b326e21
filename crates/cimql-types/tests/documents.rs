//! JSON document shapes for instances, classes and values

use cimql_types::{
    ArrayKind, CimDateTime, CimObject, CimType, CimValue, ClassDef, CqlValue, Instance, KeyValue,
    ObjectPath,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn disk_json() -> serde_json::Value {
    json!({
        "class_name": "CIM_DiskDrive",
        "path": {
            "namespace": "root/cimv2",
            "class_name": "CIM_DiskDrive",
            "keys": [
                { "name": "DeviceID", "value": { "type": "String", "value": "disk0" } }
            ]
        },
        "properties": [
            { "name": "Status", "value": { "type": "Uint16", "value": 2 } },
            { "name": "Name", "value": { "type": "String", "value": "DiskDrive1" } },
            { "name": "Size", "value": { "type": "Null", "value": { "cim_type": "Uint64" } } },
            { "name": "InstallDate", "value": { "type": "DateTime", "value": "20240102030405.000000+060" } },
            {
                "name": "Media",
                "value": {
                    "type": "Instance",
                    "value": {
                        "class_name": "CIM_Media",
                        "properties": [
                            { "name": "Capacity", "value": { "type": "Uint64", "value": 1024 } }
                        ]
                    }
                }
            }
        ]
    })
}

// ============================================================================
// Instances
// ============================================================================

#[test]
fn test_instance_document() {
    let disk: Instance = serde_json::from_value(disk_json()).unwrap();
    assert_eq!(disk.class_name, "CIM_DiskDrive");
    assert_eq!(disk.property("status").unwrap().value, CimValue::Uint16(2));
    assert!(disk.property("SIZE").unwrap().value.is_null());
    assert_eq!(
        disk.path.as_ref().unwrap().to_string(),
        "root/cimv2:CIM_DiskDrive.DeviceID=\"disk0\""
    );

    let media = &disk.property("Media").unwrap().value;
    match CqlValue::from_cim(media) {
        CqlValue::Object(CimObject::Instance(inner)) => {
            assert_eq!(inner.property("Capacity").unwrap().value, CimValue::Uint64(1024));
        }
        other => panic!("expected embedded instance, got {:?}", other),
    }
}

#[test]
fn test_datetime_property_normalizes() {
    let disk: Instance = serde_json::from_value(disk_json()).unwrap();
    let installed = CqlValue::from_cim(&disk.property("InstallDate").unwrap().value);
    let expected: CimDateTime = "20240102020405.000000+000".parse().unwrap();
    assert_eq!(installed, CqlValue::DateTime(expected));
}

#[test]
fn test_invalid_datetime_is_rejected() {
    let result: Result<CimValue, _> =
        serde_json::from_value(json!({ "type": "DateTime", "value": "2024-01-02" }));
    assert!(result.is_err());
}

// ============================================================================
// Classes
// ============================================================================

#[test]
fn test_class_document() {
    let class: ClassDef = serde_json::from_value(json!({
        "name": "CIM_DiskDrive",
        "superclass": "CIM_MediaAccessDevice",
        "properties": [
            {
                "name": "Availability",
                "cim_type": "Uint16",
                "qualifiers": [
                    { "name": "Values", "value": { "type": "Array", "value": {
                        "element_type": "String",
                        "items": [
                            { "type": "String", "value": "Other" },
                            { "type": "String", "value": "Running" }
                        ]
                    } } }
                ]
            },
            { "name": "Capabilities", "cim_type": "Uint16", "is_array": true }
        ]
    }))
    .unwrap();

    assert_eq!(class.superclass.as_deref(), Some("CIM_MediaAccessDevice"));
    let availability = class.property("AVAILABILITY").unwrap();
    assert_eq!(availability.cim_type, CimType::Uint16);
    assert_eq!(
        availability.qualifier("values").unwrap().value.as_string_items(),
        Some(vec!["Other", "Running"])
    );
    assert!(class.property("Capabilities").unwrap().is_array);
    assert!(class.property("Missing").is_none());
}

// ============================================================================
// Paths and array kinds
// ============================================================================

#[rstest]
#[case("//host/root/cimv2:CIM_Disk.DeviceID=\"d0\"")]
#[case("root/cimv2:CIM_Disk.Index=3,Primary=TRUE")]
#[case("CIM_Disk")]
fn test_path_display_parses_back(#[case] text: &str) {
    let path: ObjectPath = text.parse().unwrap();
    let reparsed: ObjectPath = path.to_string().parse().unwrap();
    assert_eq!(reparsed, path);
}

#[test]
fn test_path_keys_compare_unordered() {
    let a = ObjectPath::new("CIM_Disk")
        .with_key("Index", KeyValue::Number("3".into()))
        .with_key("Primary", KeyValue::Boolean(true));
    let b: ObjectPath = "cim_disk.primary=TRUE,index=3".parse().unwrap();
    assert_eq!(a, b);
}

#[rstest]
#[case("Indexed", ArrayKind::Indexed)]
#[case("ordered", ArrayKind::Ordered)]
#[case("Bag", ArrayKind::Bag)]
fn test_array_type_qualifier(#[case] text: &str, #[case] expected: ArrayKind) {
    assert_eq!(ArrayKind::from_qualifier(text), expected);
}
