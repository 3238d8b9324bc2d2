//! Round trips of the built-in catalogs through both representations, and
//! resolution through the built-in registry.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, LazyLock, Mutex};
use std::thread;

use chrono::{TimeZone, Utc};
use cybox_core::binding::XSI_TYPE;
use cybox_core::properties::{decode_properties, decode_properties_mapping, encode_properties, encode_properties_mapping};
use cybox_core::{
    DecodeContext, DecodeError, Entity, HexBinary, Object, ObjectProperties, RegistryError,
    TextValue, TypeRegistry,
};
use cybox_objects::file::{MD5, SHA1};
use cybox_objects::{
    builtin_context, builtin_registry, register_builtin, EPJumpCode, EntryPointSignature, File,
    FilePath, Hash, Hostname, Packer,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};

fn full_file() -> File {
    File {
        is_packed: Some(true),
        is_masqueraded: Some(false),
        file_name: Some(TextValue::from("example.txt")),
        file_path: Some(FilePath::fully_qualified("C:\\Temp\\example.txt")),
        device_path: Some("\\Device\\HarddiskVolume1".into()),
        full_path: Some("C:\\Temp\\example.txt".into()),
        file_extension: Some("txt".into()),
        size_in_bytes: Some(1024),
        magic_number: Some(HexBinary(vec![0x4d, 0x5a])),
        file_format: Some("ASCII text".into()),
        hashes: vec![
            Hash::new(MD5, "0123456789abcdef0123456789abcdef"),
            Hash::new(SHA1, "0123456789abcdef0123456789abcdef01234567"),
        ],
        modified_time: Some(Utc.with_ymd_and_hms(2014, 2, 3, 4, 5, 6).unwrap()),
        accessed_time: None,
        created_time: Some(Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()),
        user_owner: Some("alice".into()),
        packer_list: vec![
            Packer {
                entry_point: Some(HexBinary(vec![0x00, 0x40, 0x10, 0x00])),
                detected_entrypoint_signatures: vec![EntryPointSignature {
                    name: Some("UPX -> www.upx.sourceforge.net".into()),
                    type_: Some("EP".into()),
                }],
                ep_jump_codes: Some(EPJumpCode {
                    depth: Some(2),
                    opcodes: Some("E9".into()),
                }),
                ..Packer::named("UPX")
            },
            Packer::named("ASPack"),
        ],
        peak_entropy: Some(7.25),
        sym_links: vec!["/tmp/a".into(), "/tmp/b".into()],
        encryption_algorithm: Some("AES".into()),
        decryption_key: Some("s3cr3t".into()),
        compression_method: Some("deflate".into()),
        compression_version: Some("2.0".into()),
        compression_comment: Some("none".into()),
        ..File::default()
    }
}

fn full_hostname() -> Hostname {
    Hostname {
        is_domain_name: Some(true),
        naming_system: vec!["DNS".into(), "NetBIOS".into()],
        ..Hostname::new("www.example.com")
    }
}

#[rstest]
#[case::file_full(Box::new(full_file()))]
#[case::file_empty(Box::new(File::default()))]
#[case::hostname_full(Box::new(full_hostname()))]
#[case::hostname_empty(Box::new(Hostname::default()))]
fn payload_round_trips(#[case] props: Box<dyn ObjectProperties>) {
    let cx = builtin_context();

    let node = encode_properties(props.as_ref(), "Properties");
    assert_eq!(decode_properties(&node, &cx).unwrap().as_ref(), props.as_ref());

    let mapping = Value::Object(encode_properties_mapping(props.as_ref()));
    assert_eq!(decode_properties_mapping(&mapping, &cx).unwrap().as_ref(), props.as_ref());
}

#[test]
fn file_mapping_uses_declared_keys() {
    let file = File {
        size_in_bytes: Some(10),
        ..File::named("example.txt")
    };
    assert_eq!(
        Value::Object(encode_properties_mapping(&file)),
        json!({"xsi:type": "FileObjectType", "file_name": "example.txt", "size_in_bytes": 10})
    );
}

#[test]
fn object_matches_reference_mapping() {
    let cx = builtin_context();
    let mapping = json!({
        "id": "example:Object-1",
        "properties": {"xsi:type": "FileObjectType", "file_name": "example.txt"},
        "related_objects": [{"idref": "example:Object-2", "relationship": "Same As"}],
    });

    let object = Object::from_mapping(&mapping, &cx).unwrap();
    let file = object.properties().and_then(|p| p.downcast_ref::<File>()).unwrap();
    assert_eq!(file.file_name, Some(TextValue::from("example.txt")));
    assert_eq!(object.to_mapping(), mapping);
}

#[test]
fn packer_list_keeps_order() {
    let cx = builtin_context();
    let file = File {
        packer_list: vec![Packer::named("A"), Packer::named("B"), Packer::named("C")],
        ..File::default()
    };

    let node = file.to_binding("Properties");
    let names: Vec<_> = node
        .child("Packer_List")
        .unwrap()
        .children_named("Packer")
        .filter_map(|p| p.child("Name").and_then(|n| n.text()))
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    let decoded = File::from_binding(&node, &cx).unwrap();
    assert_eq!(decoded.packer_list, file.packer_list);
    let decoded = File::from_mapping(&file.to_mapping(), &cx).unwrap();
    assert_eq!(decoded.packer_list, file.packer_list);
}

#[test]
fn list_valued_file_name_is_escaped_in_binding() {
    let cx = builtin_context();
    let file = File::named(vec!["a,b", "c"]);

    let node = file.to_binding("Properties");
    assert_eq!(
        node.child("File_Name").and_then(|n| n.text()),
        Some("<![CDATA[a&comma;b,c]]>")
    );
    assert_eq!(File::from_binding(&node, &cx).unwrap(), file);

    assert_eq!(file.to_mapping()["file_name"], json!(["a,b", "c"]));
    assert_eq!(File::from_mapping(&file.to_mapping(), &cx).unwrap(), file);
}

#[test]
fn one_element_file_name_round_trips_through_binding() {
    let cx = builtin_context();
    let file = File::named(vec!["only"]);
    let node = file.to_binding("Properties");
    assert_eq!(node.child("File_Name").and_then(|n| n.text()), Some("only"));
    assert_eq!(File::from_binding(&node, &cx).unwrap(), file);
}

#[rstest]
#[case("FileObj:FileObjectType", "http://cybox.mitre.org/objects#FileObject-2")]
#[case("HostnameObj:HostnameObjectType", "http://cybox.mitre.org/objects#HostnameObject-1")]
fn builtin_registry_resolves_catalogs(#[case] discriminator: &str, #[case] namespace: &str) {
    let entry = builtin_registry().resolve(discriminator).unwrap();
    assert_eq!(entry.namespace, namespace);
    assert_eq!(entry.discriminator(), discriminator);
}

#[test]
fn resolved_file_entry_decodes_a_file() {
    let cx = builtin_context();
    let entry = builtin_registry().resolve("FileObj:FileObjectType").unwrap();
    let props = entry.decode_mapping(&json!({"file_name": "x"}), &cx).unwrap();
    assert!(props.is::<File>());
}

#[test]
fn unregistered_discriminator_is_unknown() {
    assert_eq!(
        builtin_registry().resolve("Bogus:Type").unwrap_err(),
        RegistryError::UnknownType("Bogus:Type".into())
    );

    let cx = builtin_context();
    let mut node = File::default().to_binding("Properties");
    node.set_attr(XSI_TYPE, "Bogus:Type");
    assert_eq!(
        decode_properties(&node, &cx).unwrap_err(),
        DecodeError::UnknownType("Bogus:Type".into())
    );
}

#[test]
fn register_builtin_is_idempotent() {
    let mut registry = TypeRegistry::new();
    register_builtin(&mut registry).unwrap();
    register_builtin(&mut registry).unwrap();
    assert_eq!(
        registry.discriminators(),
        vec!["FileObj:FileObjectType", "HostnameObj:HostnameObjectType"]
    );
}

static POPULATIONS: AtomicUsize = AtomicUsize::new(0);

static COUNTED: LazyLock<TypeRegistry> = LazyLock::new(|| {
    POPULATIONS.fetch_add(1, Ordering::SeqCst);
    let mut registry = TypeRegistry::new();
    register_builtin(&mut registry).unwrap();
    registry
});

#[test]
fn registry_population_runs_once_under_concurrent_first_access() {
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                COUNTED.resolve("FileObj:FileObjectType").is_ok()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(POPULATIONS.load(Ordering::SeqCst), 1);
    assert_eq!(COUNTED.len(), 2);
    assert_eq!(builtin_registry().discriminators(), COUNTED.discriminators());
}

#[test]
fn malformed_size_is_an_invalid_value() {
    let registry = TypeRegistry::new();
    let cx = DecodeContext::new(&registry);
    let err = File::from_mapping(&json!({"size_in_bytes": -5}), &cx).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidValue { field: "size_in_bytes", .. }));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn dispatch_logs_the_resolved_type() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let cx = builtin_context();
    let node = encode_properties(&full_hostname(), "Properties");
    tracing::subscriber::with_default(subscriber, || {
        assert!(decode_properties(&node, &cx).is_ok());
    });

    let output = logs.contents();
    assert!(output.contains("decoding payload"), "{output}");
    assert!(output.contains("HostnameObj:HostnameObjectType"), "{output}");
}
