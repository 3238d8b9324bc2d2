//! File Object (`FileObj:FileObjectType`).

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use cybox_core::fields::{decode_mapping_fields, encode_mapping_fields};
use cybox_core::{
    DecodeContext, DecodeError, Entity, Field, HexBinary, PropertiesBase, PropertiesType,
    TextValue,
};
use serde_json::{Map, Value};

pub const NAMESPACE: &str = "http://cybox.mitre.org/objects#FileObject-2";

// ---------------------------------------------------------------------------
// FilePath
// ---------------------------------------------------------------------------

/// A path, optionally flagged as fully qualified.
///
/// Without the flag its mapping form is the bare string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePath {
    pub value: Option<String>,
    pub fully_qualified: Option<bool>,
}

impl FilePath {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            fully_qualified: None,
        }
    }

    #[must_use]
    pub fn fully_qualified(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            fully_qualified: Some(true),
        }
    }
}

impl Entity for FilePath {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<FilePath>>> = LazyLock::new(|| {
            vec![
                Field::text("value", |p: &FilePath| &p.value, |p: &mut FilePath| &mut p.value),
                Field::attribute(
                    "fully_qualified",
                    "fully_qualified",
                    |p: &FilePath| &p.fully_qualified,
                    |p: &mut FilePath| &mut p.fully_qualified,
                ),
            ]
        });
        &FIELDS
    }

    fn to_mapping(&self) -> Value {
        match (&self.value, self.fully_qualified) {
            (Some(value), None) => Value::String(value.clone()),
            _ => {
                let mut map = Map::new();
                encode_mapping_fields(self, &mut map);
                Value::Object(map)
            }
        }
    }

    fn from_mapping(value: &Value, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        match value {
            Value::String(path) => Ok(Self::new(path.clone())),
            Value::Object(map) => decode_mapping_fields(map, cx),
            _ => Err(DecodeError::UnexpectedShape {
                field: "file_path",
                expected: "string or mapping",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Hashes
// ---------------------------------------------------------------------------

pub const MD5: &str = "MD5";
pub const SHA1: &str = "SHA1";
pub const SHA256: &str = "SHA256";

/// One digest of the file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hash {
    pub type_: Option<String>,
    pub simple_hash_value: Option<String>,
}

impl Hash {
    #[must_use]
    pub fn new(type_: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            type_: Some(type_.into()),
            simple_hash_value: Some(value.into()),
        }
    }
}

impl Entity for Hash {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<Hash>>> = LazyLock::new(|| {
            vec![
                Field::scalar("Type", "type", |h: &Hash| &h.type_, |h: &mut Hash| &mut h.type_),
                Field::scalar(
                    "Simple_Hash_Value",
                    "simple_hash_value",
                    |h: &Hash| &h.simple_hash_value,
                    |h: &mut Hash| &mut h.simple_hash_value,
                ),
            ]
        });
        &FIELDS
    }
}

// ---------------------------------------------------------------------------
// Packers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EPJumpCode {
    pub depth: Option<i64>,
    pub opcodes: Option<String>,
}

impl Entity for EPJumpCode {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<EPJumpCode>>> = LazyLock::new(|| {
            vec![
                Field::scalar("Depth", "depth", |j: &EPJumpCode| &j.depth, |j: &mut EPJumpCode| {
                    &mut j.depth
                }),
                Field::scalar("Opcodes", "opcodes", |j: &EPJumpCode| &j.opcodes, |j: &mut EPJumpCode| {
                    &mut j.opcodes
                }),
            ]
        });
        &FIELDS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPointSignature {
    pub name: Option<String>,
    pub type_: Option<String>,
}

impl Entity for EntryPointSignature {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<EntryPointSignature>>> = LazyLock::new(|| {
            vec![
                Field::scalar(
                    "Name",
                    "name",
                    |s: &EntryPointSignature| &s.name,
                    |s: &mut EntryPointSignature| &mut s.name,
                ),
                Field::scalar(
                    "Type",
                    "type",
                    |s: &EntryPointSignature| &s.type_,
                    |s: &mut EntryPointSignature| &mut s.type_,
                ),
            ]
        });
        &FIELDS
    }
}

/// A packer detected on the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packer {
    pub name: Option<String>,
    pub version: Option<String>,
    pub entry_point: Option<HexBinary>,
    pub signature: Option<String>,
    pub type_: Option<String>,
    pub detected_entrypoint_signatures: Vec<EntryPointSignature>,
    pub ep_jump_codes: Option<EPJumpCode>,
}

impl Packer {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Entity for Packer {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<Packer>>> = LazyLock::new(|| {
            vec![
                Field::scalar("Name", "name", |p: &Packer| &p.name, |p: &mut Packer| &mut p.name),
                Field::scalar("Version", "version", |p: &Packer| &p.version, |p: &mut Packer| {
                    &mut p.version
                }),
                Field::scalar("Entry_Point", "entry_point", |p: &Packer| &p.entry_point, |p: &mut Packer| {
                    &mut p.entry_point
                }),
                Field::scalar("Signature", "signature", |p: &Packer| &p.signature, |p: &mut Packer| {
                    &mut p.signature
                }),
                Field::scalar("Type", "type", |p: &Packer| &p.type_, |p: &mut Packer| &mut p.type_),
                Field::entities(
                    "Entry_Point_Signature",
                    "detected_entrypoint_signatures",
                    |p: &Packer| &p.detected_entrypoint_signatures,
                    |p: &mut Packer| &mut p.detected_entrypoint_signatures,
                )
                .within("Detected_Entrypoint_Signatures"),
                Field::entity(
                    "EP_Jump_Codes",
                    "ep_jump_codes",
                    |p: &Packer| &p.ep_jump_codes,
                    |p: &mut Packer| &mut p.ep_jump_codes,
                ),
            ]
        });
        &FIELDS
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Properties of a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    pub base: PropertiesBase,
    pub is_packed: Option<bool>,
    pub is_masqueraded: Option<bool>,
    pub file_name: Option<TextValue>,
    pub file_path: Option<FilePath>,
    pub device_path: Option<String>,
    pub full_path: Option<String>,
    pub file_extension: Option<String>,
    pub size_in_bytes: Option<u64>,
    pub magic_number: Option<HexBinary>,
    pub file_format: Option<String>,
    pub hashes: Vec<Hash>,
    pub modified_time: Option<DateTime<Utc>>,
    pub accessed_time: Option<DateTime<Utc>>,
    pub created_time: Option<DateTime<Utc>>,
    pub user_owner: Option<String>,
    pub packer_list: Vec<Packer>,
    pub peak_entropy: Option<f64>,
    pub sym_links: Vec<String>,
    pub encryption_algorithm: Option<String>,
    pub decryption_key: Option<String>,
    pub compression_method: Option<String>,
    pub compression_version: Option<String>,
    pub compression_comment: Option<String>,
}

impl File {
    #[must_use]
    pub fn named(file_name: impl Into<TextValue>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            ..Self::default()
        }
    }

    /// Simple hash value of the first hash of `type_`.
    #[must_use]
    pub fn hash(&self, type_: &str) -> Option<&str> {
        self.hashes
            .iter()
            .find(|h| h.type_.as_deref() == Some(type_))
            .and_then(|h| h.simple_hash_value.as_deref())
    }

    /// Replace the value of the first hash of `type_`, or append one.
    pub fn set_hash(&mut self, type_: &str, value: impl Into<String>) {
        let value = value.into();
        match self.hashes.iter_mut().find(|h| h.type_.as_deref() == Some(type_)) {
            Some(existing) => existing.simple_hash_value = Some(value),
            None => self.hashes.push(Hash::new(type_, value)),
        }
    }

    pub fn add_hash(&mut self, hash: Hash) {
        self.hashes.push(hash);
    }

    #[must_use]
    pub fn md5(&self) -> Option<&str> {
        self.hash(MD5)
    }

    #[must_use]
    pub fn sha1(&self) -> Option<&str> {
        self.hash(SHA1)
    }

    #[must_use]
    pub fn sha256(&self) -> Option<&str> {
        self.hash(SHA256)
    }

    /// Alias of `size_in_bytes`.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        self.size_in_bytes
    }
}

impl Entity for File {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<File>>> = LazyLock::new(|| {
            vec![
                Field::attribute("is_packed", "is_packed", |f: &File| &f.is_packed, |f: &mut File| {
                    &mut f.is_packed
                }),
                Field::attribute(
                    "is_masqueraded",
                    "is_masqueraded",
                    |f: &File| &f.is_masqueraded,
                    |f: &mut File| &mut f.is_masqueraded,
                ),
                Field::scalar("File_Name", "file_name", |f: &File| &f.file_name, |f: &mut File| {
                    &mut f.file_name
                }),
                Field::entity("File_Path", "file_path", |f: &File| &f.file_path, |f: &mut File| {
                    &mut f.file_path
                }),
                Field::scalar("Device_Path", "device_path", |f: &File| &f.device_path, |f: &mut File| {
                    &mut f.device_path
                }),
                Field::scalar("Full_Path", "full_path", |f: &File| &f.full_path, |f: &mut File| {
                    &mut f.full_path
                }),
                Field::scalar(
                    "File_Extension",
                    "file_extension",
                    |f: &File| &f.file_extension,
                    |f: &mut File| &mut f.file_extension,
                ),
                Field::scalar(
                    "Size_In_Bytes",
                    "size_in_bytes",
                    |f: &File| &f.size_in_bytes,
                    |f: &mut File| &mut f.size_in_bytes,
                ),
                Field::scalar(
                    "Magic_Number",
                    "magic_number",
                    |f: &File| &f.magic_number,
                    |f: &mut File| &mut f.magic_number,
                ),
                Field::scalar("File_Format", "file_format", |f: &File| &f.file_format, |f: &mut File| {
                    &mut f.file_format
                }),
                Field::entities("Hash", "hashes", |f: &File| &f.hashes, |f: &mut File| &mut f.hashes)
                    .within("Hashes"),
                Field::scalar(
                    "Modified_Time",
                    "modified_time",
                    |f: &File| &f.modified_time,
                    |f: &mut File| &mut f.modified_time,
                ),
                Field::scalar(
                    "Accessed_Time",
                    "accessed_time",
                    |f: &File| &f.accessed_time,
                    |f: &mut File| &mut f.accessed_time,
                ),
                Field::scalar(
                    "Created_Time",
                    "created_time",
                    |f: &File| &f.created_time,
                    |f: &mut File| &mut f.created_time,
                ),
                Field::scalar("User_Owner", "user_owner", |f: &File| &f.user_owner, |f: &mut File| {
                    &mut f.user_owner
                }),
                Field::entities("Packer", "packer_list", |f: &File| &f.packer_list, |f: &mut File| {
                    &mut f.packer_list
                })
                .within("Packer_List"),
                Field::scalar(
                    "Peak_Entropy",
                    "peak_entropy",
                    |f: &File| &f.peak_entropy,
                    |f: &mut File| &mut f.peak_entropy,
                ),
                Field::scalars("Sym_Link", "sym_links", |f: &File| &f.sym_links, |f: &mut File| {
                    &mut f.sym_links
                })
                .within("Sym_Links"),
                Field::scalar(
                    "Encryption_Algorithm",
                    "encryption_algorithm",
                    |f: &File| &f.encryption_algorithm,
                    |f: &mut File| &mut f.encryption_algorithm,
                ),
                Field::scalar(
                    "Decryption_Key",
                    "decryption_key",
                    |f: &File| &f.decryption_key,
                    |f: &mut File| &mut f.decryption_key,
                ),
                Field::scalar(
                    "Compression_Method",
                    "compression_method",
                    |f: &File| &f.compression_method,
                    |f: &mut File| &mut f.compression_method,
                ),
                Field::scalar(
                    "Compression_Version",
                    "compression_version",
                    |f: &File| &f.compression_version,
                    |f: &mut File| &mut f.compression_version,
                ),
                Field::scalar(
                    "Compression_Comment",
                    "compression_comment",
                    |f: &File| &f.compression_comment,
                    |f: &mut File| &mut f.compression_comment,
                ),
            ]
        });
        &FIELDS
    }
}

impl PropertiesType for File {
    const XSI_NS: &'static str = "FileObj";
    const XSI_TYPE: &'static str = "FileObjectType";
    const NAMESPACE: &'static str = NAMESPACE;

    fn properties_base(&self) -> &PropertiesBase {
        &self.base
    }

    fn properties_base_mut(&mut self) -> &mut PropertiesBase {
        &mut self.base
    }
}
