use crate::registry::{BoxError, MessageDecoder};
use prost::{
    bytes::Buf,
    encoding::{decode_key, decode_varint, WireType},
};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Nested messages deeper than this are rejected.
pub const MAX_NESTING_DEPTH: usize = 32;

/// File access used to load schema descriptors.
pub trait SchemaReader {
    /// Read the whole file at `path`.
    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// Reads schema files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsSchemaReader {
    /// Directory paths are resolved against.
    root: PathBuf,
}

impl FsSchemaReader {
    /// Construct a reader rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        FsSchemaReader {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl SchemaReader for FsSchemaReader {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }
}

impl SchemaReader for HashMap<String, String> {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

/// Errors that can occur while loading schema descriptors.
#[derive(Debug, Snafu)]
pub enum SchemaError {
    /// The file could not be read.
    #[snafu(display("unable to read schema {path}: {source}"))]
    Read {
        /// Path handed to the reader.
        path: String,
        /// Source io error.
        source: io::Error,
    },

    /// The file is not a valid schema descriptor.
    #[snafu(display("unable to parse schema {path}: {source}"))]
    Parse {
        /// Path handed to the reader.
        path: String,
        /// Source json error.
        source: serde_json::Error,
    },

    /// A `message` field does not name its type.
    #[snafu(display("field {message}.{field} in {path} is a message but has no type_name"))]
    MissingTypeName {
        /// Path handed to the reader.
        path: String,
        /// Message declaring the field.
        message: String,
        /// Field name.
        field: String,
    },

    /// A `message` field names a type that is not declared in the same file.
    #[snafu(display("field {message}.{field} in {path} refers to unknown type {type_name}"))]
    UnresolvedType {
        /// Path handed to the reader.
        path: String,
        /// Message declaring the field.
        message: String,
        /// Field name.
        field: String,
        /// The unresolved type name.
        type_name: String,
    },
}

/// Errors raised while walking protobuf wire data against a loaded schema.
#[derive(Debug, Snafu)]
pub enum WireError {
    /// A varint or key could not be read.
    #[snafu(display("{source}"))]
    Prost {
        /// Source prost error.
        source: prost::DecodeError,
    },

    /// The wire type on the wire is not the one the field's kind requires.
    #[snafu(display("field {field} expects wire type {expected:?} but found {found:?}"))]
    WireTypeMismatch {
        /// Field name.
        field: String,
        /// Wire type required by the schema.
        expected: WireType,
        /// Wire type found in the data.
        found: WireType,
    },

    /// The buffer ended in the middle of a value.
    #[snafu(display("buffer underflow"))]
    Truncated,

    /// A string field held invalid UTF-8.
    #[snafu(display("field {field} is not valid utf-8"))]
    InvalidUtf8 {
        /// Field name.
        field: String,
    },

    /// Groups are deprecated and not supported.
    #[snafu(display("group wire types are not supported"))]
    UnsupportedGroup,

    /// Messages nest deeper than [`MAX_NESTING_DEPTH`].
    #[snafu(display("message nesting exceeds {}", MAX_NESTING_DEPTH))]
    DepthExceeded,
}

impl From<prost::DecodeError> for WireError {
    fn from(source: prost::DecodeError) -> Self {
        WireError::Prost { source }
    }
}

/// Contents of one schema descriptor file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaFile {
    /// Protobuf package, e.g. `osmosis.gamm.v1beta1`.
    #[serde(default)]
    pub package: String,
    /// Messages declared in the package.
    pub messages: Vec<MessageSchema>,
}

/// One declared message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageSchema {
    /// Message name without the package.
    pub name: String,
    /// Declared fields.
    pub fields: Vec<FieldSchema>,
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldSchema {
    /// Field name, used as the JSON key.
    pub name: String,
    /// Field number.
    pub number: u32,
    /// Scalar kind, `enum` or `message`.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Whether the field is repeated.
    #[serde(default)]
    pub repeated: bool,
    /// Message name for `message` fields, relative to the package or fully qualified.
    #[serde(default)]
    pub type_name: Option<String>,
}

/// Protobuf field kinds understood by the dynamic decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum FieldKind {
    String,
    Bytes,
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Double,
    Float,
    Enum,
    Message,
}

impl FieldKind {
    /// Wire type a single value of this kind is encoded with.
    fn wire_type(self) -> WireType {
        match self {
            FieldKind::String | FieldKind::Bytes | FieldKind::Message => WireType::LengthDelimited,
            FieldKind::Fixed32 | FieldKind::Sfixed32 | FieldKind::Float => WireType::ThirtyTwoBit,
            FieldKind::Fixed64 | FieldKind::Sfixed64 | FieldKind::Double => WireType::SixtyFourBit,
            _ => WireType::Varint,
        }
    }

    /// JSON value of an absent field.
    fn default_value(self) -> Value {
        match self {
            FieldKind::String => Value::String(String::new()),
            FieldKind::Bytes => Value::Array(Vec::new()),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Message => Value::Null,
            FieldKind::Double | FieldKind::Float => Value::from(0.0),
            _ => Value::from(0),
        }
    }
}

/// A field with its message type resolved to a fully qualified name.
#[derive(Debug, Clone)]
struct ResolvedField {
    /// JSON key.
    name: String,
    /// Field number.
    number: u32,
    /// Declared kind.
    kind: FieldKind,
    /// Whether values accumulate into an array.
    repeated: bool,
    /// Fully qualified message name for `message` fields.
    message: Option<String>,
}

/// All messages of one schema file, keyed by fully qualified name.
#[derive(Debug, Default)]
struct SchemaSet {
    /// Fields per message.
    messages: HashMap<String, Vec<ResolvedField>>,
}

/// [`MessageDecoder`] driven by a loaded schema rather than generated code.
#[derive(Debug, Clone)]
pub struct DynamicMessageDecoder {
    /// Every message of the file the decoder was loaded from.
    schemas: Arc<SchemaSet>,
    /// The message this decoder produces.
    full_name: String,
}

impl MessageDecoder for DynamicMessageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Value, BoxError> {
        let mut buf = bytes;
        Ok(decode_message(&self.schemas, &self.full_name, &mut buf, 0)?)
    }
}

/// Read and parse `path`, returning one decoder per declared message keyed by its type url.
pub fn load_schema_decoders<R: SchemaReader + ?Sized>(
    reader: &R,
    path: &str,
) -> Result<Vec<(String, Arc<dyn MessageDecoder>)>, SchemaError> {
    let text = reader.read_to_string(path).context(ReadSnafu { path })?;
    let file: SchemaFile = serde_json::from_str(&text).context(ParseSnafu { path })?;

    let qualify = |name: &str| {
        if file.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", file.package, name)
        }
    };
    let declared: Vec<String> = file.messages.iter().map(|m| qualify(&m.name)).collect();

    let mut schemas = SchemaSet::default();
    for (message, full_name) in file.messages.iter().zip(&declared) {
        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            let resolved_message = if field.kind == FieldKind::Message {
                let type_name = field.type_name.as_deref().context(MissingTypeNameSnafu {
                    path,
                    message: &message.name,
                    field: &field.name,
                })?;
                let type_name = type_name.trim_start_matches('.');
                let target = [type_name.to_string(), qualify(type_name)]
                    .into_iter()
                    .find(|candidate| declared.contains(candidate))
                    .context(UnresolvedTypeSnafu {
                        path,
                        message: &message.name,
                        field: &field.name,
                        type_name,
                    })?;
                Some(target)
            } else {
                None
            };
            fields.push(ResolvedField {
                name: field.name.clone(),
                number: field.number,
                kind: field.kind,
                repeated: field.repeated,
                message: resolved_message,
            });
        }
        schemas.messages.insert(full_name.clone(), fields);
    }

    let schemas = Arc::new(schemas);
    Ok(declared
        .into_iter()
        .map(|full_name| {
            let decoder: Arc<dyn MessageDecoder> = Arc::new(DynamicMessageDecoder {
                schemas: schemas.clone(),
                full_name: full_name.clone(),
            });
            (format!("/{full_name}"), decoder)
        })
        .collect())
}

/// Decode one message body, consuming `buf` to its end.
fn decode_message(
    schemas: &SchemaSet,
    full_name: &str,
    buf: &mut &[u8],
    depth: usize,
) -> Result<Value, WireError> {
    ensure!(depth <= MAX_NESTING_DEPTH, DepthExceededSnafu);
    let fields = schemas
        .messages
        .get(full_name)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut out = Map::new();
    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(buf)?;
        let Some(field) = fields.iter().find(|f| f.number == tag) else {
            skip_value(wire_type, buf)?;
            continue;
        };

        let packed = field.repeated
            && wire_type == WireType::LengthDelimited
            && field.kind.wire_type() != WireType::LengthDelimited;
        if packed {
            let mut chunk = take_length_delimited(buf)?;
            while chunk.has_remaining() {
                let value = decode_value(schemas, field, &mut chunk, depth)?;
                push_repeated(&mut out, &field.name, value);
            }
            continue;
        }

        ensure!(
            wire_type == field.kind.wire_type(),
            WireTypeMismatchSnafu {
                field: &field.name,
                expected: field.kind.wire_type(),
                found: wire_type,
            }
        );
        let value = decode_value(schemas, field, buf, depth)?;
        if field.repeated {
            push_repeated(&mut out, &field.name, value);
        } else {
            out.insert(field.name.clone(), value);
        }
    }

    for field in fields {
        if !out.contains_key(&field.name) {
            let default = if field.repeated {
                Value::Array(Vec::new())
            } else {
                field.kind.default_value()
            };
            out.insert(field.name.clone(), default);
        }
    }

    Ok(Value::Object(out))
}

/// Decode a single value of `field`'s kind; the key has already been consumed.
fn decode_value(
    schemas: &SchemaSet,
    field: &ResolvedField,
    buf: &mut &[u8],
    depth: usize,
) -> Result<Value, WireError> {
    let value = match field.kind {
        FieldKind::Bool => Value::Bool(decode_varint(buf)? != 0),
        FieldKind::Int32 | FieldKind::Enum => Value::from(decode_varint(buf)? as i32),
        FieldKind::Int64 => Value::from(decode_varint(buf)? as i64),
        FieldKind::Uint32 => Value::from(decode_varint(buf)? as u32),
        FieldKind::Uint64 => Value::from(decode_varint(buf)?),
        FieldKind::Sint32 => Value::from(zigzag(decode_varint(buf)?) as i32),
        FieldKind::Sint64 => Value::from(zigzag(decode_varint(buf)?)),
        FieldKind::Fixed32 => {
            ensure_remaining(buf, 4)?;
            Value::from(buf.get_u32_le())
        }
        FieldKind::Sfixed32 => {
            ensure_remaining(buf, 4)?;
            Value::from(buf.get_i32_le())
        }
        FieldKind::Float => {
            ensure_remaining(buf, 4)?;
            float_value(f64::from(buf.get_f32_le()))
        }
        FieldKind::Fixed64 => {
            ensure_remaining(buf, 8)?;
            Value::from(buf.get_u64_le())
        }
        FieldKind::Sfixed64 => {
            ensure_remaining(buf, 8)?;
            Value::from(buf.get_i64_le())
        }
        FieldKind::Double => {
            ensure_remaining(buf, 8)?;
            float_value(buf.get_f64_le())
        }
        FieldKind::String => {
            let bytes = take_length_delimited(buf)?;
            let text = std::str::from_utf8(bytes)
                .ok()
                .context(InvalidUtf8Snafu { field: &field.name })?;
            Value::String(text.to_string())
        }
        FieldKind::Bytes => {
            let bytes = take_length_delimited(buf)?;
            Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
        }
        FieldKind::Message => {
            let mut nested = take_length_delimited(buf)?;
            let name = field.message.as_deref().unwrap_or_default();
            decode_message(schemas, name, &mut nested, depth + 1)?
        }
    };
    Ok(value)
}

/// Skip a value of an undeclared field.
fn skip_value(wire_type: WireType, buf: &mut &[u8]) -> Result<(), WireError> {
    match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
        }
        WireType::SixtyFourBit => {
            ensure_remaining(buf, 8)?;
            buf.advance(8);
        }
        WireType::ThirtyTwoBit => {
            ensure_remaining(buf, 4)?;
            buf.advance(4);
        }
        WireType::LengthDelimited => {
            take_length_delimited(buf)?;
        }
        WireType::StartGroup | WireType::EndGroup => return UnsupportedGroupSnafu.fail(),
    }
    Ok(())
}

/// Split a length-prefixed slice off the front of `buf`.
fn take_length_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], WireError> {
    let len = usize::try_from(decode_varint(buf)?).map_err(|_| WireError::Truncated)?;
    ensure_remaining(buf, len)?;
    let slice: &'a [u8] = buf;
    let (head, tail) = slice.split_at(len);
    *buf = tail;
    Ok(head)
}

/// Fail with [`WireError::Truncated`] when fewer than `len` bytes remain.
fn ensure_remaining(buf: &[u8], len: usize) -> Result<(), WireError> {
    ensure!(buf.len() >= len, TruncatedSnafu);
    Ok(())
}

/// Undo zigzag encoding of `sint32`/`sint64` values.
fn zigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Non-finite floats have no JSON form and become null.
fn float_value(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Append `value` to the array stored under `name`.
fn push_repeated(out: &mut Map<String, Value>, name: &str, value: Value) {
    match out
        .entry(name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(items) => items.push(value),
        other => *other = Value::Array(vec![value]),
    }
}
