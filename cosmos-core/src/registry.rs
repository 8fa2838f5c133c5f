use crate::{
    error::{DecodeError, MalformedPayloadSnafu, UnknownTypeSnafu},
    proto,
    schema::{load_schema_decoders, SchemaError, SchemaReader},
};
use log::error;
use serde_json::Value;
use snafu::OptionExt;
use std::{collections::HashMap, error::Error, fmt, marker::PhantomData, sync::Arc};

/// Boxed cause returned by [`MessageDecoder`] implementations.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Type urls whose inner `msg` byte field is itself a UTF-8 JSON document.
pub const CONTRACT_MSG_TYPE_URLS: [&str; 3] = [
    proto::MSG_EXECUTE_CONTRACT,
    proto::MSG_MIGRATE_CONTRACT,
    proto::MSG_INSTANTIATE_CONTRACT,
];

/// Decodes the protobuf bytes of one message kind into a JSON payload.
pub trait MessageDecoder: Send + Sync {
    /// Decode `bytes`, returning the payload or the reason the bytes do not fit the schema.
    fn decode(&self, bytes: &[u8]) -> Result<Value, BoxError>;
}

/// [`MessageDecoder`] for any prost message that can also be serialized.
pub struct ProstDecoder<M>(PhantomData<fn() -> M>);

impl<M> ProstDecoder<M> {
    /// Construct a decoder for `M`.
    pub fn new() -> Self {
        ProstDecoder(PhantomData)
    }
}

impl<M> Default for ProstDecoder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> MessageDecoder for ProstDecoder<M>
where
    M: prost::Message + Default + serde::Serialize,
{
    fn decode(&self, bytes: &[u8]) -> Result<Value, BoxError> {
        let message = M::decode(bytes)?;
        Ok(serde_json::to_value(message)?)
    }
}

/// Maps type urls to message decoders.
///
/// Registration is last-write-wins. The registry is immutable once shared, so it is handed around
/// as an `Arc<TypeRegistry>`.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    /// Decoder per type url.
    decoders: HashMap<String, Arc<dyn MessageDecoder>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut type_urls = self.type_urls();
        type_urls.sort_unstable();
        f.debug_struct("TypeRegistry")
            .field("type_urls", &type_urls)
            .finish()
    }
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in Cosmos SDK, IBC and CosmWasm messages.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_prost::<proto::MsgSend>(proto::MSG_SEND);
        registry.register_prost::<proto::MsgMultiSend>(proto::MSG_MULTI_SEND);
        registry.register_prost::<proto::MsgDelegate>(proto::MSG_DELEGATE);
        registry.register_prost::<proto::MsgDelegate>(proto::MSG_UNDELEGATE);
        registry.register_prost::<proto::MsgBeginRedelegate>(proto::MSG_BEGIN_REDELEGATE);
        registry.register_prost::<proto::MsgWithdrawDelegatorReward>(
            proto::MSG_WITHDRAW_DELEGATOR_REWARD,
        );
        registry.register_prost::<proto::MsgVote>(proto::MSG_VOTE);
        registry.register_prost::<proto::MsgTransfer>(proto::MSG_TRANSFER);
        registry.register_prost::<proto::MsgExecuteContract>(proto::MSG_EXECUTE_CONTRACT);
        registry.register_prost::<proto::MsgInstantiateContract>(proto::MSG_INSTANTIATE_CONTRACT);
        registry.register_prost::<proto::MsgMigrateContract>(proto::MSG_MIGRATE_CONTRACT);
        registry
    }

    /// Add or replace the decoder for `type_url`.
    pub fn register(&mut self, type_url: impl Into<String>, decoder: Arc<dyn MessageDecoder>) {
        self.decoders.insert(type_url.into(), decoder);
    }

    /// Register a [`ProstDecoder`] for `M` under `type_url`.
    pub fn register_prost<M>(&mut self, type_url: impl Into<String>)
    where
        M: prost::Message + Default + serde::Serialize + 'static,
    {
        self.register(type_url, Arc::new(ProstDecoder::<M>::new()));
    }

    /// Load schema descriptor files through `reader` and register every message they declare.
    ///
    /// Returns the type urls that were registered.
    pub fn load_schemas<R: SchemaReader + ?Sized>(
        &mut self,
        reader: &R,
        paths: &[String],
    ) -> Result<Vec<String>, SchemaError> {
        let mut registered = Vec::new();
        for path in paths {
            for (type_url, decoder) in load_schema_decoders(reader, path)? {
                self.register(type_url.clone(), decoder);
                registered.push(type_url);
            }
        }
        Ok(registered)
    }

    /// Whether a decoder is registered for `type_url`.
    pub fn contains(&self, type_url: &str) -> bool {
        self.decoders.contains_key(type_url)
    }

    /// All registered type urls, in no particular order.
    pub fn type_urls(&self) -> Vec<&str> {
        self.decoders.keys().map(String::as_str).collect()
    }

    /// Decode `bytes` as the message named by `type_url`.
    ///
    /// Failures are logged before being returned.
    pub fn decode(&self, type_url: &str, bytes: &[u8]) -> Result<Value, DecodeError> {
        self.decode_inner(type_url, bytes).inspect_err(|e| {
            error!("{e}");
        })
    }

    /// [`TypeRegistry::decode`] without the logging.
    fn decode_inner(&self, type_url: &str, bytes: &[u8]) -> Result<Value, DecodeError> {
        let decoder = self
            .decoders
            .get(type_url)
            .context(UnknownTypeSnafu { type_url })?;

        let mut payload = decoder
            .decode(bytes)
            .map_err(|e| DecodeError::MalformedPayload {
                type_url: type_url.to_string(),
                message: e.to_string(),
            })?;

        if CONTRACT_MSG_TYPE_URLS.contains(&type_url) {
            parse_contract_msg(type_url, &mut payload)?;
        }

        Ok(payload)
    }
}

/// Replace the `msg` field of a contract message with the JSON document its bytes hold.
fn parse_contract_msg(type_url: &str, payload: &mut Value) -> Result<(), DecodeError> {
    let Some(msg) = payload.get_mut("msg") else {
        return Ok(());
    };

    let raw = match msg {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .context(MalformedPayloadSnafu {
                type_url,
                message: "contract msg is not a byte array",
            })?,
        Value::String(s) => s.clone().into_bytes(),
        _ => return Ok(()),
    };

    if raw.is_empty() {
        *msg = Value::Object(Default::default());
        return Ok(());
    }

    let text = String::from_utf8(raw).map_err(|e| DecodeError::MalformedPayload {
        type_url: type_url.to_string(),
        message: format!("contract msg is not utf-8: {e}"),
    })?;
    *msg = serde_json::from_str(&text).map_err(|e| DecodeError::MalformedPayload {
        type_url: type_url.to_string(),
        message: format!("contract msg is not json: {e}"),
    })?;

    Ok(())
}
