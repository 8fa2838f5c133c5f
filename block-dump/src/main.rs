//! Fetches a range of Cosmos blocks and prints the elements matching a set of handler filters
//! as JSON lines.

use block_fetcher::{FetchDispatcher, FetchError, FetcherArgs};
use clap::Parser;
use cosmos_core::{
    dictionary::{build_query_conditions, HandlerFilter},
    filter::{filter_block, filter_event, filter_message, filter_transaction},
    schema::{FsSchemaReader, SchemaError},
    LazyBlockContent,
    TypeRegistry,
};
use env_logger::Env;
use log::{error, info};
use serde_json::{json, Value};
use snafu::{ResultExt, Snafu};
use std::{path::PathBuf, sync::Arc};

/// Errors that end the dump.
#[derive(Debug, Snafu)]
enum DumpError {
    /// The filters file could not be read.
    #[snafu(display("failed to read filters from {}: {source}", path.display()))]
    ReadFilters {
        /// Filters file.
        path: PathBuf,
        /// Source io error.
        source: std::io::Error,
    },
    /// The filters file is not a list of handler filters.
    #[snafu(display("failed to parse filters: {source}"))]
    ParseFilters {
        /// Source serde error.
        source: serde_json::Error,
    },
    /// A message schema could not be loaded.
    #[snafu(display("failed to load message schemas: {source}"), context(false))]
    Schema {
        /// Source schema error.
        source: SchemaError,
    },
    /// Blocks could not be fetched.
    #[snafu(display("failed to fetch blocks: {source}"), context(false))]
    Fetch {
        /// Source fetch error.
        source: FetchError,
    },
    /// The requested range is empty.
    #[snafu(display("end height {end} is below start height {start}"))]
    EmptyRange {
        /// First height.
        start: u64,
        /// Last height.
        end: u64,
    },
}

/// Command-line arguments for the CLI
#[derive(Parser, Debug)]
#[command(
    name = "block-dump",
    about = "Fetches Cosmos blocks and prints the elements matching handler filters"
)]
struct Cli {
    #[command(flatten)]
    fetcher: FetcherArgs,

    /// First height to fetch. Defaults to the latest height of the node.
    #[arg(long, env)]
    start: Option<u64>,

    /// Last height to fetch, inclusive. Defaults to `start`.
    #[arg(long, env)]
    end: Option<u64>,

    /// Heights fetched per batch; 0 is treated as 1.
    #[arg(long, env, default_value = "10")]
    batch_size: usize,

    /// JSON file with a list of handler filters, e.g.
    /// `[{"kind": "message", "filter": {"type": "/cosmos.bank.v1beta1.MsgSend"}}]`.
    ///
    /// Without it every block is printed.
    #[arg(long, env)]
    filters: Option<PathBuf>,

    /// Directory schema files are read from.
    #[arg(long, env, default_value = ".")]
    schema_dir: PathBuf,

    /// Message schema file, relative to `schema_dir`. May be repeated.
    #[arg(long = "schema")]
    schemas: Vec<String>,
}

fn load_handlers(path: Option<&PathBuf>) -> Result<Vec<HandlerFilter>, DumpError> {
    let Some(path) = path else {
        return Ok(vec![HandlerFilter::Block { filter: None }]);
    };
    let contents = std::fs::read_to_string(path).context(ReadFiltersSnafu { path })?;
    serde_json::from_str(&contents).context(ParseFiltersSnafu)
}

/// One JSON record per element of `content` matched by any of `handlers`.
fn matching_records(content: &LazyBlockContent, handlers: &[HandlerFilter]) -> Vec<Value> {
    let height = content.height();
    let mut records = Vec::new();
    for handler in handlers {
        match handler {
            HandlerFilter::Block { filter } => {
                let block = content.block();
                if filter_block(block, filter.as_ref()) {
                    records.push(json!({
                        "kind": "block",
                        "height": height,
                        "hash": block.block_id.hash,
                        "time": block.header.time,
                        "txCount": block.tx_count,
                    }));
                }
            }
            HandlerFilter::Transaction { filter } => {
                records.extend(
                    content
                        .transactions()
                        .iter()
                        .filter(|tx| filter_transaction(tx, filter.as_ref()))
                        .map(|tx| {
                            json!({
                                "kind": "transaction",
                                "height": height,
                                "idx": tx.idx,
                                "hash": tx.hash,
                                "code": tx.result.code,
                                "gasUsed": tx.result.gas_used,
                            })
                        }),
                );
            }
            HandlerFilter::Message { filter } => {
                records.extend(
                    content
                        .messages()
                        .iter()
                        .filter(|msg| filter_message(msg, filter.as_ref()))
                        .map(|msg| {
                            json!({
                                "kind": "message",
                                "height": height,
                                "idx": msg.idx,
                                "txHash": msg.tx.hash,
                                "type": msg.type_url,
                                "data": msg.decoded_msg().ok(),
                            })
                        }),
                );
            }
            HandlerFilter::Event { filter } => {
                records.extend(
                    content
                        .events()
                        .iter()
                        .filter(|event| filter_event(event, filter.as_ref()))
                        .map(|event| {
                            json!({
                                "kind": "event",
                                "height": height,
                                "idx": event.idx,
                                "txHash": event.tx.as_ref().map(|tx| &tx.hash),
                                "msgType": event.msg.as_ref().map(|msg| &msg.type_url),
                                "event": event.event,
                            })
                        }),
                );
            }
        }
    }
    records
}

async fn run(cli: Cli) -> Result<(), DumpError> {
    let handlers = load_handlers(cli.filters.as_ref())?;
    for entry in build_query_conditions(&handlers) {
        println!("{}", json!({ "kind": "dictionaryQuery", "entry": entry }));
    }

    let mut registry = TypeRegistry::with_defaults();
    if !cli.schemas.is_empty() {
        let reader = FsSchemaReader::new(&cli.schema_dir);
        let registered = registry.load_schemas(&reader, &cli.schemas)?;
        info!("registered {} message types from schemas", registered.len());
    }

    let mut dispatcher = FetchDispatcher::connect(&cli.fetcher, Arc::new(registry)).await?;
    let start = match cli.start {
        Some(start) => start,
        None => dispatcher.latest_height().await?,
    };
    let end = cli.end.unwrap_or(start);
    if end < start {
        return EmptyRangeSnafu { start, end }.fail();
    }

    let heights: Vec<u64> = (start..=end).collect();
    for batch in heights.chunks(cli.batch_size.max(1)) {
        for content in dispatcher.fetch_blocks(batch).await? {
            for record in matching_records(&content, &handlers) {
                println!("{record}");
            }
        }
        if let Some(last) = batch.last() {
            info!("dumped up to height {last}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("{err}");
        std::process::exit(1);
    }
}
