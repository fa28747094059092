//! DynamoDB table accessor.
//!
//! [`DynamoTableAccessor`] wraps an `aws_sdk_dynamodb::Client` bound to one
//! table. Credentials come from the default AWS provider chain
//! (environment, profile, instance metadata, ...).
//!
//! The SDK is async while the finder is a strictly sequential pull loop, so
//! the accessor owns a current-thread tokio runtime and each cursor blocks
//! on exactly one page request at a time. `LastEvaluatedKey` is fed back as
//! `ExclusiveStartKey` until the backend reports no further pages.
//!
//! # Example
//!
//! ```no_run
//! use dynadupe::accessor::{ConnectSettings, DynamoTableAccessor, TableAccessor};
//!
//! let settings = ConnectSettings::new("eu-central-1", "users");
//! let accessor = DynamoTableAccessor::connect(&settings).unwrap();
//! for row in accessor.scan_attribute("email").unwrap() {
//!     println!("{}", row.unwrap().to_json());
//! }
//! ```

use std::collections::HashMap;

use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tokio::runtime::Runtime;

use super::{AccessorError, AttrValue, Record, RecordCursor, TableAccessor};

type Item = HashMap<String, AttributeValue>;

/// Placeholder for the index attribute in expressions, so reserved words
/// such as `name` or `status` can be used as index attributes.
const ATTR_PLACEHOLDER: &str = "#attr";
const VALUE_PLACEHOLDER: &str = ":value";

/// Everything needed to open a session against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectSettings {
    /// AWS region identifier (e.g. `eu-central-1`)
    pub region: String,
    /// Table name
    pub table: String,
    /// Custom endpoint, e.g. DynamoDB Local
    pub endpoint_url: Option<String>,
    /// Secondary index name; defaults to the index attribute name
    pub index_name: Option<String>,
    /// Maximum items per page request
    pub page_size: Option<u32>,
}

impl ConnectSettings {
    /// Settings for `table` in `region` with every option at its default.
    #[must_use]
    pub fn new(region: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            table: table.into(),
            endpoint_url: None,
            index_name: None,
            page_size: None,
        }
    }

    /// Use a custom endpoint URL.
    #[must_use]
    pub fn with_endpoint_url(mut self, url: Option<String>) -> Self {
        self.endpoint_url = url;
        self
    }

    /// Query an explicitly named index instead of the attribute-named one.
    #[must_use]
    pub fn with_index_name(mut self, name: Option<String>) -> Self {
        self.index_name = name;
        self
    }

    /// Limit the number of items per page.
    #[must_use]
    pub fn with_page_size(mut self, size: Option<u32>) -> Self {
        self.page_size = size.filter(|s| *s > 0);
        self
    }

    /// Name of the index queried for `attribute`.
    #[must_use]
    pub fn index_for<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.index_name.as_deref().unwrap_or(attribute)
    }
}

/// Accessor over a live DynamoDB table.
pub struct DynamoTableAccessor {
    client: Client,
    runtime: Runtime,
    settings: ConnectSettings,
}

impl std::fmt::Debug for DynamoTableAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoTableAccessor")
            .field("client", &"<client>")
            .field("settings", &self.settings)
            .finish()
    }
}

impl DynamoTableAccessor {
    /// Open a session and verify that the table exists.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::Connection`] if the table cannot be described
    /// (unknown table, unreachable region, missing credentials), or
    /// [`AccessorError::Io`] if the runtime cannot be started.
    pub fn connect(settings: &ConnectSettings) -> Result<Self, AccessorError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let client = runtime.block_on(async {
            let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(Region::new(settings.region.clone()))
                .load()
                .await;
            let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
            if let Some(ref url) = settings.endpoint_url {
                log::debug!("Using custom endpoint {}", url);
                builder = builder.endpoint_url(url);
            }
            Client::from_conf(builder.build())
        });

        let described = runtime.block_on(
            client
                .describe_table()
                .table_name(&settings.table)
                .send(),
        );
        match described {
            Ok(output) => {
                let status = output
                    .table()
                    .and_then(|t| t.table_status())
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                log::info!(
                    "Connected to table {} in {} (status {})",
                    settings.table,
                    settings.region,
                    status
                );
            }
            Err(e) => {
                return Err(AccessorError::Connection {
                    region: settings.region.clone(),
                    table: settings.table.clone(),
                    message: DisplayErrorContext(&e).to_string(),
                });
            }
        }

        Ok(Self {
            client,
            runtime,
            settings: settings.clone(),
        })
    }

    /// Settings this accessor was opened with.
    #[must_use]
    pub fn settings(&self) -> &ConnectSettings {
        &self.settings
    }

    fn page_limit(&self) -> Option<i32> {
        self.settings
            .page_size
            .map(|s| i32::try_from(s).unwrap_or(i32::MAX))
    }

    fn fetch_page(&self, request: &PageRequest, start_key: Option<Item>) -> Result<Page, AccessorError> {
        match request {
            PageRequest::Scan { attribute } => {
                let output = self
                    .runtime
                    .block_on(
                        self.client
                            .scan()
                            .table_name(&self.settings.table)
                            .projection_expression(ATTR_PLACEHOLDER)
                            .expression_attribute_names(ATTR_PLACEHOLDER, attribute)
                            .set_limit(self.page_limit())
                            .set_exclusive_start_key(start_key)
                            .send(),
                    )
                    .map_err(|e| AccessorError::Read {
                        operation: "scan",
                        message: DisplayErrorContext(&e).to_string(),
                    })?;
                Ok(Page {
                    items: output.items.unwrap_or_default(),
                    next_key: output.last_evaluated_key,
                })
            }
            PageRequest::Query { attribute, value } => {
                let output = self
                    .runtime
                    .block_on(
                        self.client
                            .query()
                            .table_name(&self.settings.table)
                            .index_name(self.settings.index_for(attribute))
                            .key_condition_expression(format!(
                                "{ATTR_PLACEHOLDER} = {VALUE_PLACEHOLDER}"
                            ))
                            .expression_attribute_names(ATTR_PLACEHOLDER, attribute)
                            .expression_attribute_values(
                                VALUE_PLACEHOLDER,
                                AttributeValue::S(value.clone()),
                            )
                            .set_limit(self.page_limit())
                            .set_exclusive_start_key(start_key)
                            .send(),
                    )
                    .map_err(|e| AccessorError::Read {
                        operation: "query",
                        message: DisplayErrorContext(&e).to_string(),
                    })?;
                Ok(Page {
                    items: output.items.unwrap_or_default(),
                    next_key: output.last_evaluated_key,
                })
            }
        }
    }

    fn cursor(&self, request: PageRequest) -> Result<RecordCursor<'_>, AccessorError> {
        let first = self.fetch_page(&request, None)?;
        Ok(Box::new(PagedCursor {
            accessor: self,
            request,
            buffer: first.items.into_iter(),
            next_key: first.next_key,
            done: false,
        }))
    }
}

impl TableAccessor for DynamoTableAccessor {
    fn scan_attribute<'a>(&'a self, attribute: &str) -> Result<RecordCursor<'a>, AccessorError> {
        log::debug!("Scanning {} projecting {}", self.settings.table, attribute);
        self.cursor(PageRequest::Scan {
            attribute: attribute.to_string(),
        })
    }

    fn query_by_value<'a>(
        &'a self,
        attribute: &str,
        value: &str,
    ) -> Result<RecordCursor<'a>, AccessorError> {
        log::trace!(
            "Querying index {} for {} = {:?}",
            self.settings.index_for(attribute),
            attribute,
            value
        );
        self.cursor(PageRequest::Query {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.settings.table, self.settings.region)
    }
}

#[derive(Debug)]
enum PageRequest {
    Scan { attribute: String },
    Query { attribute: String, value: String },
}

struct Page {
    items: Vec<Item>,
    next_key: Option<Item>,
}

/// Pull-based cursor over a paginated scan or query.
///
/// Holds at most one page. A page may legitimately be empty while more
/// pages follow, so `next` keeps fetching until it has an item or the
/// backend stops returning a continuation key.
struct PagedCursor<'a> {
    accessor: &'a DynamoTableAccessor,
    request: PageRequest,
    buffer: std::vec::IntoIter<Item>,
    next_key: Option<Item>,
    done: bool,
}

impl Iterator for PagedCursor<'_> {
    type Item = Result<Record, AccessorError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item_to_record(item)));
            }
            if self.done {
                return None;
            }
            let Some(start_key) = self.next_key.take() else {
                self.done = true;
                return None;
            };
            match self.accessor.fetch_page(&self.request, Some(start_key)) {
                Ok(page) => {
                    self.buffer = page.items.into_iter();
                    self.next_key = page.next_key;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn blob_bytes(blob: Blob) -> Vec<u8> {
    blob.into_inner()
}

/// Convert an SDK attribute value into the crate's value type.
pub(crate) fn convert_value(value: AttributeValue) -> AttrValue {
    match value {
        AttributeValue::S(s) => AttrValue::S(s),
        AttributeValue::N(n) => AttrValue::N(n),
        AttributeValue::B(b) => AttrValue::B(blob_bytes(b)),
        AttributeValue::Bool(b) => AttrValue::Bool(b),
        AttributeValue::Null(_) => AttrValue::Null,
        AttributeValue::L(items) => AttrValue::L(items.into_iter().map(convert_value).collect()),
        AttributeValue::M(map) => AttrValue::M(
            map.into_iter()
                .map(|(k, v)| (k, convert_value(v)))
                .collect(),
        ),
        AttributeValue::Ss(items) => AttrValue::Ss(items),
        AttributeValue::Ns(items) => AttrValue::Ns(items),
        AttributeValue::Bs(items) => AttrValue::Bs(items.into_iter().map(blob_bytes).collect()),
        // Types added to the service after this SDK release
        _ => AttrValue::Null,
    }
}

fn item_to_record(item: Item) -> Record {
    item.into_iter()
        .map(|(k, v)| (k, convert_value(v)))
        .collect()
}
