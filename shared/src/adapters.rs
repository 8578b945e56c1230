use crate::{
    configuration::Configuration,
    core::{NameRecord, NameRepository, RepositoryError},
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::{
    error::{DisplayErrorContext, SdkError},
    types::{AttributeValue, Get, Put, TransactGetItem, TransactWriteItem},
    Client,
};
use std::time::Duration;

/// Stores names through the database's DynamoDB-compatible document API.
///
/// Every call opens its own client, waits for the table to answer, runs a single
/// transaction and drops the client again. Nothing is shared between invocations
/// apart from the SDK configuration.
#[derive(Debug)]
pub struct DynamoDbNameRepository {
    sdk_config: SdkConfig,
    endpoint_url: String,
    table_name: String,
    discovery_timeout: Duration,
}

impl DynamoDbNameRepository {
    pub fn new(sdk_config: SdkConfig, configuration: &Configuration) -> Self {
        Self {
            sdk_config,
            endpoint_url: configuration.store_url(),
            table_name: configuration.table_name.clone(),
            discovery_timeout: configuration.discovery_timeout(),
        }
    }

    fn connect(&self) -> Client {
        let config = aws_sdk_dynamodb::config::Builder::from(&self.sdk_config)
            .endpoint_url(&self.endpoint_url)
            .build();
        Client::from_conf(config)
    }

    async fn wait_for_discovery(&self, client: &Client) -> Result<(), RepositoryError> {
        let probe = client.describe_table().table_name(&self.table_name).send();

        let details = match tokio::time::timeout(self.discovery_timeout, probe).await {
            Ok(Ok(_)) => return Ok(()),
            Ok(Err(e @ (SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)))) => {
                format!("{}", DisplayErrorContext(&e))
            }
            // the store answered, so it was found; the table itself is the problem
            Ok(Err(e)) => {
                return Err(RepositoryError::Query(format!(
                    "Error describing table: {}",
                    DisplayErrorContext(&e)
                )))
            }
            Err(_) => format!("no response within {:?}", self.discovery_timeout),
        };

        tracing::error!(
            endpoint = %self.endpoint_url,
            table = %self.table_name,
            "Connect failed to store, last reported discovery error: {}",
            details
        );
        Err(RepositoryError::Unavailable { details })
    }
}

#[async_trait]
impl NameRepository for DynamoDbNameRepository {
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    async fn store(&self, record: &NameRecord) -> Result<(), RepositoryError> {
        let client = self.connect();
        self.wait_for_discovery(&client).await?;

        let upsert = Put::builder()
            .table_name(&self.table_name)
            .item("id", AttributeValue::S(record.id.clone()))
            .item("name", AttributeValue::S(record.name.clone()))
            .build()
            .map_err(|e| RepositoryError::Query(format!("Error building upsert: {:?}", e)))?;

        client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(upsert).build())
            .send()
            .await
            .map(|_| ())
            .map_err(|e| {
                RepositoryError::Query(format!("Error upserting item: {}", DisplayErrorContext(&e)))
            })
    }

    #[tracing::instrument(skip(self))]
    async fn lookup(&self, id: &str) -> Result<Option<String>, RepositoryError> {
        let client = self.connect();
        self.wait_for_discovery(&client).await?;

        // `name` is a reserved word in the expression language
        let select = Get::builder()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .projection_expression("#name")
            .expression_attribute_names("#name", "name")
            .build()
            .map_err(|e| RepositoryError::Query(format!("Error building select: {:?}", e)))?;

        let result = client
            .transact_get_items()
            .transact_items(TransactGetItem::builder().get(select).build())
            .send()
            .await
            .map_err(|e| {
                RepositoryError::Query(format!("Error selecting item: {}", DisplayErrorContext(&e)))
            })?;

        Ok(result
            .responses()
            .first()
            .and_then(|response| response.item())
            .and_then(|item| item.get("name"))
            .and_then(|name| name.as_s().ok())
            .cloned())
    }
}
