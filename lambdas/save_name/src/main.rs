use crate::event_handler::HandlerDeps;
use event_handler::function_handler;
use lambda_runtime::{run, service_fn, tracing, Error};
use shared::adapters::DynamoDbNameRepository;
use shared::configuration::Configuration;

mod event_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();
    let config = Configuration::load()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let name_repo = DynamoDbNameRepository::new(aws_config, &config);
    let deps = HandlerDeps { name_repo };

    run(service_fn(|event| function_handler(&deps, event))).await
}
