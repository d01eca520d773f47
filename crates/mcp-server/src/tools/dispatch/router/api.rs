use super::{ServiceState, ToolError, ToolResult};
use crate::tools::schemas::api::{
    CommitTransactionRequest, GetTransactionRequest, GraphqlQueryRequest,
};
use rdb_deploy::DeployError;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

pub(super) async fn commit_transaction(
    state: &mut ServiceState,
    request: CommitTransactionRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let response = state
        .relay
        .commit_transaction(&request.transaction_id, &request.value, cancel)
        .await
        .map_err(|err| ToolError::deploy("Error committing transaction", err))?;
    Ok(format!(
        "Transaction committed (status {}):\n{}",
        response.status, response.body
    ))
}

pub(super) async fn get_transaction(
    state: &mut ServiceState,
    request: GetTransactionRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let response = state
        .relay
        .get_transaction(&request.transaction_id, cancel)
        .await
        .map_err(|err| ToolError::deploy("Error fetching transaction", err))?;
    Ok(format!(
        "Transaction data (status {}):\n{}",
        response.status, response.body
    ))
}

pub(super) async fn graphql_query(
    state: &mut ServiceState,
    request: GraphqlQueryRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let context = "Error executing GraphQL query";
    let variables = Value::Object(request.variables);
    let (_status, body) = state
        .relay
        .graphql(&request.query, &variables, cancel)
        .await
        .map_err(|err| ToolError::deploy(context, err))?;
    let pretty = serde_json::to_string_pretty(&body)
        .map_err(|err| ToolError::deploy(context, DeployError::relay(err.to_string())))?;
    Ok(format!("GraphQL Response:\n{pretty}"))
}
