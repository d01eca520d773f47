use rmcp::model::JsonObject;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CommitTransactionRequest {
    #[schemars(description = "Transaction ID")]
    pub transaction_id: String,

    #[schemars(description = "Transaction value/data")]
    pub value: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetTransactionRequest {
    #[schemars(description = "Transaction ID to retrieve")]
    pub transaction_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GraphqlQueryRequest {
    #[schemars(description = "GraphQL query string")]
    pub query: String,

    /// Sent verbatim as the `variables` member of the request body.
    #[serde(default)]
    #[schemars(description = "Optional GraphQL variables")]
    pub variables: JsonObject,
}
