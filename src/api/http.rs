//! Implements the `Api` trait with `reqwest` against the MyPockit REST backend.

use crate::api::wire::{ApiResponse, TransactionPage, TransactionQuery};
use crate::api::{endpoints, Api, ApiError, ApiResult};
use crate::model::{Amount, Category, Month, TransactionType};
use crate::Result;
use anyhow::Context;
use reqwest::{Method, RequestBuilder, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;
use tracing::trace;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Talks to the backend over HTTP. Every request carries the session's bearer token.
pub(super) struct HttpApi {
    client: reqwest::Client,
    base: Url,
    token: String,
}

impl HttpApi {
    pub(super) fn new(base: Url, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            base,
            token: token.into(),
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> ApiResult<RequestBuilder> {
        let url = self.base.join(endpoint).map_err(|source| ApiError::Url {
            endpoint: endpoint.to_string(),
            source,
        })?;
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(&self.token))
    }

    async fn get<T>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ApiResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        trace!("GET {endpoint} {params:?}");
        let request = self.request(Method::GET, endpoint)?.query(params);
        send(endpoint, request).await
    }
}

/// Sends `request` and decodes the response envelope. A 401 becomes `ApiError::Unauthorized`,
/// any other non-2xx status becomes `ApiError::Status`.
async fn send<T>(endpoint: &str, request: RequestBuilder) -> ApiResult<ApiResponse<T>>
where
    T: DeserializeOwned,
{
    let response = request
        .send()
        .await
        .map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .json::<ApiResponse<T>>()
        .await
        .map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
}

fn month_params(month: Month) -> [(&'static str, String); 2] {
    [
        ("month", month.id().to_string()),
        ("year", month.year().to_string()),
    ]
}

#[async_trait::async_trait]
impl Api for HttpApi {
    async fn total_income_or_expense(
        &self,
        user_id: i64,
        kind: TransactionType,
        month: Month,
    ) -> ApiResult<ApiResponse<Amount>> {
        let mut params = vec![
            ("userId", user_id.to_string()),
            ("transactionTypeId", kind.id().to_string()),
        ];
        params.extend(month_params(month));
        self.get(endpoints::TOTAL_INCOME_OR_EXPENSE, &params).await
    }

    async fn total_no_of_transactions(
        &self,
        user_id: i64,
        month: Month,
    ) -> ApiResult<ApiResponse<u64>> {
        let mut params = vec![("userId", user_id.to_string())];
        params.extend(month_params(month));
        self.get(endpoints::TOTAL_NO_OF_TRANSACTIONS, &params).await
    }

    async fn total_by_category(
        &self,
        email: &str,
        category_id: i64,
        month: Month,
    ) -> ApiResult<ApiResponse<Amount>> {
        let mut params = vec![
            ("email", email.to_string()),
            ("categoryId", category_id.to_string()),
        ];
        params.extend(month_params(month));
        self.get(endpoints::TOTAL_BY_CATEGORY, &params).await
    }

    async fn categories(&self) -> ApiResult<ApiResponse<Vec<Category>>> {
        self.get(endpoints::CATEGORIES, &[]).await
    }

    async fn transactions(
        &self,
        email: &str,
        query: &TransactionQuery,
    ) -> ApiResult<ApiResponse<TransactionPage>> {
        self.get(endpoints::TRANSACTIONS, &query.params(email))
            .await
    }

    async fn budget(&self, month: Month) -> ApiResult<ApiResponse<Amount>> {
        self.get(endpoints::BUDGET, &month_params(month)).await
    }

    async fn create_budget(&self, amount: Amount) -> ApiResult<ApiResponse<IgnoredAny>> {
        trace!("POST {} {amount}", endpoints::CREATE_BUDGET);
        let request = self
            .request(Method::POST, endpoints::CREATE_BUDGET)?
            .json(&json!({ "amount": amount.rounded().value().to_f64() }));
        send(endpoints::CREATE_BUDGET, request).await
    }
}
