//! Request/response boundary to the server-side actions.

use async_trait::async_trait;
use floor_shared::{
    domain::{
        CardNumber, CardPosition, CardSummary, FaultReport, FaultType, OvenId, OvenProcess,
        ProgramId, SelectOption,
    },
    locale::Locale,
    protocol::{
        ActionResult, ActiveFaultRequest, ActiveFaultResponse, ActiveProgramResponse,
        CardPositionsRequest, CardsRequest, CreateCardReply, CreateCardRequest,
        DeletePositionRequest, FinishFaultRequest, LoginCredentials, LoginResponse, NoParams,
        OvenRequest, ReportFaultRequest,
    },
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Every call is one round trip. Nothing here retries.
#[async_trait]
pub trait ActionGateway: Send + Sync {
    async fn login(&self, credentials: LoginCredentials) -> ClientResult<LoginResponse>;

    async fn create_new_card(
        &self,
        persons: Vec<String>,
        warehouse: String,
        sector: String,
    ) -> ClientResult<CardNumber>;
    async fn fetch_cards(&self, persons: Vec<String>) -> ClientResult<Vec<CardSummary>>;
    async fn fetch_card_positions(
        &self,
        persons: Vec<String>,
        card: CardNumber,
    ) -> ClientResult<Vec<CardPosition>>;
    async fn delete_card_position(
        &self,
        persons: Vec<String>,
        card: CardNumber,
        position: u32,
    ) -> ClientResult<()>;
    async fn fetch_warehouse_options(&self) -> ClientResult<Vec<SelectOption>>;
    async fn fetch_sector_options(&self) -> ClientResult<Vec<SelectOption>>;

    async fn fetch_oven_processes(&self, oven: OvenId) -> ClientResult<Vec<OvenProcess>>;
    async fn fetch_active_oven_program(&self, oven: OvenId) -> ClientResult<Option<ProgramId>>;
    async fn fetch_active_oven_fault(
        &self,
        oven: OvenId,
        locale: Locale,
    ) -> ClientResult<Option<FaultReport>>;
    async fn fetch_oven_fault_types(&self) -> ClientResult<Vec<FaultType>>;
    async fn report_oven_fault(
        &self,
        oven: OvenId,
        fault_key: String,
        operators: Vec<String>,
    ) -> ClientResult<()>;
    async fn finish_oven_fault(&self, oven: OvenId, operators: Vec<String>) -> ClientResult<()>;
}

/// Posts JSON to `{server_url}/actions/<name>` and unwraps the
/// `{"success"}`/`{"error"}` envelope.
pub struct HttpActionGateway {
    http: Client,
    base: Url,
}

impl HttpActionGateway {
    pub fn new(server_url: &str) -> ClientResult<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> ClientResult<Self> {
        let mut base = Url::parse(server_url)
            .map_err(|err| ClientError::Network(format!("invalid server url '{server_url}': {err}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn post<Req, Res>(&self, action: &'static str, request: &Req) -> ClientResult<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned,
    {
        let url = self
            .base
            .join(&format!("actions/{action}"))
            .map_err(|err| ClientError::Network(err.to_string()))?;
        debug!(action, %url, "calling action");
        Ok(self
            .http
            .post(url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn call<Req, Res>(&self, action: &'static str, request: &Req) -> ClientResult<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned,
    {
        let envelope: ActionResult<Res> = self.post(action, request).await?;
        envelope.into_result().map_err(|err| {
            warn!(action, tag = %err.tag, "action returned error");
            ClientError::Gateway(err)
        })
    }
}

#[async_trait]
impl ActionGateway for HttpActionGateway {
    async fn login(&self, credentials: LoginCredentials) -> ClientResult<LoginResponse> {
        self.call("login", &credentials).await
    }

    async fn create_new_card(
        &self,
        persons: Vec<String>,
        warehouse: String,
        sector: String,
    ) -> ClientResult<CardNumber> {
        let reply: CreateCardReply = self
            .post(
                "create-new-card",
                &CreateCardRequest {
                    persons,
                    warehouse,
                    sector,
                },
            )
            .await?;
        reply.into_result().map_err(|err| {
            warn!(action = "create-new-card", tag = %err.tag, "action returned error");
            ClientError::Gateway(err)
        })
    }

    async fn fetch_cards(&self, persons: Vec<String>) -> ClientResult<Vec<CardSummary>> {
        self.call("get-cards", &CardsRequest { persons }).await
    }

    async fn fetch_card_positions(
        &self,
        persons: Vec<String>,
        card: CardNumber,
    ) -> ClientResult<Vec<CardPosition>> {
        self.call("get-card-positions", &CardPositionsRequest { persons, card })
            .await
    }

    async fn delete_card_position(
        &self,
        persons: Vec<String>,
        card: CardNumber,
        position: u32,
    ) -> ClientResult<()> {
        self.call(
            "delete-card-position",
            &DeletePositionRequest {
                persons,
                card,
                position,
            },
        )
        .await
    }

    async fn fetch_warehouse_options(&self) -> ClientResult<Vec<SelectOption>> {
        self.call("get-warehouse-options", &NoParams {}).await
    }

    async fn fetch_sector_options(&self) -> ClientResult<Vec<SelectOption>> {
        self.call("get-sector-options", &NoParams {}).await
    }

    async fn fetch_oven_processes(&self, oven: OvenId) -> ClientResult<Vec<OvenProcess>> {
        self.call("get-oven-processes", &OvenRequest { oven }).await
    }

    async fn fetch_active_oven_program(&self, oven: OvenId) -> ClientResult<Option<ProgramId>> {
        let response: ActiveProgramResponse = self
            .call("fetch-active-oven-program", &OvenRequest { oven })
            .await?;
        Ok(response.program)
    }

    async fn fetch_active_oven_fault(
        &self,
        oven: OvenId,
        locale: Locale,
    ) -> ClientResult<Option<FaultReport>> {
        let response: ActiveFaultResponse = self
            .call(
                "fetch-active-oven-fault",
                &ActiveFaultRequest { oven, lang: locale },
            )
            .await?;
        Ok(response.fault)
    }

    async fn fetch_oven_fault_types(&self) -> ClientResult<Vec<FaultType>> {
        self.call("fetch-oven-fault-types", &NoParams {}).await
    }

    async fn report_oven_fault(
        &self,
        oven: OvenId,
        fault_key: String,
        operators: Vec<String>,
    ) -> ClientResult<()> {
        self.call(
            "report-oven-fault",
            &ReportFaultRequest {
                oven,
                fault_key,
                operators,
            },
        )
        .await
    }

    async fn finish_oven_fault(&self, oven: OvenId, operators: Vec<String>) -> ClientResult<()> {
        self.call("finish-oven-fault", &FinishFaultRequest { oven, operators })
            .await
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
