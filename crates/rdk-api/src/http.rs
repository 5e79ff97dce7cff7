//! reqwest-backed facade.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use rdk_schemas::{
    Expense, ExpenseHistoryFilter, Flat, LoginRequest, NewExpense, NewFlat, NewServiceRequest,
    OtpPurpose, OtpRequest, OwnerRecordRent, PasswordChange, PaymentHistoryFilter, ProfileUpdate,
    RecordRentPayment, RentFlatRequest, RentPayment, ServiceExpenseUpdate, ServiceRating,
    ServiceRequest, ServiceRequestUpdate, SessionUser, SignupRequest, SummaryPeriod, Tenant,
    UserFilter, UserRow, VacateFlatRequest,
};

use crate::envelope::{decode, decode_field_or_self, decode_list, parse_body, unwrap_envelope};
use crate::{
    normalize_error_message, AccountsApi, Ack, AdminApi, ApiError, ApiResult, FinancialsApi,
    FlatUpdate, FlatsApi, PredictorApi, ServiceRequestsApi, DEFAULT_ERROR_MESSAGE,
};

/// HTTP client for the rental backend.
///
/// Cookies set by the backend (the login session) are kept in an in-memory
/// jar and sent on every later call. [`HttpRentalApi::session_cookie`] and
/// [`HttpRentalApi::restore_session_cookie`] let a short-lived process carry
/// the session across runs.
#[derive(Debug, Clone)]
pub struct HttpRentalApi {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl HttpRentalApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base url '{base_url}': {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "base url '{base_url}' cannot carry a path"
            )));
        }

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("http client init failed: {e}")))?;

        Ok(Self {
            http,
            jar,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Cookie header the jar would send to the backend, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// Seed the jar from a header previously returned by `session_cookie`.
    pub fn restore_session_cookie(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, &self.base_url);
        }
    }

    fn endpoint(&self, path: &str, id: Option<&str>) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| ApiError::Transport("base url cannot carry a path".to_string()))?;
            segs.pop_if_empty();
            segs.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(id) = id {
                segs.push(id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, path: &str, id: Option<&str>) -> ApiResult<RequestBuilder> {
        let url = self.endpoint(path, id)?;
        Ok(self.http.request(method, url))
    }

    async fn execute(&self, method: Method, path: &str, rb: RequestBuilder) -> ApiResult<Value> {
        debug!(%method, path, "api call");

        let resp = rb.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "api call transport failure");
            ApiError::Transport(self.transport_message(&e))
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            warn!(%method, path, error = %e, "api response read failed");
            ApiError::Transport(format!("failed to read response: {e}"))
        })?;
        let parsed = parse_body(&bytes);

        if !status.is_success() {
            let message = normalize_error_message(parsed.as_ref().ok(), DEFAULT_ERROR_MESSAGE);
            warn!(%method, path, status = status.as_u16(), %message, "api call failed");
            return Err(ApiError::server(status.as_u16(), message));
        }

        let body = parsed.map_err(|e| ApiError::Decode(format!("{path}: invalid json: {e}")))?;
        Ok(unwrap_envelope(body))
    }

    fn transport_message(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            format!("could not reach server at {}", self.base_url)
        } else {
            e.to_string()
        }
    }

    async fn get(&self, path: &str, id: Option<&str>) -> ApiResult<Value> {
        let rb = self.request(Method::GET, path, id)?;
        self.execute(Method::GET, path, rb).await
    }

    async fn get_query<Q>(&self, path: &str, id: Option<&str>, query: &Q) -> ApiResult<Value>
    where
        Q: Serialize + ?Sized + Sync,
    {
        let rb = self.request(Method::GET, path, id)?.query(query);
        self.execute(Method::GET, path, rb).await
    }

    async fn send_json<B>(
        &self,
        method: Method,
        path: &str,
        id: Option<&str>,
        body: &B,
    ) -> ApiResult<Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let rb = self.request(method.clone(), path, id)?.json(body);
        self.execute(method, path, rb).await
    }

    async fn send_empty(&self, method: Method, path: &str, id: Option<&str>) -> ApiResult<Value> {
        let rb = self.request(method.clone(), path, id)?;
        self.execute(method, path, rb).await
    }
}

fn require_id<'a>(id: &'a str, what: &str) -> ApiResult<&'a str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{what} id is required")));
    }
    Ok(trimmed)
}

#[async_trait]
impl FlatsApi for HttpRentalApi {
    async fn list_flats(&self) -> ApiResult<Vec<Flat>> {
        decode_list(self.get("/list-flats", None).await?, "flats")
    }

    async fn owner_flats(&self, owner_id: &str) -> ApiResult<Vec<Flat>> {
        let owner_id = require_id(owner_id, "Owner")?;
        decode_list(self.get("/owner-flats", Some(owner_id)).await?, "flats")
    }

    async fn available_tenants(&self) -> ApiResult<Vec<Tenant>> {
        decode_list(
            self.get("/available-tenants", None).await?,
            "available_tenants",
        )
    }

    async fn all_tenants(&self) -> ApiResult<Vec<Tenant>> {
        decode_list(self.get("/all-tenants", None).await?, "tenants")
    }

    async fn request_otp(
        &self,
        flat_id: &str,
        tenant_id: &str,
        purpose: OtpPurpose,
    ) -> ApiResult<Ack> {
        let body = OtpRequest::new(flat_id.trim(), tenant_id.trim());
        body.validate()?;
        let path = match purpose {
            OtpPurpose::Assign => "/request-rent-otp",
            OtpPurpose::Vacate => "/request-vacate-otp",
        };
        decode(
            self.send_json(Method::POST, path, None, &body).await?,
            "otp ack",
        )
    }

    async fn rent_flat(&self, req: &RentFlatRequest) -> ApiResult<FlatUpdate> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/rent-flat", None, req).await?,
            "rent-flat",
        )
    }

    async fn vacate_flat(&self, req: &VacateFlatRequest) -> ApiResult<FlatUpdate> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/vacate-flat", None, req)
                .await?,
            "vacate-flat",
        )
    }

    async fn create_flat(&self, req: &NewFlat) -> ApiResult<FlatUpdate> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/create-flat", None, req)
                .await?,
            "create-flat",
        )
    }

    async fn delete_flat(&self, flat_id: &str) -> ApiResult<Ack> {
        let flat_id = require_id(flat_id, "Flat")?;
        decode(
            self.send_empty(Method::DELETE, "/delete-flat", Some(flat_id))
                .await?,
            "delete-flat",
        )
    }
}

#[async_trait]
impl AccountsApi for HttpRentalApi {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<Ack> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/signup", None, req).await?,
            "signup",
        )
    }

    async fn login(&self, req: &LoginRequest) -> ApiResult<SessionUser> {
        req.validate()?;
        decode_field_or_self(
            self.send_json(Method::POST, "/login", None, req).await?,
            "user",
        )
    }

    async fn verify_otp(&self, email: &str, otp_code: &str) -> ApiResult<Ack> {
        let email = email.trim();
        let otp_code = otp_code.trim();
        if email.is_empty() {
            return Err(ApiError::Validation("Email is required".to_string()));
        }
        if otp_code.is_empty() {
            return Err(ApiError::Validation("Enter OTP".to_string()));
        }
        let body = json!({ "email": email, "otp_code": otp_code });
        decode(
            self.send_json(Method::POST, "/verify-otp", None, &body)
                .await?,
            "verify-otp",
        )
    }

    async fn resend_otp(&self, email: &str) -> ApiResult<Ack> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::Validation("Email is required".to_string()));
        }
        let body = json!({ "email": email });
        decode(
            self.send_json(Method::POST, "/request-otp", None, &body)
                .await?,
            "request-otp",
        )
    }

    async fn profile(&self, user_id: &str) -> ApiResult<Value> {
        let user_id = require_id(user_id, "User")?;
        let body = self.get("/profile", Some(user_id)).await?;
        Ok(match body {
            Value::Object(mut map) if map.contains_key("profile") => {
                map.remove("profile").unwrap_or(Value::Null)
            }
            other => other,
        })
    }

    async fn update_profile(&self, req: &ProfileUpdate) -> ApiResult<Ack> {
        require_id(&req.unique_id, "User")?;
        decode(
            self.send_json(Method::PUT, "/update-profile", None, req)
                .await?,
            "update-profile",
        )
    }

    async fn change_password(&self, req: &PasswordChange) -> ApiResult<Ack> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/change-password", None, req)
                .await?,
            "change-password",
        )
    }
}

#[async_trait]
impl ServiceRequestsApi for HttpRentalApi {
    async fn create_service_request(&self, req: &NewServiceRequest) -> ApiResult<Ack> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/create-service-request", None, req)
                .await?,
            "create-service-request",
        )
    }

    async fn tenant_service_requests(&self, tenant_id: &str) -> ApiResult<Vec<ServiceRequest>> {
        let tenant_id = require_id(tenant_id, "Tenant")?;
        decode_list(
            self.get("/tenant-service-requests", Some(tenant_id))
                .await?,
            "service_requests",
        )
    }

    async fn owner_service_requests(&self, owner_id: &str) -> ApiResult<Vec<ServiceRequest>> {
        let owner_id = require_id(owner_id, "Owner")?;
        decode_list(
            self.get("/owner-service-requests", Some(owner_id)).await?,
            "service_requests",
        )
    }

    async fn update_service_request(&self, req: &ServiceRequestUpdate) -> ApiResult<Ack> {
        req.validate()?;
        let body = req.clone().normalized();
        decode(
            self.send_json(Method::PUT, "/update-service-request", None, &body)
                .await?,
            "update-service-request",
        )
    }

    async fn rate_service_request(&self, req: &ServiceRating) -> ApiResult<Ack> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/rate-service-request", None, req)
                .await?,
            "rate-service-request",
        )
    }

    async fn service_request_details(&self, request_id: &str) -> ApiResult<Value> {
        let request_id = require_id(request_id, "Service request")?;
        self.get("/service-request-details", Some(request_id)).await
    }
}

#[async_trait]
impl FinancialsApi for HttpRentalApi {
    async fn my_rent_payments(&self) -> ApiResult<Vec<RentPayment>> {
        decode_list(self.get("/tenant/rent-payments", None).await?, "payments")
    }

    async fn record_rent_payment(&self, req: &RecordRentPayment) -> ApiResult<Ack> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/tenant/record-rent-payment", None, req)
                .await?,
            "record-rent-payment",
        )
    }

    async fn owner_record_rent(&self, req: &OwnerRecordRent) -> ApiResult<Ack> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/owner/record-rent", None, req)
                .await?,
            "owner-record-rent",
        )
    }

    async fn verify_rent_payment(&self, payment_id: &str) -> ApiResult<Ack> {
        let payment_id = require_id(payment_id, "Payment")?;
        decode(
            self.send_empty(
                Method::POST,
                "/owner/verify-rent-payment",
                Some(payment_id),
            )
            .await?,
            "verify-rent-payment",
        )
    }

    async fn financial_summary(&self, owner_id: &str, period: SummaryPeriod) -> ApiResult<Value> {
        let owner_id = require_id(owner_id, "Owner")?;
        period.validate()?;
        self.get_query("/financial-summary", Some(owner_id), &period)
            .await
    }

    async fn rent_payment_history(
        &self,
        filter: &PaymentHistoryFilter,
    ) -> ApiResult<Vec<RentPayment>> {
        decode_list(
            self.get_query("/rent-payment-history", None, filter)
                .await?,
            "payments",
        )
    }

    async fn expense_history(&self, filter: &ExpenseHistoryFilter) -> ApiResult<Vec<Expense>> {
        decode_list(
            self.get_query("/expense-history", None, filter).await?,
            "expenses",
        )
    }

    async fn create_manual_expense(&self, req: &NewExpense) -> ApiResult<Ack> {
        req.validate()?;
        decode(
            self.send_json(Method::POST, "/create-manual-expense", None, req)
                .await?,
            "create-manual-expense",
        )
    }

    async fn update_service_expense(&self, req: &ServiceExpenseUpdate) -> ApiResult<Ack> {
        req.validate()?;
        decode(
            self.send_json(Method::PUT, "/update-service-expense", None, req)
                .await?,
            "update-service-expense",
        )
    }
}

#[async_trait]
impl AdminApi for HttpRentalApi {
    async fn statistics(&self) -> ApiResult<Value> {
        self.get("/admin/statistics", None).await
    }

    async fn users(&self, filter: &UserFilter) -> ApiResult<Vec<UserRow>> {
        decode_list(self.get_query("/admin/users", None, filter).await?, "users")
    }

    async fn user_details(&self, user_id: &str) -> ApiResult<Value> {
        let user_id = require_id(user_id, "User")?;
        self.get("/admin/user-details", Some(user_id)).await
    }

    async fn cleanup(&self) -> ApiResult<Value> {
        self.send_empty(Method::POST, "/admin/cleanup", None).await
    }

    async fn export_data(&self) -> ApiResult<Value> {
        self.get("/admin/export", None).await
    }

    async fn delete_user(&self, user_id: &str) -> ApiResult<Ack> {
        let user_id = require_id(user_id, "User")?;
        decode(
            self.send_empty(Method::DELETE, "/delete-user", Some(user_id))
                .await?,
            "delete-user",
        )
    }
}

#[async_trait]
impl PredictorApi for HttpRentalApi {
    async fn predict_rent(&self, features: &Value) -> ApiResult<Value> {
        if !features.is_object() {
            return Err(ApiError::Validation(
                "Prediction input must be a JSON object".to_string(),
            ));
        }
        self.send_json(Method::POST, "/predict-rent", None, features)
            .await
    }
}
