//! rdk-api
//!
//! Data access facade for the rental backend. Every remote call the client
//! makes goes through the traits below; the workflow layer never builds a
//! request itself.
//!
//! The facade owns no state beyond the HTTP client and its cookie jar and
//! performs no retries. Bodies are validated before they are sent; failures
//! come back as [`ApiError`] with the server message normalized.
//!
//! The surface is split by resource so a workflow (and its test double) can
//! depend on just the part it drives. [`RentalApi`] is the whole facade.

mod envelope;
mod error;
mod http;

pub use envelope::{unwrap_envelope, Ack, FlatUpdate};
pub use error::{normalize_error_message, ApiError, ErrorKind, DEFAULT_ERROR_MESSAGE};
pub use http::HttpRentalApi;

use async_trait::async_trait;
use serde_json::Value;

use rdk_schemas::{
    Expense, ExpenseHistoryFilter, Flat, LoginRequest, NewExpense, NewFlat, NewServiceRequest,
    OtpPurpose, OwnerRecordRent, PasswordChange, PaymentHistoryFilter, ProfileUpdate,
    RecordRentPayment, RentFlatRequest, RentPayment, ServiceExpenseUpdate, ServiceRating,
    ServiceRequest, ServiceRequestUpdate, SessionUser, SignupRequest, SummaryPeriod, Tenant,
    UserFilter, UserRow, VacateFlatRequest,
};

pub type ApiResult<T> = Result<T, ApiError>;

/// Flats, tenant availability and the OTP-gated rent / vacate handshake.
#[async_trait]
pub trait FlatsApi: Send + Sync {
    /// `GET /list-flats`
    async fn list_flats(&self) -> ApiResult<Vec<Flat>>;

    /// `GET /owner-flats/{owner_id}`
    async fn owner_flats(&self, owner_id: &str) -> ApiResult<Vec<Flat>>;

    /// `GET /available-tenants`
    async fn available_tenants(&self) -> ApiResult<Vec<Tenant>>;

    /// `GET /all-tenants`
    async fn all_tenants(&self) -> ApiResult<Vec<Tenant>>;

    /// `POST /request-rent-otp` or `/request-vacate-otp`, by purpose.
    async fn request_otp(
        &self,
        flat_id: &str,
        tenant_id: &str,
        purpose: OtpPurpose,
    ) -> ApiResult<Ack>;

    async fn request_rent_otp(&self, flat_id: &str, tenant_id: &str) -> ApiResult<Ack> {
        self.request_otp(flat_id, tenant_id, OtpPurpose::Assign)
            .await
    }

    async fn request_vacate_otp(&self, flat_id: &str, tenant_id: &str) -> ApiResult<Ack> {
        self.request_otp(flat_id, tenant_id, OtpPurpose::Vacate)
            .await
    }

    /// `POST /rent-flat`
    async fn rent_flat(&self, req: &RentFlatRequest) -> ApiResult<FlatUpdate>;

    /// `POST /vacate-flat`
    async fn vacate_flat(&self, req: &VacateFlatRequest) -> ApiResult<FlatUpdate>;

    /// `POST /create-flat`
    async fn create_flat(&self, req: &NewFlat) -> ApiResult<FlatUpdate>;

    /// `DELETE /delete-flat/{flat_id}`
    async fn delete_flat(&self, flat_id: &str) -> ApiResult<Ack>;
}

/// Sign-up, login, e-mail verification and profile.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<Ack>;

    /// User fields arrive either at the top level or under `user`.
    async fn login(&self, req: &LoginRequest) -> ApiResult<SessionUser>;

    /// `POST /verify-otp` with the e-mailed account verification code.
    async fn verify_otp(&self, email: &str, otp_code: &str) -> ApiResult<Ack>;

    /// `POST /request-otp`
    async fn resend_otp(&self, email: &str) -> ApiResult<Ack>;

    /// `GET /profile/{user_id}`; the `profile` object, shape backend-owned.
    async fn profile(&self, user_id: &str) -> ApiResult<Value>;

    async fn update_profile(&self, req: &ProfileUpdate) -> ApiResult<Ack>;

    async fn change_password(&self, req: &PasswordChange) -> ApiResult<Ack>;
}

#[async_trait]
pub trait ServiceRequestsApi: Send + Sync {
    async fn create_service_request(&self, req: &NewServiceRequest) -> ApiResult<Ack>;

    async fn tenant_service_requests(&self, tenant_id: &str) -> ApiResult<Vec<ServiceRequest>>;

    async fn owner_service_requests(&self, owner_id: &str) -> ApiResult<Vec<ServiceRequest>>;

    async fn update_service_request(&self, req: &ServiceRequestUpdate) -> ApiResult<Ack>;

    async fn rate_service_request(&self, req: &ServiceRating) -> ApiResult<Ack>;

    /// Request plus its linked expenses, as returned by the backend.
    async fn service_request_details(&self, request_id: &str) -> ApiResult<Value>;
}

#[async_trait]
pub trait FinancialsApi: Send + Sync {
    /// Payments of the logged-in tenant (identified by the session cookie).
    async fn my_rent_payments(&self) -> ApiResult<Vec<RentPayment>>;

    async fn record_rent_payment(&self, req: &RecordRentPayment) -> ApiResult<Ack>;

    async fn owner_record_rent(&self, req: &OwnerRecordRent) -> ApiResult<Ack>;

    /// `POST /owner/verify-rent-payment/{payment_id}`
    async fn verify_rent_payment(&self, payment_id: &str) -> ApiResult<Ack>;

    async fn financial_summary(&self, owner_id: &str, period: SummaryPeriod) -> ApiResult<Value>;

    async fn rent_payment_history(
        &self,
        filter: &PaymentHistoryFilter,
    ) -> ApiResult<Vec<RentPayment>>;

    async fn expense_history(&self, filter: &ExpenseHistoryFilter) -> ApiResult<Vec<Expense>>;

    async fn create_manual_expense(&self, req: &NewExpense) -> ApiResult<Ack>;

    async fn update_service_expense(&self, req: &ServiceExpenseUpdate) -> ApiResult<Ack>;
}

#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn statistics(&self) -> ApiResult<Value>;

    async fn users(&self, filter: &UserFilter) -> ApiResult<Vec<UserRow>>;

    async fn user_details(&self, user_id: &str) -> ApiResult<Value>;

    async fn cleanup(&self) -> ApiResult<Value>;

    async fn export_data(&self) -> ApiResult<Value>;

    async fn delete_user(&self, user_id: &str) -> ApiResult<Ack>;
}

/// Rent prediction service, reached through the same backend.
#[async_trait]
pub trait PredictorApi: Send + Sync {
    /// `POST /predict-rent`; request and response are passed through as-is.
    async fn predict_rent(&self, features: &Value) -> ApiResult<Value>;
}

/// The complete facade.
pub trait RentalApi:
    FlatsApi + AccountsApi + ServiceRequestsApi + FinancialsApi + AdminApi + PredictorApi
{
}

impl<T> RentalApi for T where
    T: FlatsApi + AccountsApi + ServiceRequestsApi + FinancialsApi + AdminApi + PredictorApi
{
}
