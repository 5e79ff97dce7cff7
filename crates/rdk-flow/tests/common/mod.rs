//! In-memory backend for workflow scenarios.
//!
//! Mirrors the server rules the dialog relies on: an OTP is issued per
//! (flat, tenant, purpose), only the current code confirms, a confirm is
//! refused with a 409 when the flat has changed since the OTP was issued, and
//! a confirmed assign / vacate flips the flat and tenant records together and
//! voids every other challenge for that flat.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rdk_api::{Ack, ApiError, ApiResult, FlatUpdate, FlatsApi};
use rdk_schemas::{
    Flat, Money, NewFlat, OtpPurpose, PersonRef, RentFlatRequest, Tenant, VacateFlatRequest,
};

pub const GOOD_CODE: &str = "123456";
pub const OWNER_ID: &str = "own-1";

#[derive(Default)]
struct State {
    flats: Vec<Flat>,
    tenants: Vec<Tenant>,
    issued: HashMap<(String, String, OtpPurpose), String>,
    calls: Vec<String>,
    fail_next_otp: Option<ApiError>,
    fail_listing: bool,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    /// One vacant flat `flat-1`, one rented flat `flat-2` (tenant `t2`),
    /// one free tenant `t1`.
    pub fn seeded() -> Self {
        let backend = Self::default();
        {
            let mut s = backend.state.lock().unwrap();
            s.flats = vec![
                flat("flat-1", None),
                flat("flat-2", Some("t2")),
            ];
            s.tenants = vec![tenant("t1", false), tenant("t2", true)];
        }
        backend
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn fail_next_otp(&self, err: ApiError) {
        self.state.lock().unwrap().fail_next_otp = Some(err);
    }

    /// Register another free tenant.
    pub fn add_tenant(&self, id: &str) {
        self.state.lock().unwrap().tenants.push(tenant(id, false));
    }

    pub fn fail_listing(&self, on: bool) {
        self.state.lock().unwrap().fail_listing = on;
    }

    fn record(&self, call: String) -> std::sync::MutexGuard<'_, State> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(call);
        s
    }
}

pub fn flat(id: &str, tenant: Option<&str>) -> Flat {
    Flat {
        flat_unique_id: id.to_string(),
        title: format!("Flat {id}"),
        address: "MG Road".to_string(),
        rent: Money::from_cents(1_500_000),
        is_rented: tenant.is_some(),
        tenant: tenant.map(person),
        owner: Some(person(OWNER_ID)),
        rented_to_unique_id: None,
        created_at: None,
    }
}

fn person(id: &str) -> PersonRef {
    PersonRef {
        unique_id: id.to_string(),
        username: format!("user-{id}"),
        contact_no: None,
    }
}

fn tenant(id: &str, rented: bool) -> Tenant {
    Tenant {
        unique_id: id.to_string(),
        username: format!("user-{id}"),
        email: format!("{id}@example.com"),
        contact_no: None,
        currently_rented: rented,
        created_at: None,
        current_rental: None,
    }
}

fn rejected() -> ApiError {
    ApiError::server(400, "Invalid or expired OTP")
}

impl State {
    fn flat(&self, flat_id: &str) -> ApiResult<&Flat> {
        self.flats
            .iter()
            .find(|f| f.flat_unique_id == flat_id)
            .ok_or_else(|| ApiError::server(404, "Flat not found"))
    }

    fn void_challenges(&mut self, flat_id: &str) {
        self.issued.retain(|(f, _, _), _| f != flat_id);
    }
}

/// Manually advanced epoch-ms clock.
#[derive(Clone, Default)]
pub struct TestClock(Arc<AtomicI64>);

impl TestClock {
    pub fn at(ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(ms)))
    }

    pub fn advance_ms(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn reader(&self) -> impl Fn() -> i64 + Send + Sync + 'static {
        let inner = Arc::clone(&self.0);
        move || inner.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlatsApi for FakeBackend {
    async fn list_flats(&self) -> ApiResult<Vec<Flat>> {
        let s = self.record("list_flats".into());
        if s.fail_listing {
            return Err(ApiError::Transport("connection reset".into()));
        }
        Ok(s.flats.clone())
    }

    async fn owner_flats(&self, owner_id: &str) -> ApiResult<Vec<Flat>> {
        let s = self.record(format!("owner_flats:{owner_id}"));
        if s.fail_listing {
            return Err(ApiError::Transport("connection reset".into()));
        }
        Ok(s.flats
            .iter()
            .filter(|f| f.owner.as_ref().is_some_and(|o| o.unique_id == owner_id))
            .cloned()
            .collect())
    }

    async fn available_tenants(&self) -> ApiResult<Vec<Tenant>> {
        let s = self.record("available_tenants".into());
        Ok(s.tenants.iter().filter(|t| t.is_available()).cloned().collect())
    }

    async fn all_tenants(&self) -> ApiResult<Vec<Tenant>> {
        let s = self.record("all_tenants".into());
        Ok(s.tenants.clone())
    }

    async fn request_otp(
        &self,
        flat_id: &str,
        tenant_id: &str,
        purpose: OtpPurpose,
    ) -> ApiResult<Ack> {
        let mut s = self.record(format!("request_otp:{purpose}:{flat_id}:{tenant_id}"));
        if let Some(err) = s.fail_next_otp.take() {
            return Err(err);
        }
        let Some(f) = s.flats.iter().find(|f| f.flat_unique_id == flat_id) else {
            return Err(ApiError::server(404, "Flat not found"));
        };
        match purpose {
            OtpPurpose::Assign if f.is_rented => {
                return Err(ApiError::server(409, "Flat is already rented"))
            }
            OtpPurpose::Vacate if !f.is_linked_to(tenant_id) => {
                return Err(ApiError::server(400, "Tenant does not occupy this flat"))
            }
            _ => {}
        }
        s.issued.insert(
            (flat_id.to_string(), tenant_id.to_string(), purpose),
            GOOD_CODE.to_string(),
        );
        Ok(Ack {
            message: Some("OTP sent to tenant".into()),
        })
    }

    async fn rent_flat(&self, req: &RentFlatRequest) -> ApiResult<FlatUpdate> {
        let mut s = self.record(format!(
            "rent_flat:{}:{}",
            req.flat_unique_id, req.tenant_unique_id
        ));
        if s.flat(&req.flat_unique_id)?.is_rented {
            return Err(ApiError::server(409, "Flat is already rented"));
        }
        let key = (
            req.flat_unique_id.clone(),
            req.tenant_unique_id.clone(),
            OtpPurpose::Assign,
        );
        if s.issued.get(&key).map(String::as_str) != Some(req.otp_code.as_str()) {
            return Err(rejected());
        }
        s.void_challenges(&req.flat_unique_id);
        for f in s.flats.iter_mut().filter(|f| f.flat_unique_id == req.flat_unique_id) {
            f.is_rented = true;
            f.tenant = Some(person(&req.tenant_unique_id));
        }
        for t in s.tenants.iter_mut().filter(|t| t.unique_id == req.tenant_unique_id) {
            t.currently_rented = true;
        }
        Ok(FlatUpdate::default())
    }

    async fn vacate_flat(&self, req: &VacateFlatRequest) -> ApiResult<FlatUpdate> {
        let mut s = self.record(format!(
            "vacate_flat:{}:{}",
            req.flat_unique_id, req.tenant_unique_id
        ));
        if !s.flat(&req.flat_unique_id)?.is_linked_to(&req.tenant_unique_id) {
            return Err(ApiError::server(409, "Flat is not rented to this tenant"));
        }
        let key = (
            req.flat_unique_id.clone(),
            req.tenant_unique_id.clone(),
            OtpPurpose::Vacate,
        );
        if s.issued.get(&key).map(String::as_str) != Some(req.otp_code.as_str()) {
            return Err(rejected());
        }
        s.void_challenges(&req.flat_unique_id);
        for f in s.flats.iter_mut().filter(|f| f.flat_unique_id == req.flat_unique_id) {
            f.is_rented = false;
            f.tenant = None;
            f.rented_to_unique_id = None;
        }
        for t in s.tenants.iter_mut().filter(|t| t.unique_id == req.tenant_unique_id) {
            t.currently_rented = false;
        }
        Ok(FlatUpdate::default())
    }

    async fn create_flat(&self, req: &NewFlat) -> ApiResult<FlatUpdate> {
        let mut s = self.record(format!("create_flat:{}", req.title));
        let id = format!("flat-{}", s.flats.len() + 1);
        let mut f = flat(&id, None);
        f.title = req.title.clone();
        s.flats.push(f.clone());
        Ok(FlatUpdate {
            message: None,
            flat: Some(f),
        })
    }

    async fn delete_flat(&self, flat_id: &str) -> ApiResult<Ack> {
        let mut s = self.record(format!("delete_flat:{flat_id}"));
        s.flats.retain(|f| f.flat_unique_id != flat_id);
        Ok(Ack::default())
    }
}
