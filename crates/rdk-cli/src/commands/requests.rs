//! `rdk requests ...`

use anyhow::Result;

use rdk_api::ServiceRequestsApi;
use rdk_schemas::{
    AccountType, Money, NewServiceRequest, Priority, ServiceCategory, ServiceRating,
    ServiceRequest, ServiceRequestUpdate, ServiceStatus,
};

use super::{or_dash, print_ack, print_json, Ctx};

fn print_request(r: &ServiceRequest) {
    println!(
        "request_id={} title={:?} status={:?} priority={} category={:?} flat={:?} rating={}",
        r.request_unique_id,
        r.title,
        r.status,
        or_dash(r.priority.as_deref()),
        or_dash(r.category.as_deref()),
        or_dash(r.flat_title.as_deref()),
        r.tenant_rating.map_or_else(|| "-".to_string(), |n| n.to_string()),
    );
}

fn print_requests(list: &[ServiceRequest]) {
    for r in list {
        print_request(r);
    }
    println!("requests={}", list.len());
}

pub struct NewRequestArgs {
    pub flat_id: String,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub priority: Priority,
}

pub async fn create(ctx: &Ctx, args: NewRequestArgs) -> Result<()> {
    let tenant = ctx.session.require_role(AccountType::Tenant)?;
    let req = NewServiceRequest {
        flat_unique_id: args.flat_id,
        tenant_unique_id: tenant.unique_id.clone(),
        title: args.title,
        description: args.description,
        category: args.category,
        priority: args.priority,
    };
    let ack = ctx.submit(|| ctx.api.create_service_request(&req)).await?;
    print_ack(&ack, "Service request submitted");
    Ok(())
}

pub async fn mine(ctx: &Ctx) -> Result<()> {
    let tenant = ctx.session.require_role(AccountType::Tenant)?;
    let list = ctx.api.tenant_service_requests(&tenant.unique_id).await?;
    print_requests(&list);
    Ok(())
}

pub async fn owner(ctx: &Ctx) -> Result<()> {
    let owner = ctx.session.require_role(AccountType::Owner)?;
    let list = ctx.api.owner_service_requests(&owner.unique_id).await?;
    print_requests(&list);
    Ok(())
}

pub struct UpdateArgs {
    pub request_id: String,
    pub status: ServiceStatus,
    pub notes: Option<String>,
    pub estimated_cost: Option<Money>,
    pub actual_cost: Option<Money>,
    pub contractor_name: Option<String>,
    pub contractor_contact: Option<String>,
}

pub async fn update(ctx: &Ctx, args: UpdateArgs) -> Result<()> {
    ctx.session.require_role(AccountType::Owner)?;
    let req = ServiceRequestUpdate {
        request_unique_id: args.request_id,
        status: args.status,
        owner_notes: args.notes,
        estimated_cost: args.estimated_cost,
        actual_cost: args.actual_cost,
        contractor_name: args.contractor_name,
        contractor_contact: args.contractor_contact,
    };
    let ack = ctx.submit(|| ctx.api.update_service_request(&req)).await?;
    print_ack(&ack, "Service request updated");
    Ok(())
}

pub async fn rate(
    ctx: &Ctx,
    request_id: String,
    rating: u8,
    notes: Option<String>,
) -> Result<()> {
    let tenant = ctx.session.require_role(AccountType::Tenant)?;
    let req = ServiceRating {
        request_unique_id: request_id,
        tenant_unique_id: Some(tenant.unique_id.clone()),
        rating,
        tenant_notes: notes,
    };
    let ack = ctx.submit(|| ctx.api.rate_service_request(&req)).await?;
    print_ack(&ack, "Thanks for the rating");
    Ok(())
}

pub async fn show(ctx: &Ctx, request_id: &str) -> Result<()> {
    ctx.session.require_user()?;
    let details = ctx.api.service_request_details(request_id).await?;
    print_json(&details)
}
