//! Rent payments, expenses and the owner's financial summary.

use anyhow::Result;
use chrono::NaiveDate;

use rdk_api::FinancialsApi;
use rdk_schemas::{
    AccountType, Expense, ExpenseHistoryFilter, ExpenseType, Money, NewExpense, OwnerRecordRent,
    PaymentHistoryFilter, PaymentMethod, RecordRentPayment, RentPayment, ServiceExpenseUpdate,
    SummaryPeriod,
};

use super::{or_dash, print_ack, print_json, Ctx};

fn print_payments(list: &[RentPayment]) {
    for p in list {
        println!(
            "payment_id={} amount={} status={:?} method={:?} date={} flat={:?} verified={}",
            p.payment_unique_id,
            p.amount,
            or_dash(p.payment_status.as_deref()),
            or_dash(p.payment_method.as_deref()),
            or_dash(p.payment_date.as_deref()),
            or_dash(p.flat.as_ref().map(|f| f.title.as_str())),
            p.is_verified(),
        );
    }
    println!("payments={}", list.len());
}

fn print_expenses(list: &[Expense]) {
    for e in list {
        println!(
            "expense_id={} type={:?} amount={} date={} vendor={:?}",
            e.expense_unique_id,
            e.expense_type,
            e.amount,
            or_dash(e.expense_date.as_deref()),
            or_dash(e.vendor_name.as_deref()),
        );
    }
    println!("expenses={}", list.len());
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

pub async fn my_payments(ctx: &Ctx) -> Result<()> {
    ctx.session.require_role(AccountType::Tenant)?;
    let list = ctx.api.my_rent_payments().await?;
    print_payments(&list);
    Ok(())
}

pub struct PayArgs {
    pub flat_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub due_date: Option<NaiveDate>,
    pub late_fee: Option<Money>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

pub async fn pay(ctx: &Ctx, args: PayArgs) -> Result<()> {
    let tenant = ctx.session.require_role(AccountType::Tenant)?;
    let req = RecordRentPayment {
        flat_unique_id: args.flat_id,
        amount: args.amount,
        payment_method: args.method,
        tenant_unique_id: Some(tenant.unique_id.clone()),
        due_date: args.due_date,
        late_fee: args.late_fee,
        transaction_id: args.transaction_id,
        notes: args.notes,
    };
    let ack = ctx.submit(|| ctx.api.record_rent_payment(&req)).await?;
    print_ack(&ack, "Payment recorded");
    Ok(())
}

pub async fn record(ctx: &Ctx, flat_id: String, amount: Money, method: PaymentMethod) -> Result<()> {
    ctx.session.require_role(AccountType::Owner)?;
    let req = OwnerRecordRent {
        flat_unique_id: flat_id,
        amount,
        payment_method: method,
    };
    let ack = ctx.submit(|| ctx.api.owner_record_rent(&req)).await?;
    print_ack(&ack, "Rent recorded");
    Ok(())
}

pub async fn verify(ctx: &Ctx, payment_id: &str) -> Result<()> {
    ctx.session.require_role(AccountType::Owner)?;
    let ack = ctx.submit(|| ctx.api.verify_rent_payment(payment_id)).await?;
    print_ack(&ack, "Payment verified");
    Ok(())
}

pub async fn payment_history(
    ctx: &Ctx,
    flat_id: Option<String>,
    tenant_id: Option<String>,
) -> Result<()> {
    let owner = ctx.session.require_role(AccountType::Owner)?;
    let filter = PaymentHistoryFilter {
        flat_unique_id: flat_id,
        tenant_unique_id: tenant_id,
        owner_unique_id: Some(owner.unique_id.clone()),
    };
    let list = ctx.api.rent_payment_history(&filter).await?;
    print_payments(&list);
    Ok(())
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

pub struct NewExpenseArgs {
    pub flat_id: String,
    pub expense_type: ExpenseType,
    pub amount: Money,
    pub description: String,
    pub vendor_name: Option<String>,
    pub vendor_contact: Option<String>,
    pub tax_deductible: bool,
    pub notes: Option<String>,
}

pub async fn create_expense(ctx: &Ctx, args: NewExpenseArgs) -> Result<()> {
    let owner = ctx.session.require_role(AccountType::Owner)?;
    let req = NewExpense {
        owner_unique_id: owner.unique_id.clone(),
        flat_unique_id: args.flat_id,
        expense_type: args.expense_type,
        amount: args.amount,
        description: args.description,
        vendor_name: args.vendor_name,
        vendor_contact: args.vendor_contact,
        is_tax_deductible: args.tax_deductible,
        notes: args.notes,
    };
    let ack = ctx.submit(|| ctx.api.create_manual_expense(&req)).await?;
    print_ack(&ack, "Expense recorded");
    Ok(())
}

pub async fn expense_history(
    ctx: &Ctx,
    flat_id: Option<String>,
    expense_type: Option<ExpenseType>,
) -> Result<()> {
    let owner = ctx.session.require_role(AccountType::Owner)?;
    let filter = ExpenseHistoryFilter {
        owner_unique_id: Some(owner.unique_id.clone()),
        flat_unique_id: flat_id,
        expense_type,
    };
    let list = ctx.api.expense_history(&filter).await?;
    print_expenses(&list);
    Ok(())
}

pub async fn update_expense(
    ctx: &Ctx,
    expense_id: String,
    amount: Money,
    description: Option<String>,
    vendor_name: Option<String>,
) -> Result<()> {
    ctx.session.require_role(AccountType::Owner)?;
    let req = ServiceExpenseUpdate {
        expense_unique_id: expense_id,
        amount,
        description,
        vendor_name,
    };
    let ack = ctx.submit(|| ctx.api.update_service_expense(&req)).await?;
    print_ack(&ack, "Expense updated");
    Ok(())
}

pub async fn summary(ctx: &Ctx, period: SummaryPeriod) -> Result<()> {
    let owner = ctx.session.require_role(AccountType::Owner)?;
    let summary = ctx.api.financial_summary(&owner.unique_id, period).await?;
    print_json(&summary)
}
