mod commands;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use commands::{account, admin, finance, flats, requests, Ctx};
use rdk_api::PredictorApi;
use rdk_schemas::{
    AccountType, ExpenseType, Money, PaymentMethod, Priority, ServiceCategory, ServiceStatus,
    SignupRequest, SummaryPeriod, UserFilter,
};

#[derive(Parser)]
#[command(name = "rdk")]
#[command(about = "RentDesk rental management CLI", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> env -> local)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Defaults to the configured email env var
        #[arg(long)]
        email: Option<String>,

        /// Read the password from the first stdin line instead of the env
        #[arg(long, default_value_t = false)]
        password_stdin: bool,
    },

    /// Forget the stored session
    Logout,

    /// Print the logged-in user
    Whoami,

    /// Create an account; verification is pending until `verify-otp`
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        /// Owner | Tenant
        #[arg(long = "type")]
        account_type: AccountType,

        #[arg(long)]
        contact_no: Option<String>,

        #[arg(long, default_value_t = false)]
        password_stdin: bool,
    },

    /// Verify an account with the e-mailed code
    VerifyOtp {
        /// Defaults to the e-mail awaiting verification
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        code: String,
    },

    /// Send a new account verification code
    ResendOtp {
        #[arg(long)]
        email: Option<String>,
    },

    /// Profile of the logged-in user
    Profile {
        #[command(subcommand)]
        cmd: ProfileCmd,
    },

    Flats {
        #[command(subcommand)]
        cmd: FlatsCmd,
    },

    Tenants {
        #[command(subcommand)]
        cmd: TenantsCmd,
    },

    /// Maintenance requests
    Requests {
        #[command(subcommand)]
        cmd: RequestsCmd,
    },

    /// Rent payments
    Payments {
        #[command(subcommand)]
        cmd: PaymentsCmd,
    },

    Expenses {
        #[command(subcommand)]
        cmd: ExpensesCmd,
    },

    /// Owner financial summary, optionally for one year or month
    Summary {
        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        month: Option<u32>,
    },

    Admin {
        #[command(subcommand)]
        cmd: AdminCmd,
    },

    /// Ask the prediction service for a rent estimate
    PredictRent {
        /// Feature object as inline JSON
        #[arg(long, conflicts_with = "json_file")]
        json: Option<String>,

        /// Path to a feature JSON file
        #[arg(long = "json-file", conflicts_with = "json")]
        json_file: Option<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash,
}

#[derive(Subcommand)]
enum ProfileCmd {
    Show,

    Update {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        contact_no: Option<String>,
    },

    /// Change password; reads the current and new password from stdin
    Password,
}

#[derive(Subcommand)]
enum FlatsCmd {
    /// Owners see their own flats; everyone else the public listing
    List {
        /// Public listing even when logged in as an owner
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        address: String,

        /// Monthly rent, e.g. 15000 or 15000.50
        #[arg(long)]
        rent: Money,
    },

    Delete {
        #[arg(long = "flat")]
        flat_id: String,
    },

    /// Assign a tenant to a vacant flat (OTP confirmed by the tenant)
    Assign {
        #[arg(long = "flat")]
        flat_id: String,

        #[arg(long = "tenant")]
        tenant_id: String,
    },

    /// Vacate a rented flat (OTP confirmed by the occupant)
    Vacate {
        #[arg(long = "flat")]
        flat_id: String,
    },
}

#[derive(Subcommand)]
enum TenantsCmd {
    /// Tenants not currently renting
    Available,
    All,
}

#[derive(Subcommand)]
enum RequestsCmd {
    Create {
        #[arg(long = "flat")]
        flat_id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Plumbing | Electrical | HVAC | Appliances | General Maintenance | Emergency
        #[arg(long)]
        category: ServiceCategory,

        #[arg(long, default_value = "Medium")]
        priority: Priority,
    },

    /// Requests raised by the logged-in tenant
    Mine,

    /// Requests on the logged-in owner's flats
    Owner,

    Update {
        #[arg(long = "id")]
        request_id: String,

        /// Open | In Progress | Completed | Cancelled
        #[arg(long)]
        status: ServiceStatus,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        estimated_cost: Option<Money>,

        #[arg(long)]
        actual_cost: Option<Money>,

        #[arg(long)]
        contractor_name: Option<String>,

        #[arg(long)]
        contractor_contact: Option<String>,
    },

    /// Rate a completed request (1-5)
    Rate {
        #[arg(long = "id")]
        request_id: String,

        #[arg(long)]
        rating: u8,

        #[arg(long)]
        notes: Option<String>,
    },

    Show {
        #[arg(long = "id")]
        request_id: String,
    },
}

#[derive(Subcommand)]
enum PaymentsCmd {
    /// Payments made by the logged-in tenant
    Mine,

    /// Record a rent payment as the tenant
    Pay {
        #[arg(long = "flat")]
        flat_id: String,

        #[arg(long)]
        amount: Money,

        #[arg(long, default_value = "Other")]
        method: PaymentMethod,

        /// YYYY-MM-DD
        #[arg(long)]
        due_date: Option<NaiveDate>,

        #[arg(long)]
        late_fee: Option<Money>,

        #[arg(long)]
        transaction_id: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Record rent received as the owner
    Record {
        #[arg(long = "flat")]
        flat_id: String,

        #[arg(long)]
        amount: Money,

        #[arg(long, default_value = "Other")]
        method: PaymentMethod,
    },

    Verify {
        #[arg(long = "id")]
        payment_id: String,
    },

    History {
        #[arg(long = "flat")]
        flat_id: Option<String>,

        #[arg(long = "tenant")]
        tenant_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum ExpensesCmd {
    Create {
        #[arg(long = "flat")]
        flat_id: String,

        #[arg(long = "type")]
        expense_type: ExpenseType,

        #[arg(long)]
        amount: Money,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        vendor_name: Option<String>,

        #[arg(long)]
        vendor_contact: Option<String>,

        #[arg(long, default_value_t = false)]
        tax_deductible: bool,

        #[arg(long)]
        notes: Option<String>,
    },

    History {
        #[arg(long = "flat")]
        flat_id: Option<String>,

        #[arg(long = "type")]
        expense_type: Option<ExpenseType>,
    },

    /// Correct the expense linked to a service request
    Update {
        #[arg(long = "id")]
        expense_id: String,

        #[arg(long)]
        amount: Money,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        vendor_name: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminCmd {
    Stats,

    Users {
        #[arg(long = "type")]
        account_type: Option<AccountType>,

        #[arg(long)]
        rented: Option<bool>,
    },

    User {
        #[arg(long = "id")]
        user_id: String,
    },

    /// Remove orphaned records server-side
    Cleanup,

    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },

    DeleteUser {
        #[arg(long = "id")]
        user_id: String,

        /// Acknowledge the deletion cannot be undone.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Dev convenience; silent when the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        // Needs no session or backend.
        Commands::ConfigHash => config_hash(&cli.config_paths),
        cmd => dispatch(&cli.config_paths, cmd).await,
    }
}

fn config_hash(paths: &[String]) -> Result<()> {
    let loaded = commands::load_config(paths)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

async fn dispatch(config_paths: &[String], cmd: Commands) -> Result<()> {
    let mut ctx = Ctx::open(config_paths)?;

    match cmd {
        Commands::Login {
            email,
            password_stdin,
        } => account::login(&mut ctx, email, password_stdin).await?,
        Commands::Logout => account::logout(&mut ctx)?,
        Commands::Whoami => account::whoami(&ctx)?,
        Commands::Signup {
            email,
            username,
            account_type,
            contact_no,
            password_stdin,
        } => {
            let req = SignupRequest {
                email,
                username,
                password: String::new(),
                account_type,
                contact_no,
            };
            account::signup(&mut ctx, req, password_stdin).await?
        }
        Commands::VerifyOtp { email, code } => account::verify_otp(&mut ctx, email, &code).await?,
        Commands::ResendOtp { email } => account::resend_otp(&ctx, email).await?,

        Commands::Profile { cmd } => match cmd {
            ProfileCmd::Show => account::show_profile(&ctx).await?,
            ProfileCmd::Update {
                username,
                contact_no,
            } => account::update_profile(&mut ctx, username, contact_no).await?,
            ProfileCmd::Password => account::change_password(&ctx).await?,
        },

        Commands::Flats { cmd } => match cmd {
            FlatsCmd::List { all } => flats::list(&ctx, all).await?,
            FlatsCmd::Create {
                title,
                address,
                rent,
            } => flats::create(&ctx, title, address, rent).await?,
            FlatsCmd::Delete { flat_id } => flats::delete(&ctx, &flat_id).await?,
            FlatsCmd::Assign { flat_id, tenant_id } => {
                flats::assign(&ctx, &flat_id, &tenant_id).await?
            }
            FlatsCmd::Vacate { flat_id } => flats::vacate(&ctx, &flat_id).await?,
        },

        Commands::Tenants { cmd } => match cmd {
            TenantsCmd::Available => flats::available_tenants(&ctx).await?,
            TenantsCmd::All => flats::all_tenants(&ctx).await?,
        },

        Commands::Requests { cmd } => match cmd {
            RequestsCmd::Create {
                flat_id,
                title,
                description,
                category,
                priority,
            } => {
                let args = requests::NewRequestArgs {
                    flat_id,
                    title,
                    description,
                    category,
                    priority,
                };
                requests::create(&ctx, args).await?
            }
            RequestsCmd::Mine => requests::mine(&ctx).await?,
            RequestsCmd::Owner => requests::owner(&ctx).await?,
            RequestsCmd::Update {
                request_id,
                status,
                notes,
                estimated_cost,
                actual_cost,
                contractor_name,
                contractor_contact,
            } => {
                let args = requests::UpdateArgs {
                    request_id,
                    status,
                    notes,
                    estimated_cost,
                    actual_cost,
                    contractor_name,
                    contractor_contact,
                };
                requests::update(&ctx, args).await?
            }
            RequestsCmd::Rate {
                request_id,
                rating,
                notes,
            } => requests::rate(&ctx, request_id, rating, notes).await?,
            RequestsCmd::Show { request_id } => requests::show(&ctx, &request_id).await?,
        },

        Commands::Payments { cmd } => match cmd {
            PaymentsCmd::Mine => finance::my_payments(&ctx).await?,
            PaymentsCmd::Pay {
                flat_id,
                amount,
                method,
                due_date,
                late_fee,
                transaction_id,
                notes,
            } => {
                let args = finance::PayArgs {
                    flat_id,
                    amount,
                    method,
                    due_date,
                    late_fee,
                    transaction_id,
                    notes,
                };
                finance::pay(&ctx, args).await?
            }
            PaymentsCmd::Record {
                flat_id,
                amount,
                method,
            } => finance::record(&ctx, flat_id, amount, method).await?,
            PaymentsCmd::Verify { payment_id } => finance::verify(&ctx, &payment_id).await?,
            PaymentsCmd::History { flat_id, tenant_id } => {
                finance::payment_history(&ctx, flat_id, tenant_id).await?
            }
        },

        Commands::Expenses { cmd } => match cmd {
            ExpensesCmd::Create {
                flat_id,
                expense_type,
                amount,
                description,
                vendor_name,
                vendor_contact,
                tax_deductible,
                notes,
            } => {
                let args = finance::NewExpenseArgs {
                    flat_id,
                    expense_type,
                    amount,
                    description,
                    vendor_name,
                    vendor_contact,
                    tax_deductible,
                    notes,
                };
                finance::create_expense(&ctx, args).await?
            }
            ExpensesCmd::History {
                flat_id,
                expense_type,
            } => finance::expense_history(&ctx, flat_id, expense_type).await?,
            ExpensesCmd::Update {
                expense_id,
                amount,
                description,
                vendor_name,
            } => finance::update_expense(&ctx, expense_id, amount, description, vendor_name).await?,
        },

        Commands::Summary { year, month } => {
            finance::summary(&ctx, SummaryPeriod { year, month }).await?
        }

        Commands::Admin { cmd } => match cmd {
            AdminCmd::Stats => admin::stats(&ctx).await?,
            AdminCmd::Users {
                account_type,
                rented,
            } => {
                let filter = UserFilter {
                    account_type,
                    currently_rented: rented,
                };
                admin::users(&ctx, filter).await?
            }
            AdminCmd::User { user_id } => admin::user(&ctx, &user_id).await?,
            AdminCmd::Cleanup => admin::cleanup(&ctx).await?,
            AdminCmd::Export { out } => admin::export(&ctx, out).await?,
            AdminCmd::DeleteUser { user_id, yes } => {
                admin::delete_user(&ctx, &user_id, yes).await?
            }
        },

        Commands::PredictRent { json, json_file } => {
            let features = commands::load_json_arg(json, json_file)?;
            let estimate = ctx.api.predict_rent(&features).await?;
            commands::print_json(&estimate)?;
        }

        Commands::ConfigHash => config_hash(config_paths)?,
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
