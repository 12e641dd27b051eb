use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use leadsite::{
    config::AppConfig,
    db,
    models::{User, UserListing, UserPatch},
    repositories::PgUserRepository,
    services::{LeadService, LeadServiceError, ListQuery},
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "leadsite-cli")]
#[command(about = "Read and manage registered leads", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List all leads, newest first
    List {
        /// Maximum number of leads to display
        #[arg(short, long)]
        limit: Option<u32>,

        /// Offset for pagination
        #[arg(short = 'o', long)]
        offset: Option<u32>,
    },

    /// Leads registered in the last N days
    Recent {
        #[arg(short, long, default_value_t = 30)]
        days: i64,
    },

    /// Search first name, last name, email and company
    Search { term: String },

    /// Leads from one company (exact match)
    Company { name: String },

    /// Show one lead by id or email
    Show {
        #[arg(long, conflicts_with = "email", required_unless_present = "email")]
        id: Option<i64>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Print the number of leads
    Count,

    /// Delete a lead
    Delete {
        #[arg(long)]
        id: i64,
    },

    /// Change fields of a lead; omitted fields are left as they are
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    if cli.format == OutputFormat::Table {
        println!("Connecting to {}", config.database.masked_url());
    }

    let pool = db::create_pool(&config.database)?;
    db::ensure_schema(&pool)
        .await
        .context("could not reach the database or create the schema")?;

    let repository = Arc::new(PgUserRepository::new(pool.clone()));
    let service = LeadService::new(repository);

    let result = run(&service, cli.command, cli.format).await;
    db::close_pool(&pool).await;

    if let Err(err) = result {
        eprintln!("❌ {}", err);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    service: &LeadService,
    command: Commands,
    format: OutputFormat,
) -> Result<(), LeadServiceError> {
    match command {
        Commands::List { limit, offset } => {
            let page = service
                .list(ListQuery {
                    limit,
                    offset,
                    ..Default::default()
                })
                .await?;
            if format == OutputFormat::Table {
                println!("Total leads in database: {}", page.total);
            }
            print_users(&page.users, format);
        }
        Commands::Recent { days } => {
            let (days, users) = service.recent(Some(days)).await?;
            if format == OutputFormat::Table {
                println!("Leads from the last {} days:", days);
            }
            print_users(&users, format);
        }
        Commands::Search { term } => {
            let users = service.search(&term).await?;
            if format == OutputFormat::Table {
                println!("Search results for \"{}\":", term.trim());
            }
            print_users(&users, format);
        }
        Commands::Company { name } => {
            let page = service
                .list(ListQuery {
                    company: Some(name.clone()),
                    ..Default::default()
                })
                .await?;
            if format == OutputFormat::Table {
                println!("Leads from company \"{}\":", name);
            }
            print_users(&page.users, format);
        }
        Commands::Show { id, email } => {
            let user = match (id, email) {
                (Some(id), _) => service.find_user_by_id(id).await?,
                (None, Some(email)) => service.find_user_by_email(&email).await?,
                (None, None) => None,
            };
            let user = user.ok_or(LeadServiceError::UserNotFound)?;
            print_users(std::slice::from_ref(&user), format);
        }
        Commands::Count => {
            let count = service.count().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "total": count })),
                OutputFormat::Table => println!("Total leads in database: {}", count),
            }
        }
        Commands::Delete { id } => {
            service.delete(id).await?;
            println!("✅ Lead {} deleted", id);
        }
        Commands::Update {
            id,
            first_name,
            last_name,
            email,
            company,
            phone,
            message,
        } => {
            let patch = UserPatch {
                first_name,
                last_name,
                email,
                company,
                phone,
                message,
            };
            let user = service.update(id, patch).await?;
            match format {
                OutputFormat::Json => print_users(std::slice::from_ref(&user), format),
                OutputFormat::Table => {
                    println!("✅ Lead {} updated", user.id);
                    print_users(std::slice::from_ref(&user), format);
                }
            }
        }
    }

    Ok(())
}

fn print_users(users: &[User], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let listings: Vec<UserListing> = users.iter().map(UserListing::from).collect();
            match serde_json::to_string_pretty(&listings) {
                Ok(json) => println!("{}", json),
                Err(err) => eprintln!("❌ Failed to encode leads: {}", err),
            }
        }
        OutputFormat::Table => {
            if users.is_empty() {
                println!("\nNo leads found.\n");
                return;
            }

            let rule = "-".repeat(80);
            println!("\nFound {} lead(s):", users.len());
            println!("{}", "=".repeat(80));
            for (index, user) in users.iter().enumerate() {
                println!("[Lead #{}]", index + 1);
                println!("  ID:       {}", user.id);
                println!("  Name:     {} {}", user.first_name, user.last_name);
                println!("  Email:    {}", user.email);
                println!("  Company:  {}", user.company);
                println!("  Phone:    {}", user.phone);
                if user.message.is_empty() {
                    println!("  Message:  (empty)");
                } else {
                    println!("  Message:  {}", user.message);
                }
                println!("  Created:  {}", user.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("  Updated:  {}", user.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("{}", rule);
            }
        }
    }
}
