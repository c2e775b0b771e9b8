use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use serde::Serialize;

use admin_console::auth::RequestHeaders;
use admin_console::authz::{
    permission_key, Action, DefaultPermissionEvaluator, InMemoryRoleRepository, PermissionEvaluator, Resource,
    RoleRepository, Subject,
};
use admin_console::jobs::{JobForm, JobsClient};
use admin_console::proxy::ProxyClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "admin console operator tool", long_about = None)]
struct Cli {
    /// Console origin; job calls go through its /api/proxy path
    #[arg(long, env = "ADMIN_CONSOLE_URL", default_value = "http://localhost:3001", global = true)]
    url: String,
    /// Bearer token forwarded to the backend API
    #[arg(long, env = "ADMIN_CONSOLE_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scheduler jobs
    #[command(subcommand)]
    Jobs(JobsCommand),
    /// Built-in role table
    #[command(subcommand)]
    Roles(RolesCommand),
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },
    Get { id: String },
    Create(CreateJobArgs),
    Delete { id: String },
    Pause { id: String },
    Resume { id: String },
    History {
        #[arg(long)]
        job_id: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },
}

#[derive(Args, Debug)]
struct CreateJobArgs {
    #[arg(long)]
    job_id: String,
    /// `module:function` reference
    #[arg(long)]
    function: String,
    /// cron, interval or date
    #[arg(long, default_value = "cron")]
    trigger: String,
    #[arg(long, default_value = "")]
    cron: String,
    #[arg(long, default_value = "")]
    weeks: String,
    #[arg(long, default_value = "")]
    days: String,
    #[arg(long, default_value = "")]
    hours: String,
    #[arg(long, default_value = "")]
    minutes: String,
    #[arg(long, default_value = "")]
    seconds: String,
    /// RFC 3339 timestamp
    #[arg(long, default_value = "")]
    run_date: String,
    #[arg(long, default_value = "")]
    start_date: String,
    #[arg(long, default_value = "")]
    end_date: String,
    /// JSON array
    #[arg(long, default_value = "[]")]
    args: String,
    /// JSON object
    #[arg(long, default_value = "{}")]
    kwargs: String,
    #[arg(long)]
    replace_existing: bool,
}

impl From<CreateJobArgs> for JobForm {
    fn from(args: CreateJobArgs) -> Self {
        JobForm {
            job_id: args.job_id,
            function: args.function,
            trigger_type: args.trigger,
            cron_expression: args.cron,
            weeks: args.weeks,
            days: args.days,
            hours: args.hours,
            minutes: args.minutes,
            seconds: args.seconds,
            run_date: args.run_date,
            start_date: args.start_date,
            end_date: args.end_date,
            args: args.args,
            kwargs: args.kwargs,
            replace_existing: args.replace_existing,
        }
    }
}

#[derive(Subcommand, Debug)]
enum RolesCommand {
    /// Print every role with its permissions
    List,
    /// Evaluate one permission for a role
    Check {
        #[arg(long)]
        role: String,
        #[arg(long)]
        resource: String,
        #[arg(long)]
        action: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Jobs(cmd) => {
            let mut headers = RequestHeaders::new();
            if let Some(token) = cli.token.as_deref() {
                headers = headers.with_bearer_token(token);
            }
            let client = JobsClient::new(ProxyClient::new(cli.url).with_headers(headers));
            run_jobs(&client, cmd).await?;
        }
        Commands::Roles(cmd) => run_roles(cmd).await?,
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_jobs(client: &JobsClient, cmd: JobsCommand) -> anyhow::Result<()> {
    match cmd {
        JobsCommand::List { page, page_size } => {
            let jobs = client.list_jobs(page, page_size).await?;
            println!("{:<24} {:<8} {:<26} {}", "ID", "PAUSED", "NEXT RUN", "TRIGGER");
            for job in &jobs.items {
                let next = job
                    .next_run_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<24} {:<8} {:<26} {}", job.id, job.paused, next, job.trigger);
            }
            println!("page {}/{} ({} jobs)", jobs.page, jobs.total_pages, jobs.total);
        }
        JobsCommand::Get { id } => print_json(&client.get_job(&id).await?)?,
        JobsCommand::Create(args) => {
            let form = JobForm::from(args);
            let req = match form.validate() {
                Ok(req) => req,
                Err(errors) => anyhow::bail!("invalid job: {errors}"),
            };
            print_json(&client.create_job(&req).await?)?;
        }
        JobsCommand::Delete { id } => {
            client.delete_job(&id).await?;
            println!("deleted {id}");
        }
        JobsCommand::Pause { id } => print_json(&client.pause_job(&id).await?)?,
        JobsCommand::Resume { id } => print_json(&client.resume_job(&id).await?)?,
        JobsCommand::History { job_id, page, page_size } => {
            let history = client.list_history(job_id.as_deref(), page, page_size).await?;
            println!("{:<8} {:<24} {:<10} {}", "RUN", "JOB", "STATUS", "STARTED");
            for run in &history.items {
                println!(
                    "{:<8} {:<24} {:<10} {}",
                    run.id,
                    run.job_id,
                    run.status,
                    run.started_at.to_rfc3339()
                );
            }
            println!("page {}/{} ({} runs)", history.page, history.total_pages, history.total);
        }
    }
    Ok(())
}

async fn run_roles(cmd: RolesCommand) -> anyhow::Result<()> {
    let roles = Arc::new(InMemoryRoleRepository::with_defaults());

    match cmd {
        RolesCommand::List => {
            for role in roles.list().await.context("failed to read role table")? {
                let keys: Vec<&str> = role.permissions.iter().map(|p| p.key.as_str()).collect();
                println!("{}: {}", role.name, keys.join(", "));
            }
        }
        RolesCommand::Check { role, resource, action } => {
            let evaluator = DefaultPermissionEvaluator::new(roles);
            let resource = Resource::from(resource.as_str());
            let action = Action::from(action.as_str());
            let subject = Subject::user("cli", role.as_str());
            let decision = evaluator.check(&subject, &resource, &action).await;
            let key = permission_key(&resource, &action);
            match decision.deny_reason() {
                None => println!("{role}: {key} allowed"),
                Some(reason) => println!("{role}: {key} denied ({})", reason.code()),
            }
        }
    }
    Ok(())
}
