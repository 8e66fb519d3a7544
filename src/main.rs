use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use jobweaver::domain::entities::identity::{JobKey, TriggerKey};
use jobweaver::domain::entities::job::{JobDataMap, JobDetail, JobExecutionOutcome};
use jobweaver::domain::entities::trigger::{CronMisfireInstruction, CronTrigger, SimpleMisfireInstruction, SimpleTrigger, Trigger, TriggerCore};
use jobweaver::domain::entities::{Job, JobExecutionContext};
use jobweaver::infrastructure::{InMemoryJobStore, SystemClock};
use jobweaver::scheduler::{FnJobFactory, JobFactory, JobScheduler, SchedulerConfig};

#[derive(Parser, Debug)]
#[command(name = "jobweaver")]
#[command(author = "JobWeaver Team")]
#[command(version = "0.1.0")]
#[command(about = "Runs an in-memory JobWeaver scheduler instance", long_about = None)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Schedules a "print" demo job and runs until interrupted.
    Demo {
        /// Repeat interval in seconds for the default simple trigger; ignored
        /// if `--cron` is given.
        #[arg(long, default_value_t = 3)]
        interval_seconds: i64,

        /// Cron expression (6 or 7 fields) to drive the demo job instead of
        /// a fixed-rate simple trigger.
        #[arg(long)]
        cron: Option<String>,
    },
}

/// The one job class the bundled `FnJobFactory` registration knows how to
/// construct: logs its own fire time and returns.
struct PrintJob;

impl Job for PrintJob {
    fn execute(&mut self, ctx: &mut JobExecutionContext) -> anyhow::Result<JobExecutionOutcome> {
        tracing::info!(job = %ctx.job_key, fire_time = %ctx.fire_time, "demo job firing");
        Ok(JobExecutionOutcome::default())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("jobweaver=debug,info")
    } else {
        EnvFilter::new("jobweaver=info")
    };
    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Demo { interval_seconds, cron } => run_demo(interval_seconds, cron),
    }
}

fn run_demo(interval_seconds: i64, cron: Option<String>) -> Result<()> {
    let clock = Arc::new(SystemClock);
    let store = Arc::new(InMemoryJobStore::new(clock.clone()));
    let factory: Arc<dyn JobFactory> = Arc::new(FnJobFactory::new().register("jobweaver-demo.print", || Box::new(PrintJob) as Box<dyn Job>));
    let config = SchedulerConfig::from_env().instance_name("jobweaver-cli-demo");

    let scheduler = JobScheduler::new(store, factory, clock, config).context("failed to construct scheduler")?;

    let job = JobDetail::new(JobKey::new("demo-job"), "jobweaver-demo.print").durable(true);
    let mut data_map = JobDataMap::new();
    data_map.insert("source".to_string(), serde_json::json!("cli-demo"));

    let trigger = match cron {
        Some(expr) => {
            let cron_expression = expr.parse().context("invalid cron expression")?;
            let mut core = TriggerCore::new(TriggerKey::new("demo-trigger"), JobKey::new("demo-job"), chrono::Utc::now());
            core.data_map = data_map;
            Trigger::Cron(CronTrigger {
                core,
                cron_expression,
                time_zone: chrono_tz::UTC,
                misfire_instruction: CronMisfireInstruction::FireOnceNow,
            })
        }
        None => {
            let mut core = TriggerCore::new(TriggerKey::new("demo-trigger"), JobKey::new("demo-job"), chrono::Utc::now());
            core.data_map = data_map;
            Trigger::Simple(SimpleTrigger {
                core,
                repeat_count: -1,
                repeat_interval: chrono::Duration::seconds(interval_seconds),
                times_triggered: 0,
                misfire_instruction: SimpleMisfireInstruction::RescheduleNowWithRemainingRepeatCount,
            })
        }
    };

    let first_fire = scheduler.schedule_job(job, trigger).context("failed to schedule demo job")?;
    tracing::info!(%first_fire, "demo job scheduled");

    scheduler.start().context("failed to start scheduler")?;

    block_forever();
    scheduler.shutdown(true).context("failed to shut down scheduler")?;
    Ok(())
}

/// No signal-handling crate in this demo's dependency set, so Ctrl-C simply
/// kills the process like any other unhandled `SIGINT`. This just parks the
/// main thread so the scheduler's background threads keep firing.
fn block_forever() {
    loop {
        std::thread::sleep(Duration::from_secs(3600));
    }
}
