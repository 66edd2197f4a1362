use anyhow::Context;
use args::{Args, Command};
use clap::Parser;
use config::Config;
use identity::CommandLineIdentity;
use provisioner::{KeyManager, KeyOptions, ProvisionError, Sample, SampleKind};

mod args;
mod identity;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args.log)?;

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    let litellm = config.litellm;

    match args.command {
        Command::Samples { sample } => {
            let samples = provisioner::render_all(None, litellm.base_url.as_str(), &litellm.sample_model);
            print_samples(&samples, sample);
        }
        Command::Generate {
            alias,
            budget,
            models,
            tags,
            sample,
        } => {
            let manager = initialize(litellm, args.email).await?;

            let options = KeyOptions {
                alias,
                budget_id: budget,
                models,
                tags,
            };

            let key = manager.generate_key(options).await.map_err(operator_error)?;

            println!("Key '{}' generated. Save it now, it will not be shown again.", key.alias());
            println!();
            println!("{}", key.expose());
            println!();

            print_samples(&manager.samples(Some(&key)), sample);
        }
        Command::Budgets => {
            let manager = initialize(litellm, args.email).await?;

            if manager.available_budgets().is_empty() {
                println!("No budgets available.");
            }

            for budget in manager.available_budgets() {
                let max_budget = budget
                    .max_budget
                    .map(|max_budget| max_budget.to_string())
                    .unwrap_or_else(|| "unlimited".to_string());

                match &budget.budget_duration {
                    Some(duration) => println!("{}\tmax {max_budget}\tresets every {duration}", budget.budget_id),
                    None => println!("{}\tmax {max_budget}", budget.budget_id),
                }
            }
        }
        Command::Status => {
            let manager = initialize(litellm, args.email).await?;
            let config = manager.config();

            println!("gateway:   {}", manager.base_url());
            println!("strategy:  {:?}", manager.session().strategy());

            match manager.identity() {
                Some(identity) => println!("identity:  {identity} ({:?})", identity.source()),
                None => println!("identity:  none"),
            }

            println!("team:      {}", config.team_id.as_deref().unwrap_or("none"));
            println!("budget:    {}", config.budget_id.as_deref().unwrap_or("none"));

            for notice in manager.notices() {
                println!("notice:    {notice}");
            }
        }
    }

    Ok(())
}

async fn initialize(config: config::LitellmConfig, email: Option<String>) -> anyhow::Result<KeyManager> {
    KeyManager::initialize(config, &CommandLineIdentity::new(email))
        .await
        .map_err(operator_error)
}

fn operator_error(err: ProvisionError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

fn print_samples(samples: &[Sample], only: Option<SampleKind>) {
    for sample in samples.iter().filter(|sample| only.is_none_or(|kind| kind == sample.kind)) {
        println!("# {}", sample.kind.label());
        println!("{}", sample.code);
        println!();
    }
}
