use std::{
    fmt::Display,
    fs::File,
    io::stdin,
    path::{Path, PathBuf},
    process::exit,
};

use charge_rating::{
    context::{
        LatestTenantModel, MemoryTariffStore, PricingContextResolver, TariffModel, Tenant,
        Transaction,
    },
    explain::{explain, Explain},
    lint::lint,
    pricer::{PricedDimension, StepMode},
    rater::{PricedConsumption, Rater, RatingConfig},
    tariff::DimensionKind,
    telemetry::Telemetry,
    types::{money::Money, time::DateTime},
};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use serde::de::DeserializeOwned;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

use crate::{error::Error, Result};

/// Amounts are unrounded, this is only for display.
const DISPLAY_DECIMALS: u32 = 4;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub async fn run(self) {
        if let Err(err) = self.command.run().await {
            eprintln!("{} {err}", style("error:").red().bold());
            exit(1);
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rate the telemetry of a charging session.
    ///
    /// Resolves the pricing context of the transaction against the provided tariff models and
    /// shows the amount owed per dimension.
    Rate(Rate),
    /// Show the tariff definitions of the provided tariff models in a readable form.
    Explain(ExplainArgs),
    /// Check the tariff definitions of the provided tariff models for errors and warnings.
    ///
    /// Exits with a non-zero status if any definition would be rejected by storage.
    Lint(Lint),
}

impl Command {
    async fn run(self) -> Result<()> {
        match self {
            Self::Rate(args) => args.run().await,
            Self::Explain(args) => args.run(),
            Self::Lint(args) => args.run(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ModelArgs {
    /// A path to a json array of tariff models.
    #[arg(short = 'm', long)]
    models: PathBuf,
}

impl ModelArgs {
    fn load(&self) -> Result<Vec<TariffModel>> {
        read_json(&self.models, "tariff models")
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<T> {
    debug!(path = %path.display(), kind, "reading json");

    let file = File::open(path).map_err(|e| Error::file(path.to_path_buf(), e))?;
    serde_json::from_reader(&file).map_err(|e| Error::deserialize(path.display(), kind, e))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StepModeArg {
    /// Bill the usage left after the last full step.
    Remainder,
    /// Bill usage rounded up to whole steps.
    RoundUp,
}

impl From<StepModeArg> for StepMode {
    fn from(arg: StepModeArg) -> Self {
        match arg {
            StepModeArg::Remainder => Self::Remainder,
            StepModeArg::RoundUp => Self::RoundUp,
        }
    }
}

#[derive(Debug, Parser)]
pub struct Rate {
    #[command(flatten)]
    models: ModelArgs,
    /// A path to the transaction in json format.
    #[arg(short = 't', long)]
    transaction: PathBuf,
    /// A path to the telemetry snapshot in json format.
    ///
    /// If no path is provided the telemetry is read from standard in.
    #[arg(short = 'e', long)]
    telemetry: Option<PathBuf>,
    /// How step sizes turn usage into billed usage.
    #[arg(
        short = 's',
        long,
        value_enum,
        env = "CHARGE_RATING_STEP_MODE",
        default_value_t = StepModeArg::Remainder
    )]
    step_mode: StepModeArg,
    /// Print the priced consumption as json instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Tabled)]
struct RateRow {
    dimension: String,
    tariff: String,
    quantity: String,
    billed: String,
    amount: String,
}

impl RateRow {
    fn new<V: Display>(kind: DimensionKind, priced: &PricedDimension<V>) -> Self {
        Self {
            dimension: kind.to_string(),
            tariff: priced.item_description.clone().unwrap_or_default(),
            quantity: priced.quantity.to_string(),
            billed: priced.billed_quantity.to_string(),
            amount: priced.amount.rounded(DISPLAY_DECIMALS).to_string(),
        }
    }

    fn total(total: Money) -> Self {
        Self {
            dimension: style("Total").bold().to_string(),
            tariff: String::new(),
            quantity: String::new(),
            billed: String::new(),
            amount: style(total.rounded(DISPLAY_DECIMALS)).bold().to_string(),
        }
    }
}

impl Rate {
    fn load_telemetry(&self) -> Result<Telemetry> {
        if let Some(path) = &self.telemetry {
            read_json(path, "telemetry")
        } else {
            let mut stdin = stdin().lock();
            serde_json::from_reader(&mut stdin)
                .map_err(|e| Error::deserialize("<stdin>", "telemetry", e))
        }
    }

    async fn run(self) -> Result<()> {
        let models = self.models.load()?;
        let transaction: Transaction = read_json(&self.transaction, "transaction")?;
        let telemetry = self.load_telemetry()?;

        let store = MemoryTariffStore::with_models(models)?;
        let resolver = PricingContextResolver::new(LatestTenantModel::new(store));
        let tenant = Tenant::new(transaction.scope.tenant_id.clone());
        let model = resolver.resolve(&tenant, &transaction).await?;

        let rater = Rater::new(RatingConfig {
            step_mode: self.step_mode.into(),
        });
        let consumption = rater.rate(&model, &telemetry)?;

        if self.json {
            let json = serde_json::to_string_pretty(&consumption).map_err(|error| {
                Error::Serialize {
                    kind: "priced consumption",
                    error,
                }
            })?;
            println!("{json}");
            return Ok(());
        }

        println!(
            "{} transaction `{}` with {} of {} tariff definitions ({} steps)",
            style("Rating").green(),
            transaction.id,
            model.definitions().len(),
            style(&tenant.id).cyan(),
            rater.config().step_mode,
        );

        print_consumption(&consumption)
    }
}

fn print_consumption(consumption: &PricedConsumption) -> Result<()> {
    let Some(total) = consumption.total_amount()? else {
        println!(
            "{}",
            style("No dimension was priced, check the tariff model of this tenant.").yellow()
        );
        return Ok(());
    };

    let mut rows = Vec::new();

    if let Some(priced) = &consumption.flat_fee {
        rows.push(RateRow::new(DimensionKind::FlatFee, priced));
    }

    if let Some(priced) = &consumption.energy {
        rows.push(RateRow::new(DimensionKind::Energy, priced));
    }

    if let Some(priced) = &consumption.charging_time {
        rows.push(RateRow::new(DimensionKind::ChargingTime, priced));
    }

    if let Some(priced) = &consumption.parking_time {
        rows.push(RateRow::new(DimensionKind::ParkingTime, priced));
    }

    rows.push(RateRow::total(total));

    println!("{}", Table::new(rows).with(Style::modern()));

    Ok(())
}

#[derive(Debug, Parser)]
pub struct ExplainArgs {
    #[command(flatten)]
    models: ModelArgs,
    /// Timezone to show validity windows in.
    #[arg(short = 'z', long, default_value = "Europe/Amsterdam")]
    timezone: Tz,
}

#[derive(Debug, Tabled)]
struct ExplainRow {
    dimension: String,
    price: String,
    step: String,
    active: String,
}

impl ExplainArgs {
    fn run(self) -> Result<()> {
        for model in self.models.load()? {
            println!(
                "{} `{}` of tenant `{}`, created {}",
                style("Tariff model").green(),
                model.id,
                model.tenant_id,
                self.local(model.created_on),
            );

            for definition in &model.definitions {
                self.print(&explain(definition));
            }
        }

        Ok(())
    }

    fn local(&self, instant: DateTime) -> String {
        instant
            .with_timezone(&self.timezone)
            .format("%Y-%m-%d %H:%M %Z")
            .to_string()
    }

    fn print(&self, explain: &Explain) {
        println!();
        println!("{}", style(&explain.name).bold());

        if let Some(description) = &explain.description {
            println!("  {description}");
        }

        match (explain.valid_from, explain.valid_to) {
            (Some(from), Some(to)) => {
                println!("  valid from {} until {}", self.local(from), self.local(to));
            }
            (Some(from), None) => println!("  valid from {}", self.local(from)),
            (None, Some(to)) => println!("  valid until {}", self.local(to)),
            (None, None) => {}
        }

        if let Some(connector_type) = explain.connector_type {
            println!("  only on {connector_type:?} connectors");
        }

        if let Some(connector_power) = explain.connector_power {
            println!("  only on {connector_power} kW connectors");
        }

        for restriction in &explain.restrictions {
            println!("  applies when {restriction}");
        }

        let rows = explain.dimensions.iter().map(|dimension| ExplainRow {
            dimension: dimension.kind.to_string(),
            price: format!("{} per {}", dimension.price, dimension.kind.unit()),
            step: dimension
                .step_size
                .map(|step_size| step_size.to_string())
                .unwrap_or_default(),
            active: if dimension.active {
                String::from("yes")
            } else {
                style("no").dim().to_string()
            },
        });

        println!("{}", Table::new(rows).with(Style::modern()));
    }
}

#[derive(Debug, Parser)]
pub struct Lint {
    #[command(flatten)]
    models: ModelArgs,
}

impl Lint {
    fn run(self) -> Result<()> {
        let mut errors = 0;

        for model in self.models.load()? {
            for definition in &model.definitions {
                for warning in lint(definition) {
                    let level = if warning.is_error() {
                        errors += 1;
                        style("error").red().bold()
                    } else {
                        style("warning").yellow().bold()
                    };

                    println!(
                        "{level}: `{}` in model `{}`: {warning}",
                        definition.name, model.id
                    );
                }
            }
        }

        if errors > 0 {
            return Err(Error::Lint { errors });
        }

        println!("{}", style("No errors found").green());

        Ok(())
    }
}
