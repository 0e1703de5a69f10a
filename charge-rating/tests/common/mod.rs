use std::{
    fs::{read_dir, File},
    path::PathBuf,
};

use charge_rating::{
    context::{
        LatestTenantModel, MemoryTariffStore, PricingContextResolver, TariffModel, Tenant,
        Transaction,
    },
    pricer::{PricedDimension, StepMode},
    rater::{Rater, RatingConfig},
    telemetry::Telemetry,
};
use rust_decimal::Decimal;
use serde::Deserialize;

pub struct JsonTest {
    pub path: PathBuf,
    pub models: Vec<TariffModel>,
    pub transaction: Transaction,
    pub cases: Vec<(String, RatingCase)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCase {
    pub telemetry: Telemetry,
    #[serde(default)]
    pub step_mode: StepMode,
    pub expected: Expected,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expected {
    pub flat_fee: Option<ExpectedDimension>,
    pub energy: Option<ExpectedDimension>,
    pub charging_time: Option<ExpectedDimension>,
    pub parking_time: Option<ExpectedDimension>,
    pub total: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedDimension {
    pub amount: Decimal,
    pub item_description: String,
}

pub fn collect_json_tests() -> Result<Vec<JsonTest>, Box<dyn std::error::Error>> {
    let mut tests = Vec::new();

    for test_dir in read_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/resources"))? {
        let test_dir_path = test_dir?.path();

        if !test_dir_path.is_dir() {
            continue;
        }

        let mut models = None;
        let mut transaction = None;
        let mut cases = Vec::new();

        for json_file in read_dir(&test_dir_path)? {
            let file_path = json_file?.path();

            if file_path.extension().unwrap() != "json" {
                continue;
            }

            let file_stem = file_path.file_stem().unwrap();
            if file_stem == "models" {
                models = Some(serde_json::from_reader(File::open(file_path)?)?);
            } else if file_stem == "transaction" {
                transaction = Some(serde_json::from_reader(File::open(file_path)?)?);
            } else {
                cases.push((
                    file_stem.to_string_lossy().to_string(),
                    serde_json::from_reader(File::open(file_path)?)?,
                ));
            }
        }

        tests.push(JsonTest {
            models: models
                .unwrap_or_else(|| panic!("no models.json in test directory {test_dir_path:?}")),
            transaction: transaction.unwrap_or_else(|| {
                panic!("no transaction.json in test directory {test_dir_path:?}")
            }),
            cases,
            path: test_dir_path,
        });
    }

    Ok(tests)
}

pub fn resolver(
    models: Vec<TariffModel>,
) -> Result<PricingContextResolver<LatestTenantModel<MemoryTariffStore>>, charge_rating::Error> {
    let store = MemoryTariffStore::with_models(models)?;
    Ok(PricingContextResolver::new(LatestTenantModel::new(store)))
}

pub async fn validate_case(
    models: Vec<TariffModel>,
    transaction: &Transaction,
    case: RatingCase,
) -> Result<(), charge_rating::Error> {
    let tenant = Tenant::new(transaction.scope.tenant_id.clone());
    let model = resolver(models)?.resolve(&tenant, transaction).await?;

    let rater = Rater::new(RatingConfig {
        step_mode: case.step_mode,
    });
    let consumption = rater.rate(&model, &case.telemetry)?;
    let expected = case.expected;

    assert_dimension(consumption.flat_fee.as_ref(), expected.flat_fee, "flat_fee");
    assert_dimension(consumption.energy.as_ref(), expected.energy, "energy");
    assert_dimension(
        consumption.charging_time.as_ref(),
        expected.charging_time,
        "charging_time",
    );
    assert_dimension(
        consumption.parking_time.as_ref(),
        expected.parking_time,
        "parking_time",
    );

    assert_eq!(
        consumption.total_amount()?.map(Decimal::from),
        expected.total,
        "total"
    );

    Ok(())
}

fn assert_dimension<V>(
    priced: Option<&PricedDimension<V>>,
    expected: Option<ExpectedDimension>,
    name: &str,
) {
    match (priced, expected) {
        (None, None) => {}
        (Some(priced), Some(expected)) => {
            assert_eq!(Decimal::from(priced.amount), expected.amount, "{name} amount");
            assert_eq!(
                priced.item_description.as_deref(),
                Some(expected.item_description.as_str()),
                "{name} item description"
            );
        }
        (priced, expected) => panic!(
            "{name}: expected {}, got {}",
            if expected.is_some() { "a priced dimension" } else { "nothing" },
            if priced.is_some() { "a priced dimension" } else { "nothing" },
        ),
    }
}
