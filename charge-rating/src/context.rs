use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    lint,
    restriction::{passes_static_restrictions, SessionStart},
    tariff::{ConnectorType, ResolvedTariffModel, ScopeLevel, TariffDefinition},
    types::{electricity::Kw, time::DateTime},
    Error, Result,
};

/// The tenant a resolution is performed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Tenant {
    pub id: String,
}

impl Tenant {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Where in the pricing hierarchy a session takes place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingScope {
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_area_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_station_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl PricingScope {
    /// A scope that only knows its tenant.
    #[must_use]
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            company_id: None,
            site_id: None,
            site_area_id: None,
            charging_station_id: None,
            user_group_id: None,
            user_id: None,
        }
    }

    /// The populated levels of this scope with their entity id, broadest first.
    pub fn levels(&self) -> impl Iterator<Item = (ScopeLevel, &str)> {
        [
            (ScopeLevel::Tenant, Some(&self.tenant_id)),
            (ScopeLevel::Company, self.company_id.as_ref()),
            (ScopeLevel::Site, self.site_id.as_ref()),
            (ScopeLevel::SiteArea, self.site_area_id.as_ref()),
            (ScopeLevel::ChargingStation, self.charging_station_id.as_ref()),
            (ScopeLevel::UserGroup, self.user_group_id.as_ref()),
            (ScopeLevel::User, self.user_id.as_ref()),
        ]
        .into_iter()
        .filter_map(|(level, id)| id.map(|id| (level, id.as_str())))
    }
}

/// The charging session a pricing context is resolved for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub scope: PricingScope,
    /// Unknown connectors are not excluded by connector restrictions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<ConnectorType>,
    /// Unknown connector power is not excluded by connector power restrictions.
    #[serde(
        default,
        rename = "connectorPowerkW",
        skip_serializing_if = "Option::is_none"
    )]
    pub connector_power: Option<Kw>,
    pub started_at: DateTime,
}

impl Transaction {
    #[must_use]
    pub fn session_start(&self) -> SessionStart {
        SessionStart {
            started_at: self.started_at,
            connector_type: self.connector_type,
            connector_power: self.connector_power,
        }
    }
}

/// A stored, ordered set of tariff definitions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffModel {
    pub id: String,
    pub tenant_id: String,
    pub created_on: DateTime,
    pub definitions: Vec<TariffDefinition>,
}

/// Paging of a tariff model query. Results are always newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelQuery {
    pub limit: Option<usize>,
    pub skip: usize,
}

impl ModelQuery {
    /// Only the most recently created model.
    #[must_use]
    pub fn newest() -> Self {
        Self {
            limit: Some(1),
            skip: 0,
        }
    }
}

/// Storage of tariff models.
///
/// Implementations must return models sorted by creation time descending and keep the order
/// of the definitions inside a model verbatim. Failures are reported as [`Error::Storage`].
#[async_trait]
pub trait TariffStore: Send + Sync {
    async fn tariff_models(&self, tenant: &Tenant, query: ModelQuery) -> Result<Vec<TariffModel>>;
}

/// Policy that decides which definitions apply to a scope at a point in time.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    /// The ordered definitions for `scope` as of `as_of`, or `None` if nothing applies.
    async fn resolve_for_scope(
        &self,
        scope: &PricingScope,
        as_of: DateTime,
    ) -> Result<Option<Vec<TariffDefinition>>>;
}

/// Takes the newest tariff model of the scope's tenant, whatever the rest of the scope or the
/// moment of resolution.
#[derive(Debug, Clone)]
pub struct LatestTenantModel<S> {
    store: S,
}

impl<S: TariffStore> LatestTenantModel<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: TariffStore> ResolutionStrategy for LatestTenantModel<S> {
    async fn resolve_for_scope(
        &self,
        scope: &PricingScope,
        _as_of: DateTime,
    ) -> Result<Option<Vec<TariffDefinition>>> {
        let tenant = Tenant::new(scope.tenant_id.clone());
        let models = self
            .store
            .tariff_models(&tenant, ModelQuery::newest())
            .await?;

        Ok(models.into_iter().next().map(|model| {
            debug!(model = %model.id, "using newest tariff model of tenant");
            model.definitions
        }))
    }
}

/// Resolves the tariff model a session is rated with for its whole lifetime.
#[derive(Debug, Clone)]
pub struct PricingContextResolver<R> {
    strategy: R,
}

impl<R: ResolutionStrategy> PricingContextResolver<R> {
    #[must_use]
    pub fn new(strategy: R) -> Self {
        Self { strategy }
    }

    /// Resolve the definitions that apply to `transaction`.
    ///
    /// Definitions whose static restrictions exclude the transaction are dropped, the order
    /// of the others is kept. A model of which every definition was dropped resolves to an
    /// empty model, finding no model at all is [`Error::NoPricingContext`].
    #[instrument(skip_all, fields(tenant = %tenant.id, transaction = transaction.id))]
    pub async fn resolve(
        &self,
        tenant: &Tenant,
        transaction: &Transaction,
    ) -> Result<ResolvedTariffModel> {
        if transaction.scope.tenant_id != tenant.id {
            return Err(Error::TenantMismatch {
                expected: tenant.id.clone(),
                actual: transaction.scope.tenant_id.clone(),
            });
        }

        let definitions = self
            .strategy
            .resolve_for_scope(&transaction.scope, transaction.started_at)
            .await?
            .ok_or(Error::NoPricingContext {
                transaction_id: transaction.id,
            })?;

        let total = definitions.len();
        let definitions: Vec<_> = definitions
            .into_iter()
            .filter(|definition| {
                let passes = passes_static_restrictions(definition, &transaction.session_start());

                if !passes {
                    debug!(definition = %definition.name, "excluded by static restrictions");
                }

                passes
            })
            .collect();

        info!(
            resolved = definitions.len(),
            excluded = total - definitions.len(),
            "pricing context resolved"
        );

        Ok(ResolvedTariffModel::new(definitions))
    }
}

/// A [`TariffStore`] that keeps its models in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTariffStore {
    models: Vec<TariffModel>,
}

impl MemoryTariffStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `models`, each validated as by [`MemoryTariffStore::insert`].
    pub fn with_models(models: impl IntoIterator<Item = TariffModel>) -> Result<Self> {
        let mut store = Self::new();

        for model in models {
            store.insert(model)?;
        }

        Ok(store)
    }

    /// Store `model` if every one of its definitions is valid.
    pub fn insert(&mut self, model: TariffModel) -> Result<()> {
        for definition in &model.definitions {
            lint::validate(definition)?;
        }

        debug!(model = %model.id, tenant = %model.tenant_id, "tariff model stored");
        self.models.push(model);

        Ok(())
    }
}

#[async_trait]
impl TariffStore for MemoryTariffStore {
    async fn tariff_models(&self, tenant: &Tenant, query: ModelQuery) -> Result<Vec<TariffModel>> {
        let mut models: Vec<_> = self
            .models
            .iter()
            .filter(|model| model.tenant_id == tenant.id)
            .collect();

        // Stable, models created at the same instant keep their insertion order.
        models.sort_by(|a, b| b.created_on.cmp(&a.created_on));

        Ok(models
            .into_iter()
            .skip(query.skip)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::{
        LatestTenantModel, MemoryTariffStore, ModelQuery, PricingContextResolver, PricingScope,
        TariffModel, TariffStore, Tenant, Transaction,
    };
    use crate::{
        tariff::{ConnectorType, ScopeLevel, TariffDefinition},
        types::{electricity::Kw, time::DateTime},
        Error, Result,
    };

    fn at(day: u32, hour: u32) -> DateTime {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn definition(name: &str, static_restrictions: &str) -> TariffDefinition {
        serde_json::from_str(&format!(
            r#"{{
                "entityId": "T-1",
                "entityType": "Tenant",
                "name": "{name}",
                "staticRestrictions": {static_restrictions},
                "dimensions": {{ "flatFee": {{ "price": 1, "active": true }} }}
            }}"#
        ))
        .unwrap()
    }

    fn model(id: &str, tenant_id: &str, created_on: DateTime, names: &[&str]) -> TariffModel {
        TariffModel {
            id: id.to_owned(),
            tenant_id: tenant_id.to_owned(),
            created_on,
            definitions: names.iter().map(|name| definition(name, "null")).collect(),
        }
    }

    fn transaction(tenant_id: &str) -> Transaction {
        Transaction {
            id: 42,
            scope: PricingScope::tenant(tenant_id),
            connector_type: None,
            connector_power: None,
            started_at: at(15, 12),
        }
    }

    fn resolver(
        models: Vec<TariffModel>,
    ) -> PricingContextResolver<LatestTenantModel<MemoryTariffStore>> {
        let store = MemoryTariffStore::with_models(models).unwrap();
        PricingContextResolver::new(LatestTenantModel::new(store))
    }

    fn names(model: &crate::tariff::ResolvedTariffModel) -> Vec<&str> {
        model
            .definitions()
            .iter()
            .map(|definition| definition.name.as_str())
            .collect()
    }

    #[test]
    fn scope_levels_are_broadest_first() {
        let mut scope = PricingScope::tenant("T-1");
        scope.user_id = Some(String::from("U-1"));
        scope.site_id = Some(String::from("S-1"));

        let levels: Vec<_> = scope.levels().collect();

        assert_eq!(
            levels,
            [
                (ScopeLevel::Tenant, "T-1"),
                (ScopeLevel::Site, "S-1"),
                (ScopeLevel::User, "U-1"),
            ]
        );
    }

    #[tokio::test]
    async fn newest_model_of_the_tenant_is_resolved() {
        let resolver = resolver(vec![
            model("old", "T-1", at(1, 0), &["old"]),
            model("other-tenant", "T-2", at(10, 0), &["other"]),
            model("new", "T-1", at(5, 0), &["first", "second", "third"]),
        ]);

        let resolved = resolver
            .resolve(&Tenant::new("T-1"), &transaction("T-1"))
            .await
            .unwrap();

        assert_eq!(names(&resolved), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn no_model_is_no_pricing_context() {
        let resolver = resolver(vec![model("other", "T-2", at(1, 0), &["other"])]);

        let result = resolver
            .resolve(&Tenant::new("T-1"), &transaction("T-1"))
            .await;

        assert!(matches!(
            result,
            Err(Error::NoPricingContext { transaction_id: 42 })
        ));
    }

    #[tokio::test]
    async fn transaction_of_another_tenant_is_rejected() {
        let resolver = resolver(vec![model("m", "T-1", at(1, 0), &["a"])]);

        let result = resolver
            .resolve(&Tenant::new("T-1"), &transaction("T-2"))
            .await;

        assert!(matches!(result, Err(Error::TenantMismatch { .. })));
    }

    #[tokio::test]
    async fn static_restrictions_filter_definitions_in_order() {
        let definitions = vec![
            definition("future", r#"{ "validFrom": "2024-04-01T00:00:00Z" }"#),
            definition("current", r#"{ "validFrom": "2024-03-01T00:00:00Z" }"#),
            definition("past", r#"{ "validTo": "2024-03-15T12:00:00Z" }"#),
            definition("chademo", r#"{ "connectorType": "C" }"#),
            definition("40 kW", r#"{ "connectorPowerkW": 40 }"#),
            definition("22 kW", r#"{ "connectorPowerkW": 22 }"#),
            definition("unrestricted", "{}"),
        ];
        let resolver = resolver(vec![TariffModel {
            id: String::from("m"),
            tenant_id: String::from("T-1"),
            created_on: at(1, 0),
            definitions,
        }]);

        let mut transaction = transaction("T-1");
        transaction.connector_type = Some(ConnectorType::ComboCcs);
        transaction.connector_power = Some(Kw::from(dec!(22)));

        let resolved = resolver
            .resolve(&Tenant::new("T-1"), &transaction)
            .await
            .unwrap();

        assert_eq!(names(&resolved), ["current", "22 kW", "unrestricted"]);
    }

    #[tokio::test]
    async fn store_pages_newest_first() {
        let store = MemoryTariffStore::with_models(vec![
            model("a", "T-1", at(1, 0), &["a"]),
            model("c", "T-1", at(3, 0), &["c"]),
            model("b", "T-1", at(2, 0), &["b"]),
        ])
        .unwrap();

        let ids = |models: Vec<TariffModel>| -> Vec<String> {
            models.into_iter().map(|model| model.id).collect()
        };

        let all = store
            .tariff_models(&Tenant::new("T-1"), ModelQuery::default())
            .await
            .unwrap();
        assert_eq!(ids(all), ["c", "b", "a"]);

        let page = store
            .tariff_models(
                &Tenant::new("T-1"),
                ModelQuery {
                    limit: Some(1),
                    skip: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(ids(page), ["b"]);
    }

    #[test]
    fn invalid_definitions_are_not_stored() {
        let mut invalid = model("m", "T-1", at(1, 0), &["a"]);
        invalid.definitions[0].dimensions.flat_fee = None;

        let result = MemoryTariffStore::new().insert(invalid);

        assert!(matches!(
            result,
            Err(Error::InvalidTariffDefinition { name, .. }) if name == "a"
        ));
    }

    struct FailingStore;

    #[async_trait]
    impl TariffStore for FailingStore {
        async fn tariff_models(&self, _: &Tenant, _: ModelQuery) -> Result<Vec<TariffModel>> {
            Err(Error::Storage(String::from("connection refused")))
        }
    }

    #[tokio::test]
    async fn storage_failures_are_propagated() {
        let resolver = PricingContextResolver::new(LatestTenantModel::new(FailingStore));

        let result = resolver
            .resolve(&Tenant::new("T-1"), &transaction("T-1"))
            .await;

        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
