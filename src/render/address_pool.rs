use super::RenderError;
use crate::constants::{ADDRESS_POOL_CONFIG_KEY, ADDRESS_POOL_CONFIG_MAP_NAME};
use crate::crd::{AddressPool, AddressPoolConfig};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{ApiResource, DynamicObject};
use kube::ResourceExt;
use serde_json::{json, Map, Value};

/// The MetalLB configuration ConfigMap holding just this pool.
///
/// Applying it over the live ConfigMap appends the pool to the ones already
/// configured.
///
/// # Errors
///
/// [`RenderError::Yaml`] if the configuration cannot be serialized.
pub fn render_address_pool_config_map(
    pool: &AddressPool,
    namespace: &str,
) -> Result<DynamicObject, RenderError> {
    let config = AddressPoolConfig {
        address_pools: vec![pool.to_entry()],
    };
    let payload = config.to_yaml().map_err(|source| RenderError::Yaml {
        file: format!("AddressPool {}", pool.name_any()),
        source,
    })?;

    let mut data = Map::new();
    data.insert(ADDRESS_POOL_CONFIG_KEY.to_string(), Value::String(payload));

    Ok(
        DynamicObject::new(ADDRESS_POOL_CONFIG_MAP_NAME, &ApiResource::erase::<ConfigMap>(&()))
            .within(namespace)
            .data(json!({ "data": data })),
    )
}
