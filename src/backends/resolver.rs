//! Resolver registry - per-family normalization of list items
//!
//! Each service api maps to one strategy for turning a raw list item into
//! its canonical self-link. Strategies are configured once at startup (from
//! builtins, the registry config file, or [`ResolverRegistry::register_fn`]);
//! a family whose api has no strategy cannot be completed.

use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::registry::{Registry, ResolverSpec};

/// Static regex matching `{field}` holes in a URI template.
static HOLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("Invalid HOLE_RE regex"));

/// Custom resolver callback: item in, self-link out.
pub type ResolveFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

#[derive(Clone)]
enum Strategy {
    Spec(ResolverSpec),
    Custom(ResolveFn),
}

#[derive(Clone, Default)]
pub struct ResolverRegistry {
    strategies: HashMap<String, Strategy>,
}

impl ResolverRegistry {
    /// Builtin strategies: compute items carry their own self-link, sql
    /// items are assembled from project and instance fields.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.configure(
            "compute",
            ResolverSpec::SelfLink {
                field: "selfLink".to_string(),
                name_field: "name".to_string(),
            },
        );
        registry.configure(
            "sql",
            ResolverSpec::UriTemplate {
                template:
                    "https://www.googleapis.com/sql/v1beta4/projects/{project}/instances/{instance}"
                        .to_string(),
            },
        );
        registry
    }

    /// Builtin strategies with a registry's configured specs merged over.
    pub fn for_registry(registry: &Registry) -> Self {
        let mut resolvers = Self::builtin();
        for (api, spec) in registry.resolver_specs() {
            resolvers.configure(api, spec.clone());
        }
        resolvers
    }

    pub fn configure(&mut self, api: &str, spec: ResolverSpec) {
        self.strategies.insert(api.to_string(), Strategy::Spec(spec));
    }

    /// Register a custom resolution callback for one api.
    #[allow(dead_code)]
    pub fn register_fn(&mut self, api: &str, resolve: ResolveFn) {
        self.strategies
            .insert(api.to_string(), Strategy::Custom(resolve));
    }

    /// Resolve one raw list item to its canonical self-link. `template` is
    /// the identity template being completed, used by self-link strategies
    /// when the item lacks its own link.
    pub fn resolve(&self, api: &str, item: &Value, template: &str) -> Result<String> {
        let strategy = self
            .strategies
            .get(api)
            .ok_or_else(|| anyhow!("no resolver configured for api '{api}'"))?;

        match strategy {
            Strategy::Spec(ResolverSpec::SelfLink { field, name_field }) => {
                if let Some(link) = item.get(field).and_then(Value::as_str) {
                    return Ok(link.to_string());
                }
                let name = item
                    .get(name_field)
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        anyhow!("list item has neither '{field}' nor '{name_field}'")
                    })?;
                Ok(format!("{}{name}", template.trim_end_matches('+')))
            }
            Strategy::Spec(ResolverSpec::UriTemplate { template: uri }) => render_uri(uri, item),
            Strategy::Custom(resolve) => {
                resolve(item).ok_or_else(|| anyhow!("custom resolver for '{api}' yielded nothing"))
            }
        }
    }
}

/// Fill every `{field}` hole in a URI template from the item's fields.
fn render_uri(template: &str, item: &Value) -> Result<String> {
    let mut out = String::new();
    let mut last = 0;
    for hole in HOLE_RE.find_iter(template) {
        let field = &template[hole.start() + 1..hole.end() - 1];
        let value = match item.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => bail!("list item is missing field '{field}'"),
        };
        out.push_str(&template[last..hole.start()]);
        out.push_str(&value);
        last = hole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}
