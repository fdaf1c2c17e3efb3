//! Family registry - which resource collections are completable and how
//!
//! The registry carries everything that varies per resource family: the
//! identity template and its optional-parameter whitelist, the list command
//! to fall back to, per-level flag annotations for wildcard expansion,
//! cross-link rules, TTL overrides, cacheability rules and resolver
//! strategies. Builtins cover the compute and sql services; a JSON config
//! file is merged over them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::core::identity::WILDCARD;

/// Cross-link rule for wildcard expansion: when expansion reaches a
/// directory named `level`, additionally try the `sibling` directory at the
/// same depth, annotating its names with the literal `flag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossLink {
    pub level: String,
    pub sibling: String,
    pub flag: String,
}

/// Resolver strategy for normalizing one raw list item to a self-link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolverSpec {
    /// Use the item's own self-link field when present; otherwise append
    /// the item's name field to the identity template being completed.
    SelfLink {
        #[serde(default = "default_link_field")]
        field: String,
        #[serde(default = "default_name_field")]
        name_field: String,
    },
    /// Construct the self-link from item fields through a `{field}` template.
    UriTemplate { template: String },
}

fn default_link_field() -> String {
    "selfLink".to_string()
}

fn default_name_field() -> String {
    "name".to_string()
}

/// One completable resource family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyConfig {
    /// Collection name, e.g. `compute.instances`.
    pub collection: String,

    /// Self-link template with one `{param}` hole per optional parameter
    /// and a trailing `+` standing in for the leaf name.
    pub template: String,

    /// Ordered whitelist of optional hierarchy parameters.
    #[serde(default)]
    pub params: Vec<String>,

    /// Command that lists the family's resources, as argv. Supplied
    /// parameters are appended as `--key value` pairs.
    #[serde(default)]
    pub list_command: Vec<String>,
}

impl FamilyConfig {
    /// Service prefix of the collection (`compute.instances` -> `compute`).
    pub fn api(&self) -> &str {
        self.collection
            .split('.')
            .next()
            .unwrap_or(&self.collection)
    }

    /// Build an identity template from partially-known parameters: each
    /// supplied parameter fixes its segment, each missing one becomes a
    /// wildcard.
    pub fn build_template(&self, params: &HashMap<String, String>) -> String {
        let mut link = self.template.clone();
        for param in &self.params {
            let hole = format!("{{{param}}}");
            match params.get(param) {
                Some(value) => link = link.replace(&hole, value),
                None => link = link.replace(&hole, &WILDCARD.to_string()),
            }
        }
        link
    }
}

/// Optional config file merged over the builtin registry.
#[derive(Debug, Default, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub families: Vec<FamilyConfig>,
    #[serde(default)]
    pub flags: HashMap<String, String>,
    #[serde(default)]
    pub cross_links: Vec<CrossLink>,
    #[serde(default)]
    pub ttl_secs: HashMap<String, u64>,
    #[serde(default)]
    pub default_ttl_secs: Option<u64>,
    #[serde(default)]
    pub cacheable: Vec<String>,
    #[serde(default)]
    pub resolvers: HashMap<String, ResolverSpec>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    families: HashMap<String, FamilyConfig>,
    flags: HashMap<String, String>,
    cross_links: Vec<CrossLink>,
    ttl_secs: HashMap<String, u64>,
    default_ttl_secs: Option<u64>,
    cacheable: Vec<String>,
    resolvers: HashMap<String, ResolverSpec>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// Registry with the builtin compute and sql families.
    pub fn builtin() -> Self {
        let families = builtin_families()
            .into_iter()
            .map(|family| (family.collection.clone(), family))
            .collect();

        let flags = [
            ("compute.projects", "project"),
            ("compute.regions", "region"),
            ("compute.zones", "zone"),
            ("sql.projects", "project"),
        ]
        .into_iter()
        .map(|(key, flag)| (key.to_string(), flag.to_string()))
        .collect();

        Self {
            families,
            flags,
            cross_links: vec![CrossLink {
                level: "regions".to_string(),
                sibling: "global".to_string(),
                flag: "--global".to_string(),
            }],
            ttl_secs: HashMap::new(),
            default_ttl_secs: None,
            cacheable: vec!["compute.".to_string(), "sql.instances".to_string()],
            resolvers: HashMap::new(),
        }
    }

    /// Builtin registry with a config file merged over it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry config: {}", path.display()))?;
        let file: RegistryFile = serde_json::from_str(&content)
            .with_context(|| format!("Invalid registry config: {}", path.display()))?;
        let mut registry = Self::builtin();
        registry.merge(file);
        Ok(registry)
    }

    /// Merge a config file: families, flags and resolvers replace builtin
    /// entries with the same key; cross-links and cacheability rules append.
    pub fn merge(&mut self, file: RegistryFile) {
        for family in file.families {
            self.families.insert(family.collection.clone(), family);
        }
        self.flags.extend(file.flags);
        self.cross_links.extend(file.cross_links);
        self.ttl_secs.extend(file.ttl_secs);
        if file.default_ttl_secs.is_some() {
            self.default_ttl_secs = file.default_ttl_secs;
        }
        self.cacheable.extend(file.cacheable);
        self.resolvers.extend(file.resolvers);
    }

    pub fn family(&self, collection: &str) -> Option<&FamilyConfig> {
        self.families.get(collection)
    }

    pub fn families(&self) -> impl Iterator<Item = &FamilyConfig> {
        self.families.values()
    }

    /// Flag name annotating names found under a wildcard directory
    /// (`compute` + `zones` -> `zone`, rendered as `--zone <value>`).
    #[allow(dead_code)]
    pub fn flag_for(&self, api: &str, level: &str) -> Option<&str> {
        self.flags.get(&format!("{api}.{level}")).map(String::as_str)
    }

    pub fn flags(&self) -> &HashMap<String, String> {
        &self.flags
    }

    pub fn cross_links(&self) -> &[CrossLink] {
        &self.cross_links
    }

    pub fn ttl_overrides(&self) -> (&HashMap<String, u64>, Option<u64>) {
        (&self.ttl_secs, self.default_ttl_secs)
    }

    pub fn resolver_specs(&self) -> &HashMap<String, ResolverSpec> {
        &self.resolvers
    }

    /// True when the collection's names may be cached. Rules ending in `.`
    /// match a whole service prefix; anything else matches exactly.
    pub fn is_cached(&self, collection: &str) -> bool {
        self.cacheable.iter().any(|rule| {
            if rule.ends_with('.') {
                collection.starts_with(rule.as_str())
            } else {
                collection == rule
            }
        })
    }
}

fn builtin_families() -> Vec<FamilyConfig> {
    let gcloud = |args: &[&str]| -> Vec<String> {
        let mut argv = vec!["gcloud".to_string()];
        argv.extend(args.iter().map(|s| s.to_string()));
        argv.extend(["--format".to_string(), "json".to_string()]);
        argv
    };

    vec![
        FamilyConfig {
            collection: "compute.instances".to_string(),
            template:
                "https://www.googleapis.com/compute/v1/projects/{project}/zones/{zone}/instances/+"
                    .to_string(),
            params: vec!["project".to_string(), "zone".to_string()],
            list_command: gcloud(&["compute", "instances", "list"]),
        },
        FamilyConfig {
            collection: "compute.addresses".to_string(),
            template:
                "https://www.googleapis.com/compute/v1/projects/{project}/regions/{region}/addresses/+"
                    .to_string(),
            params: vec!["project".to_string(), "region".to_string()],
            list_command: gcloud(&["compute", "addresses", "list"]),
        },
        FamilyConfig {
            collection: "compute.regions".to_string(),
            template: "https://www.googleapis.com/compute/v1/projects/{project}/regions/+"
                .to_string(),
            params: vec!["project".to_string()],
            list_command: gcloud(&["compute", "regions", "list"]),
        },
        FamilyConfig {
            collection: "compute.zones".to_string(),
            template: "https://www.googleapis.com/compute/v1/projects/{project}/zones/+"
                .to_string(),
            params: vec!["project".to_string()],
            list_command: gcloud(&["compute", "zones", "list"]),
        },
        FamilyConfig {
            collection: "sql.instances".to_string(),
            template: "https://www.googleapis.com/sql/v1beta4/projects/{project}/instances/+"
                .to_string(),
            params: vec!["project".to_string()],
            list_command: gcloud(&["sql", "instances", "list"]),
        },
    ]
}
