//! Resource expansion.
//!
//! # Responsibilities
//! - Validate resource names (`blog`, `blog.comment`, `/shop.order.item`)
//! - Build the nested path chain: `blog.comment` → `blog/<blog_id>/comment`
//! - Filter the REST table through `only` / `except`
//! - Rename `<id>` through `var`
//! - Emit one rule per surviving action, in table order
//!
//! # Design Decisions
//! - The resource group is named after the first segment only; the rest of
//!   the chain becomes a prefix on every emitted rule
//! - Rules are expanded into a buffer first and committed only when the whole
//!   resource expanded cleanly, so a bad entry never leaves half a resource
//! - Bindings from `resource_model` / `resource_validate` are attached before
//!   commit through the same [`AttributeBinder`] used after compilation

use crate::routing::binder::AttributeBinder;
use crate::routing::error::{ConfigurationError, RouteResult};
use crate::routing::options::{OptionSet, ResolvedOptions, COMPLETE_MATCH};
use crate::routing::rest::{RestAction, RestTable, ID_PLACEHOLDER};
use crate::routing::rule::{BindingKind, RuleNode};
use crate::routing::tree::{GroupId, RuleGroup, RuleTree};

/// Declaration of one REST resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSpec {
    name: String,
    route: String,
    rest: RestTable,
}

impl ResourceSpec {
    /// Declare a resource with the default REST table.
    ///
    /// Leading `/` are stripped from `name`. Fails on an empty name or an
    /// empty dotted segment.
    pub fn new(name: &str, route: impl Into<String>) -> RouteResult<Self> {
        let name = name.trim_start_matches('/');
        if name.is_empty() {
            return Err(ConfigurationError::EmptyResourceName);
        }
        if name.split('.').any(str::is_empty) {
            return Err(ConfigurationError::EmptySegment {
                resource: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            route: route.into(),
            rest: RestTable::default(),
        })
    }

    pub fn with_rest(mut self, table: RestTable) -> Self {
        self.rest = table;
        self
    }

    /// Add or override a single action.
    pub fn rest(&mut self, key: impl Into<String>, action: RestAction) {
        self.rest.set(key, action);
    }

    /// Merge `table` into the current one, or replace it outright.
    pub fn rest_table(&mut self, table: RestTable, replace: bool) {
        if replace {
            self.rest = table;
        } else {
            self.rest.merge(table);
        }
    }

    /// Full dotted name, e.g. `blog.comment`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dispatch target prefix.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn table(&self) -> &RestTable {
        &self.rest
    }

    /// Name of the group the resource registers: the first dotted segment.
    pub fn group_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    pub fn is_nested(&self) -> bool {
        self.name.contains('.')
    }
}

/// Expands a [`ResourceSpec`] into rules.
#[derive(Debug, Clone, Copy)]
pub struct ResourceCompiler<'a> {
    spec: &'a ResourceSpec,
}

impl<'a> ResourceCompiler<'a> {
    pub fn new(spec: &'a ResourceSpec) -> Self {
        Self { spec }
    }

    /// Register `spec` as a new group under `parent` and emit its rules.
    ///
    /// `options` are declared on the resource group; anything they leave out
    /// is inherited from `parent`. Resource groups default to
    /// `complete_match = true`. Nothing is added to the tree on error.
    pub fn compile(
        tree: &mut RuleTree,
        parent: GroupId,
        spec: ResourceSpec,
        mut options: OptionSet,
    ) -> RouteResult<GroupId> {
        let nodes = Self::prepare(tree, parent, &spec, &mut options)?;
        let group = tree.add_resource_group(parent, spec, options)?;
        commit(tree, group, nodes)?;
        Ok(group)
    }

    /// Expand `spec` as it would be registered under `parent`, without
    /// touching the tree. Fills in the `complete_match` default on `options`.
    pub(crate) fn prepare(
        tree: &RuleTree,
        parent: GroupId,
        spec: &ResourceSpec,
        options: &mut OptionSet,
    ) -> RouteResult<Vec<RuleNode>> {
        if tree.group(parent).is_none() {
            return Err(ConfigurationError::UnknownGroup(parent.index()));
        }
        if !options.contains(COMPLETE_MATCH) {
            options.set(COMPLETE_MATCH, true);
        }

        let resolved =
            ResolvedOptions::resolve(|k| options.get(k).or_else(|| tree.get_option(parent, k)))?;
        ResourceCompiler::new(spec).expand(&resolved)
    }

    /// Emit the rules of a resource group declared earlier without
    /// compilation. Returns the number of rules emitted (zero if the group
    /// was already built, already failed, or is not a resource group).
    ///
    /// On error the group is marked failed: it stays empty and later builds
    /// skip it.
    pub fn build(tree: &mut RuleTree, group: GroupId) -> RouteResult<usize> {
        let entry = tree
            .group(group)
            .ok_or(ConfigurationError::UnknownGroup(group.index()))?;
        let Some(spec) = entry.resource().filter(|_| entry.is_pending()) else {
            return Ok(0);
        };

        let expanded = ResolvedOptions::resolve(|k| tree.get_option(group, k))
            .and_then(|resolved| ResourceCompiler::new(spec).expand(&resolved));
        match expanded {
            Ok(nodes) => commit(tree, group, nodes),
            Err(err) => {
                tracing::warn!(
                    resource = %spec.name(),
                    error = %err,
                    "Resource rejected, skipping"
                );
                tree.mark_failed(group)?;
                Err(err)
            }
        }
    }

    /// Expand into rule nodes without touching any tree.
    pub fn expand(&self, options: &ResolvedOptions) -> RouteResult<Vec<RuleNode>> {
        let spec = self.spec;
        let (rule, leaf) = self.nested_rule(options);
        // The group contributes the first segment; rules carry the rest.
        let prefix = rule.get(spec.group_name().len() + 1..).unwrap_or("");

        let mut nodes = Vec::new();
        for (key, action) in spec.table().iter() {
            self.check_entry(key, action, leaf.is_some())?;
            if !options.permits(key) {
                tracing::trace!(resource = %spec.name(), action = %key, "Action filtered out");
                continue;
            }

            let mut suffix = action.suffix.clone();
            if suffix.contains(ID_PLACEHOLDER) {
                let var = leaf
                    .and_then(|leaf| options.var(leaf))
                    .or_else(|| options.var(spec.name()));
                if let Some(var) = var {
                    suffix = suffix.replace(ID_PLACEHOLDER, &format!("<{}>", var));
                }
            }

            let pattern = format!("{}{}", prefix, suffix).trim_matches('/').to_string();
            let target = format!("{}/{}", spec.route(), action.action);
            let mut node = RuleNode::new(action.verb, pattern, target)
                .with_action(key)
                .with_complete_match(options.complete_match);

            if let Some(model) = options.models.get(key) {
                AttributeBinder::bind(&mut node, BindingKind::Model, model.clone());
            }
            if let Some(validate) = options.validates.get(key) {
                AttributeBinder::bind(&mut node, BindingKind::Validate, validate.clone());
            }

            tracing::debug!(
                resource = %spec.name(),
                action = %key,
                verb = %node.verb(),
                pattern = %node.pattern(),
                target = %node.target(),
                "Rule expanded"
            );
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// `a.b.c` → (`a/<a_id>/b/<b_id>/c`, Some("c")); `a` → (`a`, None).
    fn nested_rule(&self, options: &ResolvedOptions) -> (String, Option<&'a str>) {
        let spec: &'a ResourceSpec = self.spec;
        let name = spec.name();
        let Some((parents, leaf)) = name.rsplit_once('.') else {
            return (name.to_string(), None);
        };

        let mut chain: Vec<String> = parents
            .split('.')
            .map(|segment| match options.var(segment) {
                Some(var) => format!("{}/<{}>", segment, var),
                None => format!("{}/<{}_id>", segment, segment),
            })
            .collect();
        chain.push(leaf.to_string());
        (chain.join("/"), Some(leaf))
    }

    fn check_entry(&self, key: &str, action: &RestAction, nested: bool) -> RouteResult<()> {
        let malformed = |reason: &str| ConfigurationError::MalformedRestEntry {
            resource: self.spec.name().to_string(),
            action: key.to_string(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(malformed("action key must not be empty"));
        }
        if action.action.is_empty() {
            return Err(malformed("action name must not be empty"));
        }
        if nested && !action.suffix.is_empty() && !action.suffix.starts_with('/') {
            return Err(malformed("nested resources need path suffixes starting with '/'"));
        }
        Ok(())
    }
}

/// Append expanded rules to their resource group and mark it built.
pub(crate) fn commit(tree: &mut RuleTree, group: GroupId, nodes: Vec<RuleNode>) -> RouteResult<usize> {
    let count = nodes.len();
    for node in nodes {
        tree.add_rule(group, node)?;
    }
    tree.mark_compiled(group)?;

    if let Some(spec) = tree.group(group).and_then(RuleGroup::resource) {
        tracing::info!(resource = %spec.name(), rules = count, "Resource compiled");
    }
    Ok(count)
}
