//! Route declaration context.
//!
//! # Responsibilities
//! - Track the active group while routes are declared (push/pop)
//! - Register plain rules, groups and resources into the tree
//! - Compile resources eagerly on registration, or lazily on `finish`
//! - Build a whole tree from a [`RoutesConfig`]
//!
//! # Design Decisions
//! - One builder per compilation; no global router instance
//! - The active group is restored after a group body or a resource build,
//!   including when they fail
//! - `finish` hands back an immutable [`RuleTree`]; reconfiguration builds a
//!   new tree rather than editing a live one

use serde_json::{Map, Value};

use crate::config::schema::{GroupConfig, ResourceConfig, RoutesConfig, RuleConfig};
use crate::routing::error::{ConfigurationError, RouteResult};
use crate::routing::options::{
    OptionSet, COMPLETE_MATCH, EXCEPT, ONLY, RESOURCE_MODEL, RESOURCE_VALIDATE, VAR,
};
use crate::routing::resource::{commit, ResourceCompiler, ResourceSpec};
use crate::routing::rest::{RestAction, RestTable};
use crate::routing::rule::{BindingKind, BindingSpec, RuleNode, Verb};
use crate::routing::tree::{GroupId, RuleId, RuleTree};

/// Builder and router context for one rule tree.
#[derive(Debug)]
pub struct RouteBuilder {
    tree: RuleTree,
    current: GroupId,
    eager: bool,
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteBuilder {
    /// A lazy builder positioned at the root group.
    pub fn new() -> Self {
        let tree = RuleTree::new();
        let current = tree.root();
        Self {
            tree,
            current,
            eager: false,
        }
    }

    /// Compile resources as soon as they are registered.
    pub fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }

    pub fn tree(&self) -> &RuleTree {
        &self.tree
    }

    pub fn current_group(&self) -> GroupId {
        self.current
    }

    /// Make `group` the active group, returning the previous one.
    pub fn set_group(&mut self, group: GroupId) -> RouteResult<GroupId> {
        if self.tree.group(group).is_none() {
            return Err(ConfigurationError::UnknownGroup(group.index()));
        }
        Ok(std::mem::replace(&mut self.current, group))
    }

    /// Set the domain of the active group.
    pub fn domain(&mut self, domain: impl Into<String>) -> RouteResult<()> {
        self.tree.set_domain(self.current, domain)
    }

    /// Set an option on the active group.
    pub fn option(&mut self, key: impl Into<String>, value: impl Into<Value>) -> RouteResult<()> {
        self.tree.set_option(self.current, key, value)
    }

    /// Declare a child group and run `body` with it active.
    pub fn group<F>(&mut self, name: &str, body: F) -> RouteResult<GroupId>
    where
        F: FnOnce(&mut Self) -> RouteResult<()>,
    {
        let group = self.tree.add_group(self.current, name)?;
        let origin = std::mem::replace(&mut self.current, group);
        let result = body(self);
        self.current = origin;
        result.map(|()| group)
    }

    /// Register a plain rule in the active group.
    pub fn rule(&mut self, verb: Verb, pattern: &str, target: &str) -> RouteResult<RuleId> {
        let complete_match = match self.tree.get_option(self.current, COMPLETE_MATCH) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ConfigurationError::InvalidOption {
                    key: COMPLETE_MATCH.to_string(),
                    reason: "expected a boolean".to_string(),
                })
            }
        };
        let node = RuleNode::new(verb, pattern.trim_matches('/'), target)
            .with_complete_match(complete_match);
        let id = self.tree.add_rule(self.current, node)?;
        tracing::debug!(verb = %verb, pattern = %pattern, target = %target, "Rule registered");
        Ok(id)
    }

    /// Start declaring a resource in the active group.
    pub fn resource(&mut self, name: &str, route: &str) -> RouteResult<ResourceBuilder<'_>> {
        let spec = ResourceSpec::new(name, route)?;
        Ok(ResourceBuilder {
            router: self,
            spec,
            options: OptionSet::new(),
        })
    }

    /// Attach a binding to a registered rule.
    pub fn bind(&mut self, rule: RuleId, kind: BindingKind, spec: BindingSpec) -> RouteResult<()> {
        self.tree.bind(rule, kind, spec)
    }

    /// Compile every resource registered but not yet built.
    ///
    /// A failing resource is marked failed and skipped; every other pending
    /// resource is still built. The first failure is returned once all of
    /// them have been attempted, so a second call only builds resources
    /// registered in between.
    pub fn build_pending(&mut self) -> RouteResult<usize> {
        let mut total = 0;
        let mut first_error = None;
        for group in self.tree.pending_resources() {
            let origin = std::mem::replace(&mut self.current, group);
            let result = ResourceCompiler::build(&mut self.tree, group);
            self.current = origin;
            match result {
                Ok(count) => total += count,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(total),
        }
    }

    /// Build pending resources and hand back the finished tree.
    pub fn finish(mut self) -> RouteResult<RuleTree> {
        let built = self.build_pending()?;
        tracing::debug!(
            rules = self.tree.rule_count(),
            lazily_built = built,
            "Rule tree finished"
        );
        Ok(self.tree)
    }

    /// Compile a full routes configuration.
    pub fn from_config(config: &RoutesConfig) -> RouteResult<RuleTree> {
        let mut router = RouteBuilder::new().eager(config.router.eager);
        if let Some(domain) = &config.router.domain {
            router.domain(domain.as_str())?;
        }
        for (key, value) in &config.router.options {
            router.option(key.as_str(), value.clone())?;
        }
        router.declare(&config.rules, &config.resources, &config.groups)?;

        let tree = router.finish()?;
        tracing::info!(
            groups = tree.group_count(),
            rules = tree.rule_count(),
            "Routes compiled"
        );
        Ok(tree)
    }

    fn declare(
        &mut self,
        rules: &[RuleConfig],
        resources: &[ResourceConfig],
        groups: &[GroupConfig],
    ) -> RouteResult<()> {
        for rule in rules {
            self.rule(rule.verb, &rule.pattern, &rule.target)?;
        }
        for resource in resources {
            self.declare_resource(resource)?;
        }
        for group in groups {
            self.group(&group.name, |router| {
                if let Some(domain) = &group.domain {
                    router.domain(domain.as_str())?;
                }
                for (key, value) in &group.options {
                    router.option(key.as_str(), value.clone())?;
                }
                router.declare(&group.rules, &group.resources, &group.groups)
            })?;
        }
        Ok(())
    }

    fn declare_resource(&mut self, config: &ResourceConfig) -> RouteResult<GroupId> {
        let mut resource = self.resource(&config.name, &config.route)?;

        if !config.rest.is_empty() {
            let table: RestTable = config
                .rest
                .iter()
                .map(|entry| {
                    let action = RestAction::new(entry.verb, entry.path.as_str(), entry.action.as_str());
                    (entry.key.as_str(), action)
                })
                .collect();
            resource = resource.rest_table(table, config.replace_rest);
        }
        if let Some(only) = &config.only {
            resource = resource.only(only.iter().cloned());
        }
        if !config.except.is_empty() {
            resource = resource.except(config.except.iter().cloned());
        }
        if !config.vars.is_empty() {
            resource = resource.vars(config.vars.clone());
        }
        if !config.model.is_empty() {
            resource = resource.with_model(config.model.clone());
        }
        if !config.validate.is_empty() {
            resource = resource.with_validate(config.validate.clone());
        }
        if let Some(complete_match) = config.complete_match {
            resource = resource.complete_match(complete_match);
        }
        for (key, value) in &config.options {
            resource = resource.option(key.as_str(), value.clone());
        }
        resource.register()
    }
}

/// Fluent declaration of one resource; finish with [`ResourceBuilder::register`].
#[derive(Debug)]
#[must_use = "a resource is only added to the tree by `register`"]
pub struct ResourceBuilder<'r> {
    router: &'r mut RouteBuilder,
    spec: ResourceSpec,
    options: OptionSet,
}

impl<'r> ResourceBuilder<'r> {
    /// Emit only these action keys.
    pub fn only<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.set(ONLY, string_array(keys));
        self
    }

    /// Never emit these action keys.
    pub fn except<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.set(EXCEPT, string_array(keys));
        self
    }

    /// Rename path parameters per resource segment.
    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: Map<String, Value> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        self.options.set(VAR, Value::Object(map));
        self
    }

    /// Model bindings keyed by action.
    pub fn with_model<I, K, V>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BindingSpec>,
    {
        self.options.set(RESOURCE_MODEL, binding_object(models));
        self
    }

    /// Validator bindings keyed by action.
    pub fn with_validate<I, K, V>(mut self, validates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BindingSpec>,
    {
        self.options.set(RESOURCE_VALIDATE, binding_object(validates));
        self
    }

    pub fn complete_match(mut self, complete_match: bool) -> Self {
        self.options.set(COMPLETE_MATCH, complete_match);
        self
    }

    /// Any other option, carried on the resource group.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.set(key, value);
        self
    }

    /// Add or override one REST action.
    pub fn rest(mut self, key: impl Into<String>, action: RestAction) -> Self {
        self.spec.rest(key, action);
        self
    }

    /// Merge a REST table into the current one, or replace it.
    pub fn rest_table(mut self, table: RestTable, replace: bool) -> Self {
        self.spec.rest_table(table, replace);
        self
    }

    /// Add the resource group to the active group.
    ///
    /// Eager builders emit the rules now; lazy ones leave the group pending
    /// until [`RouteBuilder::build_pending`] or [`RouteBuilder::finish`].
    pub fn register(self) -> RouteResult<GroupId> {
        let Self {
            router,
            spec,
            mut options,
        } = self;
        let parent = router.current;

        if router.eager {
            let nodes = ResourceCompiler::prepare(&router.tree, parent, &spec, &mut options)?;
            let group = router.tree.add_resource_group(parent, spec, options)?;
            let origin = std::mem::replace(&mut router.current, group);
            let result = commit(&mut router.tree, group, nodes);
            router.current = origin;
            return result.map(|_| group);
        }

        if !options.contains(COMPLETE_MATCH) {
            options.set(COMPLETE_MATCH, true);
        }
        let name = spec.name().to_string();
        let group = router.tree.add_resource_group(parent, spec, options)?;
        tracing::debug!(resource = %name, "Resource registered, build deferred");
        Ok(group)
    }
}

fn string_array<I, S>(items: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Array(items.into_iter().map(|s| Value::String(s.into())).collect())
}

fn binding_object<I, K, V>(bindings: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<BindingSpec>,
{
    Value::Object(
        bindings
            .into_iter()
            .map(|(k, v)| (k.into(), v.into().into_value()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::tree::ChildRef;
    use serde_json::json;

    #[test]
    fn test_group_restores_active_group() {
        let mut router = RouteBuilder::new();
        let root = router.current_group();

        let result = router.group("admin", |r| {
            assert_ne!(r.current_group(), root);
            Err(ConfigurationError::EmptyGroupName)
        });

        assert!(result.is_err());
        assert_eq!(router.current_group(), root);
    }

    #[test]
    fn test_lazy_resources_build_on_finish() {
        let mut router = RouteBuilder::new();
        let group = router.resource("blog", "index/blog").unwrap().register().unwrap();

        assert!(router.tree().group(group).unwrap().is_pending());
        assert_eq!(router.tree().rule_count(), 0);

        let tree = router.finish().unwrap();
        assert!(!tree.group(group).unwrap().is_pending());
        assert_eq!(tree.rule_count(), 7);
    }

    #[test]
    fn test_eager_resources_build_on_register() {
        let mut router = RouteBuilder::new().eager(true);
        router
            .resource("blog", "index/blog")
            .unwrap()
            .only(["index", "read"])
            .register()
            .unwrap();
        assert_eq!(router.tree().rule_count(), 2);
    }

    #[test]
    fn test_lazy_build_sees_options_set_after_registration() {
        let mut router = RouteBuilder::new();
        router.resource("blog", "index/blog").unwrap().register().unwrap();
        router.option(EXCEPT, json!(["delete", "edit"])).unwrap();

        assert_eq!(router.finish().unwrap().rule_count(), 5);
    }

    #[test]
    fn test_failed_resource_keeps_siblings() {
        let mut router = RouteBuilder::new();
        let good = router.resource("blog", "index/blog").unwrap().register().unwrap();
        router
            .resource("shop.item", "index/item")
            .unwrap()
            .rest("bad", RestAction::new(Verb::Get, "bad", "bad"))
            .register()
            .unwrap();

        let err = router.build_pending().unwrap_err();
        assert!(matches!(err, ConfigurationError::MalformedRestEntry { .. }));
        assert_eq!(router.tree().children(good).count(), 7);
        assert_eq!(router.current_group(), router.tree().root());
    }

    #[test]
    fn test_failed_resource_does_not_block_later_ones() {
        let mut router = RouteBuilder::new();
        let bad = router
            .resource("shop.item", "index/item")
            .unwrap()
            .rest("bad", RestAction::new(Verb::Get, "bad", "bad"))
            .register()
            .unwrap();
        let good = router.resource("blog", "index/blog").unwrap().register().unwrap();

        let err = router.build_pending().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MalformedRestEntry { ref resource, .. } if resource == "shop.item"
        ));
        assert_eq!(router.tree().children(good).count(), 7);
        assert!(!router.tree().group(good).unwrap().is_pending());

        let bad_group = router.tree().group(bad).unwrap();
        assert!(bad_group.is_failed());
        assert!(!bad_group.is_pending());
        assert_eq!(router.tree().children(bad).count(), 0);

        // The rejected resource is not retried.
        let later = router.resource("page", "index/page").unwrap().register().unwrap();
        assert_eq!(router.build_pending(), Ok(7));
        assert_eq!(router.tree().children(later).count(), 7);
        assert_eq!(router.current_group(), router.tree().root());
    }

    #[test]
    fn test_eager_register_restores_active_group() {
        let mut router = RouteBuilder::new().eager(true);
        let root = router.current_group();
        let group = router.resource("blog", "index/blog").unwrap().register().unwrap();
        assert_eq!(router.current_group(), root);
        assert!(!router.tree().group(group).unwrap().is_pending());

        let err = router
            .resource("shop.item", "index/item")
            .unwrap()
            .rest("bad", RestAction::new(Verb::Get, "bad", "bad"))
            .register();
        assert!(err.is_err());
        assert_eq!(router.current_group(), root);
        assert_eq!(router.tree().group_count(), 2);
    }

    #[test]
    fn test_plain_rules_inherit_complete_match() {
        let mut router = RouteBuilder::new();
        router
            .group("api", |r| {
                r.option(COMPLETE_MATCH, true)?;
                r.rule(Verb::Get, "/status/", "api/status")?;
                Ok(())
            })
            .unwrap();
        router.rule(Verb::Any, "hello", "index/hello").unwrap();

        let tree = router.finish().unwrap();
        let entries = tree.entries();
        assert_eq!(entries[0].path, "api/status");
        assert!(entries[0].complete_match);
        assert!(!entries[1].complete_match);
    }

    #[test]
    fn test_resource_builder_bindings() {
        let mut router = RouteBuilder::new().eager(true);
        let group = router
            .resource("blog", "index/blog")
            .unwrap()
            .with_model([("read", "Blog")])
            .with_validate([("save", json!(["BlogValidate", "create"]))])
            .register()
            .unwrap();

        let tree = router.finish().unwrap();
        let rules: Vec<_> = tree
            .children(group)
            .filter_map(|c| match c {
                ChildRef::Rule(_, node) => Some(node),
                ChildRef::Group(..) => None,
            })
            .collect();
        let read = rules.iter().find(|n| n.action() == Some("read")).unwrap();
        let save = rules.iter().find(|n| n.action() == Some("save")).unwrap();
        assert_eq!(read.model(), Some(&BindingSpec::from("Blog")));
        assert_eq!(
            save.validate().map(BindingSpec::as_value),
            Some(&json!(["BlogValidate", "create"]))
        );
    }
}
