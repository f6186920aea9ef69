//! The compiled rule tree.
//!
//! # Layout
//! ```text
//! RuleTree
//!   groups: [root, blog, blog.comment, ...]   (arena, indexed by GroupId)
//!   rules:  [index, create, ...]              (arena, indexed by RuleId)
//!
//! RuleGroup.children: ordered [Rule(RuleId) | Group(GroupId)]
//! RuleGroup.parent:   Option<GroupId>  (lookup only: domain, options)
//! ```
//!
//! # Design Decisions
//! - The tree owns every group and rule; ids are plain indices
//! - Parent links are never used for ownership, only inheritance lookups
//! - Nothing is ever removed, so ids stay valid for the tree's lifetime
//! - Plain data: `Send + Sync`, shareable behind `Arc` once compiled

use serde::Serialize;
use serde_json::Value;

use crate::routing::binder::AttributeBinder;
use crate::routing::error::{ConfigurationError, RouteResult};
use crate::routing::options::OptionSet;
use crate::routing::resource::ResourceSpec;
use crate::routing::rule::{BindingKind, BindingSpec, RuleNode, Verb};

/// Index of a group inside its [`RuleTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl GroupId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a rule inside its [`RuleTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A child slot of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Rule(RuleId),
    Group(GroupId),
}

/// A child resolved against the tree.
#[derive(Debug, Clone, Copy)]
pub enum ChildRef<'a> {
    Rule(RuleId, &'a RuleNode),
    Group(GroupId, &'a RuleGroup),
}

/// A container of rules and nested groups.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    name: String,
    full_name: String,
    parent: Option<GroupId>,
    domain: Option<String>,
    options: OptionSet,
    children: Vec<Child>,
    resource: Option<ResourceSpec>,
    compiled: bool,
    failed: bool,
}

impl RuleGroup {
    fn new(name: String, full_name: String, parent: Option<GroupId>) -> Self {
        Self {
            name,
            full_name,
            parent,
            domain: None,
            options: OptionSet::new(),
            children: Vec::new(),
            resource: None,
            compiled: false,
            failed: false,
        }
    }

    /// The group's own path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every ancestor's segment plus this one, joined by `/`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Domain declared on this group itself (see [`RuleTree::domain`]).
    pub fn declared_domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Options declared on this group itself (see [`RuleTree::get_option`]).
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn child_ids(&self) -> &[Child] {
        &self.children
    }

    /// Resource this group was declared for, if any.
    pub fn resource(&self) -> Option<&ResourceSpec> {
        self.resource.as_ref()
    }

    /// A resource group whose rules have not been emitted yet.
    pub fn is_pending(&self) -> bool {
        self.resource.is_some() && !self.compiled && !self.failed
    }

    /// A resource group whose build was rejected. It holds no rules and is
    /// never built again.
    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

/// Flattened view of one rule, with inherited attributes applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEntry {
    pub verb: Verb,
    pub path: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub complete_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<BindingSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate: Option<BindingSpec>,
}

/// Arena-backed tree of groups and rules.
#[derive(Debug, Clone)]
pub struct RuleTree {
    groups: Vec<RuleGroup>,
    rules: Vec<RuleNode>,
    rule_owner: Vec<GroupId>,
}

impl Default for RuleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTree {
    /// A tree holding only the unnamed root group.
    pub fn new() -> Self {
        Self {
            groups: vec![RuleGroup::new(String::new(), String::new(), None)],
            rules: Vec::new(),
            rule_owner: Vec::new(),
        }
    }

    pub fn root(&self) -> GroupId {
        GroupId(0)
    }

    pub fn group(&self, id: GroupId) -> Option<&RuleGroup> {
        self.groups.get(id.0)
    }

    pub fn rule(&self, id: RuleId) -> Option<&RuleNode> {
        self.rules.get(id.0)
    }

    /// Group a rule was registered into.
    pub fn rule_group(&self, id: RuleId) -> Option<GroupId> {
        self.rule_owner.get(id.0).copied()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn group_mut(&mut self, id: GroupId) -> RouteResult<&mut RuleGroup> {
        self.groups
            .get_mut(id.0)
            .ok_or(ConfigurationError::UnknownGroup(id.0))
    }

    /// Append a plain child group.
    pub fn add_group(&mut self, parent: GroupId, name: &str) -> RouteResult<GroupId> {
        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(ConfigurationError::EmptyGroupName);
        }
        self.push_group(parent, name.to_string())
    }

    /// Append a resource group. Its rules are emitted later by the compiler.
    pub(crate) fn add_resource_group(
        &mut self,
        parent: GroupId,
        spec: ResourceSpec,
        options: OptionSet,
    ) -> RouteResult<GroupId> {
        let id = self.push_group(parent, spec.group_name().to_string())?;
        let group = &mut self.groups[id.0];
        group.options = options;
        group.resource = Some(spec);
        Ok(id)
    }

    fn push_group(&mut self, parent: GroupId, name: String) -> RouteResult<GroupId> {
        let parent_full = self
            .group(parent)
            .ok_or(ConfigurationError::UnknownGroup(parent.0))?
            .full_name();
        let full_name = if parent_full.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", parent_full, name)
        };

        let id = GroupId(self.groups.len());
        self.groups.push(RuleGroup::new(name, full_name, Some(parent)));
        self.groups[parent.0].children.push(Child::Group(id));
        Ok(id)
    }

    /// Register a rule at the end of `group`'s children.
    pub fn add_rule(&mut self, group: GroupId, node: RuleNode) -> RouteResult<RuleId> {
        let id = RuleId(self.rules.len());
        self.group_mut(group)?.children.push(Child::Rule(id));
        self.rules.push(node);
        self.rule_owner.push(group);
        Ok(id)
    }

    pub fn set_option(
        &mut self,
        group: GroupId,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> RouteResult<()> {
        self.group_mut(group)?.options.set(key, value);
        Ok(())
    }

    /// Option lookup with inheritance: the nearest group declaring `key` wins.
    pub fn get_option(&self, group: GroupId, key: &str) -> Option<&Value> {
        self.ancestors(group).find_map(|g| g.options.get(key))
    }

    pub fn set_domain(&mut self, group: GroupId, domain: impl Into<String>) -> RouteResult<()> {
        self.group_mut(group)?.domain = Some(domain.into());
        Ok(())
    }

    /// Domain of the nearest group (self included) that declares one.
    pub fn domain(&self, group: GroupId) -> Option<&str> {
        self.ancestors(group).find_map(|g| g.domain.as_deref())
    }

    /// `group` followed by its parents up to the root.
    fn ancestors(&self, group: GroupId) -> impl Iterator<Item = &RuleGroup> {
        std::iter::successors(self.group(group), move |g| {
            g.parent.and_then(|p| self.group(p))
        })
    }

    /// Children of `group` in insertion order. Empty for unknown ids.
    pub fn children(&self, group: GroupId) -> Children<'_> {
        let ids = self
            .group(group)
            .map(|g| g.children.as_slice())
            .unwrap_or_default();
        Children {
            tree: self,
            ids: ids.iter(),
        }
    }

    /// Rule pattern prefixed with its group's full name.
    pub fn full_pattern(&self, rule: RuleId) -> Option<String> {
        let node = self.rule(rule)?;
        let group = self.group(self.rule_group(rule)?)?;
        Some(join_path(group.full_name(), node.pattern()))
    }

    /// First direct child rule of `group` emitted for action `key`.
    pub fn find_action(&self, group: GroupId, key: &str) -> Option<RuleId> {
        self.children(group).find_map(|child| match child {
            ChildRef::Rule(id, node) if node.action() == Some(key) => Some(id),
            _ => None,
        })
    }

    /// Attach a binding to an already registered rule.
    pub fn bind(&mut self, rule: RuleId, kind: BindingKind, spec: BindingSpec) -> RouteResult<()> {
        let node = self
            .rules
            .get_mut(rule.0)
            .ok_or(ConfigurationError::UnknownRule(rule.0))?;
        AttributeBinder::bind(node, kind, spec);
        Ok(())
    }

    /// Bind by action key. Returns the rule bound, or `None` when the resource
    /// emitted no rule for `key` (filtered out or not in its table).
    pub fn bind_action(
        &mut self,
        group: GroupId,
        key: &str,
        kind: BindingKind,
        spec: BindingSpec,
    ) -> RouteResult<Option<RuleId>> {
        if self.group(group).is_none() {
            return Err(ConfigurationError::UnknownGroup(group.0));
        }
        let Some(rule) = self.find_action(group, key) else {
            return Ok(None);
        };
        self.bind(rule, kind, spec)?;
        Ok(Some(rule))
    }

    /// Resource groups still waiting for compilation, in declaration order.
    pub fn pending_resources(&self) -> Vec<GroupId> {
        let mut pending = Vec::new();
        self.walk(self.root(), &mut |child| {
            if let ChildRef::Group(id, group) = child {
                if group.is_pending() {
                    pending.push(id);
                }
            }
        });
        pending
    }

    pub(crate) fn mark_compiled(&mut self, group: GroupId) -> RouteResult<()> {
        self.group_mut(group)?.compiled = true;
        Ok(())
    }

    pub(crate) fn mark_failed(&mut self, group: GroupId) -> RouteResult<()> {
        self.group_mut(group)?.failed = true;
        Ok(())
    }

    /// Every rule, depth-first in insertion order, with inheritance applied.
    pub fn entries(&self) -> Vec<RouteEntry> {
        let mut entries = Vec::with_capacity(self.rules.len());
        self.walk(self.root(), &mut |child| {
            if let ChildRef::Rule(id, node) = child {
                let group = self.rule_owner[id.0];
                entries.push(RouteEntry {
                    verb: node.verb(),
                    path: join_path(self.groups[group.0].full_name(), node.pattern()),
                    target: node.target().to_string(),
                    domain: self.domain(group).map(str::to_string),
                    action: node.action().map(str::to_string),
                    complete_match: node.complete_match(),
                    model: node.model().cloned(),
                    validate: node.validate().cloned(),
                });
            }
        });
        entries
    }

    fn walk<'a>(&'a self, group: GroupId, visit: &mut dyn FnMut(ChildRef<'a>)) {
        for child in self.children(group) {
            visit(child);
            if let ChildRef::Group(id, _) = child {
                self.walk(id, visit);
            }
        }
    }
}

/// Lazy iterator over a group's children.
pub struct Children<'a> {
    tree: &'a RuleTree,
    ids: std::slice::Iter<'a, Child>,
}

impl<'a> Iterator for Children<'a> {
    type Item = ChildRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let child = self.ids.next()?;
        Some(match *child {
            Child::Rule(id) => ChildRef::Rule(id, &self.tree.rules[id.0]),
            Child::Group(id) => ChildRef::Group(id, &self.tree.groups[id.0]),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

fn join_path(prefix: &str, pattern: &str) -> String {
    match (prefix.is_empty(), pattern.is_empty()) {
        (true, _) => pattern.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, pattern),
    }
}
