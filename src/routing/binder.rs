//! Post-expansion attribute binding.

use crate::routing::rule::{BindingKind, BindingSpec, RuleNode};

/// Attaches model/validate bindings to emitted rules.
///
/// Stateless. The payload is carried as-is; a later bind of the same kind
/// replaces the earlier one.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeBinder;

impl AttributeBinder {
    pub fn bind(node: &mut RuleNode, kind: BindingKind, spec: BindingSpec) {
        tracing::trace!(
            pattern = %node.pattern(),
            kind = ?kind,
            spec = %spec,
            "Binding attached"
        );
        *node.binding_slot(kind) = Some(spec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::rule::Verb;

    #[test]
    fn test_bind_overwrites_same_kind_only() {
        let mut node = RuleNode::new(Verb::Put, "<id>", "index/blog/update");

        AttributeBinder::bind(&mut node, BindingKind::Model, "Blog".into());
        AttributeBinder::bind(&mut node, BindingKind::Validate, "BlogValidate".into());
        AttributeBinder::bind(&mut node, BindingKind::Model, "Post".into());

        assert_eq!(node.model(), Some(&BindingSpec::from("Post")));
        assert_eq!(node.validate(), Some(&BindingSpec::from("BlogValidate")));
    }
}
