//! Evaluation of compiled location paths over a roxmltree document.

use roxmltree::{Attribute, Node};

use super::{Axis, NodeTest, Predicate, Step, XPath};
use crate::xml::{get_tag_name, qualified_name, string_value};

#[derive(Clone)]
enum Item<'a, 'input> {
    Node(Node<'a, 'input>),
    Value(String),
}

impl Item<'_, '_> {
    fn into_string(self) -> String {
        match self {
            Item::Node(node) => string_value(node),
            Item::Value(value) => value,
        }
    }
}

pub(super) fn evaluate(path: &XPath, context: Node<'_, '_>) -> Vec<String> {
    let start = if path.absolute {
        context.document().root()
    } else {
        context
    };

    let mut current = vec![Item::Node(start)];
    for step in &path.steps {
        let mut next = Vec::new();
        for item in &current {
            // Attributes have no children.
            let Item::Node(node) = item else { continue };
            // `//name` is descendant-or-self::node() followed by a child step,
            // so predicates apply per parent.
            let parents: Vec<Node<'_, '_>> = if step.axis == Axis::Descendant {
                node.descendants().collect()
            } else {
                vec![*node]
            };
            for parent in parents {
                let mut selected = select(step, parent);
                for predicate in &step.predicates {
                    selected = apply(predicate, selected);
                }
                next.extend(selected);
            }
        }
        if step.axis != Axis::Attribute {
            next = in_document_order(next);
        }
        current = next;
    }

    current.into_iter().map(Item::into_string).collect()
}

fn select<'a, 'input>(step: &Step, node: Node<'a, 'input>) -> Vec<Item<'a, 'input>> {
    match step.axis {
        Axis::Child | Axis::Descendant => node
            .children()
            .filter(|n| matches_node(&step.test, *n))
            .map(Item::Node)
            .collect(),
        Axis::SelfNode => vec![Item::Node(node)],
        Axis::Parent => node.parent().map(Item::Node).into_iter().collect(),
        Axis::Attribute => {
            if !node.is_element() {
                return Vec::new();
            }
            node.attributes()
                .filter(|a| matches_attribute(&step.test, a))
                .map(|a| Item::Value(a.value().to_string()))
                .collect()
        }
    }
}

fn matches_node(test: &NodeTest, node: Node<'_, '_>) -> bool {
    match test {
        NodeTest::Name { namespace, local } => {
            node.is_element()
                && get_tag_name(node) == local
                && node.tag_name().namespace() == namespace.as_deref()
        }
        NodeTest::AnyInNamespace(namespace) => {
            node.is_element() && node.tag_name().namespace() == Some(namespace.as_str())
        }
        NodeTest::Any => node.is_element(),
        NodeTest::Text => node.is_text(),
        NodeTest::AnyNode => true,
    }
}

fn matches_attribute(test: &NodeTest, attribute: &Attribute<'_, '_>) -> bool {
    match test {
        NodeTest::Name { namespace, local } => {
            attribute.name() == local && attribute.namespace() == namespace.as_deref()
        }
        NodeTest::AnyInNamespace(namespace) => attribute.namespace() == Some(namespace.as_str()),
        NodeTest::Any => true,
        NodeTest::Text | NodeTest::AnyNode => false,
    }
}

fn apply<'a, 'input>(predicate: &Predicate, items: Vec<Item<'a, 'input>>) -> Vec<Item<'a, 'input>> {
    match predicate {
        Predicate::Position(n) => items.into_iter().nth(n - 1).into_iter().collect(),
        _ => items
            .into_iter()
            .filter(|item| match item {
                Item::Node(node) => holds(predicate, *node),
                Item::Value(_) => false,
            })
            .collect(),
    }
}

fn holds(predicate: &Predicate, node: Node<'_, '_>) -> bool {
    if !node.is_element() {
        return false;
    }
    match predicate {
        Predicate::Position(_) => true,
        Predicate::NameEquals(name) => qualified_name(node) == *name,
        Predicate::LocalNameEquals(name) => get_tag_name(node) == name,
        Predicate::AttributeEquals {
            namespace,
            local,
            value,
        } => node.attributes().any(|a| {
            a.name() == local && a.namespace() == namespace.as_deref() && a.value() == value
        }),
    }
}

/// Sort selected nodes into document order and drop duplicates reached
/// through more than one context node.
fn in_document_order<'a, 'input>(items: Vec<Item<'a, 'input>>) -> Vec<Item<'a, 'input>> {
    let mut nodes: Vec<Node<'a, 'input>> = items
        .into_iter()
        .filter_map(|item| match item {
            Item::Node(node) => Some(node),
            Item::Value(_) => None,
        })
        .collect();
    nodes.sort_by_key(|n| n.id().get());
    nodes.dedup_by_key(|n| n.id().get());
    nodes.into_iter().map(Item::Node).collect()
}
