//! Handling of property names that contain `.` separators.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

use crate::value::{PropertyValue, Structure};

/// Property entries as they will be written, in output order.
pub type ProcessedProperties<'a> = Vec<(Cow<'a, str>, Cow<'a, PropertyValue>)>;

/// Decides how dotted property names appear in formatted output.
///
/// Selected once when a formatter is built and shared across threads.
pub trait DottedNameConvention: Send + Sync + fmt::Debug {
    fn process<'a>(&self, properties: &'a IndexMap<String, PropertyValue>) -> ProcessedProperties<'a>;
}

/// Emits every property under its name, verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveDottedNames;

impl DottedNameConvention for PreserveDottedNames {
    fn process<'a>(&self, properties: &'a IndexMap<String, PropertyValue>) -> ProcessedProperties<'a> {
        properties
            .iter()
            .map(|(name, value)| (Cow::Borrowed(name.as_str()), Cow::Borrowed(value)))
            .collect()
    }
}

/// Nests `a.b.c` as `{"a":{"b":{"c":...}}}`, merging shared prefixes.
///
/// Names with an empty segment (`.a`, `a.`, `a..b`) are left flat. When a
/// path runs through a name that already holds a value, or a plain value
/// lands on a name that already holds nested entries, the later property
/// wins; the name keeps the position where it first appeared.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnflattenDottedNames;

const SEPARATOR: char = '.';

#[derive(Default)]
struct Node<'a> {
    value: Option<&'a PropertyValue>,
    children: IndexMap<&'a str, Node<'a>>,
}

impl<'a> Node<'a> {
    fn set(&mut self, value: &'a PropertyValue) {
        self.value = Some(value);
        self.children.clear();
    }

    fn descend(&mut self, segment: &'a str) -> &mut Node<'a> {
        let child = self.children.entry(segment).or_default();
        child.value = None;
        child
    }

    fn into_value(self) -> Cow<'a, PropertyValue> {
        if self.children.is_empty() {
            return Cow::Borrowed(self.value.unwrap_or(&NULL));
        }

        let fields = self
            .children
            .into_iter()
            .map(|(name, child)| (name.to_string(), child.into_value().into_owned()))
            .collect();
        Cow::Owned(PropertyValue::Structure(Structure::new(fields)))
    }
}

static NULL: PropertyValue = PropertyValue::Scalar(crate::value::Scalar::Null);

fn is_dotted(name: &str) -> bool {
    name.contains(SEPARATOR) && name.split(SEPARATOR).all(|segment| !segment.is_empty())
}

impl DottedNameConvention for UnflattenDottedNames {
    fn process<'a>(&self, properties: &'a IndexMap<String, PropertyValue>) -> ProcessedProperties<'a> {
        if !properties.keys().any(|name| is_dotted(name)) {
            return PreserveDottedNames.process(properties);
        }

        let mut root = Node::default();
        for (name, value) in properties {
            if !is_dotted(name) {
                root.children.entry(name.as_str()).or_default().set(value);
                continue;
            }

            let mut segments = name.split(SEPARATOR);
            let mut node = &mut root;
            let Some(leaf) = segments.next_back() else {
                continue;
            };
            for segment in segments {
                node = node.descend(segment);
            }
            node.children.entry(leaf).or_default().set(value);
        }

        root.children
            .into_iter()
            .map(|(name, node)| (Cow::Borrowed(name), node.into_value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(entries: Vec<(&str, PropertyValue)>) -> IndexMap<String, PropertyValue> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn owned(processed: ProcessedProperties<'_>) -> Vec<(String, PropertyValue)> {
        processed
            .into_iter()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn structure(fields: Vec<(&str, PropertyValue)>) -> PropertyValue {
        Structure::new(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()).into()
    }

    #[test]
    fn preserve_is_identity() {
        let properties = props(vec![("a.b", 1.into()), ("a.c", 2.into()), ("z", 3.into())]);
        let processed = owned(PreserveDottedNames.process(&properties));
        assert_eq!(
            processed,
            vec![
                ("a.b".to_string(), 1.into()),
                ("a.c".to_string(), 2.into()),
                ("z".to_string(), 3.into()),
            ]
        );
    }

    #[test]
    fn unflatten_merges_prefixes() {
        let properties = props(vec![
            ("x", 0.into()),
            ("a.b", 1.into()),
            ("y", 9.into()),
            ("a.c", 2.into()),
            ("a.d.e", 3.into()),
        ]);
        let processed = owned(UnflattenDottedNames.process(&properties));
        assert_eq!(
            processed,
            vec![
                ("x".to_string(), 0.into()),
                (
                    "a".to_string(),
                    structure(vec![
                        ("b", 1.into()),
                        ("c", 2.into()),
                        ("d", structure(vec![("e", 3.into())])),
                    ])
                ),
                ("y".to_string(), 9.into()),
            ]
        );
    }

    #[test]
    fn empty_segments_stay_flat() {
        let properties = props(vec![(".a", 1.into()), ("b.", 2.into()), ("c..d", 3.into())]);
        let processed = owned(UnflattenDottedNames.process(&properties));
        let names: Vec<_> = processed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec![".a", "b.", "c..d"]);
    }

    #[test]
    fn later_nested_value_replaces_leaf() {
        let properties = props(vec![("a", 1.into()), ("b", 0.into()), ("a.b", 2.into())]);
        let processed = owned(UnflattenDottedNames.process(&properties));
        assert_eq!(
            processed,
            vec![
                ("a".to_string(), structure(vec![("b", 2.into())])),
                ("b".to_string(), 0.into()),
            ]
        );
    }

    #[test]
    fn later_leaf_replaces_nested_value() {
        let properties = props(vec![("a.b", 2.into()), ("a", 1.into())]);
        let processed = owned(UnflattenDottedNames.process(&properties));
        assert_eq!(processed, vec![("a".to_string(), 1.into())]);

        let properties = props(vec![("a.b.c", 1.into()), ("a.b", 2.into()), ("a.d", 3.into())]);
        let processed = owned(UnflattenDottedNames.process(&properties));
        assert_eq!(
            processed,
            vec![("a".to_string(), structure(vec![("b", 2.into()), ("d", 3.into())]))]
        );
    }

    #[test]
    fn existing_structures_are_not_merged_into() {
        let properties = props(vec![
            ("a", structure(vec![("x", 1.into())])),
            ("a.y", 2.into()),
        ]);
        let processed = owned(UnflattenDottedNames.process(&properties));
        assert_eq!(processed, vec![("a".to_string(), structure(vec![("y", 2.into())]))]);
    }
}
