use std::cmp::Ordering;

use serde_json::Value;

use super::parser::{CmpOp, Filter, Literal, Step};

/// Applies `steps` to `root` and returns every selected value in document
/// order. Branches that do not match are dropped.
pub(crate) fn select<'v>(steps: &[Step], root: &'v Value) -> Vec<&'v Value> {
    let mut current = vec![root];
    for step in steps {
        let mut next = Vec::new();
        for value in current {
            apply(step, value, &mut next);
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current
}

fn apply<'v>(step: &Step, value: &'v Value, out: &mut Vec<&'v Value>) {
    match (step, value) {
        (Step::Child(name), Value::Object(map)) => out.extend(map.get(name)),
        (Step::Index(index), Value::Array(items)) => {
            out.extend(resolve_index(*index, items.len()).map(|i| &items[i]))
        }
        (Step::Union(indices), Value::Array(items)) => out.extend(
            indices
                .iter()
                .filter_map(|index| resolve_index(*index, items.len()))
                .map(|i| &items[i]),
        ),
        (Step::Slice { start, end }, Value::Array(items)) => {
            let (start, end) = slice_bounds(*start, *end, items.len());
            if start < end {
                out.extend(items[start..end].iter());
            }
        }
        (Step::Wildcard, Value::Array(items)) => out.extend(items.iter()),
        (Step::Wildcard, Value::Object(map)) => out.extend(map.values()),
        (Step::Descendant(name), _) => descend(name, value, out),
        (Step::Filter(filter), Value::Array(items)) => {
            out.extend(items.iter().filter(|item| filter.matches(item)))
        }
        _ => {}
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn slice_bounds(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let len = len as i64;
    let clamp = |i: i64| (if i < 0 { (len + i).max(0) } else { i.min(len) }) as usize;
    (start.map_or(0, clamp), end.map_or(len as usize, clamp))
}

fn descend<'v>(name: &str, value: &'v Value, out: &mut Vec<&'v Value>) {
    match value {
        Value::Object(map) => {
            out.extend(map.get(name));
            for child in map.values() {
                descend(name, child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                descend(name, child, out);
            }
        }
        _ => {}
    }
}

impl Filter {
    fn matches(&self, item: &Value) -> bool {
        let target = self
            .field
            .iter()
            .try_fold(item, |value, name| value.get(name.as_str()));

        match (target, &self.comparison) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(target), Some((op, literal))) => compare(target, *op, literal),
        }
    }
}

fn compare(value: &Value, op: CmpOp, literal: &Literal) -> bool {
    let ordering = match (value, literal) {
        (Value::Number(n), Literal::Number(rhs)) => n.as_f64().and_then(|lhs| lhs.partial_cmp(rhs)),
        (Value::String(s), Literal::String(rhs)) => Some(s.as_str().cmp(rhs.as_str())),
        (Value::Bool(b), Literal::Bool(rhs)) => Some(b.cmp(rhs)),
        (Value::Null, Literal::Null) => Some(Ordering::Equal),
        _ => None,
    };

    match ordering {
        // mismatched types are only ever unequal
        None => op == CmpOp::Ne,
        Some(ordering) => match op {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonpath::parser::parse;
    use serde_json::json;

    fn run(query: &str, document: &Value) -> Vec<Value> {
        let steps = parse(query).unwrap();
        select(&steps, document).into_iter().cloned().collect()
    }

    #[test]
    fn test_select_member_and_index() {
        let doc = json!({"a": {"b": [10, 20, 30]}});
        assert_eq!(run("$.a.b[1]", &doc), vec![json!(20)]);
        assert_eq!(run("$.a.b[-1]", &doc), vec![json!(30)]);
        assert_eq!(run("$['a']['b'][0]", &doc), vec![json!(10)]);
        assert!(run("$.a.b[3]", &doc).is_empty());
        assert!(run("$.a.c", &doc).is_empty());
        assert!(run("$.a.b.c", &doc).is_empty());
    }

    #[test]
    fn test_select_root() {
        let doc = json!(7);
        assert_eq!(run("$", &doc), vec![json!(7)]);
    }

    #[test]
    fn test_select_slices_and_unions() {
        let doc = json!([0, 1, 2, 3, 4]);
        assert_eq!(run("$[1:3]", &doc), vec![json!(1), json!(2)]);
        assert_eq!(run("$[-2:]", &doc), vec![json!(3), json!(4)]);
        assert_eq!(run("$[:2]", &doc), vec![json!(0), json!(1)]);
        assert!(run("$[3:1]", &doc).is_empty());
        assert_eq!(run("$[4,0,9]", &doc), vec![json!(4), json!(0)]);
    }

    #[test]
    fn test_select_wildcards() {
        let doc = json!({"a": {"v": 1}, "b": {"v": 2}});
        assert_eq!(run("$.*.v", &doc), vec![json!(1), json!(2)]);
        assert_eq!(run("$[*].v", &doc), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_select_descendants() {
        let doc = json!({
            "v": 1,
            "nested": {"v": 2, "deeper": [{"v": 3}, {"w": 4}]}
        });
        assert_eq!(run("$..v", &doc), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_select_filters() {
        let doc = json!({"pods": [
            {"name": "a", "ready": true, "load": 0.2},
            {"name": "b", "ready": false, "load": 0.9},
            {"name": "c", "ready": true, "load": 0.7},
            {"name": "d"}
        ]});
        assert_eq!(
            run("$.pods[?(@.ready == true)].load", &doc),
            vec![json!(0.2), json!(0.7)]
        );
        assert_eq!(run("$.pods[?(@.load > 0.5)].name", &doc), vec![json!("b"), json!("c")]);
        assert_eq!(run("$.pods[?(@.load)]", &doc).len(), 3);
        assert_eq!(run("$.pods[?(@.name != 'a')]", &doc).len(), 3);
        assert_eq!(run("$.pods[?(@.ready != true)].name", &doc), vec![json!("b")]);
    }

    #[test]
    fn test_filter_on_element_itself() {
        let doc = json!([1, 5, "x", 10]);
        assert_eq!(run("$[?(@ >= 5)]", &doc), vec![json!(5), json!(10)]);
    }
}
