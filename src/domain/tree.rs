//! Object-literal tree with an "ensure path, create missing intermediates"
//! operation.
//!
//! The tree is parser independent. An adapter lifts an existing literal into
//! an [`ObjectLit`] (attaching its own anchor type to every literal that
//! exists in the source), runs [`ensure_path`], then lowers the inserted
//! properties back into its own representation via [`pending_insertions`].

/// An object literal. `anchor` is `Some` for literals that exist in the
/// source and `None` for literals synthesized by [`ensure_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLit<A> {
    pub anchor: Option<A>,
    pub props: Vec<Property<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property<A> {
    /// `None` for spreads, computed keys and methods.
    pub key: Option<String>,
    pub value: PropValue<A>,
    /// Added by [`ensure_path`] rather than read from the source.
    pub inserted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue<A> {
    Object(ObjectLit<A>),
    /// Rendered expression source for an inserted leaf.
    Expr(String),
    /// Any existing value that is not an object literal.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Inserted,
    /// The leaf key already exists at the end of the path.
    AlreadyPresent,
    /// A path segment exists but does not hold an object literal.
    Blocked,
}

impl<A> ObjectLit<A> {
    pub fn existing(anchor: A) -> Self {
        Self {
            anchor: Some(anchor),
            props: Vec::new(),
        }
    }

    pub fn synthesized() -> Self {
        Self {
            anchor: None,
            props: Vec::new(),
        }
    }

    /// Record a property read from the source.
    pub fn with_prop(mut self, key: Option<&str>, value: PropValue<A>) -> Self {
        self.props.push(Property {
            key: key.map(str::to_string),
            value,
            inserted: false,
        });
        self
    }

    /// Later duplicates shadow earlier ones, as at runtime.
    fn position(&self, key: &str) -> Option<usize> {
        self.props
            .iter()
            .rposition(|p| p.key.as_deref() == Some(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&PropValue<A>> {
        self.position(key).map(|i| &self.props[i].value)
    }

    fn push_inserted(&mut self, key: &str, value: PropValue<A>) -> &mut PropValue<A> {
        self.props.push(Property {
            key: Some(key.to_string()),
            value,
            inserted: true,
        });
        let last = self.props.len() - 1;
        &mut self.props[last].value
    }
}

/// Walk `path` from `root`, creating missing object levels, then append
/// `leaf_key: leaf_expr` to the innermost object. Existing properties are
/// never removed or reordered.
pub fn ensure_path<A>(
    root: &mut ObjectLit<A>,
    path: &[&str],
    leaf_key: &str,
    leaf_expr: &str,
) -> EnsureOutcome {
    let Some((head, rest)) = path.split_first() else {
        if root.contains_key(leaf_key) {
            return EnsureOutcome::AlreadyPresent;
        }
        root.push_inserted(leaf_key, PropValue::Expr(leaf_expr.to_string()));
        return EnsureOutcome::Inserted;
    };

    let slot = match root.position(head) {
        Some(i) => &mut root.props[i].value,
        None => root.push_inserted(head, PropValue::Object(ObjectLit::synthesized())),
    };

    match slot {
        PropValue::Object(child) => ensure_path(child, rest, leaf_key, leaf_expr),
        _ => EnsureOutcome::Blocked,
    }
}

/// Render a property key, quoting it when it is not a plain identifier.
pub fn render_key(key: &str) -> String {
    let plain = key
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if plain {
        key.to_string()
    } else {
        format!("{:?}", key)
    }
}

pub fn render_property<A>(prop: &Property<A>) -> Option<String> {
    let key = prop.key.as_deref()?;
    let value = match &prop.value {
        PropValue::Object(obj) => render_object(obj),
        PropValue::Expr(expr) => expr.clone(),
        PropValue::Opaque => return None,
    };
    Some(format!("{}: {}", render_key(key), value))
}

/// Render a synthesized literal. Opaque values have no source of their own
/// and are skipped; they only ever come from existing literals.
pub fn render_object<A>(obj: &ObjectLit<A>) -> String {
    let parts: Vec<String> = obj.props.iter().filter_map(render_property).collect();
    if parts.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", parts.join(", "))
    }
}

/// For every literal that exists in the source, the rendered properties
/// that must be appended to it, in tree order.
pub fn pending_insertions<A>(root: &ObjectLit<A>) -> Vec<(&A, Vec<String>)> {
    let mut out = Vec::new();
    collect_insertions(root, &mut out);
    out
}

fn collect_insertions<'a, A>(obj: &'a ObjectLit<A>, out: &mut Vec<(&'a A, Vec<String>)>) {
    let Some(anchor) = obj.anchor.as_ref() else {
        return;
    };
    let added: Vec<String> = obj
        .props
        .iter()
        .filter(|p| p.inserted)
        .filter_map(render_property)
        .collect();
    if !added.is_empty() {
        out.push((anchor, added));
    }
    for prop in obj.props.iter().filter(|p| !p.inserted) {
        if let PropValue::Object(child) = &prop.value {
            collect_insertions(child, out);
        }
    }
}
