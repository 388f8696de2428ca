//! Syntax-only call-site detection shared by the Injector and the Analyzer.
//!
//! Nothing here resolves what the chain root actually refers to. Any object
//! exposing a same-named method will match; that precision loss is accepted in
//! exchange for never needing a type checker during builds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal methods of the typed RPC client: vanilla invocation, React hooks,
/// and server-side prefetch / cache-priming helpers.
pub const TERMINAL_METHODS: &[&str] = &[
    "query",
    "mutation",
    "useQuery",
    "useMutation",
    "useSuspenseQuery",
    "useSuspenseInfiniteQuery",
    "useInfiniteQuery",
    "prefetch",
    "fetchQuery",
    "fetchInfiniteQuery",
    "prefetchQuery",
    "prefetchInfiniteQuery",
    "ensureQueryData",
];

/// Root identifiers the Analyzer recognizes as the typed client.
///
/// Projects aliasing their client to another name are under-counted.
pub const CLIENT_ROOTS: &[&str] = &["trpc", "api"];

/// Placeholder procedure path when a chain has nothing between root and terminal.
pub const ROOT_PROCEDURE: &str = "(root)";

pub fn is_terminal_method(name: &str) -> bool {
    TERMINAL_METHODS.contains(&name)
}

/// Does a `receiver.property(...)` call look like a remote-procedure
/// invocation?
///
/// The property must be a terminal method and the receiver must itself be a
/// property access, so `root.procedure.terminal` is the minimum shape and
/// `x.query()` is rejected. What sits further up the receiver (calls,
/// computed access) does not matter: `trpc.useUtils().post.list.prefetch()`
/// matches.
pub fn is_remote_call(property: &str, receiver_is_member: bool) -> bool {
    receiver_is_member && is_terminal_method(property)
}

/// Procedure path and terminal method extracted from a client chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureRef {
    pub procedure_path: String,
    pub method: String,
}

/// Extract `(procedure path, method)` from a chain rooted at a recognized
/// client identifier. `api.user.profile.useQuery` gives `user.profile` and
/// `useQuery`; `api.hello` gives `(root)` and `hello`.
pub fn extract_procedure<S: AsRef<str>>(chain: &[S]) -> Option<ProcedureRef> {
    let (root, rest) = chain.split_first()?;
    if !CLIENT_ROOTS.contains(&root.as_ref()) {
        return None;
    }
    let (method, middle) = rest.split_last()?;
    if method.as_ref().is_empty() || middle.iter().any(|s| s.as_ref().is_empty()) {
        return None;
    }
    let procedure_path = if middle.is_empty() {
        ROOT_PROCEDURE.to_string()
    } else {
        middle
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(".")
    };
    Some(ProcedureRef {
        procedure_path,
        method: method.as_ref().to_string(),
    })
}

/// Split callee text into its dotted segments after dropping whitespace and
/// optional-chaining / non-null markers.
///
/// Dots nested in brackets, parentheses or string literals do not split, so
/// `api.post["a.b"].useQuery` gives `api`, `post["a.b"]`, `useQuery`. Calls
/// and computed access stay inside their segment. Returns `None` when any
/// segment is empty.
pub fn split_callee(callee: &str) -> Option<Vec<String>> {
    let compact: String = callee.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.replace("?.", ".").replace("!.", ".");

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in compact.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '.' if depth == 0 => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments.iter().all(|s| !s.is_empty()).then_some(segments)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationType {
    Query,
    Mutation,
    Subscription,
    Utils,
    Unknown,
}

impl CommunicationType {
    /// Case-insensitive substring classification of a terminal method, first
    /// match wins.
    pub fn from_method(method: &str) -> Self {
        let m = method.to_lowercase();
        if m.contains("query") {
            CommunicationType::Query
        } else if m.contains("mutation") || m == "mutate" {
            CommunicationType::Mutation
        } else if m.contains("subscription") {
            CommunicationType::Subscription
        } else if m.contains("utils") || m.starts_with("usecontext") {
            CommunicationType::Utils
        } else {
            CommunicationType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationType::Query => "query",
            CommunicationType::Mutation => "mutation",
            CommunicationType::Subscription => "subscription",
            CommunicationType::Utils => "utils",
            CommunicationType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CommunicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_call_requires_member_receiver() {
        assert!(is_remote_call("useQuery", true));
        assert!(!is_remote_call("query", false));
        assert!(!is_remote_call("get", true));
    }

    #[test]
    fn test_every_terminal_detected() {
        for t in TERMINAL_METHODS {
            assert!(is_remote_call(t, true), "{t}");
        }
    }

    #[test]
    fn test_extract_procedure_nested() {
        let r = extract_procedure(&["api", "user", "profile", "useQuery"]).unwrap();
        assert_eq!(r.procedure_path, "user.profile");
        assert_eq!(r.method, "useQuery");
    }

    #[test]
    fn test_extract_procedure_root_sentinel() {
        let r = extract_procedure(&["trpc", "useUtils"]).unwrap();
        assert_eq!(r.procedure_path, ROOT_PROCEDURE);
        assert_eq!(r.method, "useUtils");
    }

    #[test]
    fn test_extract_procedure_rejects_other_roots() {
        assert!(extract_procedure(&["client", "user", "query"]).is_none());
        assert!(extract_procedure(&["api"]).is_none());
        assert!(extract_procedure(&["api", "", "query"]).is_none());
    }

    #[test]
    fn test_split_callee_plain_chain() {
        assert_eq!(
            split_callee("api.user\n  .get?.useQuery").unwrap(),
            vec!["api", "user", "get", "useQuery"]
        );
        assert_eq!(split_callee("api.x!.query").unwrap(), vec!["api", "x", "query"]);
        assert!(split_callee("api..x").is_none());
        assert!(split_callee(".x").is_none());
    }

    #[test]
    fn test_split_callee_keeps_calls_and_computed_access() {
        assert_eq!(
            split_callee("api.useUtils().post.list.invalidate").unwrap(),
            vec!["api", "useUtils()", "post", "list", "invalidate"]
        );
        assert_eq!(
            split_callee("api.post[\"by.id\"].useQuery").unwrap(),
            vec!["api", "post[\"by.id\"]", "useQuery"]
        );
        assert_eq!(
            split_callee("api.pick(a.b, 'c.d').query").unwrap(),
            vec!["api", "pick(a.b,'c.d')", "query"]
        );
    }

    #[test]
    fn test_extract_procedure_through_call_segment() {
        let chain = split_callee("api.useUtils().post.list.invalidate").unwrap();
        let r = extract_procedure(&chain).unwrap();
        assert_eq!(r.procedure_path, "useUtils().post.list");
        assert_eq!(r.method, "invalidate");
    }

    #[test]
    fn test_communication_type_first_match() {
        assert_eq!(CommunicationType::from_method("useQuery"), CommunicationType::Query);
        assert_eq!(
            CommunicationType::from_method("useSuspenseInfiniteQuery"),
            CommunicationType::Query
        );
        assert_eq!(CommunicationType::from_method("useMutation"), CommunicationType::Mutation);
        assert_eq!(CommunicationType::from_method("mutate"), CommunicationType::Mutation);
        assert_eq!(CommunicationType::from_method("mutateAsync"), CommunicationType::Unknown);
        assert_eq!(
            CommunicationType::from_method("useSubscription"),
            CommunicationType::Subscription
        );
        assert_eq!(CommunicationType::from_method("useUtils"), CommunicationType::Utils);
        assert_eq!(CommunicationType::from_method("useContext"), CommunicationType::Utils);
        assert_eq!(CommunicationType::from_method("prefetch"), CommunicationType::Unknown);
    }
}
