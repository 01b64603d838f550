//! Fixture identity.
//!
//! A fixture is identified by the concrete type of its callable. Every `fn`
//! item and every closure has a distinct type, so two syntactically identical
//! but separately defined functions never share an identity. The name is
//! taken from `std::any::type_name` and is used only for the anonymity check
//! and for log/error messages.
//!
//! Anonymous (no discoverable name):
//! - closures (`...::{{closure}}`);
//! - function pointers (`fn(..) -> ..`): all share one type;
//! - trait objects (`dyn Fn..`, `Box<dyn Fn..>`).
//!
//! A borrowed fixture (`&deploy_token`) has its own type and therefore its own
//! identity, separate from `deploy_token` itself, while both report the same
//! name. Pass fixtures by value to share cache entries.

use std::any::{type_name, TypeId};
use std::fmt;

#[derive(Clone, Copy)]
pub struct FixtureIdentity {
    type_id: TypeId,
    type_name: &'static str,
}

impl FixtureIdentity {
    pub fn of<F: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<F>(),
            type_name: type_name::<F>(),
        }
    }

    /// Same as [`FixtureIdentity::of`], inferred from a value.
    pub fn of_val<F: 'static>(_f: &F) -> Self {
        Self::of::<F>()
    }

    /// Full type path, e.g. `my_tests::deploy_token`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Short function name (last path segment), `None` when anonymous.
    pub fn name(&self) -> Option<&'static str> {
        if self.is_anonymous() {
            return None;
        }
        let base = strip_generic_args(self.type_name.trim_start_matches('&'));
        base.rsplit("::").next().filter(|s| !s.is_empty())
    }

    pub fn is_anonymous(&self) -> bool {
        let n = self.type_name.trim_start_matches('&');
        n.is_empty()
            || n.contains("{{closure}}")
            || n.starts_with("fn(")
            || n.starts_with("unsafe fn(")
            || n.starts_with("extern ")
            || n.starts_with("dyn ")
            || (n.contains("<dyn ") && is_pointer_wrapper(strip_generic_args(n)))
    }
}

// Box<dyn Fn..>, Arc<dyn Fn..>, Rc<dyn Fn..>
fn is_pointer_wrapper(base: &str) -> bool {
    matches!(base.rsplit("::").next(), Some("Box" | "Arc" | "Rc"))
}

/// `path::f<T, U>` -> `path::f`; `<A as B>::f` stays as is.
fn strip_generic_args(s: &str) -> &str {
    if !s.ends_with('>') {
        return s;
    }
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    for i in (0..bytes.len()).rev() {
        match bytes[i] {
            // `->` inside fn pointer args is not a bracket
            b'>' if i > 0 && bytes[i - 1] == b'-' => {}
            b'>' => depth += 1,
            b'<' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &s[..i];
                }
            }
            _ => {}
        }
    }
    s
}

impl PartialEq for FixtureIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for FixtureIdentity {}

impl fmt::Debug for FixtureIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixtureIdentity({})", self.type_name)
    }
}

impl fmt::Display for FixtureIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("<anonymous>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy_token() {}
    fn deploy_pool() {}
    fn generic_setup<T>() {}

    #[test]
    fn fn_items_are_named_and_distinct() {
        let a = FixtureIdentity::of_val(&deploy_token);
        let b = FixtureIdentity::of_val(&deploy_pool);
        assert!(!a.is_anonymous());
        assert_eq!(a.name(), Some("deploy_token"));
        assert_eq!(b.name(), Some("deploy_pool"));
        assert_ne!(a, b);
        assert_eq!(a, FixtureIdentity::of_val(&deploy_token));
    }

    #[test]
    fn generic_instantiations_differ() {
        let a = FixtureIdentity::of_val(&generic_setup::<u8>);
        let b = FixtureIdentity::of_val(&generic_setup::<u16>);
        assert_ne!(a, b);
        assert_eq!(a.name(), Some("generic_setup"));
    }

    #[test]
    fn generic_suffix_stripping() {
        assert_eq!(strip_generic_args("a::f<u8>"), "a::f");
        assert_eq!(strip_generic_args("a::f<Vec<u8>, fn() -> u8>"), "a::f");
        assert_eq!(strip_generic_args("<a::S as a::T>::m"), "<a::S as a::T>::m");
        assert_eq!(strip_generic_args("<a::S as a::T>::m<u8>"), "<a::S as a::T>::m");
    }

    #[test]
    fn closures_and_pointers_are_anonymous() {
        let c = || ();
        let id = FixtureIdentity::of_val(&c);
        assert!(id.is_anonymous());
        assert_eq!(id.name(), None);
        assert_eq!(id.to_string(), "<anonymous>");

        let p: fn() = deploy_token;
        assert!(FixtureIdentity::of_val(&p).is_anonymous());

        let boxed: Box<dyn Fn()> = Box::new(deploy_token);
        assert!(FixtureIdentity::of_val(&boxed).is_anonymous());
    }

    #[test]
    fn borrowed_fixture_is_a_separate_identity() {
        let r: &'static _ = &deploy_token;
        let by_ref = FixtureIdentity::of_val(&r);
        let by_val = FixtureIdentity::of_val(&deploy_token);
        assert!(!by_ref.is_anonymous());
        assert_eq!(by_ref.name(), Some("deploy_token"));
        assert_eq!(by_ref.name(), by_val.name());
        assert_ne!(by_ref, by_val);
    }

    #[test]
    fn identical_closures_are_distinct() {
        let a = || 1;
        let b = || 1;
        assert_ne!(FixtureIdentity::of_val(&a), FixtureIdentity::of_val(&b));
    }
}
