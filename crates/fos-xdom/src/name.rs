//! Qualified Names and the Name Table
//!
//! Element and attribute names are (prefix, local name, namespace) triples.
//! Two names are equal when local name and namespace match; the prefix is
//! presentation only. Names created through a document go through its
//! [`NameTable`], so repeated names share one allocation.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::{DomError, DomResult};

/// The `xml` prefix namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The `xmlns` prefix namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Element or attribute name
#[derive(Clone)]
pub struct QualifiedName {
    prefix: Option<Rc<str>>,
    local_name: Rc<str>,
    namespace: Option<Rc<str>>,
}

impl QualifiedName {
    /// Name without namespace; fails for an empty or whitespace-only local name
    pub fn new(local_name: &str) -> DomResult<Self> {
        Self::with_namespace(local_name, None)
    }

    pub fn with_namespace(local_name: &str, namespace: Option<&str>) -> DomResult<Self> {
        Self::validate_local(local_name)?;
        Ok(Self {
            prefix: None,
            local_name: Rc::from(local_name),
            namespace: namespace.filter(|ns| !ns.is_empty()).map(Rc::from),
        })
    }

    /// Known-valid local name without namespace
    pub(crate) fn local(local_name: &str) -> Self {
        Self {
            prefix: None,
            local_name: Rc::from(local_name),
            namespace: None,
        }
    }

    /// Split a `prefix:local` string; the `xml` prefix binds its namespace
    pub fn parse(qualified: &str, namespace: Option<&str>) -> DomResult<Self> {
        match qualified.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() => {
                let namespace = match (prefix, namespace) {
                    ("xml", None) => Some(XML_NAMESPACE),
                    ("xmlns", None) => Some(XMLNS_NAMESPACE),
                    (_, ns) => ns,
                };
                Ok(Self::with_namespace(local, namespace)?.with_prefix(Some(prefix)))
            }
            _ => Self::with_namespace(qualified, namespace),
        }
    }

    /// Same name, different prefix
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(Rc::from);
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `prefix:local` or just `local`
    pub fn display_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.to_string(),
        }
    }

    /// Compare against a local name and namespace without allocating
    pub fn is(&self, local_name: &str, namespace: Option<&str>) -> bool {
        &*self.local_name == local_name && self.namespace_uri() == namespace
    }

    fn validate_local(local_name: &str) -> DomResult<()> {
        if local_name.trim().is_empty() {
            return Err(DomError::InvalidArgument(
                "local name must not be empty or whitespace".into(),
            ));
        }
        if local_name.contains(':') {
            return Err(DomError::InvalidArgument(format!(
                "local name {:?} must not contain ':'",
                local_name
            )));
        }
        Ok(())
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.local_name == other.local_name && self.namespace == other.namespace
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local_name.hash(state);
        self.namespace.hash(state);
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.display_name()),
            None => write!(f, "{}", self.display_name()),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Anything usable as a name argument
///
/// Conversion happens before any state change, so an invalid name never
/// leaves a partial mutation behind.
pub trait IntoQualifiedName {
    fn into_qualified_name(self) -> DomResult<QualifiedName>;
}

impl IntoQualifiedName for QualifiedName {
    fn into_qualified_name(self) -> DomResult<QualifiedName> {
        Ok(self)
    }
}

impl IntoQualifiedName for &QualifiedName {
    fn into_qualified_name(self) -> DomResult<QualifiedName> {
        Ok(self.clone())
    }
}

impl IntoQualifiedName for &str {
    fn into_qualified_name(self) -> DomResult<QualifiedName> {
        QualifiedName::parse(self, None)
    }
}

impl IntoQualifiedName for &String {
    fn into_qualified_name(self) -> DomResult<QualifiedName> {
        QualifiedName::parse(self, None)
    }
}

impl IntoQualifiedName for String {
    fn into_qualified_name(self) -> DomResult<QualifiedName> {
        QualifiedName::parse(&self, None)
    }
}

/// String table deduplicating name parts
#[derive(Debug)]
pub struct NameTable {
    strings: HashSet<Rc<str>>,
}

impl NameTable {
    /// Create a table with the common markup names pre-interned
    pub fn new() -> Self {
        let mut table = Self {
            strings: HashSet::with_capacity(64),
        };

        const COMMON: &[&str] = &[
            XML_NAMESPACE, XMLNS_NAMESPACE, "xml", "xmlns",
            "id", "class", "style", "name", "type", "href", "src", "lang",
            "html", "head", "body", "div", "span", "p", "a",
        ];
        for s in COMMON {
            table.intern(s);
        }

        table
    }

    /// Shared copy of `s`
    pub fn intern(&mut self, s: &str) -> Rc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Rc::clone(existing);
        }
        let atom: Rc<str> = Rc::from(s);
        self.strings.insert(Rc::clone(&atom));
        atom
    }

    /// Rebuild `name` over interned parts
    pub fn intern_name(&mut self, name: &QualifiedName) -> QualifiedName {
        QualifiedName {
            prefix: name.prefix.as_deref().map(|p| self.intern(p)),
            local_name: self.intern(&name.local_name),
            namespace: name.namespace.as_deref().map(|ns| self.intern(ns)),
        }
    }

    /// Look up without interning
    pub fn lookup(&self, s: &str) -> Option<Rc<str>> {
        self.strings.get(s).cloned()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}
