//! User-defined classes and the class-name registry.
//!
//! A class is a URI, a parent class, and a set of methods, each of which
//! is a traced op over a `$self` placeholder. The builder collects the
//! host-language method bodies and traces them all at build time, so a
//! finished [`ClassDef`] is pure structure with no live callables, ready
//! for encoding.

use indexmap::IndexMap;

use crate::context::Context;
use crate::error::TraceError;
use crate::op::{OpDef, KEY_NAME};
use crate::reference::{IdRef, Ref};
use crate::state::State;
use crate::uri::Uri;
use crate::vocab;

/// A traced method: its name and its op definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    name: String,
    op: OpDef,
}

impl MethodDef {
    pub(crate) fn new(name: String, op: OpDef) -> Self {
        Self { name, op }
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The traced op.
    #[must_use]
    pub fn op(&self) -> &OpDef {
        &self.op
    }
}

/// A fully traced class definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    uri: Uri,
    parent: Uri,
    methods: Vec<MethodDef>,
}

impl ClassDef {
    /// The class URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The parent class URI.
    #[must_use]
    pub fn parent(&self) -> &Uri {
        &self.parent
    }

    /// The traced methods, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// A `$self` placeholder classed as this class, for composing method
    /// calls on an instance.
    #[must_use]
    pub fn instance(&self) -> State {
        State::from_ref(Ref::Id(IdRef::new(vocab::SELF_NAME)), self.uri.clone())
    }

    pub(crate) fn from_parts(uri: Uri, parent: Uri, methods: Vec<MethodDef>) -> Self {
        Self { uri, parent, methods }
    }
}

type GetBody = Box<dyn FnOnce(&mut Context, State, State) -> Result<State, TraceError>>;
type PostBody =
    Box<dyn FnOnce(&mut Context, State, IndexMap<String, State>) -> Result<State, TraceError>>;

enum PendingMethod {
    Get {
        key_class: String,
        body: GetBody,
    },
    Post {
        params: Vec<(String, String)>,
        body: PostBody,
    },
}

/// Collects method bodies for a class and traces them all at once.
pub struct ClassBuilder<'r> {
    registry: &'r ClassRegistry,
    uri: Uri,
    parent: Uri,
    methods: Vec<(String, PendingMethod)>,
}

impl<'r> ClassBuilder<'r> {
    /// Starts a class at `uri` extending the generic state class.
    #[must_use]
    pub fn new(registry: &'r ClassRegistry, uri: Uri) -> Self {
        Self {
            registry,
            uri,
            parent: Uri::new(vocab::STATE),
            methods: Vec::new(),
        }
    }

    /// Sets the parent class.
    #[must_use]
    pub fn extends(mut self, parent: Uri) -> Self {
        self.parent = parent;
        self
    }

    /// Adds a read method. The body receives a fresh context, a `$self`
    /// placeholder, and a placeholder for the key.
    #[must_use]
    pub fn get_method<F>(mut self, name: &str, key_class: &str, body: F) -> Self
    where
        F: FnOnce(&mut Context, State, State) -> Result<State, TraceError> + 'static,
    {
        self.methods.push((
            name.to_owned(),
            PendingMethod::Get {
                key_class: key_class.to_owned(),
                body: Box::new(body),
            },
        ));
        self
    }

    /// Adds an invocation method with named parameters. The body receives
    /// a fresh context, a `$self` placeholder, and the parameter
    /// placeholders keyed by name.
    #[must_use]
    pub fn post_method<F>(mut self, name: &str, params: &[(&str, &str)], body: F) -> Self
    where
        F: FnOnce(&mut Context, State, IndexMap<String, State>) -> Result<State, TraceError>
            + 'static,
    {
        self.methods.push((
            name.to_owned(),
            PendingMethod::Post {
                params: params
                    .iter()
                    .map(|(param, class)| ((*param).to_owned(), (*class).to_owned()))
                    .collect(),
                body: Box::new(body),
            },
        ));
        self
    }

    /// Traces every method body and assembles the class.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::NameCollision`] on duplicate method names,
    /// [`TraceError::Resolution`] for unknown parameter class names, or
    /// whatever error a body raises while tracing.
    pub fn build(self) -> Result<ClassDef, TraceError> {
        let mut methods: Vec<MethodDef> = Vec::with_capacity(self.methods.len());
        for (name, pending) in self.methods {
            if methods.iter().any(|m| m.name() == name) {
                return Err(TraceError::NameCollision(name));
            }
            let this = State::from_ref(
                Ref::Id(IdRef::new(vocab::SELF_NAME)),
                self.uri.clone(),
            );
            let op = match pending {
                PendingMethod::Get { key_class, body } => {
                    let key_class = self.registry.resolve(&key_class)?;
                    let key = State::from_ref(Ref::Id(IdRef::new(KEY_NAME)), key_class);
                    let mut cxt = Context::new();
                    let result = body(&mut cxt, this, key)?;
                    let graph = cxt.finalize(Some(result))?;
                    OpDef::Get {
                        key_name: KEY_NAME.to_owned(),
                        graph,
                    }
                }
                PendingMethod::Post { params, body } => {
                    let mut placeholders = IndexMap::with_capacity(params.len());
                    for (param, class_name) in &params {
                        let class = self.registry.resolve(class_name)?;
                        placeholders.insert(
                            param.clone(),
                            State::from_ref(Ref::Id(IdRef::new(param.clone())), class),
                        );
                    }
                    let mut cxt = Context::new();
                    let result = body(&mut cxt, this, placeholders)?;
                    let graph = cxt.finalize(Some(result))?;
                    OpDef::Post {
                        params: params.into_iter().map(|(param, _)| param).collect(),
                        graph,
                    }
                }
            };
            methods.push(MethodDef::new(name, op));
        }
        Ok(ClassDef {
            uri: self.uri,
            parent: self.parent,
            methods,
        })
    }
}

/// Maps host-language class names to class URIs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRegistry {
    names: IndexMap<String, Uri>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        let builtins = [
            ("State", vocab::STATE),
            ("Map", vocab::MAP),
            ("Tuple", vocab::TUPLE),
            ("Value", vocab::VALUE),
            ("Nil", vocab::VALUE_NONE),
            ("String", vocab::VALUE_STRING),
            ("Link", vocab::VALUE_LINK),
            ("Number", vocab::NUMBER),
            ("Bool", vocab::NUMBER_BOOL),
            ("Int", vocab::NUMBER_INT),
            ("UInt", vocab::NUMBER_UINT),
            ("Float", vocab::NUMBER_FLOAT),
            ("BTree", vocab::COLLECTION_BTREE),
            ("Stream", vocab::STREAM),
        ];
        let names = builtins
            .into_iter()
            .map(|(name, path)| (name.to_owned(), Uri::new(path)))
            .collect();
        Self { names }
    }
}

impl ClassRegistry {
    /// Creates a registry preloaded with the built-in classes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a class name to its URI.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Resolution`] if the name is not registered.
    pub fn resolve(&self, name: &str) -> Result<Uri, TraceError> {
        self.names
            .get(name)
            .cloned()
            .ok_or_else(|| TraceError::Resolution(format!("unknown class {name}")))
    }

    /// Registers a user class name.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::NameCollision`] if the name is taken or the
    /// URI is already registered under another name.
    pub fn register(&mut self, name: impl Into<String>, uri: Uri) -> Result<(), TraceError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(TraceError::NameCollision(name));
        }
        if self.names.values().any(|taken| *taken == uri) {
            return Err(TraceError::NameCollision(uri.to_string()));
        }
        self.names.insert(name, uri);
        Ok(())
    }

    /// Starts building a class at `uri`.
    #[must_use]
    pub fn class(&self, uri: Uri) -> ClassBuilder<'_> {
        ClassBuilder::new(self, uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve() {
        let registry = ClassRegistry::new();
        assert_eq!(
            registry.resolve("Int").expect("builtin").as_str(),
            vocab::NUMBER_INT
        );
        assert!(registry.resolve("Quaternion").is_err());
    }

    #[test]
    fn registration_enforces_unique_names_and_uris() {
        let mut registry = ClassRegistry::new();
        registry
            .register("Meters", Uri::new("/app/units/meters"))
            .expect("fresh");
        assert!(registry
            .register("Meters", Uri::new("/app/units/meters2"))
            .is_err());
        assert!(registry
            .register("Metres", Uri::new("/app/units/meters"))
            .is_err());
    }

    #[test]
    fn class_methods_trace_over_self() {
        let registry = ClassRegistry::new();
        let class = registry
            .class(Uri::new("/app/units/meters"))
            .extends(Uri::new(vocab::NUMBER_FLOAT))
            .get_method("scaled", "Float", |_cxt, this, key| {
                this.member("value", Uri::new(vocab::NUMBER_FLOAT)).mul(&key)
            })
            .build()
            .expect("trace succeeds");

        assert_eq!(class.uri().as_str(), "/app/units/meters");
        assert_eq!(class.parent().as_str(), vocab::NUMBER_FLOAT);
        assert_eq!(class.methods().len(), 1);

        let op = class.methods()[0].op();
        // `self` and `key` are both bound inside a method graph.
        assert!(op.free_variables().is_empty());
    }

    #[test]
    fn duplicate_method_names_collide() {
        let registry = ClassRegistry::new();
        let err = registry
            .class(Uri::new("/app/units/meters"))
            .get_method("scaled", "Float", |_cxt, _this, key| Ok(key))
            .get_method("scaled", "Float", |_cxt, _this, key| Ok(key))
            .build()
            .expect_err("duplicate name");
        assert_eq!(err, TraceError::NameCollision("scaled".to_owned()));
    }
}
