//! Setter and section-loader tables
//!
//! Each configurable type declares, once, which config keys it accepts and
//! which sections it knows how to load. Keys and section names are matched
//! by their snake case form, so `skipExport`, `SkipExport` and `skip_export`
//! all reach the `skip_export` setter.

use std::collections::HashMap;
use std::fmt;

use gem_cast::{from_arg, CastError, FromValue, Value};
use gem_core::snake_case;
use indexmap::IndexMap;

/// Cast `key -> value` pairs of one section
pub type SectionData = IndexMap<String, Value>;

type SetterFn<T> = Box<dyn Fn(&mut T, Value) -> Result<(), CastError> + Send + Sync>;
type SectionFn<T> = Box<dyn Fn(&mut T, &SectionData) + Send + Sync>;
type FallbackFn<T> = Box<dyn Fn(&mut T, &str, &SectionData) + Send + Sync>;

/// A type that can be configured from config files
pub trait ConfigTarget: Sized + 'static {
    /// The setters and section loaders of this type
    fn bindings() -> ConfigBindings<Self>;

    /// Storage for keys without a setter when `auto_configure` is on
    fn attributes(&mut self) -> Option<&mut AttributeBag> {
        None
    }
}

/// Setter and section-loader registrations for `T`
pub struct ConfigBindings<T> {
    setters: HashMap<String, SetterFn<T>>,
    sections: HashMap<String, SectionFn<T>>,
    fallback: Option<FallbackFn<T>>,
}

impl<T> ConfigBindings<T> {
    pub fn new() -> Self {
        Self {
            setters: HashMap::new(),
            sections: HashMap::new(),
            fallback: None,
        }
    }

    /// Register the setter for `key`.
    ///
    /// The value is converted with [`from_arg`]: a tuple-typed argument
    /// receives the tuple's elements, and a one-element tuple given to a
    /// scalar argument is unpacked.
    pub fn setter<A, F>(mut self, key: &str, setter: F) -> Self
    where
        A: FromValue,
        F: Fn(&mut T, A) + Send + Sync + 'static,
    {
        self.setters.insert(
            snake_case(key),
            Box::new(move |target: &mut T, value: Value| {
                setter(target, from_arg(value)?);
                Ok(())
            }),
        );
        self
    }

    /// Register the loader for a section
    pub fn section<F>(mut self, name: &str, loader: F) -> Self
    where
        F: Fn(&mut T, &SectionData) + Send + Sync + 'static,
    {
        self.sections.insert(snake_case(name), Box::new(loader));
        self
    }

    /// Register the loader for sections without their own loader
    pub fn fallback_section<F>(mut self, loader: F) -> Self
    where
        F: Fn(&mut T, &str, &SectionData) + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(loader));
        self
    }

    pub fn has_setter(&self, key: &str) -> bool {
        self.setters.contains_key(&snake_case(key))
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(&snake_case(name))
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Apply a value through the setter for `key`. `None` if there is no
    /// such setter.
    pub fn apply(&self, target: &mut T, key: &str, value: Value) -> Option<Result<(), CastError>> {
        self.setters
            .get(&snake_case(key))
            .map(|setter| setter(target, value))
    }

    /// Run the loader for `name`, falling back to the general loader
    pub(crate) fn load_section(&self, target: &mut T, name: &str, data: &SectionData) -> SectionOutcome {
        if let Some(loader) = self.sections.get(&snake_case(name)) {
            loader(target, data);
            return SectionOutcome::Loaded;
        }
        match &self.fallback {
            Some(loader) => {
                loader(target, name, data);
                SectionOutcome::Fallback
            }
            None => SectionOutcome::Unhandled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionOutcome {
    Loaded,
    Fallback,
    Unhandled,
}

impl<T> Default for ConfigBindings<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConfigBindings<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut setters: Vec<_> = self.setters.keys().collect();
        setters.sort();
        let mut sections: Vec<_> = self.sections.keys().collect();
        sections.sort();
        f.debug_struct("ConfigBindings")
            .field("setters", &setters)
            .field("sections", &sections)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Named values assigned without a setter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBag {
    values: IndexMap<String, Value>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed copy of a value
    pub fn get_as<A: FromValue>(&self, key: &str) -> Option<Result<A, CastError>> {
        self.values.get(key).cloned().map(A::from_value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
