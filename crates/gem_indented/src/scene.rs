//! Scene replay
//!
//! Instantiates the nodes of a parsed tree through constructors registered
//! per type name. Objects keep the tree's structure: each one records the
//! object it is attached to, except free (`*`) nodes, which stay detached.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::parser::{parse_file, ParseOptions};
use crate::tree::IndentedTree;

type Constructor<O> = Box<dyn Fn(&str) -> O + Send + Sync>;

/// Type name to constructor
pub struct NodeRegistry<O> {
    constructors: HashMap<String, Constructor<O>>,
}

impl<O> NodeRegistry<O> {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register the constructor for `type_name`. It receives the node's
    /// trimmed argument text, empty when there is none.
    pub fn register<F>(&mut self, type_name: &str, constructor: F) -> &mut Self
    where
        F: Fn(&str) -> O + Send + Sync + 'static,
    {
        self.constructors
            .insert(type_name.to_string(), Box::new(constructor));
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    pub fn create(&self, type_name: &str, args: &str) -> Option<O> {
        self.constructors.get(type_name).map(|constructor| constructor(args))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl<O> Default for NodeRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> fmt::Debug for NodeRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.type_names().collect();
        names.sort_unstable();
        f.debug_struct("NodeRegistry").field("types", &names).finish()
    }
}

/// An instantiated node
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject<O> {
    pub type_name: String,
    pub name: Option<String>,
    pub object: O,
    /// Index of the object this one is attached to
    pub parent: Option<usize>,
    /// `false` for free nodes
    pub attached: bool,
}

/// Objects created from an indented file
#[derive(Debug, Clone)]
pub struct Scene<O> {
    objects: Vec<SceneObject<O>>,
    names: HashMap<String, usize>,
}

impl<O> Scene<O> {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Instantiate every node of `tree` in file order. Nodes of unknown
    /// type are skipped, and their children attach to the scene root.
    pub fn replay(tree: &IndentedTree, registry: &NodeRegistry<O>) -> Self {
        let mut scene = Self::new();
        let mut created: Vec<Option<usize>> = Vec::with_capacity(tree.len());

        for (_, node) in tree.iter() {
            let Some(object) = registry.create(&node.type_name, node.args.trim()) else {
                log::warn!("Failed to load object. Unknown type {}", node.type_name);
                created.push(None);
                continue;
            };

            let parent = if node.free {
                None
            } else {
                node.parent.and_then(|p| created.get(p.index()).copied().flatten())
            };

            let index = scene.objects.len();
            if let Some(name) = &node.name {
                if scene.names.insert(name.clone(), index).is_some() {
                    log::warn!("Duplicate scene object name '{}'; keeping the latest", name);
                }
            }
            scene.objects.push(SceneObject {
                type_name: node.type_name.clone(),
                name: node.name.clone(),
                object,
                parent,
                attached: !node.free,
            });
            created.push(Some(index));
        }

        scene
    }

    /// Parse `path` and replay it
    pub fn load(path: impl AsRef<Path>, registry: &NodeRegistry<O>, options: &ParseOptions) -> Result<Self> {
        let parsed = parse_file(path, options)?;
        Ok(Self::replay(&parsed.tree, registry))
    }

    pub fn get(&self, name: &str) -> Option<&O> {
        self.names.get(name).map(|&index| &self.objects[index].object)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut O> {
        let index = *self.names.get(name)?;
        Some(&mut self.objects[index].object)
    }

    pub fn has(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &O> {
        self.objects.iter().map(|entry| &entry.object)
    }

    pub fn entries(&self) -> &[SceneObject<O>] {
        &self.objects
    }

    pub fn objects_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a O> + 'a {
        self.objects
            .iter()
            .filter(move |entry| entry.type_name == type_name)
            .map(|entry| &entry.object)
    }

    /// The object the named object is attached to
    pub fn parent_of(&self, name: &str) -> Option<&O> {
        let index = *self.names.get(name)?;
        let parent = self.objects[index].parent?;
        Some(&self.objects[parent].object)
    }

    /// Objects attached to the named object
    pub fn children_of(&self, name: &str) -> Vec<&O> {
        let Some(&index) = self.names.get(name) else {
            return Vec::new();
        };
        self.objects
            .iter()
            .filter(|entry| entry.parent == Some(index))
            .map(|entry| &entry.object)
            .collect()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<O> Default for Scene<O> {
    fn default() -> Self {
        Self::new()
    }
}
