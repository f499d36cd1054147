//! Project, target, group and file views over the element tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::element::Element;
use crate::error::Error;

/// Inclusion marker of a node (`CommonProperty/IncludeInBuild`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Marker unset or `"1"`.
    Included,
    /// Marker `"0"`: the node and all of its descendants are skipped.
    Excluded,
    /// Marker `"2"`: follow the parent. Treated as included for fragments.
    Inherit,
}

impl Inclusion {
    /// Decodes a marker value. Unknown values count as included.
    #[must_use]
    pub fn from_marker(marker: Option<&str>) -> Self {
        match marker.map(str::trim) {
            Some("0") => Self::Excluded,
            Some("2") => Self::Inherit,
            _ => Self::Included,
        }
    }

    /// Returns `true` for [`Inclusion::Excluded`].
    #[must_use]
    pub fn is_excluded(self) -> bool {
        self == Self::Excluded
    }
}

/// A node of the target → group → file hierarchy.
///
/// Property lookups are scoped to the node itself: they never descend into
/// the container holding the node's children.
pub trait TreeNode {
    /// Containers that belong to child nodes rather than to this one.
    const CHILD_CONTAINERS: &'static [&'static str];

    /// The underlying element.
    fn element(&self) -> &Element;

    /// Looks up a node-local property such as `"Cads/VariousControls/Define"`.
    fn property(&self, path: &str) -> Option<&str> {
        self.element().text_scoped(path, Self::CHILD_CONTAINERS)
    }

    /// Decodes the node's inclusion marker.
    fn inclusion(&self) -> Inclusion {
        Inclusion::from_marker(self.property("CommonProperty/IncludeInBuild"))
    }
}

// ---- Project ----------------------------------------------------------------

/// A loaded µVision project.
///
/// Built in two phases: the document is parsed into owned elements, then
/// the targets are collected once into a name index. Nothing is computed
/// lazily afterwards.
#[derive(Debug, Clone)]
pub struct Project {
    path: PathBuf,
    targets: Vec<Target>,
    index: HashMap<String, usize>,
}

impl Project {
    /// Reads and parses a project file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and the parse errors
    /// of [`Project::parse`] otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, path)
    }

    /// Parses project XML that was read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Xml`] for malformed XML and [`Error::UnexpectedRoot`]
    /// when the root element is not `<Project>`.
    pub fn parse(source: &str, path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let doc = match roxmltree::Document::parse(source) {
            Ok(doc) => doc,
            Err(source) => return Err(Error::Xml { path, source }),
        };
        let root = Element::from_node(doc.root_element());
        if root.name() != "Project" {
            return Err(Error::UnexpectedRoot {
                path,
                found: root.name().to_owned(),
            });
        }

        let mut elements = Vec::new();
        root.into_outermost_named("Target", &mut elements);

        let mut targets = Vec::with_capacity(elements.len());
        let mut index = HashMap::new();
        for element in elements {
            let Some(name) = element.child_text("TargetName").filter(|n| !n.is_empty()) else {
                continue;
            };
            let name = name.to_owned();
            if index.contains_key(&name) {
                tracing::warn!("duplicate target '{name}' ignored");
                continue;
            }
            index.insert(name.clone(), targets.len());
            targets.push(Target { name, element });
        }

        Ok(Self {
            path,
            targets,
            index,
        })
    }

    /// Path the project was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the project file. Artifact paths are relative
    /// to it.
    #[must_use]
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// File name of the project without its extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Targets in document order.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Target names in document order.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(Target::name)
    }

    /// Looks up a target by name.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.index.get(name).map(|&i| &self.targets[i])
    }
}

// ---- Target -----------------------------------------------------------------

/// One named build configuration.
#[derive(Debug, Clone)]
pub struct Target {
    name: String,
    element: Element,
}

impl TreeNode for Target {
    const CHILD_CONTAINERS: &'static [&'static str] = &["Groups"];

    fn element(&self) -> &Element {
        &self.element
    }
}

impl Target {
    /// The unique target name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Toolset identifier (`ToolsetNumber`), e.g. `"0x4"`.
    #[must_use]
    pub fn toolset_number(&self) -> Option<&str> {
        self.element.child_text("ToolsetNumber")
    }

    /// ABI sub-flag (`uAC6`) selecting the clang-based ARM compiler.
    #[must_use]
    pub fn uac6(&self) -> Option<&str> {
        self.element.child_text("uAC6")
    }

    /// Output directory, relative to the project directory.
    #[must_use]
    pub fn output_directory(&self) -> Option<&str> {
        self.property("OutputDirectory")
    }

    /// Base name of the output artifacts.
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        self.property("OutputName")
    }

    /// Groups in document order.
    #[must_use]
    pub fn groups(&self) -> Vec<Group<'_>> {
        self.element
            .descendants_named("Group")
            .into_iter()
            .map(|element| Group { element })
            .collect()
    }
}

// ---- Group ------------------------------------------------------------------

/// A named collection of files within a target.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    element: &'a Element,
}

impl TreeNode for Group<'_> {
    const CHILD_CONTAINERS: &'static [&'static str] = &["Files"];

    fn element(&self) -> &Element {
        self.element
    }
}

impl<'a> Group<'a> {
    /// The group name, if declared.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.element.child_text("GroupName")
    }

    /// Files in document order.
    #[must_use]
    pub fn files(&self) -> Vec<FileEntry<'a>> {
        self.element
            .descendants_named("File")
            .into_iter()
            .map(|element| FileEntry { element })
            .collect()
    }
}

// ---- FileEntry --------------------------------------------------------------

/// A source file leaf.
#[derive(Debug, Clone, Copy)]
pub struct FileEntry<'a> {
    element: &'a Element,
}

impl TreeNode for FileEntry<'_> {
    const CHILD_CONTAINERS: &'static [&'static str] = &[];

    fn element(&self) -> &Element {
        self.element
    }
}

impl<'a> FileEntry<'a> {
    /// The declared path (`FilePath`), as written in the project.
    #[must_use]
    pub fn path(&self) -> Option<&'a str> {
        self.element.child_text("FilePath")
    }

    /// The declared file name (`FileName`).
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.element.child_text("FileName")
    }
}
