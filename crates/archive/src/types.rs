use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple and fully-qualified name of one documented class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassName {
    /// Name without the package, e.g. `String`
    pub simple: String,

    /// Canonical name, e.g. `java.lang.String`
    pub full: String,
}

impl ClassName {
    /// Build a name from its fully-qualified form; the simple name is the last segment.
    #[must_use]
    pub fn from_full(full: impl Into<String>) -> Self {
        let full = full.into();
        let simple = full.rsplit('.').next().unwrap_or(&full).to_string();
        Self { simple, full }
    }

    /// Package part of the name, empty for the default package
    #[must_use]
    pub fn package(&self) -> &str {
        self.full
            .rsplit_once('.')
            .map_or("", |(package, _)| package)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

impl ClassKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Annotation => "@interface",
            Self::Record => "record",
        }
    }
}

/// Library metadata stored in an archive's `info.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Root of the hosted documentation; class pages live at `<base_url>java/lang/String.html`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
}

impl LibraryInfo {
    /// Documentation page for a class, if the library is hosted somewhere
    #[must_use]
    pub fn class_url(&self, full_name: &str) -> Option<String> {
        let base = self.base_url.as_deref()?;
        let separator = if base.ends_with('/') { "" } else { "/" };
        Some(format!(
            "{base}{separator}{}.html",
            full_name.replace('.', "/")
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDoc {
    pub name: String,

    /// Full signature as written in source, e.g. `int indexOf(String str)`
    #[serde(default)]
    pub signature: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub deprecated: bool,
}

/// Parsed documentation of one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDoc {
    pub name: ClassName,

    #[serde(default)]
    pub kind: ClassKind,

    #[serde(default)]
    pub modifiers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,

    #[serde(default)]
    pub interfaces: Vec<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub methods: Vec<MethodDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryInfo>,
}

impl ClassDoc {
    /// Minimal document, mostly useful for building archives by hand
    #[must_use]
    pub fn new(name: ClassName) -> Self {
        Self {
            name,
            kind: ClassKind::Class,
            modifiers: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            description: String::new(),
            since: None,
            deprecated: false,
            url: None,
            methods: Vec::new(),
            library: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }
}

/// On-disk shape of a class entry: the name comes from the entry path, the library from
/// `info.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ClassEntry {
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodDoc>,
}

impl ClassEntry {
    pub(crate) fn into_doc(self, name: ClassName, library: Option<&LibraryInfo>) -> ClassDoc {
        let url = self
            .url
            .or_else(|| library.and_then(|info| info.class_url(&name.full)));
        ClassDoc {
            name,
            kind: self.kind,
            modifiers: self.modifiers,
            superclass: self.superclass,
            interfaces: self.interfaces,
            description: self.description,
            since: self.since,
            deprecated: self.deprecated,
            url,
            methods: self.methods,
            library: library.cloned(),
        }
    }
}

impl From<&ClassDoc> for ClassEntry {
    fn from(doc: &ClassDoc) -> Self {
        Self {
            kind: doc.kind,
            modifiers: doc.modifiers.clone(),
            superclass: doc.superclass.clone(),
            interfaces: doc.interfaces.clone(),
            description: doc.description.clone(),
            since: doc.since.clone(),
            deprecated: doc.deprecated,
            url: doc.url.clone(),
            methods: doc.methods.clone(),
        }
    }
}
