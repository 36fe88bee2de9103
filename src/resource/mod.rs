// Static resource registry: the fixed set of collections this API exposes.
//
// Every request resolves against this table; nothing is registered at
// runtime. The registry is validated once at startup so that identifier
// problems (duplicate paths, bad column names) abort boot instead of
// surfacing per-request.

use std::collections::HashMap;

use thiserror::Error;

pub mod schema;

pub use schema::{FieldSelection, Schema, SchemaError};

/// Storage type of a column. Only the types the newsroom tables actually
/// use; extend alongside the DDL in `database::manager` if more appear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    /// Required columns are NOT NULL and must be present in POST bodies.
    pub required: bool,
}

/// Which placeholder gate wraps write operations on a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
    User,
    Admin,
}

/// Compile-time description of one resource collection.
#[derive(Clone, Copy, Debug)]
pub struct ResourceSpec {
    pub name: &'static str,
    pub path: &'static str,
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
    pub write_gate: GateKind,
}

/// A registered resource with its serializer attached.
#[derive(Clone, Debug)]
pub struct ResourceDef {
    pub name: &'static str,
    pub path: &'static str,
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
    pub write_gate: GateKind,
    pub schema: Schema,
}

impl ResourceDef {
    /// Columns a client may set, i.e. everything but the identity column.
    pub fn attribute_columns(&self) -> &'static [ColumnDef] {
        &self.columns[1..]
    }
}

const ID: ColumnDef = ColumnDef { name: "id", ty: ColumnType::Integer, required: false };
const TITLE: ColumnDef = ColumnDef { name: "title", ty: ColumnType::Text, required: true };

const BUILTIN: &[ResourceSpec] = &[
    ResourceSpec {
        name: "Publications",
        path: "publications",
        table: "publications",
        columns: &[ID, TITLE],
        write_gate: GateKind::User,
    },
    ResourceSpec {
        name: "Stories",
        path: "stories",
        table: "stories",
        columns: &[
            ID,
            TITLE,
            ColumnDef { name: "content", ty: ColumnType::Text, required: false },
        ],
        write_gate: GateKind::User,
    },
    ResourceSpec {
        name: "StoryCategories",
        path: "categories",
        table: "story_categories",
        columns: &[ID, TITLE],
        write_gate: GateKind::User,
    },
    ResourceSpec {
        name: "UserBookmarks",
        path: "bookmarks",
        table: "user_bookmarks",
        columns: &[ID],
        write_gate: GateKind::User,
    },
    ResourceSpec {
        name: "Podcasts",
        path: "podcasts",
        table: "podcasts",
        columns: &[ID, TITLE],
        write_gate: GateKind::Admin,
    },
    ResourceSpec {
        name: "EditorsChoice",
        path: "editors-choice",
        table: "editors_choice",
        columns: &[ID],
        write_gate: GateKind::Admin,
    },
    ResourceSpec {
        name: "Sections",
        path: "sections",
        table: "sections",
        columns: &[ID],
        write_gate: GateKind::Admin,
    },
    ResourceSpec {
        name: "ContentSections",
        path: "content-sections",
        table: "content_sections",
        columns: &[ID, TITLE],
        write_gate: GateKind::Admin,
    },
];

/// Errors raised while building the registry. These abort startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("resource registry is empty")]
    Empty,

    #[error("duplicate resource path: {0}")]
    DuplicatePath(&'static str),

    #[error("duplicate resource table: {0}")]
    DuplicateTable(&'static str),

    #[error("resource {0} must declare 'id' as its first column")]
    MissingIdentity(&'static str),

    #[error("resource {resource} uses invalid identifier '{name}'")]
    InvalidIdentifier { resource: &'static str, name: &'static str },

    #[error("resource {resource} declares column '{column}' twice")]
    DuplicateColumn { resource: &'static str, column: &'static str },
}

/// Validated mapping from URL path segment to resource definition.
#[derive(Debug)]
pub struct Registry {
    resources: Vec<ResourceDef>,
    by_path: HashMap<&'static str, usize>,
}

impl Registry {
    /// Build the fixed newsroom registry.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_specs(BUILTIN)
    }

    fn from_specs(specs: &[ResourceSpec]) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut resources = Vec::with_capacity(specs.len());
        let mut by_path = HashMap::with_capacity(specs.len());
        let mut tables: HashMap<&'static str, ()> = HashMap::with_capacity(specs.len());

        for spec in specs {
            if !is_valid_identifier(spec.table) {
                return Err(RegistryError::InvalidIdentifier { resource: spec.name, name: spec.table });
            }

            let identity = spec.columns.first();
            match identity {
                Some(col) if col.name == "id" && col.ty == ColumnType::Integer && !col.required => {}
                _ => return Err(RegistryError::MissingIdentity(spec.name)),
            }

            let mut seen: HashMap<&'static str, ()> = HashMap::with_capacity(spec.columns.len());
            for col in spec.columns {
                if !is_valid_identifier(col.name) {
                    return Err(RegistryError::InvalidIdentifier { resource: spec.name, name: col.name });
                }
                if seen.insert(col.name, ()).is_some() {
                    return Err(RegistryError::DuplicateColumn { resource: spec.name, column: col.name });
                }
            }

            if tables.insert(spec.table, ()).is_some() {
                return Err(RegistryError::DuplicateTable(spec.table));
            }
            if by_path.insert(spec.path, resources.len()).is_some() {
                return Err(RegistryError::DuplicatePath(spec.path));
            }

            resources.push(ResourceDef {
                name: spec.name,
                path: spec.path,
                table: spec.table,
                columns: spec.columns,
                write_gate: spec.write_gate,
                schema: Schema::for_columns(spec.columns),
            });
        }

        Ok(Self { resources, by_path })
    }

    /// Look up a resource by its URL path segment.
    pub fn get(&self, path: &str) -> Option<&ResourceDef> {
        self.by_path.get(path).map(|&idx| &self.resources[idx])
    }

    pub fn resources(&self) -> &[ResourceDef] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Table and column names end up inside generated SQL, so restrict them
/// to lower snake_case even though they come from compile-time constants.
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_validates() {
        let registry = Registry::builtin().expect("builtin registry must validate");
        assert_eq!(registry.len(), 8);

        let stories = registry.get("stories").expect("stories registered");
        assert_eq!(stories.table, "stories");
        assert_eq!(stories.attribute_columns().len(), 2);

        let podcasts = registry.get("podcasts").expect("podcasts registered");
        assert_eq!(podcasts.write_gate, GateKind::Admin);

        assert!(registry.get("widgets").is_none());
    }

    #[test]
    fn bookmarks_have_no_attributes() {
        let registry = Registry::builtin().unwrap();
        let bookmarks = registry.get("bookmarks").unwrap();
        assert!(bookmarks.attribute_columns().is_empty());
    }

    #[test]
    fn rejects_duplicate_paths() {
        let specs = [
            ResourceSpec {
                name: "A",
                path: "things",
                table: "things_a",
                columns: &[ID],
                write_gate: GateKind::User,
            },
            ResourceSpec {
                name: "B",
                path: "things",
                table: "things_b",
                columns: &[ID],
                write_gate: GateKind::User,
            },
        ];
        assert!(matches!(Registry::from_specs(&specs), Err(RegistryError::DuplicatePath("things"))));
    }

    #[test]
    fn rejects_missing_identity_column() {
        let specs = [ResourceSpec {
            name: "NoId",
            path: "noid",
            table: "noid",
            columns: &[TITLE],
            write_gate: GateKind::User,
        }];
        assert!(matches!(Registry::from_specs(&specs), Err(RegistryError::MissingIdentity("NoId"))));
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        let specs = [ResourceSpec {
            name: "Bad",
            path: "bad",
            table: "bad\"; DROP TABLE users; --",
            columns: &[ID],
            write_gate: GateKind::User,
        }];
        assert!(matches!(
            Registry::from_specs(&specs),
            Err(RegistryError::InvalidIdentifier { resource: "Bad", .. })
        ));
    }

    #[test]
    fn identifier_rules() {
        assert!(is_valid_identifier("story_categories"));
        assert!(is_valid_identifier("_private"));
        assert!(!is_valid_identifier("Stories"));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("editors-choice"));
        assert!(!is_valid_identifier(""));
    }
}
