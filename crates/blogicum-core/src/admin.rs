//! Admin panel configuration: which fields each entity lists, searches and
//! filters by. Built once at start-up and shared read-only.

use serde::Serialize;
use thiserror::Error;

/// Entities exposed in the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Category,
    Location,
    Post,
    Comment,
}

impl ModelKind {
    /// Field names an admin entry may refer to.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Category => &[
                "title",
                "description",
                "slug",
                "is_published",
                "created_at",
            ],
            Self::Location => &["name", "is_published", "created_at"],
            Self::Post => &[
                "title",
                "text",
                "pub_date",
                "author",
                "location",
                "category",
                "is_published",
                "image",
                "created_at",
            ],
            Self::Comment => &["text", "post", "author", "created_at"],
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminConfigError {
    #[error("{model:?} is already registered")]
    AlreadyRegistered { model: ModelKind },

    #[error("{model:?} has no field '{field}'")]
    UnknownField {
        model: ModelKind,
        field: &'static str,
    },
}

/// Admin options for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelAdmin {
    pub model: ModelKind,
    pub list_display: Vec<&'static str>,
    pub search_fields: Vec<&'static str>,
    pub list_filter: Vec<&'static str>,
}

impl ModelAdmin {
    /// Default options: list by the entity's first field, no search or filters.
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            list_display: model.fields().iter().take(1).copied().collect(),
            search_fields: Vec::new(),
            list_filter: Vec::new(),
        }
    }

    pub fn list_display(mut self, fields: &[&'static str]) -> Self {
        self.list_display = fields.to_vec();
        self
    }

    pub fn search_fields(mut self, fields: &[&'static str]) -> Self {
        self.search_fields = fields.to_vec();
        self
    }

    pub fn list_filter(mut self, fields: &[&'static str]) -> Self {
        self.list_filter = fields.to_vec();
        self
    }

    fn check_fields(&self) -> Result<(), AdminConfigError> {
        let known = self.model.fields();
        self.list_display
            .iter()
            .chain(&self.search_fields)
            .chain(&self.list_filter)
            .copied()
            .find(|field| !known.contains(field))
            .map_or(Ok(()), |field| {
                Err(AdminConfigError::UnknownField {
                    model: self.model,
                    field,
                })
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRegistry {
    pub empty_value_display: &'static str,
    pub models: Vec<ModelAdmin>,
}

impl AdminRegistry {
    pub fn new(empty_value_display: &'static str) -> Self {
        Self {
            empty_value_display,
            models: Vec::new(),
        }
    }

    /// Register an entity, rejecting duplicates and unknown field names.
    pub fn register(mut self, admin: ModelAdmin) -> Result<Self, AdminConfigError> {
        if self.get(admin.model).is_some() {
            return Err(AdminConfigError::AlreadyRegistered { model: admin.model });
        }
        admin.check_fields()?;
        self.models.push(admin);
        Ok(self)
    }

    pub fn get(&self, model: ModelKind) -> Option<&ModelAdmin> {
        self.models.iter().find(|admin| admin.model == model)
    }

    /// The blog's admin configuration.
    pub fn blog() -> Result<Self, AdminConfigError> {
        Self::new("Not set")
            .register(ModelAdmin::new(ModelKind::Location))?
            .register(
                ModelAdmin::new(ModelKind::Category).list_display(&[
                    "title",
                    "description",
                    "slug",
                ]),
            )?
            .register(
                ModelAdmin::new(ModelKind::Post)
                    .list_display(&["title", "text", "pub_date", "author", "location", "category"])
                    .search_fields(&["title"])
                    .list_filter(&["category", "location"]),
            )?
            .register(ModelAdmin::new(ModelKind::Comment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_registry_contents() {
        let registry = AdminRegistry::blog().unwrap();

        assert_eq!(registry.models.len(), 4);
        assert_eq!(registry.empty_value_display, "Not set");

        let post = registry.get(ModelKind::Post).unwrap();
        assert_eq!(post.search_fields, vec!["title"]);
        assert_eq!(post.list_filter, vec!["category", "location"]);
        assert_eq!(
            registry.get(ModelKind::Comment).unwrap().list_display,
            vec!["text"]
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = AdminRegistry::new("-")
            .register(ModelAdmin::new(ModelKind::Location))
            .and_then(|r| r.register(ModelAdmin::new(ModelKind::Location)));

        assert_eq!(
            result,
            Err(AdminConfigError::AlreadyRegistered {
                model: ModelKind::Location
            })
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = AdminRegistry::new("-")
            .register(ModelAdmin::new(ModelKind::Category).search_fields(&["name"]));

        assert_eq!(
            result,
            Err(AdminConfigError::UnknownField {
                model: ModelKind::Category,
                field: "name"
            })
        );
    }
}
