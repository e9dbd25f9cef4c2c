//! Catalogue hierarchy use-case service.
//!
//! # Responsibility
//! - Validate hierarchy invariants above the repository layer.
//! - Provide create, reparent, reorder, and delete-with-fold operations.
//!
//! # Invariants
//! - Every mutating operation commits one `CatalogueWriteBatch`, so both
//!   sides of a parent/child update land together or not at all.
//! - The circular-inheritance guard inspects one level up only; deeper
//!   cycles pass (documented known gap, see hierarchy tests).

use crate::model::catalogue::{Catalogue, CatalogueId};
use crate::model::hierarchy::{is_already_child, is_circular_inheritance, is_self_containment};
use crate::model::ordered_refs::OrderedRefError;
use crate::repo::catalogue_repo::{CatalogueRepository, CatalogueWriteBatch};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from catalogue hierarchy operations.
#[derive(Debug)]
pub enum CatalogueServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// A catalogue with this title already exists.
    TitleTaken(String),
    /// Target catalogue does not exist.
    CatalogueNotFound(CatalogueId),
    /// Requested parent does not exist.
    ParentNotFound(CatalogueId),
    /// Child already points at the requested parent.
    AlreadyChild {
        child: CatalogueId,
        parent: CatalogueId,
    },
    /// A catalogue cannot contain itself.
    SelfContainment(CatalogueId),
    /// Reparent would close a direct two-node cycle.
    CircularInheritance {
        child: CatalogueId,
        parent: CatalogueId,
    },
    /// Referenced catalogue is not a child of the named parent.
    NotAChild {
        parent: CatalogueId,
        child: CatalogueId,
    },
    /// Article is already listed under the catalogue.
    ArticleAlreadyListed {
        catalogue: CatalogueId,
        article: Uuid,
    },
    /// Article is not listed under the catalogue.
    ArticleNotListed {
        catalogue: CatalogueId,
        article: Uuid,
    },
    /// Stored state contradicts an in-memory invariant.
    InconsistentState(&'static str),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for CatalogueServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "catalogue title must not be blank"),
            Self::TitleTaken(title) => write!(f, "catalogue title already taken: `{title}`"),
            Self::CatalogueNotFound(id) => write!(f, "catalogue not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent catalogue not found: {id}"),
            Self::AlreadyChild { child, parent } => {
                write!(f, "catalogue {child} is already a child of {parent}")
            }
            Self::SelfContainment(id) => write!(f, "catalogue {id} cannot contain itself"),
            Self::CircularInheritance { child, parent } => write!(
                f,
                "reparenting {child} under {parent} would create a cycle"
            ),
            Self::NotAChild { parent, child } => {
                write!(f, "catalogue {child} is not a child of {parent}")
            }
            Self::ArticleAlreadyListed { catalogue, article } => {
                write!(f, "article {article} already listed under {catalogue}")
            }
            Self::ArticleNotListed { catalogue, article } => {
                write!(f, "article {article} not listed under {catalogue}")
            }
            Self::InconsistentState(details) => {
                write!(f, "inconsistent catalogue state: {details}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogueServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogueServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::CatalogueNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Catalogue hierarchy service facade.
pub struct CatalogueService<R: CatalogueRepository> {
    repo: R,
}

impl<R: CatalogueRepository> CatalogueService<R> {
    /// Creates a service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one catalogue under an optional parent.
    pub fn create(
        &self,
        title: impl Into<String>,
        parent_uuid: Option<CatalogueId>,
    ) -> Result<Catalogue, CatalogueServiceError> {
        let title = normalize_title(title.into())?;
        if self.repo.get_by_title(&title)?.is_some() {
            return Err(CatalogueServiceError::TitleTaken(title));
        }

        let mut catalogue = Catalogue::new(title);
        let mut batch = CatalogueWriteBatch::new();

        if let Some(parent_uuid) = parent_uuid {
            let mut parent = self
                .repo
                .get(parent_uuid)?
                .ok_or(CatalogueServiceError::ParentNotFound(parent_uuid))?;
            catalogue.parent_uuid = Some(parent_uuid);
            parent
                .children
                .append(catalogue.uuid)
                .map_err(|_| CatalogueServiceError::InconsistentState("fresh id already listed"))?;
            batch.save(parent);
        }

        batch.save(catalogue.clone());
        self.repo.commit(&batch)?;
        info!(
            "event=catalogue_create module=catalogue status=ok id={} parent={:?}",
            catalogue.uuid, catalogue.parent_uuid
        );
        Ok(catalogue)
    }

    /// Loads one catalogue by id.
    pub fn get(&self, id: CatalogueId) -> Result<Catalogue, CatalogueServiceError> {
        self.repo
            .get(id)?
            .ok_or(CatalogueServiceError::CatalogueNotFound(id))
    }

    /// Lists root catalogues.
    pub fn list_roots(&self) -> Result<Vec<Catalogue>, CatalogueServiceError> {
        Ok(self.repo.list_roots()?)
    }

    /// Moves a catalogue under a new parent. Returns the updated child.
    pub fn change_parent(
        &self,
        child_uuid: CatalogueId,
        new_parent_uuid: CatalogueId,
    ) -> Result<Catalogue, CatalogueServiceError> {
        let (child, _parent) = self.reparent(child_uuid, new_parent_uuid)?;
        Ok(child)
    }

    /// Appends a catalogue to a parent's children. Returns the updated
    /// parent. Same guard set as [`Self::change_parent`].
    pub fn append_child(
        &self,
        parent_uuid: CatalogueId,
        child_uuid: CatalogueId,
    ) -> Result<Catalogue, CatalogueServiceError> {
        let (_child, parent) = self.reparent(child_uuid, parent_uuid)?;
        Ok(parent)
    }

    /// Detaches a child, making it a root. Returns the updated parent.
    pub fn remove_child(
        &self,
        parent_uuid: CatalogueId,
        child_uuid: CatalogueId,
    ) -> Result<Catalogue, CatalogueServiceError> {
        let mut parent = self.get(parent_uuid)?;
        let mut child = self.get(child_uuid)?;

        if child.parent_uuid != Some(parent_uuid) {
            return Err(CatalogueServiceError::NotAChild {
                parent: parent_uuid,
                child: child_uuid,
            });
        }

        parent
            .children
            .remove(child_uuid)
            .map_err(|_| CatalogueServiceError::NotAChild {
                parent: parent_uuid,
                child: child_uuid,
            })?;
        child.parent_uuid = None;

        let mut batch = CatalogueWriteBatch::new();
        batch.save(child);
        batch.save(parent.clone());
        self.repo.commit(&batch)?;
        Ok(parent)
    }

    /// Exchanges the display order of two children. Returns the updated
    /// parent.
    pub fn switch_children(
        &self,
        parent_uuid: CatalogueId,
        first: CatalogueId,
        second: CatalogueId,
    ) -> Result<Catalogue, CatalogueServiceError> {
        let mut parent = self.get(parent_uuid)?;
        parent
            .children
            .swap(first, second)
            .map_err(|err| match err {
                OrderedRefError::ReferenceNotFound(missing) => CatalogueServiceError::NotAChild {
                    parent: parent_uuid,
                    child: missing,
                },
                OrderedRefError::DuplicateReference(_) => {
                    CatalogueServiceError::InconsistentState("swap reported a duplicate")
                }
            })?;

        let mut batch = CatalogueWriteBatch::new();
        batch.save(parent.clone());
        self.repo.commit(&batch)?;
        Ok(parent)
    }

    /// Deletes a catalogue and folds its children up one level.
    ///
    /// Children keep their relative order when re-appended to the
    /// grandparent; deleting a root makes its children new roots.
    pub fn delete(&self, id: CatalogueId) -> Result<(), CatalogueServiceError> {
        let catalogue = self.get(id)?;
        let child_ids = catalogue.children.in_order();

        let mut grandparent = match catalogue.parent_uuid {
            Some(grandparent_uuid) => {
                let mut loaded = self.get(grandparent_uuid)?;
                // Stale listing is tolerated; the pointer side is authoritative.
                let _ = loaded.children.remove(id);
                Some(loaded)
            }
            None => None,
        };

        let mut batch = CatalogueWriteBatch::new();
        for child_uuid in &child_ids {
            let mut child = self.get(*child_uuid)?;
            child.parent_uuid = catalogue.parent_uuid;
            if let Some(grandparent) = grandparent.as_mut() {
                grandparent.children.append(*child_uuid).map_err(|_| {
                    CatalogueServiceError::InconsistentState("folded child already listed")
                })?;
            }
            batch.save(child);
        }
        if let Some(grandparent) = grandparent {
            batch.save(grandparent);
        }
        batch.delete(id);

        self.repo.commit(&batch)?;
        info!(
            "event=catalogue_delete module=catalogue status=ok id={id} folded_children={}",
            child_ids.len()
        );
        Ok(())
    }

    /// Appends an article to the catalogue's listing. Returns the updated
    /// catalogue.
    pub fn append_article(
        &self,
        catalogue_uuid: CatalogueId,
        article_uuid: Uuid,
    ) -> Result<Catalogue, CatalogueServiceError> {
        let mut catalogue = self.get(catalogue_uuid)?;
        catalogue
            .articles
            .append(article_uuid)
            .map_err(|_| CatalogueServiceError::ArticleAlreadyListed {
                catalogue: catalogue_uuid,
                article: article_uuid,
            })?;

        let mut batch = CatalogueWriteBatch::new();
        batch.save(catalogue.clone());
        self.repo.commit(&batch)?;
        Ok(catalogue)
    }

    /// Removes an article from the catalogue's listing and compacts the
    /// ordering. Returns the updated catalogue.
    pub fn remove_article(
        &self,
        catalogue_uuid: CatalogueId,
        article_uuid: Uuid,
    ) -> Result<Catalogue, CatalogueServiceError> {
        let mut catalogue = self.get(catalogue_uuid)?;
        catalogue
            .articles
            .remove(article_uuid)
            .map_err(|_| CatalogueServiceError::ArticleNotListed {
                catalogue: catalogue_uuid,
                article: article_uuid,
            })?;

        let mut batch = CatalogueWriteBatch::new();
        batch.save(catalogue.clone());
        self.repo.commit(&batch)?;
        Ok(catalogue)
    }

    /// Exchanges the display order of two listed articles.
    pub fn switch_articles(
        &self,
        catalogue_uuid: CatalogueId,
        first: Uuid,
        second: Uuid,
    ) -> Result<Catalogue, CatalogueServiceError> {
        let mut catalogue = self.get(catalogue_uuid)?;
        catalogue
            .articles
            .swap(first, second)
            .map_err(|err| match err {
                OrderedRefError::ReferenceNotFound(missing) => {
                    CatalogueServiceError::ArticleNotListed {
                        catalogue: catalogue_uuid,
                        article: missing,
                    }
                }
                OrderedRefError::DuplicateReference(_) => {
                    CatalogueServiceError::InconsistentState("swap reported a duplicate")
                }
            })?;

        let mut batch = CatalogueWriteBatch::new();
        batch.save(catalogue.clone());
        self.repo.commit(&batch)?;
        Ok(catalogue)
    }

    /// Shared reparent path for `change_parent` and `append_child`.
    ///
    /// Also removes the child from its old parent's children so the
    /// listing side stays consistent with the pointer side.
    fn reparent(
        &self,
        child_uuid: CatalogueId,
        new_parent_uuid: CatalogueId,
    ) -> Result<(Catalogue, Catalogue), CatalogueServiceError> {
        let mut child = self.get(child_uuid)?;

        if is_already_child(&child, new_parent_uuid) {
            return Err(CatalogueServiceError::AlreadyChild {
                child: child_uuid,
                parent: new_parent_uuid,
            });
        }
        if is_self_containment(child_uuid, new_parent_uuid) {
            return Err(CatalogueServiceError::SelfContainment(child_uuid));
        }

        let mut new_parent = self.get(new_parent_uuid)?;
        if is_circular_inheritance(child_uuid, &new_parent) {
            return Err(CatalogueServiceError::CircularInheritance {
                child: child_uuid,
                parent: new_parent_uuid,
            });
        }

        let mut batch = CatalogueWriteBatch::new();
        if let Some(old_parent_uuid) = child.parent_uuid {
            if let Some(mut old_parent) = self.repo.get(old_parent_uuid)? {
                if old_parent.children.remove(child_uuid).is_ok() {
                    batch.save(old_parent);
                }
            }
        }

        child.parent_uuid = Some(new_parent_uuid);
        new_parent
            .children
            .append(child_uuid)
            .map_err(|_| CatalogueServiceError::InconsistentState("child already listed"))?;

        batch.save(child.clone());
        batch.save(new_parent.clone());
        self.repo.commit(&batch)?;
        Ok((child, new_parent))
    }
}

fn normalize_title(value: String) -> Result<String, CatalogueServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogueServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
