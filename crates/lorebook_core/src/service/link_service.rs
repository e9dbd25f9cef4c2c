//! Entry link resolution use-case service.
//!
//! # Responsibility
//! - Derive implicit article links from raw entry content.
//! - Curate author-declared explicit links and re-derive after changes.
//!
//! # Invariants
//! - Explicit link phrases are scrubbed from the content before matching
//!   and never re-appear as implicit links.
//! - `implicit_links` is replaced wholesale on every run; stored content
//!   is never modified by normalization.
//! - Unresolvable entry references are skipped, never fatal.

use crate::model::article::{Article, ArticleId};
use crate::model::entry::{Entry, EntryId};
use crate::repo::article_repo::ArticleRepository;
use crate::repo::entry_repo::EntryRepository;
use crate::repo::synonym_repo::SynonymTable;
use crate::repo::RepoError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static PUNCTUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.,;:!?"'`()\[\]{}<>]"#).expect("valid punctuation regex"));

/// Stop words dropped from both content and candidates before matching.
/// Whole-token, case-insensitive.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "is", "it", "of", "on", "or", "the",
    "to", "was", "with",
];

/// Placeholder written over a matched span so overlapping or repeated
/// candidates cannot double-match it.
const MATCHED_SPAN: &str = "-#-";

/// Errors from link resolution operations.
#[derive(Debug)]
pub enum LinkServiceError {
    /// Target entry does not exist.
    EntryNotFound(EntryId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for LinkServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LinkServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::EntryNotFound(_) => None,
        }
    }
}

impl From<RepoError> for LinkServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::EntryNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Link resolution service facade.
pub struct LinkService<E: EntryRepository, A: ArticleRepository, S: SynonymTable> {
    entries: E,
    articles: A,
    synonyms: S,
}

impl<E: EntryRepository, A: ArticleRepository, S: SynonymTable> LinkService<E, A, S> {
    /// Creates a service from repository/capability implementations.
    pub fn new(entries: E, articles: A, synonyms: S) -> Self {
        Self {
            entries,
            articles,
            synonyms,
        }
    }

    /// Re-derives implicit links for one entry and persists the result.
    pub fn link_entry_to_articles(&self, entry_uuid: EntryId) -> Result<Entry, LinkServiceError> {
        let entry = self
            .entries
            .get(entry_uuid)?
            .ok_or(LinkServiceError::EntryNotFound(entry_uuid))?;
        self.relink(entry)
    }

    /// Re-derives implicit links for every entry the article references.
    ///
    /// References that no longer resolve are skipped silently; the
    /// remaining entries are updated and returned in article order.
    pub fn refresh_links_of_article(
        &self,
        article: &Article,
    ) -> Result<Vec<Entry>, LinkServiceError> {
        let mut updated = Vec::new();
        for entry_uuid in article.entries.in_order() {
            let Some(entry) = self.entries.get(entry_uuid)? else {
                log::debug!(
                    "event=link_refresh module=link status=skip article={} entry={entry_uuid}",
                    article.uuid
                );
                continue;
            };
            updated.push(self.relink(entry)?);
        }
        Ok(updated)
    }

    /// Declares an author link and re-derives implicit links, since the
    /// explicit set feeds the scrub step.
    pub fn declare_explicit_link(
        &self,
        entry_uuid: EntryId,
        phrase: impl Into<String>,
        target: ArticleId,
    ) -> Result<Entry, LinkServiceError> {
        let mut entry = self
            .entries
            .get(entry_uuid)?
            .ok_or(LinkServiceError::EntryNotFound(entry_uuid))?;
        entry.explicit_links.insert(phrase.into(), target);
        self.relink(entry)
    }

    /// Retracts an author link and re-derives implicit links. Retracting
    /// an unknown phrase is a no-op apart from the re-derivation.
    pub fn retract_explicit_link(
        &self,
        entry_uuid: EntryId,
        phrase: &str,
    ) -> Result<Entry, LinkServiceError> {
        let mut entry = self
            .entries
            .get(entry_uuid)?
            .ok_or(LinkServiceError::EntryNotFound(entry_uuid))?;
        entry.explicit_links.remove(phrase);
        self.relink(entry)
    }

    fn relink(&self, entry: Entry) -> Result<Entry, LinkServiceError> {
        let candidates = self.articles.list_link_titles()?;
        let synonyms = self.synonyms.all()?;
        let implicit = resolve_implicit_links(
            &entry.content,
            &entry.explicit_links,
            &candidates,
            &synonyms,
        );
        let entry = entry.relinked(implicit);
        self.entries.save(&entry)?;
        Ok(entry)
    }
}

/// Computes the implicit link set for one piece of content.
///
/// The pipeline scrubs explicit link phrases, normalizes content and
/// candidates to dash-delimited token runs, then scans candidates longest
/// first in two passes (article titles, then synonym aliases). Matched
/// spans are blanked with [`MATCHED_SPAN`] so a shorter candidate cannot
/// re-match inside a longer one.
pub fn resolve_implicit_links(
    content: &str,
    explicit_links: &BTreeMap<String, ArticleId>,
    title_candidates: &[(String, ArticleId)],
    synonyms: &BTreeMap<String, ArticleId>,
) -> BTreeMap<String, ArticleId> {
    let mut scrubbed = content.to_string();
    for phrase in explicit_links.keys() {
        scrubbed = scrubbed.replace(phrase.as_str(), " ");
    }

    let mut haystack = format!("-{}-", normalize_phrase(&scrubbed));
    let mut found = BTreeMap::new();

    scan_candidates(
        &mut haystack,
        title_candidates.iter().map(|(title, id)| (title.as_str(), *id)),
        &mut found,
    );
    scan_candidates(
        &mut haystack,
        synonyms.iter().map(|(alias, id)| (alias.as_str(), *id)),
        &mut found,
    );

    found
}

/// Normalizes a phrase to its dash-joined matchable form.
///
/// Lower-cases, strips the fixed punctuation set, drops stop words and
/// joins the surviving tokens with single dashes. Returns an empty string
/// when nothing survives.
pub fn normalize_phrase(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = PUNCTUATION_RE.replace_all(&lowered, "");
    stripped
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .collect::<Vec<_>>()
        .join("-")
}

fn scan_candidates<'a>(
    haystack: &mut String,
    candidates: impl Iterator<Item = (&'a str, ArticleId)>,
    found: &mut BTreeMap<String, ArticleId>,
) {
    let mut prepared: Vec<(String, String, ArticleId)> = candidates
        .filter_map(|(phrase, target)| {
            let normalized = normalize_phrase(phrase);
            if normalized.is_empty() {
                return None;
            }
            Some((phrase.to_string(), format!("-{normalized}-"), target))
        })
        .collect();
    // Longest needle first, then lexical, for a deterministic scan where
    // a short title cannot fragment a longer one it is contained in.
    prepared.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));

    for (phrase, needle, target) in prepared {
        if haystack.contains(&needle) {
            found.insert(phrase, target);
            *haystack = haystack.replace(&needle, MATCHED_SPAN);
        }
    }
}
