use lorebook_core::db::open_db_in_memory;
use lorebook_core::{
    ArticleService, EntryRepository, LinkService, LinkServiceError, SqliteArticleRepository,
    SqliteEntryRepository, SqliteSynonymTable, SynonymTable,
};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn articles(
    conn: &rusqlite::Connection,
) -> ArticleService<SqliteArticleRepository<'_>, SqliteEntryRepository<'_>> {
    ArticleService::new(
        SqliteArticleRepository::new(conn),
        SqliteEntryRepository::new(conn),
    )
}

fn links(
    conn: &rusqlite::Connection,
) -> LinkService<SqliteEntryRepository<'_>, SqliteArticleRepository<'_>, SqliteSynonymTable<'_>> {
    LinkService::new(
        SqliteEntryRepository::new(conn),
        SqliteArticleRepository::new(conn),
        SqliteSynonymTable::new(conn),
    )
}

#[test]
fn title_mention_becomes_implicit_link() {
    let conn = setup();
    let articles = articles(&conn);
    let links = links(&conn);

    let conciliator = articles.create_article("Conciliator").unwrap();
    let host = articles.create_article("Chronicle").unwrap();
    let entry = articles
        .append_entry(host.uuid, "The Conciliator arrived before dawn.")
        .unwrap();

    let entry = links.link_entry_to_articles(entry.uuid).unwrap();
    assert_eq!(entry.implicit_links.get("Conciliator"), Some(&conciliator.uuid));
}

#[test]
fn explicit_phrase_is_excluded_from_implicit_matching() {
    let conn = setup();
    let articles = articles(&conn);
    let links = links(&conn);

    let conciliator = articles.create_article("Conciliator").unwrap();
    let vanessa = articles.create_article("Vanessa Strongwill").unwrap();
    let host = articles.create_article("Chronicle").unwrap();
    let entry = articles
        .append_entry(host.uuid, "Conciliator, tutor of Vanessa Strongwill")
        .unwrap();

    let entry = links
        .declare_explicit_link(entry.uuid, "Vanessa Strongwill", vanessa.uuid)
        .unwrap();

    assert_eq!(
        entry.explicit_links.get("Vanessa Strongwill"),
        Some(&vanessa.uuid)
    );
    assert_eq!(entry.implicit_links.len(), 1);
    assert_eq!(entry.implicit_links.get("Conciliator"), Some(&conciliator.uuid));
}

#[test]
fn retracting_the_phrase_lets_it_match_again() {
    let conn = setup();
    let articles = articles(&conn);
    let links = links(&conn);

    let vanessa = articles.create_article("Vanessa Strongwill").unwrap();
    let host = articles.create_article("Chronicle").unwrap();
    let entry = articles
        .append_entry(host.uuid, "A letter to Vanessa Strongwill")
        .unwrap();

    let entry = links
        .declare_explicit_link(entry.uuid, "Vanessa Strongwill", vanessa.uuid)
        .unwrap();
    assert!(entry.implicit_links.is_empty());

    let entry = links
        .retract_explicit_link(entry.uuid, "Vanessa Strongwill")
        .unwrap();
    assert!(entry.explicit_links.is_empty());
    assert_eq!(
        entry.implicit_links.get("Vanessa Strongwill"),
        Some(&vanessa.uuid)
    );
}

#[test]
fn synonym_alias_resolves_to_its_article() {
    let conn = setup();
    let articles = articles(&conn);
    let links = links(&conn);

    let jonathan = articles.create_article("Jonathan").unwrap();
    let host = articles.create_article("Chronicle").unwrap();
    let entry = articles
        .append_entry(host.uuid, "A portrait hangs in the Harker estate.")
        .unwrap();

    let synonyms = SqliteSynonymTable::new(&conn);
    synonyms.set("Harker", jonathan.uuid).unwrap();

    let entry = links.link_entry_to_articles(entry.uuid).unwrap();
    assert_eq!(entry.implicit_links.get("Harker"), Some(&jonathan.uuid));
}

#[test]
fn resolved_links_are_persisted() {
    let conn = setup();
    let articles = articles(&conn);
    let links = links(&conn);

    let conciliator = articles.create_article("Conciliator").unwrap();
    let host = articles.create_article("Chronicle").unwrap();
    let entry = articles
        .append_entry(host.uuid, "Conciliator teaches history.")
        .unwrap();

    links.link_entry_to_articles(entry.uuid).unwrap();

    let reloaded = SqliteEntryRepository::new(&conn)
        .get(entry.uuid)
        .unwrap()
        .unwrap();
    assert_eq!(
        reloaded.implicit_links.get("Conciliator"),
        Some(&conciliator.uuid)
    );
}

#[test]
fn linking_twice_is_idempotent() {
    let conn = setup();
    let articles = articles(&conn);
    let links = links(&conn);

    articles.create_article("Conciliator").unwrap();
    let host = articles.create_article("Chronicle").unwrap();
    let entry = articles
        .append_entry(host.uuid, "Conciliator teaches history.")
        .unwrap();

    let first = links.link_entry_to_articles(entry.uuid).unwrap();
    let second = links.link_entry_to_articles(entry.uuid).unwrap();
    assert_eq!(first.implicit_links, second.implicit_links);
}

#[test]
fn linking_unknown_entry_fails() {
    let conn = setup();
    let links = links(&conn);

    let ghost = Uuid::new_v4();
    let err = links.link_entry_to_articles(ghost).unwrap_err();
    assert!(matches!(err, LinkServiceError::EntryNotFound(id) if id == ghost));
}

#[test]
fn refresh_skips_dangling_entry_references() {
    let conn = setup();
    let articles = articles(&conn);
    let links = links(&conn);

    articles.create_article("Conciliator").unwrap();
    let host = articles.create_article("Chronicle").unwrap();
    let doomed = articles
        .append_entry(host.uuid, "This row will vanish.")
        .unwrap();
    let kept = articles
        .append_entry(host.uuid, "Conciliator remains.")
        .unwrap();

    // Drop the entry row behind the ordering's back; the attachment stays.
    conn.execute(
        "DELETE FROM entries WHERE uuid = ?1;",
        [doomed.uuid.to_string()],
    )
    .unwrap();

    let host = articles.get_article(host.uuid).unwrap();
    assert_eq!(host.entries.len(), 2);

    let updated = links.refresh_links_of_article(&host).unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].uuid, kept.uuid);
    assert!(updated[0].implicit_links.contains_key("Conciliator"));
}
