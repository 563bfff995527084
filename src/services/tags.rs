//! Tag services

use tracing::info;

use super::conflict_or_db;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Tag, TagCreate, TagUpdate};

const DUPLICATE_TAG: &str = "A tag with that name, color or slug already exists";

pub fn list_tags(db: &Database) -> AppResult<Vec<Tag>> {
    let conn = db.get_conn()?;
    Ok(Tag::list(&conn)?)
}

pub fn get_tag(db: &Database, id: i64) -> AppResult<Tag> {
    let conn = db.get_conn()?;
    Tag::get_by_id(&conn, id)?.ok_or_else(|| AppError::not_found(format!("Tag {}", id)))
}

pub fn create_tag(db: &Database, mut data: TagCreate) -> AppResult<Tag> {
    data.validate().map_err(AppError::invalid_input)?;
    let conn = db.get_conn()?;
    let tag = Tag::create(&conn, &data).map_err(|e| conflict_or_db(e, DUPLICATE_TAG))?;
    info!(tag_id = tag.id, slug = %tag.slug, "created tag");
    Ok(tag)
}

pub fn update_tag(db: &Database, id: i64, mut data: TagUpdate) -> AppResult<Tag> {
    data.validate().map_err(AppError::invalid_input)?;
    let conn = db.get_conn()?;
    Tag::update(&conn, id, &data)
        .map_err(|e| conflict_or_db(e, DUPLICATE_TAG))?
        .ok_or_else(|| AppError::not_found(format!("Tag {}", id)))
}

/// Removing a tag detaches it from every recipe
pub fn delete_tag(db: &Database, id: i64) -> AppResult<()> {
    let conn = db.get_conn()?;
    if !Tag::delete(&conn, id)? {
        return Err(AppError::not_found(format!("Tag {}", id)));
    }
    info!(tag_id = id, "deleted tag");
    Ok(())
}
