//! Bulk load of divisions and sub-divisions from the national JSON export.
//!
//! The file is a list of entries, one per educational province:
//!
//! ```json
//! [{"province_macro": "Kasaï Central",
//!   "province_educationnelle": "Kasaï Central 1",
//!   "subdivisions": [{"subdivision_name": "Kananga 1"}]}]
//! ```

use super::{divisions, provinces, sub_divisions};
use chrono::Utc;
use indicatif::ProgressBar;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct DivisionImportEntry {
    #[serde(default)]
    pub province_macro: String,
    #[serde(default)]
    pub province_educationnelle: String,
    #[serde(default)]
    pub subdivisions: Vec<SubDivisionImportEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubDivisionImportEntry {
    pub subdivision_name: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub provinces_created: usize,
    pub divisions_created: usize,
    pub sub_divisions_created: usize,
    pub entries_skipped: usize,
}

/// Alternate spelling tried when the province name is not found as given.
/// "Kasaï Central" is stored as "Kasaï-Central", except for Kongo Central.
fn normalized_province_name(name: &str) -> String {
    let hyphenated = name.replace(' ', "-");
    if hyphenated == "Kongo-Central" {
        "Kongo Central".to_string()
    } else {
        hyphenated
    }
}

/// Unique code for an imported sub-division: `{division_id}-{name}-{random}`.
fn sub_division_code(division_id: i32, name: &str) -> String {
    let prefix: String = name.chars().take(50).collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{division_id}-{prefix}-{}", &suffix[..8])
}

async fn find_province_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<provinces::Model>, DbErr> {
    provinces::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(provinces::Column::Name))).eq(name.to_lowercase()))
        .one(db)
        .await
}

async fn find_or_create_province<C: ConnectionTrait>(
    db: &C,
    name: &str,
    summary: &mut ImportSummary,
) -> Result<provinces::Model, DbErr> {
    if let Some(province) = find_province_by_name(db, name).await? {
        return Ok(province);
    }
    if let Some(province) = find_province_by_name(db, &normalized_province_name(name)).await? {
        return Ok(province);
    }

    let province = provinces::ActiveModel {
        name: Set(Some(name.to_string())),
        ..Default::default()
    }
    .insert(db)
    .await?;
    summary.provinces_created += 1;
    tracing::info!(name, "Created province");
    Ok(province)
}

async fn find_or_create_division<C: ConnectionTrait>(
    db: &C,
    province_id: i32,
    name: &str,
    summary: &mut ImportSummary,
) -> Result<divisions::Model, DbErr> {
    let existing = divisions::Entity::find()
        .filter(divisions::Column::ProvinceId.eq(province_id))
        .filter(divisions::Column::Name.eq(name))
        .one(db)
        .await?;
    if let Some(division) = existing {
        return Ok(division);
    }

    let now = Utc::now();
    let division = divisions::ActiveModel {
        province_id: Set(province_id),
        name: Set(name.to_string()),
        code: Set(None),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    summary.divisions_created += 1;
    tracing::debug!(name, province_id, "Created division");
    Ok(division)
}

async fn ensure_sub_division<C: ConnectionTrait>(
    db: &C,
    division_id: i32,
    name: &str,
    summary: &mut ImportSummary,
) -> Result<(), DbErr> {
    let existing = sub_divisions::Entity::find()
        .filter(sub_divisions::Column::DivisionId.eq(division_id))
        .filter(sub_divisions::Column::Name.eq(name))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let now = Utc::now();
    sub_divisions::ActiveModel {
        division_id: Set(division_id),
        name: Set(name.to_string()),
        code: Set(sub_division_code(division_id, name)),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    summary.sub_divisions_created += 1;
    Ok(())
}

/// Imports every entry inside a single transaction. Any failure rolls the
/// whole import back and is reported as one error.
pub async fn import_divisions(
    db: &DatabaseConnection,
    entries: &[DivisionImportEntry],
    progress: Option<&ProgressBar>,
) -> anyhow::Result<ImportSummary> {
    let txn = db.begin().await?;
    let mut summary = ImportSummary::default();

    for entry in entries {
        let province_name = entry.province_macro.trim();
        let division_name = entry.province_educationnelle.trim();

        if province_name.is_empty() || division_name.is_empty() {
            summary.entries_skipped += 1;
        } else {
            let province = find_or_create_province(&txn, province_name, &mut summary)
                .await
                .map_err(|e| anyhow::anyhow!("Import failed on province '{province_name}': {e}"))?;
            let division = find_or_create_division(&txn, province.id, division_name, &mut summary)
                .await
                .map_err(|e| anyhow::anyhow!("Import failed on division '{division_name}': {e}"))?;

            for sub in &entry.subdivisions {
                let Some(name) = sub.subdivision_name.as_deref().map(str::trim) else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                ensure_sub_division(&txn, division.id, name, &mut summary)
                    .await
                    .map_err(|e| anyhow::anyhow!("Import failed on sub-division '{name}': {e}"))?;
            }
        }

        if let Some(bar) = progress {
            bar.inc(1);
        }
    }

    txn.commit().await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_helpers::setup_test_db;
    use sea_orm::PaginatorTrait;

    fn entry(province: &str, division: &str, subs: &[&str]) -> DivisionImportEntry {
        DivisionImportEntry {
            province_macro: province.to_string(),
            province_educationnelle: division.to_string(),
            subdivisions: subs
                .iter()
                .map(|name| SubDivisionImportEntry {
                    subdivision_name: Some((*name).to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_normalized_province_name() {
        assert_eq!(normalized_province_name("Kasaï Central"), "Kasaï-Central");
        assert_eq!(normalized_province_name("Kongo Central"), "Kongo Central");
        assert_eq!(normalized_province_name("Kinshasa"), "Kinshasa");
    }

    #[test]
    fn test_sub_division_code_shape() {
        let long_name = "x".repeat(80);
        let code = sub_division_code(12, &long_name);
        assert!(code.starts_with(&format!("12-{}-", "x".repeat(50))));
        assert_eq!(code.len(), "12-".len() + 50 + 1 + 8);
    }

    #[tokio::test]
    async fn test_import_reuses_existing_province_case_insensitively() {
        let db = setup_test_db().await;
        provinces::ActiveModel {
            name: Set(Some("Kasaï-Central".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let entries = vec![
            entry("kasaï central", "Kasaï Central 1", &["Kananga 1", "Kananga 2"]),
            entry("Kinshasa", "Kinshasa Funa", &["Funa 1"]),
            entry("", "Orphan", &["Ignored"]),
        ];

        let summary = import_divisions(&db, &entries, None).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                provinces_created: 1,
                divisions_created: 2,
                sub_divisions_created: 3,
                entries_skipped: 1,
            }
        );
        assert_eq!(provinces::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let db = setup_test_db().await;
        let entries = vec![entry("Kinshasa", "Kinshasa Funa", &["Funa 1", "Funa 2"])];

        import_divisions(&db, &entries, None).await.unwrap();
        let second = import_divisions(&db, &entries, None).await.unwrap();

        assert_eq!(second, ImportSummary::default());
        assert_eq!(divisions::Entity::find().count(&db).await.unwrap(), 1);
        assert_eq!(sub_divisions::Entity::find().count(&db).await.unwrap(), 2);
    }
}
