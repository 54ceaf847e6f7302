use super::models::{self as schools, School};
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::geography::{divisions, provinces, sub_divisions};
use crate::not_found;
use crate::recoltes::models as recoltes;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, TransactionTrait,
};
use std::collections::HashMap;

/// Converts rows to API objects with the province, division and sub-division
/// names filled in, using one lookup per level.
pub async fn with_location_names(
    db: &DatabaseConnection,
    models: Vec<schools::Model>,
) -> BusinessResult<Vec<School>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let province_ids: Vec<i32> = models.iter().map(|m| m.province_id).collect();
    let division_ids: Vec<i32> = models.iter().map(|m| m.division_id).collect();
    let sub_division_ids: Vec<i32> = models.iter().map(|m| m.sub_division_id).collect();

    let province_names: HashMap<i32, Option<String>> = provinces::Entity::find()
        .filter(provinces::Column::Id.is_in(province_ids))
        .all(db)
        .await
        .map_err(|e| e.to_business_error("province"))?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let division_names: HashMap<i32, String> = divisions::Entity::find()
        .filter(divisions::Column::Id.is_in(division_ids))
        .all(db)
        .await
        .map_err(|e| e.to_business_error("division"))?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();
    let sub_division_names: HashMap<i32, String> = sub_divisions::Entity::find()
        .filter(sub_divisions::Column::Id.is_in(sub_division_ids))
        .all(db)
        .await
        .map_err(|e| e.to_business_error("sub_division"))?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let mut school = School::from(model);
            school.province_name = province_names.get(&school.province_id).cloned().flatten();
            school.division_name = division_names.get(&school.division_id).cloned();
            school.sub_division_name = sub_division_names.get(&school.sub_division_id).cloned();
            school
        })
        .collect())
}

pub async fn load_school(db: &DatabaseConnection, id: i32) -> BusinessResult<School> {
    let model = schools::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("school"))?
        .ok_or_else(|| not_found!("school", id))?;

    with_location_names(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| not_found!("school", id))
}

/// Deletes a school together with its recoltes.
pub async fn delete_school(db: &DatabaseConnection, id: i32) -> BusinessResult<()> {
    let school = schools::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("school"))?
        .ok_or_else(|| not_found!("school", id))?;

    let txn = db.begin().await.map_err(|e| e.to_business_error("school"))?;

    let removed = recoltes::Entity::delete_many()
        .filter(recoltes::Column::EstablishmentId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| e.to_business_error("recolte"))?;
    school
        .delete(&txn)
        .await
        .map_err(|e| e.to_business_error("school"))?;

    txn.commit().await.map_err(|e| e.to_business_error("school"))?;

    tracing::info!(id, recoltes = removed.rows_affected, "Deleted school");
    Ok(())
}
