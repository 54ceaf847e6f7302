use super::{cities, divisions, provinces, sub_divisions, territories};
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::schools::models as schools;
use crate::{not_found, protected_resource};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
};

/// Fails when any of the counted references is non-zero.
fn guard_references(resource: &str, references: &[(&str, u64)]) -> BusinessResult<()> {
    let blocking: Vec<String> = references
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| format!("{count} {name}(s)"))
        .collect();

    if blocking.is_empty() {
        Ok(())
    } else {
        Err(protected_resource!(
            resource,
            format!("still referenced by {}", blocking.join(", "))
        ))
    }
}

async fn count_schools(db: &DatabaseConnection, column: schools::Column, id: i32) -> BusinessResult<u64> {
    schools::Entity::find()
        .filter(column.eq(id))
        .count(db)
        .await
        .map_err(|e| e.to_business_error("school"))
}

pub async fn delete_province(db: &DatabaseConnection, id: i32) -> BusinessResult<()> {
    let province = provinces::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("province"))?
        .ok_or_else(|| not_found!("province", id))?;

    let map_err = |e: sea_orm::DbErr| e.to_business_error("province");
    let divisions = divisions::Entity::find()
        .filter(divisions::Column::ProvinceId.eq(id))
        .count(db)
        .await
        .map_err(map_err)?;
    let cities = cities::Entity::find()
        .filter(cities::Column::ProvinceId.eq(id))
        .count(db)
        .await
        .map_err(map_err)?;
    let territories = territories::Entity::find()
        .filter(territories::Column::ProvinceId.eq(id))
        .count(db)
        .await
        .map_err(map_err)?;
    let schools = count_schools(db, schools::Column::ProvinceId, id).await?;

    guard_references(
        "province",
        &[
            ("division", divisions),
            ("city", cities),
            ("territory", territories),
            ("school", schools),
        ],
    )?;

    province
        .delete(db)
        .await
        .map_err(|e| e.to_delete_error("province"))?;
    Ok(())
}

pub async fn delete_division(db: &DatabaseConnection, id: i32) -> BusinessResult<()> {
    let division = divisions::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("division"))?
        .ok_or_else(|| not_found!("division", id))?;

    let sub_divisions = sub_divisions::Entity::find()
        .filter(sub_divisions::Column::DivisionId.eq(id))
        .count(db)
        .await
        .map_err(|e| e.to_business_error("division"))?;
    let schools = count_schools(db, schools::Column::DivisionId, id).await?;

    guard_references(
        "division",
        &[("sub-division", sub_divisions), ("school", schools)],
    )?;

    division
        .delete(db)
        .await
        .map_err(|e| e.to_delete_error("division"))?;
    Ok(())
}

pub async fn delete_sub_division(db: &DatabaseConnection, id: i32) -> BusinessResult<()> {
    let sub_division = sub_divisions::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("sub_division"))?
        .ok_or_else(|| not_found!("sub-division", id))?;

    let schools = count_schools(db, schools::Column::SubDivisionId, id).await?;
    guard_references("sub-division", &[("school", schools)])?;

    sub_division
        .delete(db)
        .await
        .map_err(|e| e.to_delete_error("sub_division"))?;
    Ok(())
}

pub async fn delete_city(db: &DatabaseConnection, id: i32) -> BusinessResult<()> {
    let city = cities::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("city"))?
        .ok_or_else(|| not_found!("city", id))?;

    let schools = count_schools(db, schools::Column::CityId, id).await?;
    guard_references("city", &[("school", schools)])?;

    city.delete(db)
        .await
        .map_err(|e| e.to_delete_error("city"))?;
    Ok(())
}

pub async fn delete_territory(db: &DatabaseConnection, id: i32) -> BusinessResult<()> {
    let territory = territories::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("territory"))?
        .ok_or_else(|| not_found!("territory", id))?;

    let schools = count_schools(db, schools::Column::TerritoryId, id).await?;
    guard_references("territory", &[("school", schools)])?;

    territory
        .delete(db)
        .await
        .map_err(|e| e.to_delete_error("territory"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::BusinessError;

    #[test]
    fn test_guard_references_passes_when_unreferenced() {
        assert!(guard_references("division", &[("school", 0), ("sub-division", 0)]).is_ok());
    }

    #[test]
    fn test_guard_references_lists_blocking_rows() {
        let err = guard_references("division", &[("sub-division", 0), ("school", 2)]).unwrap_err();
        match err {
            BusinessError::Protected { resource, message } => {
                assert_eq!(resource, "division");
                assert_eq!(message, "still referenced by 2 school(s)");
            }
            other => panic!("Expected protected error, got {other:?}"),
        }
    }
}
