use super::campaign_templates;
use super::models::{self as campaigns, Campaign, CampaignCreate};
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::not_found;
use crate::recoltes::models as recoltes;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Attaches template ids and recolte counts to each campaign with two
/// grouped lookups.
pub async fn with_details(
    db: &DatabaseConnection,
    models: Vec<campaigns::Model>,
) -> BusinessResult<Vec<Campaign>> {
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();

    let mut templates: HashMap<i32, Vec<Uuid>> = HashMap::new();
    for binding in campaign_templates::Entity::find()
        .filter(campaign_templates::Column::CampaignId.is_in(ids.clone()))
        .all(db)
        .await
        .map_err(|e| e.to_business_error("campaign"))?
    {
        templates
            .entry(binding.campaign_id)
            .or_default()
            .push(binding.question_template_id);
    }

    let counts: HashMap<i32, i64> = recoltes::Entity::find()
        .select_only()
        .column(recoltes::Column::CampaignId)
        .column_as(Expr::col(recoltes::Column::Id).count(), "count")
        .filter(recoltes::Column::CampaignId.is_in(ids))
        .group_by(recoltes::Column::CampaignId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await
        .map_err(|e| e.to_business_error("recolte"))?
        .into_iter()
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let bound = templates.remove(&model.id).unwrap_or_default();
            let count = counts.get(&model.id).copied().unwrap_or(0);
            Campaign::build(model, bound, u64::try_from(count).unwrap_or(0))
        })
        .collect())
}

pub async fn load_campaign(db: &DatabaseConnection, id: i32) -> BusinessResult<Campaign> {
    let model = campaigns::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("campaign"))?
        .ok_or_else(|| not_found!("campaign", id))?;

    with_details(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| not_found!("campaign", id))
}

async fn bind_templates<C: ConnectionTrait>(
    db: &C,
    campaign_id: i32,
    template_ids: &[Uuid],
) -> BusinessResult<()> {
    campaign_templates::Entity::delete_many()
        .filter(campaign_templates::Column::CampaignId.eq(campaign_id))
        .exec(db)
        .await
        .map_err(|e| e.to_business_error("campaign"))?;

    let mut unique = template_ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    for template_id in unique {
        campaign_templates::ActiveModel {
            campaign_id: Set(campaign_id),
            question_template_id: Set(template_id),
        }
        .insert(db)
        .await
        .map_err(|e| e.to_business_error("question_template"))?;
    }
    Ok(())
}

/// Creates or replaces a campaign and its template bindings in one transaction.
pub async fn save_campaign(
    db: &DatabaseConnection,
    existing: Option<campaigns::Model>,
    payload: CampaignCreate,
) -> BusinessResult<i32> {
    let now = Utc::now();
    let txn = db.begin().await.map_err(|e| e.to_business_error("campaign"))?;

    let is_new = existing.is_none();
    let mut active = match existing {
        Some(model) => model.into(),
        None => campaigns::ActiveModel {
            created_at: Set(now),
            ..Default::default()
        },
    };
    active.name = Set(payload.name);
    active.start_date = Set(payload.start_date);
    active.end_date = Set(payload.end_date);
    active.comments = Set(payload.comments);
    active.updated_at = Set(now);

    let campaign = if is_new {
        active.insert(&txn).await
    } else {
        active.update(&txn).await
    }
    .map_err(|e| e.to_business_error("campaign"))?;

    bind_templates(&txn, campaign.id, &payload.question_templates).await?;
    txn.commit().await.map_err(|e| e.to_business_error("campaign"))?;

    Ok(campaign.id)
}

/// Deletes a campaign. Its recoltes are kept and detached.
pub async fn delete_campaign(db: &DatabaseConnection, id: i32) -> BusinessResult<()> {
    let campaign = campaigns::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("campaign"))?
        .ok_or_else(|| not_found!("campaign", id))?;

    let txn = db.begin().await.map_err(|e| e.to_business_error("campaign"))?;

    recoltes::Entity::update_many()
        .col_expr(
            recoltes::Column::CampaignId,
            Expr::value(Option::<i32>::None),
        )
        .filter(recoltes::Column::CampaignId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| e.to_business_error("recolte"))?;
    campaign_templates::Entity::delete_many()
        .filter(campaign_templates::Column::CampaignId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| e.to_business_error("campaign"))?;
    campaign
        .delete(&txn)
        .await
        .map_err(|e| e.to_business_error("campaign"))?;

    txn.commit().await.map_err(|e| e.to_business_error("campaign"))?;
    Ok(())
}
