use super::questions::{self, Question, QuestionKind, options_for};
use super::{groupes, templates};
use crate::campaigns::campaign_templates;
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::forms::split_options;
use crate::{not_found, validation_error};
use chrono::Utc;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A groupe reference from the bulk form: an id, a numeric string or blank.
#[derive(ToSchema, Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum GroupeRef {
    Id(i32),
    Text(String),
}

impl GroupeRef {
    fn resolve(&self) -> BusinessResult<Option<i32>> {
        match self {
            Self::Id(id) => Ok(Some(*id)),
            Self::Text(raw) if raw.trim().is_empty() => Ok(None),
            Self::Text(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| validation_error!("groupe", format!("'{raw}' is not a groupe id"))),
        }
    }
}

/// Parallel lists from the bulk question form. Entry `i` of every list
/// describes question `i`. The shortest list sent decides how many questions
/// are created; `options` and `groupe` may be omitted entirely.
#[derive(ToSchema, Deserialize, Clone, Debug, Default)]
pub struct BulkQuestions {
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub kind: Vec<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Option<i32>>)]
    pub groupe: Vec<Option<GroupeRef>>,
}

struct NewQuestion {
    text: String,
    kind: QuestionKind,
    options: Vec<String>,
    groupe_id: Option<i32>,
}

fn zip_bulk(payload: &BulkQuestions) -> BusinessResult<Vec<NewQuestion>> {
    let count = [payload.options.len(), payload.groupe.len()]
        .into_iter()
        .filter(|len| *len > 0)
        .fold(payload.text.len().min(payload.kind.len()), usize::min);

    payload
        .text
        .iter()
        .zip(&payload.kind)
        .take(count)
        .enumerate()
        .map(|(i, (text, kind))| {
            let kind = QuestionKind::try_from_value(&kind.trim().to_string())
                .map_err(|_| validation_error!("kind", format!("'{kind}' is not a question kind")))?;
            let groupe_id = match payload.groupe.get(i) {
                Some(Some(groupe)) => groupe.resolve()?,
                _ => None,
            };
            Ok(NewQuestion {
                text: text.trim().to_string(),
                kind,
                options: payload
                    .options
                    .get(i)
                    .map(String::as_str)
                    .map(split_options)
                    .unwrap_or_default(),
                groupe_id,
            })
        })
        .collect()
}

/// Adds every zipped question to the template in one transaction.
pub async fn bulk_add_questions(
    db: &DatabaseConnection,
    template_id: Uuid,
    payload: &BulkQuestions,
) -> BusinessResult<Vec<Question>> {
    templates::Entity::find_by_id(template_id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("question_template"))?
        .ok_or_else(|| not_found!("question template", template_id))?;

    let new_questions = zip_bulk(payload)?;
    let txn = db.begin().await.map_err(|e| e.to_business_error("question"))?;

    let mut created = Vec::with_capacity(new_questions.len());
    for question in new_questions {
        let now = Utc::now();
        let model = questions::ActiveModel {
            id: Set(Uuid::new_v4()),
            template_id: Set(template_id),
            groupe_id: Set(question.groupe_id),
            text: Set(question.text),
            kind: Set(question.kind),
            options: Set(options_for(question.kind, question.options)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| e.to_business_error("question"))?;
        created.push(Question::from(model));
    }

    txn.commit().await.map_err(|e| e.to_business_error("question"))?;

    tracing::info!(%template_id, count = created.len(), "Bulk added questions");
    Ok(created)
}

/// Deletes a template, its questions and its campaign bindings.
pub async fn delete_template(db: &DatabaseConnection, id: Uuid) -> BusinessResult<()> {
    let template = templates::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("question_template"))?
        .ok_or_else(|| not_found!("question template", id))?;

    let txn = db
        .begin()
        .await
        .map_err(|e| e.to_business_error("question_template"))?;

    questions::Entity::delete_many()
        .filter(questions::Column::TemplateId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| e.to_business_error("question"))?;
    campaign_templates::Entity::delete_many()
        .filter(campaign_templates::Column::QuestionTemplateId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| e.to_business_error("campaign"))?;
    template
        .delete(&txn)
        .await
        .map_err(|e| e.to_business_error("question_template"))?;

    txn.commit()
        .await
        .map_err(|e| e.to_business_error("question_template"))?;
    Ok(())
}

/// Deletes a groupe; its questions stay, ungrouped.
pub async fn delete_groupe(db: &DatabaseConnection, id: i32) -> BusinessResult<()> {
    let groupe = groupes::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("groupe"))?
        .ok_or_else(|| not_found!("groupe", id))?;

    let txn = db.begin().await.map_err(|e| e.to_business_error("groupe"))?;

    questions::Entity::update_many()
        .col_expr(questions::Column::GroupeId, Expr::value(Option::<i32>::None))
        .filter(questions::Column::GroupeId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| e.to_business_error("question"))?;
    groupe
        .delete(&txn)
        .await
        .map_err(|e| e.to_business_error("groupe"))?;

    txn.commit().await.map_err(|e| e.to_business_error("groupe"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::BusinessError;
    use serde_json::json;

    fn bulk(value: serde_json::Value) -> BulkQuestions {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_zip_truncates_to_shortest_list() {
        let payload = bulk(json!({
            "text": ["Nombre d'élèves", "Eau potable ?", "Remarques"],
            "kind": ["number", "choice"],
            "options": ["", "Oui, Non", ""],
            "groupe": ["", 4, ""]
        }));

        let zipped = zip_bulk(&payload).unwrap();
        assert_eq!(zipped.len(), 2);
        assert_eq!(zipped[0].kind, QuestionKind::Number);
        assert_eq!(zipped[0].groupe_id, None);
        assert_eq!(zipped[1].options, vec!["Oui", "Non"]);
        assert_eq!(zipped[1].groupe_id, Some(4));
    }

    #[test]
    fn test_zip_without_options_or_groupe_lists() {
        let payload = bulk(json!({
            "text": ["Nombre de salles", "Latrines ?", "Observations"],
            "kind": ["number", "choice"],
            "options": ["", "Oui, Non"]
        }));

        let zipped = zip_bulk(&payload).unwrap();
        assert_eq!(zipped.len(), 2);
        assert!(zipped.iter().all(|question| question.groupe_id.is_none()));
        assert_eq!(zipped[1].options, vec!["Oui", "Non"]);
    }

    #[test]
    fn test_zip_short_options_list_still_truncates() {
        let payload = bulk(json!({
            "text": ["Nombre de salles", "Latrines ?", "Observations"],
            "kind": ["number", "choice", "text"],
            "options": ["", "Oui, Non"]
        }));

        assert_eq!(zip_bulk(&payload).unwrap().len(), 2);
    }

    #[test]
    fn test_zip_rejects_unknown_kind() {
        let payload = bulk(json!({
            "text": ["Date de visite"],
            "kind": ["date"],
            "options": [""],
            "groupe": [null]
        }));

        assert!(matches!(
            zip_bulk(&payload),
            Err(BusinessError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_groupe_ref_parsing() {
        assert_eq!(GroupeRef::Text(" 7 ".to_string()).resolve().unwrap(), Some(7));
        assert_eq!(GroupeRef::Text(String::new()).resolve().unwrap(), None);
        assert!(GroupeRef::Text("abc".to_string()).resolve().is_err());
    }
}
