use crate::common::forms::split_options;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[sea_orm(string_value = "choice")]
    Choice,
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "number")]
    Number,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub template_id: Uuid,
    pub groupe_id: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub kind: QuestionKind,
    #[sea_orm(column_type = "Json")]
    pub options: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::templates::Entity",
        from = "Column::TemplateId",
        to = "super::templates::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    QuestionTemplates,
    #[sea_orm(
        belongs_to = "super::groupes::Entity",
        from = "Column::GroupeId",
        to = "super::groupes::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Groupes,
}

impl Related<super::templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestionTemplates.def()
    }
}

impl Related<super::groupes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groupes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct Question {
    pub id: Uuid,
    pub template_id: Uuid,
    pub groupe_id: Option<i32>,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reads the stored options column. A value that is not a list of strings is
/// reported and read as no options.
fn stored_options(id: Uuid, value: Json) -> Vec<String> {
    match serde_json::from_value(value) {
        Ok(options) => options,
        Err(e) => {
            tracing::warn!(question = %id, "Ignoring unreadable question options: {e}");
            Vec::new()
        }
    }
}

impl From<Model> for Question {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            template_id: model.template_id,
            groupe_id: model.groupe_id,
            text: model.text,
            kind: model.kind,
            options: stored_options(model.id, model.options),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Options arrive either as a JSON list or as one comma separated string.
#[derive(ToSchema, Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum OptionsInput {
    List(Vec<String>),
    Text(String),
}

impl Default for OptionsInput {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl OptionsInput {
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::List(options) => options
                .into_iter()
                .map(|option| option.trim().to_string())
                .filter(|option| !option.is_empty())
                .collect(),
            Self::Text(raw) => split_options(&raw),
        }
    }
}

/// Options only apply to choice questions; other kinds store an empty list.
pub fn options_for(kind: QuestionKind, options: Vec<String>) -> Json {
    match kind {
        QuestionKind::Choice => Json::from(options),
        QuestionKind::Text | QuestionKind::Number => Json::Array(Vec::new()),
    }
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct QuestionCreate {
    pub template_id: Uuid,
    #[serde(default)]
    pub groupe_id: Option<i32>,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: OptionsInput,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_accept_list_or_comma_string() {
        let from_list: OptionsInput = serde_json::from_value(json!(["Oui", " ", "Non "])).unwrap();
        assert_eq!(from_list.into_list(), vec!["Oui", "Non"]);

        let from_text: OptionsInput = serde_json::from_value(json!("Eau, Électricité,")).unwrap();
        assert_eq!(from_text.into_list(), vec!["Eau", "Électricité"]);
    }

    #[test]
    fn test_unreadable_stored_options_read_as_empty() {
        let id = Uuid::new_v4();
        assert_eq!(stored_options(id, json!(["Oui", "Non"])), vec!["Oui", "Non"]);
        assert!(stored_options(id, json!({"Oui": 1})).is_empty());
        assert!(stored_options(id, json!("Oui, Non")).is_empty());
    }

    #[test]
    fn test_options_dropped_for_free_text_kinds() {
        let options = vec!["A".to_string(), "B".to_string()];
        assert_eq!(options_for(QuestionKind::Choice, options.clone()), json!(["A", "B"]));
        assert_eq!(options_for(QuestionKind::Number, options), json!([]));
    }

    #[test]
    fn test_kind_parses_from_stored_value() {
        use sea_orm::ActiveEnum;
        assert_eq!(
            QuestionKind::try_from_value(&"number".to_string()).unwrap(),
            QuestionKind::Number
        );
        assert!(QuestionKind::try_from_value(&"date".to_string()).is_err());
    }
}
