use crate::models::{Database, FieldSpec, FieldType, GenerationRequest};
use crate::prompt::Language;

/// One field being authored in the add-field modal. Type defaults to
/// String, the required flag to false; instructions are optional.
#[derive(Debug, Clone)]
pub struct FieldDraft {
    pub name: String,
    pub field_type: FieldType,
    pub is_required: bool,
    pub instructions: String,
}

impl Default for FieldDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            field_type: FieldType::String,
            is_required: false,
            instructions: String::new(),
        }
    }
}

impl FieldDraft {
    fn into_spec(self) -> FieldSpec {
        let instructions = if self.instructions.trim().is_empty() {
            None
        } else {
            Some(self.instructions)
        };
        FieldSpec {
            name: self.name,
            field_type: self.field_type,
            is_required: self.is_required,
            instructions,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormErrors {
    pub entity: Option<String>,
    pub fields: Option<String>,
}

/// Collects one generation request. Fields are append-only: the list grows
/// through the draft modal and is never edited or pruned.
#[derive(Debug, Default)]
pub struct GeneratorForm {
    pub entity: String,
    pub fields: Vec<FieldSpec>,
    pub language: Language,
    pub database: Database,
    pub errors: FormErrors,
    draft: Option<FieldDraft>,
}

impl GeneratorForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_field_modal(&mut self) {
        self.draft.get_or_insert_with(FieldDraft::default);
    }

    pub fn close_field_modal(&mut self) {
        self.draft = None;
    }

    pub fn draft_mut(&mut self) -> Option<&mut FieldDraft> {
        self.draft.as_mut()
    }

    /// Appends the draft as a new field. Keeps the modal open with an
    /// inline error when the name is blank.
    pub fn add_field(&mut self) -> bool {
        let Some(draft) = self.draft.take() else {
            return false;
        };
        if draft.name.trim().is_empty() {
            self.errors.fields = Some("Field name is required.".to_string());
            self.draft = Some(draft);
            return false;
        }
        self.errors.fields = None;
        self.fields.push(draft.into_spec());
        true
    }

    /// Entity must be non-empty after trimming and at least one field must
    /// exist. Violations surface as inline messages and block submission.
    pub fn validate(&mut self) -> bool {
        self.errors = FormErrors::default();
        if self.entity.trim().is_empty() {
            self.errors.entity = Some("Entity name is required.".to_string());
        }
        if self.fields.is_empty() {
            self.errors.fields = Some("At least one field is required.".to_string());
        }
        self.errors.entity.is_none() && self.errors.fields.is_none()
    }

    pub fn to_request(&self, stream: bool) -> GenerationRequest {
        GenerationRequest {
            entity: self.entity.trim().to_string(),
            fields: self.fields.clone(),
            database: self.database,
            language: self.language.as_str().to_string(),
            stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled_form() -> GeneratorForm {
        let mut form = GeneratorForm::new();
        form.entity = "Book".into();
        form.open_field_modal();
        form.draft_mut().unwrap().name = "title".into();
        form.add_field();
        form
    }

    #[test]
    fn new_draft_uses_the_modal_defaults() {
        let mut form = GeneratorForm::new();
        form.open_field_modal();
        let draft = form.draft_mut().unwrap();
        assert_eq!(draft.field_type, FieldType::String);
        assert!(!draft.is_required);
        assert!(draft.instructions.is_empty());
    }

    #[test]
    fn add_field_requires_a_name_and_keeps_the_modal_open() {
        let mut form = GeneratorForm::new();
        form.open_field_modal();
        assert!(!form.add_field());
        assert_eq!(form.errors.fields.as_deref(), Some("Field name is required."));
        assert!(form.draft_mut().is_some());
        assert!(form.fields.is_empty());
    }

    #[test]
    fn add_field_appends_and_closes_the_modal() {
        let mut form = GeneratorForm::new();
        form.open_field_modal();
        let draft = form.draft_mut().unwrap();
        draft.name = "title".into();
        draft.is_required = true;
        draft.instructions = "  ".into();
        assert!(form.add_field());
        assert!(form.draft_mut().is_none());
        assert_eq!(form.fields.len(), 1);
        assert!(form.fields[0].is_required);
        // Blank instructions collapse to absent.
        assert_eq!(form.fields[0].instructions, None);
    }

    #[test]
    fn fields_are_append_only() {
        let mut form = filled_form();
        form.open_field_modal();
        form.draft_mut().unwrap().name = "pages".into();
        form.add_field();
        let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "pages"]);
    }

    #[test]
    fn blank_entity_blocks_validation() {
        let mut form = filled_form();
        form.entity = "   ".into();
        assert!(!form.validate());
        assert_eq!(form.errors.entity.as_deref(), Some("Entity name is required."));
        assert_eq!(form.errors.fields, None);
    }

    #[test]
    fn empty_field_list_blocks_validation() {
        let mut form = GeneratorForm::new();
        form.entity = "Book".into();
        assert!(!form.validate());
        assert_eq!(
            form.errors.fields.as_deref(),
            Some("At least one field is required.")
        );
    }

    #[test]
    fn valid_form_builds_the_wire_request() {
        let mut form = filled_form();
        form.database = Database::PostgreSql;
        form.language = Language::NodeJs;
        assert!(form.validate());
        let request = form.to_request(true);
        assert_eq!(request.entity, "Book");
        assert_eq!(request.language, "node js");
        assert_eq!(request.database, Database::PostgreSql);
        assert!(request.stream);
    }
}
