use crate::models::{Database, FieldSpec};
use std::fmt;

/// The closed set of target stacks. Template dispatch is a plain `match`
/// over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Java,
    ReactJs,
    NextJs,
    NodeJs,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Java,
        Language::ReactJs,
        Language::NextJs,
        Language::NodeJs,
    ];

    pub fn parse(value: &str) -> Option<Language> {
        match value {
            "java" => Some(Language::Java),
            "react js" => Some(Language::ReactJs),
            "next js" => Some(Language::NextJs),
            "node js" => Some(Language::NodeJs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::ReactJs => "react js",
            Language::NextJs => "next js",
            Language::NodeJs => "node js",
        }
    }

    pub fn system_message(&self) -> &'static str {
        match self {
            Language::Java => {
                "You are an expert in Java Spring Boot development. Respond with pure JSON output only."
            }
            Language::ReactJs => {
                "You are an expert in React JS development. Respond with pure JSON output only."
            }
            Language::NextJs => {
                "You are an expert in Next JS development. Respond with pure JSON output only."
            }
            Language::NodeJs => {
                "You are an expert in Node JS and Express development. Respond with pure JSON output only."
            }
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Java
    }
}

/// Renders the fields as one human-readable, single-line description:
/// `name (type)[ [Required]][ - Instructions: ...]`, joined with `, `.
pub fn render_field_list(fields: &[FieldSpec]) -> String {
    fields
        .iter()
        .map(describe_field)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_field(field: &FieldSpec) -> String {
    let mut description = format!("{} ({})", field.name, field.field_type);
    if field.is_required {
        description.push_str(" [Required]");
    }
    if let Some(instructions) = field.instructions.as_deref() {
        // Free text may span lines; the template stays single-line.
        let flattened = instructions.lines().collect::<Vec<_>>().join(" ");
        if !flattened.trim().is_empty() {
            description.push_str(" - Instructions: ");
            description.push_str(&flattened);
        }
    }
    description
}

pub fn build_prompt(
    language: Language,
    entity: &str,
    fields: &[FieldSpec],
    database: Database,
) -> String {
    let field_definitions = render_field_list(fields);
    match language {
        Language::Java => java_prompt(entity, &field_definitions, database),
        Language::ReactJs => react_prompt(entity, &field_definitions),
        Language::NextJs => next_prompt(entity, &field_definitions, database),
        Language::NodeJs => node_prompt(entity, &field_definitions, database),
    }
}

fn java_prompt(entity: &str, field_definitions: &str, database: Database) -> String {
    format!(
        r#"Generate a Java Spring Boot CRUD application using **ONLY JSON OUTPUT**.

- **Entity Name**: {entity}
- **Fields**: {field_definitions}
- **Database**: {database}

🚨 **Strict JSON Output Format** (NO explanations, NO markdown, NO extra text):
```json
{{
  "Entity": "<Java entity code>",
  "Repository": "<Java repository code based on {database}>",
  "Service": "<Java service code>",
  "Controller": "<Java controller code>"
}}
```

**Rules:**
1️⃣ **DO NOT** include explanations or formatting outside JSON.
2️⃣ **DO NOT** wrap JSON in markdown (```json ... ```).
3️⃣ **ENSURE** valid Java syntax for each section.
4️⃣ **ENSURE** bean validation for every field marked [Required] and for every field's Instructions.

**Others:**
**ENSURE** to use lombok
"#
    )
}

fn react_prompt(entity: &str, field_definitions: &str) -> String {
    format!(
        r#"Generate a React JS CRUD front end using **ONLY JSON OUTPUT**.

- **Entity Name**: {entity}
- **Fields**: {field_definitions}

🚨 **Strict JSON Output Format** (NO explanations, NO markdown, NO extra text):
```json
{{
  "Api": "<axios client module for {entity} CRUD calls>",
  "List": "<React component listing {entity} records with delete actions>",
  "Form": "<React form component creating and editing {entity} records>",
  "App": "<React app component wiring the views together>"
}}
```

**Rules:**
1️⃣ **DO NOT** include explanations or formatting outside JSON.
2️⃣ **DO NOT** wrap JSON in markdown (```json ... ```).
3️⃣ **ENSURE** valid JSX syntax for each section.
4️⃣ **ENSURE** client-side validation for every field marked [Required] and for every field's Instructions.

**Others:**
**ENSURE** to use functional components with hooks
"#
    )
}

fn next_prompt(entity: &str, field_definitions: &str, database: Database) -> String {
    format!(
        r#"Generate a Next JS CRUD application using **ONLY JSON OUTPUT**.

- **Entity Name**: {entity}
- **Fields**: {field_definitions}
- **Database**: {database}

🚨 **Strict JSON Output Format** (NO explanations, NO markdown, NO extra text):
```json
{{
  "Model": "<data model code based on {database}>",
  "ApiRoute": "<Next JS route handler code for {entity} CRUD operations>",
  "Page": "<Next JS client page component for {entity}>"
}}
```

**Rules:**
1️⃣ **DO NOT** include explanations or formatting outside JSON.
2️⃣ **DO NOT** wrap JSON in markdown (```json ... ```).
3️⃣ **ENSURE** valid TypeScript syntax for each section.
4️⃣ **ENSURE** server-side validation for every field marked [Required] and for every field's Instructions.

**Others:**
**ENSURE** to use the App Router
"#
    )
}

fn node_prompt(entity: &str, field_definitions: &str, database: Database) -> String {
    format!(
        r#"Generate a Node JS Express CRUD application using **ONLY JSON OUTPUT**.

- **Entity Name**: {entity}
- **Fields**: {field_definitions}
- **Database**: {database}

🚨 **Strict JSON Output Format** (NO explanations, NO markdown, NO extra text):
```json
{{
  "Model": "<model code based on {database}>",
  "Routes": "<Express router code for {entity} CRUD endpoints>",
  "Controller": "<Express controller code>",
  "Server": "<Express server bootstrap code>"
}}
```

**Rules:**
1️⃣ **DO NOT** include explanations or formatting outside JSON.
2️⃣ **DO NOT** wrap JSON in markdown (```json ... ```).
3️⃣ **ENSURE** valid JavaScript syntax for each section.
4️⃣ **ENSURE** validation middleware for every field marked [Required] and for every field's Instructions.

**Others:**
**ENSURE** to use async/await handlers
"#
    )
}
