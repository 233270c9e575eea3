//! Multipart form payloads.
//!
//! Parts are kept as owned bytes so the transport can stream them without
//! re-encoding. `from_model` flattens a JSON object into form fields the way
//! the backend's form endpoints expect.

use serde_json::Value;

/// How repeated fields are keyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrayKeyStyle {
    /// `tags=a&tags=b`
    #[default]
    Repeat,
    /// `tags[]=a&tags[]=b`
    Brackets,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartContent {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: String,
        mime_type: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub content: PartContent,
}

/// Ordered multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            content: PartContent::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            content: PartContent::File {
                bytes,
                file_name: file_name.into(),
                mime_type: mime_type.map(str::to_string),
            },
        });
        self
    }

    /// Flatten a JSON object into text parts.
    ///
    /// `null` and empty strings are skipped, arrays produce one part per
    /// element, nested objects are JSON-encoded. Non-object models yield an
    /// empty form.
    pub fn from_model(model: &Value, style: ArrayKeyStyle) -> Self {
        let mut form = Self::new();
        let Some(fields) = model.as_object() else {
            return form;
        };
        for (key, value) in fields {
            match value {
                Value::Null => {}
                Value::String(s) if s.is_empty() => {}
                Value::Array(items) => {
                    let name = match style {
                        ArrayKeyStyle::Repeat => key.clone(),
                        ArrayKeyStyle::Brackets => format!("{key}[]"),
                    };
                    for item in items {
                        form = form.text(name.clone(), scalar_text(item));
                    }
                }
                other => form = form.text(key.clone(), scalar_text(other)),
            }
        }
        form
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }
}

/// Text form of a field value; strings are taken verbatim.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn texts(form: &MultipartForm) -> Vec<(&str, &str)> {
        form.parts()
            .iter()
            .filter_map(|p| match &p.content {
                PartContent::Text(t) => Some((p.name.as_str(), t.as_str())),
                PartContent::File { .. } => None,
            })
            .collect()
    }

    #[test]
    fn from_model_skips_empty_values() {
        let model = json!({"username": "an", "email": "", "phone": null, "age": 30, "active": true});
        let form = MultipartForm::from_model(&model, ArrayKeyStyle::Repeat);
        assert_eq!(
            texts(&form),
            vec![("active", "true"), ("age", "30"), ("username", "an")]
        );
    }

    #[test]
    fn from_model_repeats_array_keys() {
        let model = json!({"roles": ["ADMIN", "STAFF"]});
        let form = MultipartForm::from_model(&model, ArrayKeyStyle::Repeat);
        assert_eq!(texts(&form), vec![("roles", "ADMIN"), ("roles", "STAFF")]);
    }

    #[test]
    fn from_model_bracket_style() {
        let model = json!({"ids": [1, 2]});
        let form = MultipartForm::from_model(&model, ArrayKeyStyle::Brackets);
        assert_eq!(texts(&form), vec![("ids[]", "1"), ("ids[]", "2")]);
    }

    #[test]
    fn from_model_encodes_nested_objects() {
        let model = json!({"address": {"city": "Hanoi"}});
        let form = MultipartForm::from_model(&model, ArrayKeyStyle::Repeat);
        assert_eq!(texts(&form), vec![("address", r#"{"city":"Hanoi"}"#)]);
    }

    #[test]
    fn file_parts_keep_bytes() {
        let form = MultipartForm::new()
            .text("username", "an")
            .file("avatar", "a.png", Some("image/png"), vec![0x89, 0x50, 0x00]);
        assert_eq!(form.parts().len(), 2);
        let PartContent::File { bytes, file_name, mime_type } = &form.parts()[1].content else {
            panic!("expected file part");
        };
        assert_eq!(bytes, &vec![0x89, 0x50, 0x00]);
        assert_eq!(file_name, "a.png");
        assert_eq!(mime_type.as_deref(), Some("image/png"));
    }
}
