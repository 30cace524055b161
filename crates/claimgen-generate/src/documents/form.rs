//! PDF AcroForm templates: synthesis, caching and field filling.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use super::DocumentType;
use super::fields::{FieldKind, FieldValue, field_table};
use crate::errors::GenerationError;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const FIELD_HEIGHT: i64 = 20;
const FIELD_SPACING: i64 = 32;

fn codec(err: impl std::fmt::Display) -> GenerationError {
    GenerationError::Document(err.to_string())
}

/// Field declared by a template: its name and raw `/FT` kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateField {
    pub name: String,
    pub kind: String,
    pub options: Vec<String>,
}

/// Build a single-page form with one widget per field.
pub(crate) fn synthesize_form(
    title: &str,
    fields: &[TemplateField],
) -> Result<Vec<u8>, GenerationError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let heading = format!("BT /F1 14 Tf 72 {} Td ({title}) Tj ET", PAGE_HEIGHT - 60);
    let content_id = doc.add_object(Stream::new(Dictionary::new(), heading.into_bytes()));

    let mut field_refs = Vec::with_capacity(fields.len());
    for (idx, field) in fields.iter().enumerate() {
        let top = PAGE_HEIGHT - 100 - idx as i64 * FIELD_SPACING;
        let mut widget = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => Object::Name(field.kind.as_bytes().to_vec()),
            "T" => Object::string_literal(field.name.as_str()),
            "Rect" => vec![
                Object::Integer(220),
                Object::Integer(top - FIELD_HEIGHT),
                Object::Integer(PAGE_WIDTH - 72),
                Object::Integer(top),
            ],
            "P" => page_id,
        };
        match field.kind.as_str() {
            "Btn" => widget.set("V", Object::Name(b"Off".to_vec())),
            "Ch" => {
                widget.set("V", Object::string_literal(""));
                widget.set(
                    "Opt",
                    field
                        .options
                        .iter()
                        .map(|option| Object::string_literal(option.as_str()))
                        .collect::<Vec<Object>>(),
                );
            }
            _ => widget.set("V", Object::string_literal("")),
        }
        field_refs.push(Object::Reference(doc.add_object(widget)));
    }

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "Annots" => field_refs.clone(),
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! {
            "Fields" => field_refs,
            "NeedAppearances" => true,
        },
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(codec)?;
    Ok(bytes)
}

/// Template synthesized from the built-in field table of `document_type`.
pub fn synthesize(document_type: DocumentType) -> Result<Vec<u8>, GenerationError> {
    let fields: Vec<TemplateField> = field_table(document_type)
        .iter()
        .map(|spec| TemplateField {
            name: spec.name.to_string(),
            kind: spec.kind.pdf_name().to_string(),
            options: match spec.kind {
                FieldKind::Choice(options) => {
                    options.iter().map(|option| option.to_string()).collect()
                }
                _ => Vec::new(),
            },
        })
        .collect();
    synthesize_form(document_type.code(), &fields)
}

fn field_ids(doc: &Document) -> Result<Vec<ObjectId>, GenerationError> {
    let catalog = doc.catalog().map_err(codec)?;
    let acroform = match catalog.get(b"AcroForm").map_err(codec)? {
        Object::Reference(id) => doc.get_dictionary(*id).map_err(codec)?,
        Object::Dictionary(dict) => dict,
        other => {
            return Err(GenerationError::Document(format!(
                "unexpected AcroForm object {other:?}"
            )));
        }
    };
    acroform
        .get(b"Fields")
        .and_then(Object::as_array)
        .map_err(codec)?
        .iter()
        .map(|field| field.as_reference().map_err(codec))
        .collect()
}

fn field_name(dict: &Dictionary) -> Result<String, GenerationError> {
    match dict.get(b"T").map_err(codec)? {
        Object::String(bytes, _) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        other => Err(GenerationError::Document(format!(
            "field name is not a string: {other:?}"
        ))),
    }
}

fn field_kind(dict: &Dictionary) -> Result<String, GenerationError> {
    let kind = dict.get(b"FT").and_then(Object::as_name).map_err(codec)?;
    Ok(String::from_utf8_lossy(kind).into_owned())
}

/// Every field in a template, in declaration order.
pub fn read_fields(template: &[u8]) -> Result<Vec<TemplateField>, GenerationError> {
    let doc = Document::load_mem(template).map_err(codec)?;
    field_ids(&doc)?
        .into_iter()
        .map(|id| {
            let dict = doc.get_dictionary(id).map_err(codec)?;
            let options = match dict.get(b"Opt").and_then(Object::as_array) {
                Ok(options) => options
                    .iter()
                    .filter_map(|option| match option {
                        Object::String(bytes, _) => {
                            Some(String::from_utf8_lossy(bytes).into_owned())
                        }
                        _ => None,
                    })
                    .collect(),
                Err(_) => Vec::new(),
            };
            Ok(TemplateField {
                name: field_name(dict)?,
                kind: field_kind(dict)?,
                options,
            })
        })
        .collect()
}

/// Reject templates that declare a field kind the binder cannot fill.
pub fn check_bindable(document_type: DocumentType, template: &[u8]) -> Result<(), GenerationError> {
    for field in read_fields(template)? {
        if !matches!(field.kind.as_str(), "Tx" | "Btn" | "Ch") {
            return Err(GenerationError::TemplateBinding {
                document: document_type.code().to_string(),
                field: field.name,
                kind: field.kind,
            });
        }
    }
    Ok(())
}

/// Fill `template` with `values`; fields without a value keep their default.
pub fn fill(
    document_type: DocumentType,
    template: &[u8],
    values: &[(&str, FieldValue)],
) -> Result<Vec<u8>, GenerationError> {
    let mut doc = Document::load_mem(template).map_err(codec)?;
    let values: BTreeMap<&str, &FieldValue> =
        values.iter().map(|(name, value)| (*name, value)).collect();

    for id in field_ids(&doc)? {
        let dict = doc
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(codec)?;
        let name = field_name(dict)?;
        let kind = field_kind(dict)?;
        if !matches!(kind.as_str(), "Tx" | "Btn" | "Ch") {
            return Err(GenerationError::TemplateBinding {
                document: document_type.code().to_string(),
                field: name,
                kind,
            });
        }
        let Some(value) = values.get(name.as_str()) else {
            continue;
        };
        match (kind.as_str(), value) {
            ("Tx", FieldValue::Text(text)) | ("Ch", FieldValue::Choice(text)) => {
                dict.set("V", Object::string_literal(text.as_str()));
            }
            ("Btn", FieldValue::Checked(checked)) => {
                let state: &[u8] = if *checked { b"Yes" } else { b"Off" };
                dict.set("V", Object::Name(state.to_vec()));
                dict.set("AS", Object::Name(state.to_vec()));
            }
            _ => {
                return Err(GenerationError::Document(format!(
                    "value {value:?} does not fit {kind} field '{name}'"
                )));
            }
        }
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(codec)?;
    Ok(bytes)
}

/// Template bytes per document type, read from an optional directory of
/// `<CODE>.pdf` files and otherwise synthesized. Templates are cached.
#[derive(Debug, Default)]
pub struct TemplateStore {
    dir: Option<PathBuf>,
    cache: RwLock<BTreeMap<DocumentType, Arc<Vec<u8>>>>,
}

impl TemplateStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn template(&self, document_type: DocumentType) -> Result<Arc<Vec<u8>>, GenerationError> {
        if let Some(template) = self.cached(document_type) {
            return Ok(template);
        }

        let template = Arc::new(self.read_or_synthesize(document_type)?);
        check_bindable(document_type, &template)?;

        let mut cache = self
            .cache
            .write()
            .map_err(|_| GenerationError::Document("template cache poisoned".to_string()))?;
        cache.insert(document_type, Arc::clone(&template));
        Ok(template)
    }

    fn cached(&self, document_type: DocumentType) -> Option<Arc<Vec<u8>>> {
        let cache = self.cache.read().ok()?;
        cache.get(&document_type).cloned()
    }

    fn read_or_synthesize(&self, document_type: DocumentType) -> Result<Vec<u8>, GenerationError> {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{}.pdf", document_type.code()));
            match fs::read(&path) {
                Ok(bytes) => {
                    debug!(path = %path.display(), "form template loaded");
                    return Ok(bytes);
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        synthesize(document_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_template_declares_the_field_table() {
        let template = synthesize(DocumentType::Caring).unwrap();
        let fields = read_fields(&template).unwrap();
        let names: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();
        let expected: Vec<&str> = field_table(DocumentType::Caring)
            .iter()
            .map(|spec| spec.name)
            .collect();
        assert_eq!(names, expected);
        let relationship = fields.iter().find(|f| f.name == "Relationship").unwrap();
        assert_eq!(relationship.kind, "Ch");
        assert_eq!(relationship.options.len(), 6);
    }

    #[test]
    fn fill_sets_text_and_checkbox_values() {
        let template = synthesize(DocumentType::HealthCareProvider).unwrap();
        let filled = fill(
            DocumentType::HealthCareProvider,
            &template,
            &[
                ("Employee first name", FieldValue::Text("Ada".to_string())),
                ("Continuous leave", FieldValue::Checked(true)),
            ],
        )
        .unwrap();

        let doc = Document::load_mem(&filled).unwrap();
        let mut seen = 0;
        for id in field_ids(&doc).unwrap() {
            let dict = doc.get_dictionary(id).unwrap();
            match field_name(dict).unwrap().as_str() {
                "Employee first name" => {
                    match dict.get(b"V").unwrap() {
                        Object::String(bytes, _) => assert_eq!(bytes.as_slice(), b"Ada"),
                        other => panic!("unexpected value {other:?}"),
                    }
                    seen += 1;
                }
                "Continuous leave" => {
                    assert_eq!(dict.get(b"V").unwrap().as_name().unwrap(), b"Yes");
                    seen += 1;
                }
                _ => {}
            }
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn signature_fields_cannot_be_bound() {
        let template = synthesize_form(
            "HCP",
            &[
                TemplateField {
                    name: "Employee first name".to_string(),
                    kind: "Tx".to_string(),
                    options: Vec::new(),
                },
                TemplateField {
                    name: "Provider signature".to_string(),
                    kind: "Sig".to_string(),
                    options: Vec::new(),
                },
            ],
        )
        .unwrap();

        let err = check_bindable(DocumentType::HealthCareProvider, &template).unwrap_err();
        match err {
            GenerationError::TemplateBinding { field, kind, .. } => {
                assert_eq!(field, "Provider signature");
                assert_eq!(kind, "Sig");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            fill(DocumentType::HealthCareProvider, &template, &[]),
            Err(GenerationError::TemplateBinding { .. })
        ));
        let values = [("Employee first name", FieldValue::Text("Ada".to_string()))];
        assert!(matches!(
            fill(DocumentType::HealthCareProvider, &template, &values),
            Err(GenerationError::TemplateBinding { .. })
        ));
    }

    #[test]
    fn templates_are_read_from_the_directory_first() {
        let dir = std::env::temp_dir().join(format!("claimgen_templates_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let custom = synthesize_form(
            "MASSID",
            &[TemplateField {
                name: "Last name".to_string(),
                kind: "Tx".to_string(),
                options: Vec::new(),
            }],
        )
        .unwrap();
        fs::write(dir.join("MASSID.pdf"), &custom).unwrap();

        let store = TemplateStore::new(Some(dir.clone()));
        assert_eq!(*store.template(DocumentType::MassId).unwrap(), custom);
        let fallback = store.template(DocumentType::Caring).unwrap();
        assert_eq!(*fallback, synthesize(DocumentType::Caring).unwrap());

        let _ = fs::remove_dir_all(dir);
    }
}
