use serde::{Deserialize, Serialize};

/// Custom field types an inventory schema may declare.
///
/// The type is advisory metadata for the presentation layer: values are
/// stored as raw text and the server does not validate them against the
/// declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    SingleLineText,
    MultiLineText,
    Number,
    DocumentOrImage,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleLineText => "SingleLineText",
            Self::MultiLineText => "MultiLineText",
            Self::Number => "Number",
            Self::DocumentOrImage => "DocumentOrImage",
            Self::Boolean => "Boolean",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SingleLineText" => Some(Self::SingleLineText),
            "MultiLineText" => Some(Self::MultiLineText),
            "Number" => Some(Self::Number),
            "DocumentOrImage" => Some(Self::DocumentOrImage),
            "Boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}
