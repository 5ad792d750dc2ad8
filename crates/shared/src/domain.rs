use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(SelectionId);

/// The only media type accepted as a score upload.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    Initial,
    Regenerate,
}

impl SubmitMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Regenerate => "regenerate",
        }
    }

    /// Noun used in the generic server-failure phrase.
    pub fn activity(self) -> &'static str {
        match self {
            Self::Initial => "processing",
            Self::Regenerate => "regeneration",
        }
    }

    pub fn loading_message(self) -> &'static str {
        match self {
            Self::Initial => "Analyzing Sheet Music...",
            Self::Regenerate => "Generating New Visual...",
        }
    }
}
