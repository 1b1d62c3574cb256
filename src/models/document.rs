use serde::{Deserialize, Serialize};

use super::search::Metadata;

/// Language tag of a dataset partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    /// Whether text of this language goes through Arabic normalization.
    pub fn needs_normalization(&self) -> bool {
        matches!(self, Language::Ar)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ar" | "arabic" => Ok(Language::Ar),
            "en" | "english" => Ok(Language::En),
            _ => Err(format!("unknown language: {}", s)),
        }
    }
}

/// Kind of input file a chunk was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Pdf,
    Txt,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Pdf => "pdf",
            SourceType::Txt => "txt",
        }
    }

    /// Classify a path by its extension; anything but `.pdf`/`.txt` is `None`.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceType::Pdf),
            "txt" => Some(SourceType::Txt),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic category inferred from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Packaging,
    Training,
    Quality,
    Energy,
    Customer,
    Production,
    Marketing,
    Storage,
    Transport,
    Safety,
    General,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Packaging => "packaging",
            Topic::Training => "training",
            Topic::Quality => "quality",
            Topic::Energy => "energy",
            Topic::Customer => "customer",
            Topic::Production => "production",
            Topic::Marketing => "marketing",
            Topic::Storage => "storage",
            Topic::Transport => "transport",
            Topic::Safety => "safety",
            Topic::General => "general",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub lang: Language,
    pub chunk_id: u32,
    pub source_type: SourceType,
    pub topic: Topic,
    /// Citation label; always the filename for ingested chunks.
    pub source: String,
    pub ingested_at: String,
}

impl ChunkMetadata {
    /// Flatten into the string-keyed mapping persisted next to the vector.
    pub fn to_metadata(&self) -> Metadata {
        let mut map = Metadata::new();
        map.insert("filename".into(), self.filename.clone().into());
        map.insert("lang".into(), self.lang.as_str().into());
        map.insert("chunk_id".into(), self.chunk_id.into());
        map.insert("source_type".into(), self.source_type.as_str().into());
        map.insert("topic".into(), self.topic.as_str().into());
        map.insert("source".into(), self.source.clone().into());
        map.insert("ingested_at".into(), self.ingested_at.clone().into());
        map
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dense_vector: Vec<f32>,
}

impl DocumentChunk {
    /// Stable id of a source file within its partition.
    pub fn document_id(lang: Language, source_type: SourceType, filename: &str) -> String {
        use sha2::{Digest, Sha256};
        let input = format!("{}:{}:{}", lang, source_type, filename);
        let hash = Sha256::digest(input.as_bytes());
        hex::encode(&hash[..16])
    }

    pub fn generate_id(document_id: &str, chunk_index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_id, chunk_index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn new(content: String, metadata: ChunkMetadata) -> Self {
        let document_id =
            Self::document_id(metadata.lang, metadata.source_type, &metadata.filename);
        let id = Self::generate_id(&document_id, metadata.chunk_id);
        Self {
            id,
            content,
            metadata,
            dense_vector: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(filename: &str, chunk_id: u32) -> ChunkMetadata {
        ChunkMetadata {
            filename: filename.to_string(),
            lang: Language::En,
            chunk_id,
            source_type: SourceType::Txt,
            topic: Topic::General,
            source: filename.to_string(),
            ingested_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_chunk_generate_id() {
        let id = DocumentChunk::generate_id("abc123", 5);
        assert_eq!(id.len(), 36);
        assert!(id.chars().filter(|c| *c == '-').count() == 4);
        let id2 = DocumentChunk::generate_id("abc123", 5);
        assert_eq!(id, id2);
        let id3 = DocumentChunk::generate_id("abc123", 6);
        assert_ne!(id, id3);
    }

    #[test]
    fn test_document_id_depends_on_partition() {
        let en = DocumentChunk::document_id(Language::En, SourceType::Txt, "a.txt");
        let ar = DocumentChunk::document_id(Language::Ar, SourceType::Txt, "a.txt");
        assert_eq!(en.len(), 32);
        assert_ne!(en, ar);
    }

    #[test]
    fn test_metadata_mapping() {
        let chunk = DocumentChunk::new("hello".to_string(), metadata("notes.txt", 3));
        let map = chunk.metadata.to_metadata();
        assert_eq!(map["filename"], "notes.txt");
        assert_eq!(map["lang"], "en");
        assert_eq!(map["chunk_id"], 3);
        assert_eq!(map["source_type"], "txt");
        assert_eq!(map["topic"], "general");
        assert_eq!(map["source"], "notes.txt");
    }

    #[test]
    fn test_source_type_from_path() {
        use std::path::Path;
        assert_eq!(SourceType::from_path(Path::new("a.PDF")), Some(SourceType::Pdf));
        assert_eq!(SourceType::from_path(Path::new("b.txt")), Some(SourceType::Txt));
        assert_eq!(SourceType::from_path(Path::new("c.docx")), None);
        assert_eq!(SourceType::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("ar".parse::<Language>().unwrap(), Language::Ar);
        assert_eq!("English".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
        assert!(Language::Ar.needs_normalization());
        assert!(!Language::En.needs_normalization());
    }
}
