//! Query system for filtering documents.
//!
//! Every query is a predicate over the object in scope: a document root, or a
//! single nested object inside a [`NestedQuery`]. Join queries
//! ([`HasChildQuery`], [`HasParentQuery`]) step from one document to related
//! documents of the same committed snapshot.

pub mod boolean;
pub mod context;
pub mod fuzzy;
pub mod has_child;
pub mod has_parent;
pub mod match_all;
pub mod nested;
pub mod parser;
#[allow(clippy::module_inception)]
pub mod query;
pub mod term;

pub use self::boolean::{BooleanClause, BooleanQuery, BooleanQueryBuilder, Occur};
pub use self::context::MatchContext;
pub use self::fuzzy::{Fuzziness, FuzzyQuery};
pub use self::has_child::HasChildQuery;
pub use self::has_parent::HasParentQuery;
pub use self::match_all::MatchAllQuery;
pub use self::nested::NestedQuery;
pub use self::parser::QueryParser;
pub use self::query::Query;
pub use self::term::TermQuery;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::document::{AnalyzedDocument, AnalyzedFields, Document, DocumentParser};
    use crate::index::snapshot::{IndexSnapshot, WriteBatch, WriteOp};
    use crate::schema::{Dynamic, Mapping, MappingSet};

    /// Analyze a document against its type's mapping.
    pub fn analyzed(
        mappings: &MappingSet,
        doc_type: &str,
        id: &str,
        parent: Option<&str>,
        source: Document,
        seq_no: u64,
    ) -> AnalyzedDocument {
        let mapping = mappings.get(doc_type).unwrap();
        let parsed = DocumentParser::new(mapping, Dynamic::True)
            .parse(&source)
            .unwrap();
        AnalyzedDocument {
            id: id.to_string(),
            doc_type: doc_type.to_string(),
            parent: parent.map(str::to_string),
            source: Arc::new(source),
            fields: parsed.fields,
            seq_no,
        }
    }

    /// Commit documents into a fresh snapshot.
    pub fn snapshot(mappings: MappingSet, docs: Vec<AnalyzedDocument>) -> IndexSnapshot {
        let batch: WriteBatch = docs
            .into_iter()
            .map(|doc| WriteOp::Index(Arc::new(doc)))
            .collect();
        IndexSnapshot::empty().apply([&batch], Arc::new(mappings))
    }

    /// A lone document with hand-built terms.
    pub fn single_doc(build: impl FnOnce(&mut AnalyzedFields)) -> (IndexSnapshot, AnalyzedDocument) {
        let mut fields = AnalyzedFields::new();
        build(&mut fields);
        let doc = AnalyzedDocument {
            id: "1".to_string(),
            doc_type: "doc".to_string(),
            parent: None,
            source: Arc::new(Document::new()),
            fields,
            seq_no: 1,
        };
        (IndexSnapshot::empty(), doc)
    }

    /// `profile` parents with `connection` children keyed by user code.
    pub fn parent_child_mappings() -> MappingSet {
        let mut mappings = MappingSet::new();
        mappings
            .declare(Mapping::builder("profile").text("name").build().unwrap())
            .unwrap();
        mappings
            .declare(
                Mapping::builder("connection")
                    .parent("profile")
                    .keyword("sender")
                    .keyword("receiver")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        mappings
    }
}
