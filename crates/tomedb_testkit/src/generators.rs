//! Property-based test generators using proptest.
//!
//! Provides strategies for documents and databases that are consistent by
//! construction, so any problem a check reports is a checker bug.

use crate::fixtures::document;
use proptest::prelude::*;
use tomedb_core::{Backend, DatabaseBuilder, Document, Revision};

/// Strategy for either generation.
pub fn backend_strategy() -> impl Strategy<Value = Backend> {
    prop_oneof![Just(Backend::Chert), Just(Backend::Glass)]
}

/// Strategy for short lower-case texts, possibly empty.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
        0..12,
    )
    .prop_map(|words| words.join(" "))
}

/// Strategy for positionally indexed documents.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    text_strategy().prop_map(|text| document(&text))
}

/// Strategy for consistent databases of up to 20 documents with some
/// unused docids after the last document.
pub fn database_strategy() -> impl Strategy<Value = DatabaseBuilder> {
    (
        backend_strategy(),
        prop::collection::vec(document_strategy(), 0..20),
        1u64..4,
        0u32..5,
        prop::collection::vec(prop::string::string_regex("[a-z]{2,6}").expect("Invalid regex"), 0..4),
    )
        .prop_map(|(backend, docs, revision, spare, words)| {
            let mut builder = DatabaseBuilder::new(backend);
            let count = docs.len() as u32;
            for doc in docs {
                builder.add_document(doc);
            }
            for word in words {
                builder.add_spelling(word, 1);
            }
            builder
                .revision(Revision::new(revision))
                .last_docid(tomedb_core::DocId::new(count + spare))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn texts_have_no_empty_words(text in text_strategy()) {
            prop_assert!(text.split(' ').all(|w| !w.is_empty()) || text.is_empty());
        }

        #[test]
        fn documents_count_every_word(text in text_strategy()) {
            prop_assert_eq!(document(&text).doclen() as usize, text.split_whitespace().count());
        }
    }
}
