use super::index::SemanticIndex;
use super::mock::MockSemanticIndex;
use super::model::ChunkRecord;

fn chunk(index: usize, text: &str) -> ChunkRecord {
    ChunkRecord {
        chunk_index: index,
        text: text.to_string(),
        source_file: "notice.pdf".to_string(),
    }
}

#[tokio::test]
async fn test_index_and_query_scoped_to_document() {
    let index = MockSemanticIndex::new();

    index
        .index_chunks(
            "analysis-1",
            "doc-a",
            vec![
                chunk(0, "road maintenance and resurfacing works"),
                chunk(1, "payment terms thirty days"),
            ],
        )
        .await
        .unwrap();
    index
        .index_chunks(
            "analysis-1",
            "doc-b",
            vec![chunk(0, "road maintenance for another city entirely")],
        )
        .await
        .unwrap();

    let results = index
        .query("doc-a", "road maintenance works", 10, 0.0)
        .await
        .unwrap();

    assert!(!results.is_empty());
    // Scoped: nothing from doc-b can appear.
    assert!(results.iter().all(|r| r.source_file == "notice.pdf"));
    assert_eq!(index.chunk_count("doc-a"), 2);
    assert_eq!(index.chunk_count("doc-b"), 1);
}

#[tokio::test]
async fn test_query_ranks_by_overlap() {
    let index = MockSemanticIndex::new();

    index
        .index_chunks(
            "analysis-1",
            "doc-a",
            vec![
                chunk(0, "iso 9001 certification required for bidders"),
                chunk(1, "unrelated catering clause"),
            ],
        )
        .await
        .unwrap();

    let results = index
        .query("doc-a", "iso 9001 certification", 10, 0.0)
        .await
        .unwrap();

    assert_eq!(results[0].chunk_index, 0);
    assert!(results[0].score > results.last().unwrap().score || results.len() == 1);
}

#[tokio::test]
async fn test_score_threshold_filters() {
    let index = MockSemanticIndex::new();

    index
        .index_chunks("analysis-1", "doc-a", vec![chunk(0, "totally different words")])
        .await
        .unwrap();

    let results = index
        .query("doc-a", "iso certification", 10, 0.5)
        .await
        .unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_query_unknown_document_is_empty() {
    let index = MockSemanticIndex::new();

    let results = index.query("ghost", "anything", 10, 0.0).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_delete_document() {
    let index = MockSemanticIndex::new();

    index
        .index_chunks("analysis-1", "doc-a", vec![chunk(0, "some text")])
        .await
        .unwrap();
    assert!(index.contains_document("doc-a"));

    index.delete_document("doc-a").await.unwrap();
    assert!(!index.contains_document("doc-a"));
}

#[tokio::test]
async fn test_delete_namespace_removes_all_documents_in_it() {
    let index = MockSemanticIndex::new();

    index
        .index_chunks("analysis-1", "doc-a", vec![chunk(0, "a")])
        .await
        .unwrap();
    index
        .index_chunks("analysis-1", "doc-b", vec![chunk(0, "b")])
        .await
        .unwrap();
    index
        .index_chunks("analysis-2", "doc-c", vec![chunk(0, "c")])
        .await
        .unwrap();

    index.delete_namespace("analysis-1").await.unwrap();

    assert!(!index.contains_document("doc-a"));
    assert!(!index.contains_document("doc-b"));
    assert!(index.contains_document("doc-c"));
}

#[tokio::test]
async fn test_index_usage_reflects_chunk_tokens() {
    let index = MockSemanticIndex::new();

    let usage = index
        .index_chunks("analysis-1", "doc-a", vec![chunk(0, "four words right here")])
        .await
        .unwrap();

    assert_eq!(usage.prompt_tokens, 4);
}
