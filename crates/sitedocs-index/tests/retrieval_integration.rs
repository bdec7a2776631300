use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use sitedocs_index::{
    DocumentRetriever, IndexBuilder, PdfLoader, RetrievalConfig, SplitterConfig, TextSplitter,
};
use sitedocs_llm::mock::MockEmbedder;

fn pdf_with_text(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_owned(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_owned(),
        format!("<< /Length {} >> stream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_owned(),
    ];
    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj {body} endobj\n", i + 1).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(b"xref\n0 6\n0000000000 65535 f \n");
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!("trailer << /Size 6 /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n").as_bytes(),
    );
    out
}

fn retriever(base: &Path, mock: &MockEmbedder) -> DocumentRetriever<MockEmbedder> {
    let builder = IndexBuilder::new(
        Arc::new(PdfLoader::default()),
        TextSplitter::new(SplitterConfig::default()).unwrap(),
        Arc::new(mock.clone()),
        base,
    );
    DocumentRetriever::new(Arc::new(builder), RetrievalConfig::default())
}

fn add_pdf(base: &Path, project: &str, name: &str, text: &str) {
    let dir = base.join(project);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), pdf_with_text(text)).unwrap();
}

#[tokio::test]
async fn basic_retrieval_cites_pdf_filename() {
    let base = tempfile::tempdir().unwrap();
    add_pdf(
        base.path(),
        "Tower A",
        "foundation.pdf",
        "Concrete foundation depth: 1500mm. Rebar spacing: 200mm.",
    );
    let mock = MockEmbedder::default();
    let r = retriever(base.path(), &mock);

    let hits = r.retrieve("Tower A", "rebar spacing").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, "foundation.pdf");

    let context = r
        .get_relevant_context("Tower A", "rebar spacing")
        .await
        .unwrap()
        .unwrap();
    assert!(context.starts_with("--- FROM DOCUMENT: foundation.pdf ---\n"));
    assert!(context.contains("1500mm"));
}

#[tokio::test]
async fn cached_index_until_rebuild() {
    let base = tempfile::tempdir().unwrap();
    add_pdf(base.path(), "Tower A", "doc1.pdf", "Slab thickness is 250mm.");
    let mock = MockEmbedder::default();
    let r = retriever(base.path(), &mock);

    let first = r.registry().get_or_build("Tower A").await.unwrap().unwrap();
    assert_eq!(first.sources(), ["doc1.pdf"]);
    let embedded = mock.texts_embedded();

    add_pdf(base.path(), "Tower A", "doc2.pdf", "Column grid is 6 by 6 metres.");
    let cached = r.registry().get_or_build("Tower A").await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &cached));
    assert_eq!(mock.texts_embedded(), embedded);

    let rebuilt = r.registry().rebuild("Tower A").await.unwrap().unwrap();
    assert_eq!(rebuilt.sources(), ["doc1.pdf", "doc2.pdf"]);
}

#[tokio::test]
async fn concurrent_queries_trigger_one_build() {
    let base = tempfile::tempdir().unwrap();
    add_pdf(base.path(), "Tower A", "doc1.pdf", "Slab thickness is 250mm.");
    let mock = MockEmbedder::default().with_delay(50);
    let r = retriever(base.path(), &mock);

    let results = join_all((0..10).map(|_| r.registry().get_or_build("Tower A"))).await;
    let indices: Vec<_> = results.into_iter().map(|r| r.unwrap().unwrap()).collect();
    assert!(indices.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn empty_folder_is_rescanned_every_time() {
    let base = tempfile::tempdir().unwrap();
    std::fs::create_dir(base.path().join("New Site")).unwrap();
    let mock = MockEmbedder::default();
    let r = retriever(base.path(), &mock);

    assert!(r.get_relevant_context("New Site", "q").await.unwrap().is_none());
    assert!(r.registry().get("New Site").is_none());

    add_pdf(base.path(), "New Site", "plan.pdf", "Site access from the north gate.");
    assert!(r.get_relevant_context("New Site", "gate").await.unwrap().is_some());
}

#[tokio::test]
async fn corrupt_pdf_does_not_block_project() {
    let base = tempfile::tempdir().unwrap();
    add_pdf(base.path(), "Tower A", "good.pdf", "Rebar spacing: 200mm.");
    std::fs::write(base.path().join("Tower A").join("bad.pdf"), b"not a valid pdf").unwrap();
    let mock = MockEmbedder::default();
    let r = retriever(base.path(), &mock);

    let index = r.registry().get_or_build("Tower A").await.unwrap().unwrap();
    assert_eq!(index.sources(), ["good.pdf"]);
}

#[tokio::test]
async fn rebuild_all_counts_projects_with_documents() {
    let base = tempfile::tempdir().unwrap();
    add_pdf(base.path(), "Tower A", "a.pdf", "Slab thickness is 250mm.");
    add_pdf(base.path(), "Tower B", "b.pdf", "Roof membrane overlaps are 100mm.");
    std::fs::create_dir(base.path().join("Empty")).unwrap();
    let mock = MockEmbedder::default();
    let r = retriever(base.path(), &mock);

    let count = r.rebuild_all(&["Tower A", "Tower B", "Empty", "Missing"]).await;
    assert_eq!(count, 2);
    assert_eq!(r.registry().cached_projects(), ["Tower A", "Tower B"]);
}
