use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::chunking::{heading_pattern, split_sections};
use super::corpus::strip_front_matter;
use super::*;
use crate::error::{CoreError, CoreResult};
use crate::semantic::{
    EmbeddingProvider, LocalHashEmbedder, embed_text_local, resolve_model_config,
};

struct FlakyProvider {
    model: EmbeddingModelConfig,
    fail_on_call: usize,
    calls: AtomicUsize,
}

impl EmbeddingProvider for FlakyProvider {
    fn model(&self) -> &EmbeddingModelConfig {
        &self.model
    }

    fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on_call {
            return Err(CoreError::Embedding("provider unreachable".to_string()));
        }
        Ok(embed_text_local(text, self.model.dimensions))
    }
}

fn product_corpus() -> Vec<CorpusDocument> {
    vec![
        CorpusDocument::new("intro.md", "PickLLM helps teams discover large language models."),
        CorpusDocument::new("billing.md", "Pricing is based on a monthly subscription."),
        CorpusDocument::new("team.md", "The project was started by two engineers in Oslo."),
        CorpusDocument::new("roadmap.md", "Upcoming work includes multilingual questionnaires."),
    ]
}

fn build_default(corpus: &[CorpusDocument]) -> DocumentIndex {
    build_index(corpus, &LocalHashEmbedder::default(), &ChunkingConfig::default()).unwrap()
}

#[test]
fn split_sections_keeps_headings_with_their_body() {
    let text = "Intro line\n\n## Data\nWe use LMArena.\n\n## Pricing\nFree tier.\n### Detail\nMore.";
    let sections = split_sections(text).unwrap();
    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0], "Intro line");
    assert!(sections[1].starts_with("## Data"));
    assert!(sections[1].ends_with("We use LMArena."));
    assert!(sections[2].contains("### Detail"));
}

#[test]
fn split_sections_without_headings_returns_whole_text() {
    assert_eq!(split_sections("  just text  ").unwrap(), vec!["just text".to_string()]);
    assert!(split_sections("   \n").unwrap().is_empty());
}

#[test]
fn long_sections_are_windowed_with_bounded_overlap() {
    let words = (0..120)
        .map(|index| format!("word{index:03}"))
        .collect::<Vec<String>>();
    let text = words.join(" ");
    let config = ChunkingConfig {
        target_chars: 100,
        overlap_chars: 24,
    };

    let chunks = chunk_document(&text, &config).unwrap();
    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 100));

    for pair in chunks.windows(2) {
        let previous = pair[0].split(' ').collect::<Vec<&str>>();
        let next = pair[1].split(' ').collect::<Vec<&str>>();
        let first_next = next[0];
        let position = previous
            .iter()
            .position(|word| *word == first_next)
            .expect("next chunk starts inside the previous one");
        let overlap = previous[position..].join(" ");
        assert!(overlap.chars().count() <= 24);
    }

    assert_eq!(chunks.last().unwrap().split(' ').last(), Some("word119"));
}

#[test]
fn invalid_chunking_is_rejected() {
    let corpus = product_corpus();
    let config = ChunkingConfig {
        target_chars: 50,
        overlap_chars: 50,
    };
    let err = build_index(&corpus, &LocalHashEmbedder::default(), &config).unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));
}

#[test]
fn build_records_model_and_insertion_order() {
    let index = build_default(&product_corpus());
    assert_eq!(index.len(), 4);
    assert_eq!(index.source_count(), 4);
    assert_eq!(index.model(), &resolve_model_config(""));
    assert_eq!(index.chunks()[1].chunk_id, "billing.md#0");
    assert!(index.chunks().iter().all(|chunk| chunk.embedding.len() == 384));
}

#[test]
fn provider_failure_publishes_nothing() {
    let provider = FlakyProvider {
        model: resolve_model_config("flaky"),
        fail_on_call: 2,
        calls: AtomicUsize::new(0),
    };
    let err = build_index(&product_corpus(), &provider, &ChunkingConfig::default()).unwrap_err();
    match err {
        CoreError::Embedding(reason) => assert!(reason.contains("team.md#0")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn cost_question_retrieves_the_pricing_chunk() {
    let index = build_default(&product_corpus());
    let result = query(&index, &LocalHashEmbedder::default(), "how much does it cost", 1).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(
        result.hits[0].chunk.text,
        "Pricing is based on a monthly subscription."
    );
}

#[test]
fn unrelated_question_still_returns_k_results() {
    let index = build_default(&product_corpus());
    let provider = LocalHashEmbedder::default();

    let result = query(&index, &provider, "What is the capital of France?", 3).unwrap();
    assert_eq!(result.len(), 3);
    assert!(
        result
            .hits
            .windows(2)
            .all(|pair| pair[0].similarity >= pair[1].similarity)
    );

    let capped = query(&index, &provider, "What is the capital of France?", 10).unwrap();
    assert_eq!(capped.len(), 4);
}

#[test]
fn equal_similarity_keeps_insertion_order() {
    let corpus = vec![
        CorpusDocument::new("b.md", "identical text"),
        CorpusDocument::new("a.md", "identical text"),
    ];
    let index = build_default(&corpus);
    let result = query(&index, &LocalHashEmbedder::default(), "identical text", 2).unwrap();
    assert_eq!(result.hits[0].chunk.source_id, "b.md");
    assert_eq!(result.hits[1].chunk.source_id, "a.md");
}

#[test]
fn zero_k_is_an_invalid_argument() {
    let index = build_default(&product_corpus());
    let err = query(&index, &LocalHashEmbedder::default(), "pricing", 0).unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));
}

#[test]
fn querying_with_another_model_is_rejected() {
    let index = build_default(&product_corpus());
    let other = LocalHashEmbedder::new(resolve_model_config("other-model"));
    let err = query(&index, &other, "pricing", 1).unwrap_err();
    assert!(matches!(err, CoreError::EmbeddingModelMismatch { .. }));
}

#[test]
fn persisted_index_round_trips_with_its_model() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("index.sqlite");
    let index = build_default(&product_corpus());

    save_index(&index, &db_path).unwrap();
    let restored = load_index(&db_path).unwrap();

    assert_eq!(restored.model(), index.model());
    assert_eq!(restored.chunks(), index.chunks());
    assert_eq!(restored.built_at(), index.built_at());

    let counts = store_counts(&db_path).unwrap();
    assert_eq!(counts.chunks, 4);
    assert_eq!(counts.embeddings, 4);
    assert_eq!(counts.model_id.as_deref(), Some(index.model().model_id.as_str()));

    let smaller = build_default(&product_corpus()[..1]);
    save_index(&smaller, &db_path).unwrap();
    assert_eq!(load_index(&db_path).unwrap().len(), 1);
}

#[test]
fn model_lock_records_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let lock_path = dir.path().join("lock.json");
    let model = resolve_model_config("");
    write_model_lock(&model, &lock_path).unwrap();

    let raw = fs::read_to_string(&lock_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["model_id"], model.model_id.as_str());
    assert_eq!(value["checksum"].as_str().map(str::len), Some(64));
}

#[test]
fn chat_prompt_orders_instruction_context_then_question() {
    let index = build_default(&product_corpus());
    let result = query(&index, &LocalHashEmbedder::default(), "how much does it cost", 2).unwrap();
    let prompt = build_chat_prompt("how much does it cost", &result, DEFAULT_CONCISENESS);

    let instruction = prompt.find("friendly assistant").unwrap();
    let context = prompt.find("source: billing.md").unwrap();
    let question = prompt.find("Question: how much does it cost").unwrap();
    assert!(instruction < context && context < question);
    assert!(prompt.contains("<<< end context 2 >>>"));
    assert!(prompt.contains("concise"));
}

#[test]
fn chat_prompt_for_empty_retrieval_says_so() {
    let index = build_default(&[]);
    let result = query(&index, &LocalHashEmbedder::default(), "anything", 2).unwrap();
    assert!(result.is_empty());

    let prompt = build_chat_prompt("anything", &result, DEFAULT_CONCISENESS);
    assert!(prompt.contains("Relevant context from PickLLM documentation:"));
    assert!(prompt.contains("no relevant documentation was found"));
    assert!(prompt.contains("don't have relevant information"));
}

#[test]
fn corpus_loader_reads_markdown_and_strips_front_matter() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    fs::write(
        dir.path().join("README.md"),
        "---\ntitle: PickLLM\n---\n# PickLLM\nFind a model.",
    )
    .unwrap();
    fs::write(dir.path().join("docs").join("faq.mdx"), "## FAQ\nAsk away.").unwrap();
    fs::write(dir.path().join("docs").join("notes.txt"), "ignored").unwrap();
    fs::write(dir.path().join(".git").join("HEAD.md"), "ignored").unwrap();

    let documents = load_corpus_dir(dir.path()).unwrap();
    let sources = documents
        .iter()
        .map(|document| document.source_id.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(sources, vec!["README.md", "docs/faq.mdx"]);
    assert_eq!(documents[0].text, "# PickLLM\nFind a model.");
}

#[test]
fn front_matter_without_terminator_is_kept() {
    assert_eq!(strip_front_matter("---\nno end"), "---\nno end");
    assert_eq!(strip_front_matter("plain"), "plain");
}

#[test]
fn whitespace_heavy_sections_still_respect_the_target_size() {
    let text = (0..10)
        .map(|index| format!("token{index}"))
        .collect::<Vec<String>>()
        .join("\n\n            ");
    let config = ChunkingConfig {
        target_chars: 100,
        overlap_chars: 20,
    };

    let chunks = chunk_document(&text, &config).unwrap();
    assert!(!chunks.is_empty());
    assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 100));
    assert!(chunks.concat().contains("token9"));
}

#[test]
fn heading_pattern_compiles_once() {
    let first = heading_pattern().unwrap();
    let second = heading_pattern().unwrap();
    assert!(std::ptr::eq(first, second));
    assert!(first.is_match("## Pricing"));
    assert!(!first.is_match("### Pricing"));
}

#[test]
fn corpus_root_may_itself_be_hidden() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join(".docs");
    fs::create_dir_all(root.join("guide")).unwrap();
    fs::write(root.join("guide").join("setup.md"), "Install it.").unwrap();
    fs::write(root.join(".draft.md"), "not yet").unwrap();

    let documents = load_corpus_dir(&root).unwrap();
    let sources = documents
        .iter()
        .map(|document| document.source_id.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(sources, vec!["guide/setup.md"]);
}
