mod common;

use std::sync::Arc;

use adslot::{
    CategoryConfig, CategoryRegistry, ClassificationResult, Classifier, ClassifierError,
    EmbeddingError,
};
use common::{init, FailingEmbedder, KeywordEmbedder, TEST_MODEL};

fn setup_test_classifier(embedder: KeywordEmbedder) -> Classifier<KeywordEmbedder> {
    Classifier::builder()
        .with_embedder(embedder)
        .build()
        .expect("Failed to create classifier")
}

#[tokio::test]
async fn test_end_to_end_classification() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let classifier = setup_test_classifier(KeywordEmbedder::medical());

    let result = classifier
        .classify("What is the best treatment for HER2 positive breast cancer?")
        .await?;

    assert_eq!(result.category.as_deref(), Some("breast_cancer"));
    assert_eq!(result.sponsor.as_deref(), Some("Pfizer"));
    assert_eq!(result.creative_id.as_deref(), Some("pfizer-breast"));
    assert!(!result.blocked);
    assert!(result.reason.is_none());
    assert!(result.confidence >= 0.6 && result.confidence <= 1.0);
    Ok(())
}

#[tokio::test]
async fn test_each_builtin_category() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier(KeywordEmbedder::medical());

    let cases = [
        ("Is FOLFIRINOX used for metastatic pancreatic cancer?", "pancreatic_cancer", "genentech-pancreatic"),
        ("Is a JAK inhibitor good for rheumatoid arthritis?", "arthritis", "lilly-arthritis"),
        ("When should adults get the shingles vaccine?", "vaccines_infectious_disease", "gsk-vaccines"),
    ];
    for (question, category, creative_id) in cases {
        let result = classifier.classify(question).await?;
        assert_eq!(result.category.as_deref(), Some(category), "question: {}", question);
        assert_eq!(result.creative_id.as_deref(), Some(creative_id));
    }
    Ok(())
}

#[tokio::test]
async fn test_below_threshold() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier(KeywordEmbedder::medical());

    let result = classifier.classify("How do I fix a flat bike tire?").await?;

    assert!(result.category.is_none());
    assert!(result.sponsor.is_none());
    assert!(result.creative_id.is_none());
    assert!(!result.blocked);
    assert_eq!(result.reason.as_deref(), Some("Below threshold"));
    assert!(result.confidence > 0.0 && result.confidence < 0.6);
    Ok(())
}

#[tokio::test]
async fn test_custom_threshold() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builder()
        .with_embedder(KeywordEmbedder::medical())
        .with_threshold(0.999)?
        .build()?;

    let result = classifier
        .classify("What is the best treatment for HER2 positive breast cancer?")
        .await?;

    assert_eq!(result.reason.as_deref(), Some("Below threshold"));
    assert!(result.confidence > 0.9 && result.confidence < 0.999);
    Ok(())
}

#[tokio::test]
async fn test_score_equal_to_threshold_shows_ad() -> Result<(), Box<dyn std::error::Error>> {
    // No keyword hits: question and seed both embed to [0, 0.25], cosine exactly 1
    let registry = CategoryRegistry::new().with_category(
        CategoryConfig::new("wellness", "Wellness", "Acme Health", "acme-wellness")
            .with_seed_phrases(vec!["general wellness"]),
    )?;
    let classifier = Classifier::builder()
        .with_embedder(KeywordEmbedder::new(TEST_MODEL, vec![vec!["alpha"]]))
        .with_registry(Arc::new(registry))
        .with_threshold(1.0)?
        .build()?;

    let result = classifier.classify("how do i stay healthy").await?;

    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.category.as_deref(), Some("wellness"));
    assert_eq!(result.sponsor.as_deref(), Some("Acme Health"));
    assert_eq!(result.creative_id.as_deref(), Some("acme-wellness"));
    assert!(result.reason.is_none());
    Ok(())
}

#[test]
fn test_decide_from_precomputed_scores() {
    let classifier = setup_test_classifier(KeywordEmbedder::medical());

    let at_threshold: Vec<(String, f32)> = vec![
        ("pancreatic_cancer".to_string(), 0.1),
        ("arthritis".to_string(), 0.6),
    ];
    let result = classifier.decide(&at_threshold);
    assert_eq!(result.category.as_deref(), Some("arthritis"));
    assert_eq!(result.sponsor.as_deref(), Some("Eli Lilly"));
    assert_eq!(result.creative_id.as_deref(), Some("lilly-arthritis"));
    assert_eq!(result.confidence, 0.6);

    let below: Vec<(String, f32)> = vec![("arthritis".to_string(), 0.599)];
    let result = classifier.decide(&below);
    assert!(result.category.is_none());
    assert_eq!(result.reason.as_deref(), Some("Below threshold"));

    let result = classifier.decide(&[]);
    assert_eq!(result.reason.as_deref(), Some("No category match"));
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn test_empty_registry() -> Result<(), Box<dyn std::error::Error>> {
    let embedder = KeywordEmbedder::medical();
    let classifier = Classifier::builder()
        .with_embedder(embedder.clone())
        .with_registry(Arc::new(CategoryRegistry::new()))
        .build()?;

    let result = classifier.classify("breast cancer").await?;

    assert_eq!(
        result,
        ClassificationResult {
            category: None,
            sponsor: None,
            creative_id: None,
            confidence: 0.0,
            blocked: false,
            reason: Some("No category match".to_string()),
        }
    );
    assert_eq!(embedder.embed_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_ties_go_to_first_category() -> Result<(), Box<dyn std::error::Error>> {
    let registry = CategoryRegistry::new()
        .with_category(
            CategoryConfig::new("first", "First", "Sponsor A", "a")
                .with_seed_phrases(vec!["breast cancer"]),
        )?
        .with_category(
            CategoryConfig::new("second", "Second", "Sponsor B", "b")
                .with_seed_phrases(vec!["breast cancer"]),
        )?;
    let classifier = Classifier::builder()
        .with_embedder(KeywordEmbedder::medical())
        .with_registry(Arc::new(registry))
        .build()?;

    let result = classifier.classify("breast cancer screening").await?;
    assert_eq!(result.category.as_deref(), Some("first"));
    assert_eq!(result.sponsor.as_deref(), Some("Sponsor A"));
    Ok(())
}

#[tokio::test]
async fn test_question_is_lowercased_but_seeds_are_not() -> Result<(), Box<dyn std::error::Error>> {
    let embedder = KeywordEmbedder::medical();
    let classifier = setup_test_classifier(embedder.clone());

    classifier.classify("HER2 Breast Cancer").await?;

    let seen = embedder.seen();
    assert_eq!(seen[0], "her2 breast cancer");
    assert_eq!(seen[1], "pancreatic cancer treatment");
    assert!(seen.iter().any(|t| t == "FOLFIRINOX for pancreatic cancer"));
    Ok(())
}

#[tokio::test]
async fn test_centroids_recomputed_on_every_call() -> Result<(), Box<dyn std::error::Error>> {
    let embedder = KeywordEmbedder::medical();
    let classifier = setup_test_classifier(embedder.clone());
    let seed_count: usize = classifier
        .registry()
        .categories()
        .iter()
        .map(|c| c.seed_phrases.len())
        .sum();

    classifier.classify("shingles vaccine").await?;
    assert_eq!(embedder.embed_calls(), 1 + seed_count);

    classifier.classify("shingles vaccine").await?;
    assert_eq!(embedder.embed_calls(), 2 * (1 + seed_count));
    assert_eq!(embedder.batch_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_scores_follow_registry_order() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier(KeywordEmbedder::medical());

    let scores = classifier.scores("RSV vaccination for older adults").await?;
    let keys: Vec<&str> = scores.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["pancreatic_cancer", "breast_cancer", "arthritis", "vaccines_infectious_disease"]);

    let best = scores
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .unwrap();
    assert_eq!(best.0, "vaccines_infectious_disease");
    Ok(())
}

#[tokio::test]
async fn test_service_error_propagates() {
    let classifier = Classifier::builder()
        .with_embedder(FailingEmbedder)
        .build()
        .unwrap();

    let result = classifier.classify("breast cancer").await;
    assert!(matches!(
        result,
        Err(ClassifierError::ServiceError(EmbeddingError::Status { status: 401, .. }))
    ));
}

#[tokio::test]
async fn test_seed_embedding_failure_fails_whole_classification() {
    let embedder = KeywordEmbedder::medical().failing_after(5);
    let classifier = setup_test_classifier(embedder.clone());

    let result = classifier.classify("breast cancer").await;
    assert!(matches!(result, Err(ClassifierError::ServiceError(_))));
    assert_eq!(embedder.embed_calls(), 6);
}

#[tokio::test]
async fn test_concurrent_classification() {
    let classifier = Arc::new(setup_test_classifier(KeywordEmbedder::medical()));
    let mut handles = vec![];

    for question in ["breast cancer", "shingles vaccine", "rheumatoid arthritis", "bike tire"] {
        let classifier = Arc::clone(&classifier);
        handles.push(tokio::spawn(async move {
            classifier.classify(question).await.map(|r| r.category)
        }));
    }

    let mut categories = vec![];
    for handle in handles {
        categories.push(handle.await.unwrap().unwrap());
    }
    assert_eq!(
        categories,
        vec![
            Some("breast_cancer".to_string()),
            Some("vaccines_infectious_disease".to_string()),
            Some("arthritis".to_string()),
            None,
        ]
    );
}

#[tokio::test]
async fn test_classifier_info() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builder()
        .with_embedder(KeywordEmbedder::medical())
        .with_centroid_cache("/tmp/adslot-info/ads-centroids.json")
        .build()?;

    let info = classifier.info();
    assert_eq!(info.model, common::TEST_MODEL);
    assert_eq!(info.num_categories, 4);
    assert_eq!(info.category_keys[0], "pancreatic_cancer");
    assert!((info.threshold - 0.6).abs() < f32::EPSILON);
    assert!(info.cache_path.unwrap().ends_with("ads-centroids.json"));
    Ok(())
}
