mod common;

use common::{words_of, BrokenModel, FourClassModel, KeywordModel};
use hate_detector::{
    Category, ClassifierError, Controller, ExplainerConfig, Outcome, State, TextExplainer, TextScoring, Trigger,
};
use rand::{rngs::StdRng, SeedableRng};

fn explainer() -> TextExplainer {
    TextExplainer::new(ExplainerConfig::default()).unwrap()
}

#[test]
fn test_love_community_is_normal() -> Result<(), Box<dyn std::error::Error>> {
    let model = KeywordModel::new(180);
    let mut controller = Controller::new(&model, explainer(), StdRng::seed_from_u64(0));

    let outcome = controller.handle(Trigger::Edited("I love this community".into()))?;
    let result = match outcome {
        Outcome::Displayed(result) => result,
        other => panic!("expected a result, got {:?}", other),
    };

    assert_eq!(result.category, Category::Normal);
    assert_eq!(result.emoji, "😊");
    assert_eq!(result.label, "Normal");
    assert!(result.confidence > 50.0);
    assert!(result.summary().starts_with("😊  Normal with Confidence: "));

    let allowed = ["love", "community", "this", "I"];
    assert!(!result.explanation.words.is_empty());
    for word in result.explanation.as_list() {
        assert!(allowed.contains(&word.word.as_str()), "unexpected word {}", word.word);
    }
    assert!(result.explanation.words[0].weight > 0.0);
    assert!(result.figure.title.ends_with("Normal"));
    assert!(matches!(controller.state(), State::Displaying(_)));
    Ok(())
}

#[test]
fn test_empty_input_keeps_previous_result() -> Result<(), Box<dyn std::error::Error>> {
    let model = KeywordModel::new(180);
    let mut controller = Controller::new(&model, explainer(), StdRng::seed_from_u64(1));

    assert!(matches!(controller.handle(Trigger::Edited(String::new()))?, Outcome::Ignored));
    assert!(matches!(controller.state(), State::Idle));
    assert_eq!(model.calls.get(), 0);

    controller.handle(Trigger::Edited("you stupid idiot".into()))?;
    let before = controller.current().map(|r| r.summary());

    assert!(matches!(controller.handle(Trigger::Edited("   ".into()))?, Outcome::Ignored));
    assert_eq!(controller.current().map(|r| r.summary()), before);
    assert_eq!(controller.current().unwrap().category, Category::Offensive);
    Ok(())
}

#[test]
fn test_long_input_matches_truncated_prefix() -> Result<(), Box<dyn std::error::Error>> {
    let model = KeywordModel::new(180);
    let mut words: Vec<String> = vec!["i".into(), "love".into(), "this".into()];
    words.extend(std::iter::repeat("the".to_string()).take(200));
    words.extend(["hate", "hate", "you", "stupid"].iter().map(|w| w.to_string()));
    let long_text = words.join(" ");
    let prefix = words[..180].join(" ");

    assert!(model.encoder().count_tokens(&long_text)? > 180);
    assert_eq!(model.predict(&long_text)?, model.predict(&prefix)?);
    assert_eq!(model.predict_distribution(&long_text)?, model.predict_distribution(&prefix)?);

    let mut controller = Controller::new(&model, explainer(), StdRng::seed_from_u64(2));
    match controller.handle(Trigger::Edited(long_text))? {
        Outcome::Displayed(result) => assert_eq!(result.category, Category::Normal),
        other => panic!("expected a result, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_both_triggers_share_the_handler() -> Result<(), Box<dyn std::error::Error>> {
    let model = KeywordModel::new(180);
    let mut controller = Controller::new(&model, explainer(), StdRng::seed_from_u64(3));

    // pressing predict before typing anything does nothing
    assert!(matches!(controller.handle(Trigger::Predict)?, Outcome::Ignored));

    let first = match controller.handle(Trigger::Edited("I hate you all".into()))? {
        Outcome::Displayed(result) => result,
        other => panic!("expected a result, got {:?}", other),
    };
    let second = match controller.handle(Trigger::Predict)? {
        Outcome::Displayed(result) => result,
        other => panic!("expected a result, got {:?}", other),
    };

    assert_eq!(controller.text(), "I hate you all");
    assert_eq!(first.category, Category::Hateful);
    assert_eq!(first.category, second.category);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.emoji, "😡");
    Ok(())
}

#[test]
fn test_seeded_controllers_agree() -> Result<(), Box<dyn std::error::Error>> {
    let model = KeywordModel::new(180);
    let text = "great people and a great day but stupid traffic";
    let mut a = Controller::new(&model, explainer(), StdRng::seed_from_u64(99));
    let mut b = Controller::new(&model, explainer(), StdRng::seed_from_u64(99));

    let (ra, rb) = match (a.handle(Trigger::Edited(text.into()))?, b.handle(Trigger::Edited(text.into()))?) {
        (Outcome::Displayed(ra), Outcome::Displayed(rb)) => (ra, rb),
        other => panic!("expected results, got {:?}", other),
    };
    assert_eq!(ra.explanation.words, rb.explanation.words);
    assert_eq!(ra.figure, rb.figure);

    let words = words_of(text);
    for word in ra.explanation.as_list() {
        assert!(words.contains(&word.word));
    }
    Ok(())
}

#[test]
fn test_unknown_label_is_fatal() {
    let model = FourClassModel;
    let mut controller = Controller::new(&model, explainer(), StdRng::seed_from_u64(4));
    let result = controller.handle(Trigger::Edited("anything at all".into()));
    assert!(matches!(result, Err(ClassifierError::UnknownLabel(3))));
}

#[test]
fn test_model_failure_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let model = BrokenModel;
    let mut controller = Controller::new(&model, explainer(), StdRng::seed_from_u64(5));
    match controller.handle(Trigger::Edited("hello".into()))? {
        Outcome::Failed(message) => assert!(message.contains("session crashed")),
        other => panic!("expected a failure, got {:?}", other),
    }
    assert!(matches!(controller.state(), State::Idle));
    Ok(())
}

#[test]
fn test_label_mapping_is_fixed() {
    let table: Vec<(&str, &str)> = (0..3)
        .map(|i| {
            let category = Category::from_index(i).unwrap();
            (category.emoji(), category.label())
        })
        .collect();
    assert_eq!(table, vec![("😡", "Hateful"), ("😊", "Normal"), ("😠", "Offensive")]);
    assert!(Category::from_index(3).is_err());
}
