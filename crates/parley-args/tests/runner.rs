mod common;

use common::Harness;
use parley_args::{
    generator_fn, ArgumentDefaults, ArgumentOptions, ArgumentRunner, ArgumentType, Command,
    ContentParser, Flag, Match, Outcome, Step, Unordered, Value,
};

async fn run(harness: &Harness, command: &Command, content: &str) -> Outcome {
    command
        .parse(&harness.handler, &harness.message(content), content)
        .await
        .expect("argument run failed")
}

async fn run_value(harness: &Harness, command: &Command, content: &str) -> Value {
    match run(harness, command, content).await {
        Outcome::Value(value) => value,
        Outcome::Flag(flag) => panic!("expected a value, got {:?}", flag),
    }
}

#[tokio::test]
async fn test_ordered_phrases() {
    let harness = Harness::new();
    let command = Command::new("add").args([
        ArgumentOptions::new("a").kind("integer"),
        ArgumentOptions::new("b").kind("integer"),
        ArgumentOptions::new("first").index(0),
    ]);
    let result = run_value(&harness, &command, "1 2").await;
    assert_eq!(result.get("a"), Some(&Value::Integer(1)));
    assert_eq!(result.get("b"), Some(&Value::Integer(2)));
    assert_eq!(result.get("first"), Some(&Value::from("1")));
}

#[tokio::test]
async fn test_unordered_never_reuses_an_index() {
    let harness = Harness::new();
    let command = Command::new("pair").args([
        ArgumentOptions::new("arg1")
            .kind(ArgumentType::choices(["b"]))
            .unordered(Unordered::All),
        ArgumentOptions::new("arg2")
            .kind(ArgumentType::choices(["a"]))
            .unordered(Unordered::All),
    ]);
    let result = run_value(&harness, &command, "A B").await;
    assert_eq!(result.get("arg1"), Some(&Value::from("b")));
    assert_eq!(result.get("arg2"), Some(&Value::from("a")));

    let command = Command::new("twice").args([
        ArgumentOptions::new("x").unordered(Unordered::All),
        ArgumentOptions::new("y").unordered(Unordered::All),
        ArgumentOptions::new("z").unordered(Unordered::All),
    ]);
    let result = run_value(&harness, &command, "one two").await;
    assert_eq!(result.get("x"), Some(&Value::from("one")));
    assert_eq!(result.get("y"), Some(&Value::from("two")));
    assert_eq!(result.get("z"), Some(&Value::Null));
}

#[tokio::test]
async fn test_unordered_offset_and_indices() {
    let harness = Harness::new();
    let command = Command::new("pick").args([
        ArgumentOptions::new("late")
            .kind("integer")
            .unordered(Unordered::From(1)),
        ArgumentOptions::new("only")
            .kind("integer")
            .unordered(Unordered::Indices(vec![2, 0])),
    ]);
    let result = run_value(&harness, &command, "1 2 3").await;
    assert_eq!(result.get("late"), Some(&Value::Integer(2)));
    assert_eq!(result.get("only"), Some(&Value::Integer(3)));
}

#[tokio::test]
async fn test_rest_text_and_content() {
    let harness = Harness::new();
    let command = Command::new("say").flag_words(["-f"]).args([
        ArgumentOptions::new("first"),
        ArgumentOptions::new("rest").matching(Match::Rest),
        ArgumentOptions::new("text").matching(Match::Text),
        ArgumentOptions::new("content").matching(Match::Content),
        ArgumentOptions::new("limited").matching(Match::Text).index(1).limit(1),
    ]);
    let result = run_value(&harness, &command, "one -f two  three ").await;
    assert_eq!(result.get("first"), Some(&Value::from("one")));
    assert_eq!(result.get("rest"), Some(&Value::from("two  three")));
    assert_eq!(result.get("text"), Some(&Value::from("one two  three")));
    assert_eq!(result.get("content"), Some(&Value::from("one -f two  three")));
    assert_eq!(result.get("limited"), Some(&Value::from("two")));
}

#[tokio::test]
async fn test_rest_content_from_cursor() {
    let harness = Harness::new();
    let command = Command::new("note").flag_words(["-f"]).args([
        ArgumentOptions::new("first"),
        ArgumentOptions::new("body").matching(Match::RestContent),
    ]);
    let result = run_value(&harness, &command, "one two -f \"three four\"").await;
    assert_eq!(result.get("body"), Some(&Value::from("two -f \"three four\"")));
}

#[tokio::test]
async fn test_separate_casts_each_phrase_and_advances() {
    let harness = Harness::new();
    let command = Command::new("sum").args([
        ArgumentOptions::new("numbers")
            .kind("integer")
            .matching(Match::Separate)
            .limit(3),
        ArgumentOptions::new("last"),
    ]);
    let result = run_value(&harness, &command, "1 x 3 end").await;
    assert_eq!(
        result.get("numbers"),
        Some(&Value::Array(vec![Value::Integer(1), Value::Null, Value::Integer(3)]))
    );
    assert_eq!(result.get("last"), Some(&Value::from("end")));
}

#[tokio::test]
async fn test_separate_aborts_on_short_circuit() {
    let mut harness = Harness::new();
    let command = Command::new("sum").args([ArgumentOptions::new("numbers")
        .kind("integer")
        .matching(Match::Separate)
        .otherwise("not a number")]);
    let result = run(&harness, &command, "1 x 3").await;
    assert_eq!(result, Flag::cancel().into());
    assert_eq!(harness.sent(), vec!["not a number"]);
}

#[tokio::test]
async fn test_flags() {
    let harness = Harness::new();
    let command = Command::new("ls").args([
        ArgumentOptions::new("all").matching(Match::Flag).flag(["-a", "--all"]),
        ArgumentOptions::new("verbose")
            .matching(Match::Flag)
            .flag(["-v"])
            .multiple_flags(true),
        ArgumentOptions::new("color")
            .matching(Match::Flag)
            .flag(["--no-color"])
            .default_value(true),
        ArgumentOptions::new("path"),
    ]);

    let result = run_value(&harness, &command, "-v docs -V --ALL").await;
    assert_eq!(result.get("all"), Some(&Value::Boolean(true)));
    assert_eq!(result.get("verbose"), Some(&Value::Integer(2)));
    assert_eq!(result.get("color"), Some(&Value::Boolean(true)));
    assert_eq!(result.get("path"), Some(&Value::from("docs")));

    let result = run_value(&harness, &command, "--no-color").await;
    assert_eq!(result.get("all"), Some(&Value::Boolean(false)));
    assert_eq!(result.get("verbose"), Some(&Value::Integer(0)));
    assert_eq!(result.get("color"), Some(&Value::Boolean(false)));
}

#[tokio::test]
async fn test_options() {
    let harness = Harness::new();
    let command = Command::new("send").args([
        ArgumentOptions::new("to").matching(Match::Option).flag(["--to"]),
        ArgumentOptions::new("tags")
            .matching(Match::Option)
            .flag(["--tag"])
            .multiple_flags(true)
            .limit(2),
        ArgumentOptions::new("count")
            .kind("integer")
            .matching(Match::Option)
            .flag(["--count"])
            .default_value(1i64),
        ArgumentOptions::new("body").matching(Match::Rest),
    ]);

    let content = "--tag a --to \"bob smith\" --tag b --tag c hi there";
    let result = run_value(&harness, &command, content).await;
    assert_eq!(result.get("to"), Some(&Value::from("bob smith")));
    assert_eq!(
        result.get("tags"),
        Some(&Value::Array(vec![Value::from("a"), Value::from("b")]))
    );
    assert_eq!(result.get("count"), Some(&Value::Integer(1)));
    assert_eq!(result.get("body"), Some(&Value::from("hi there")));
}

#[tokio::test]
async fn test_none_match_uses_default() {
    let harness = Harness::new();
    let command = Command::new("ping").args([ArgumentOptions::new("n")
        .matching(Match::None)
        .default_value("pong")]);
    let result = run_value(&harness, &command, "ignored").await;
    assert_eq!(result.get("n"), Some(&Value::from("pong")));
}

#[tokio::test]
async fn test_separator_mode() {
    let harness = Harness::new();
    let command = Command::new("poll").separator(Some(",")).args([
        ArgumentOptions::new("question"),
        ArgumentOptions::new("answers").matching(Match::Separate),
    ]);
    let result = run_value(&harness, &command, "lunch?, pizza, sushi rolls").await;
    assert_eq!(result.get("question"), Some(&Value::from("lunch?")));
    assert_eq!(
        result.get("answers"),
        Some(&Value::Array(vec![Value::from("pizza"), Value::from("sushi rolls")]))
    );
}

#[tokio::test]
async fn test_generator_sees_feedback_and_state() {
    let harness = Harness::new();
    let command = Command::new("repeat").generator(|| {
        let mut stage = 0;
        let mut times = 0;
        generator_fn(move |context, feedback| {
            stage += 1;
            match stage {
                1 => Step::Argument(ArgumentOptions::new("times").kind("integer")),
                2 => {
                    assert_eq!(context.state.phrase_index, 1);
                    times = feedback
                        .and_then(|outcome| outcome.into_value().as_i64())
                        .unwrap_or(0);
                    Step::Argument(ArgumentOptions::new("word"))
                }
                _ => {
                    let word = feedback.map(Outcome::into_value).unwrap_or_default();
                    Step::Done(Value::from(word.as_input().repeat(times as usize)).into())
                }
            }
        })
    });
    let result = run_value(&harness, &command, "3 ab").await;
    assert_eq!(result, Value::from("ababab"));
}

#[tokio::test]
async fn test_generator_fail_flag_is_fed_back() {
    let harness = Harness::new();
    let command = Command::new("check").generator(|| {
        let mut first = true;
        generator_fn(move |_, feedback| {
            if std::mem::take(&mut first) {
                return Step::Flag(Flag::fail("nope"));
            }
            Step::Done(feedback.unwrap_or_else(Outcome::null))
        })
    });
    assert_eq!(run(&harness, &command, "").await, Flag::fail("nope").into());
}

#[tokio::test]
async fn test_generator_cancel_short_circuits() {
    let harness = Harness::new();
    let command = Command::new("stop").generator(|| {
        generator_fn(|_, feedback| match feedback {
            None => Step::Flag(Flag::cancel()),
            Some(_) => panic!("the runner kept going after a cancel"),
        })
    });
    assert_eq!(run(&harness, &command, "a b").await, Flag::cancel().into());
}

#[tokio::test]
async fn test_continue_gets_exact_rest() {
    let harness = Harness::new();
    let defaults = ArgumentDefaults::new();
    let runner = ArgumentRunner::new(&harness.handler, &defaults);
    let content = "first   \"second part\"  tail ";
    let parsed = ContentParser::new().parse(content);

    let mut stage = 0;
    let mut generator = generator_fn(move |_, _| {
        stage += 1;
        if stage == 1 {
            Step::Argument(ArgumentOptions::new("first"))
        } else {
            Step::Flag(Flag::continue_to("other"))
        }
    });
    let result = runner
        .run(&harness.message(content), &parsed, &mut generator)
        .await
        .unwrap();
    assert_eq!(
        result,
        Flag::continue_with("other", false, Some("\"second part\"  tail ".to_string())).into()
    );
}

#[tokio::test]
async fn test_continue_from_caster_skips_consumed_phrase() {
    let harness = Harness::new();
    let command = Command::new("alias").args([
        ArgumentOptions::new("target").kind(ArgumentType::from_fn(|_, phrase| {
            if phrase == "help" {
                Flag::continue_to("help").into()
            } else {
                Value::from(phrase).into()
            }
        })),
        ArgumentOptions::new("never"),
    ]);
    let result = run(&harness, &command, "help me  please").await;
    assert_eq!(
        result,
        Flag::continue_with("help", false, Some("me  please".to_string())).into()
    );
}
