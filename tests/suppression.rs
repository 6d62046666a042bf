use actor_clippy::create_default_engine;

const ACTOR: &str = r#"
public class PausedActor : ReceiveActor, IWithStash
{
    public PausedActor()
    {
        Receive<string>(msg =>
        {
#pragma warning disable AK1008
            Stash.Stash();
            Stash.Stash();
#pragma warning restore AK1008
        });
        Receive<int>(n =>
        {
            Stash.Stash();
            Stash.Stash();
        });
    }
}
"#;

#[test]
fn pragma_suppresses_only_enclosed_rows() {
    let engine = create_default_engine();

    let diags = engine.lint_source(ACTOR).expect("linting should succeed");
    let rows: Vec<usize> = diags.iter().map(|d| d.span.start.row).collect();
    assert_eq!(rows, vec![15, 16], "got: {diags:#?}");
}

#[test]
fn pragma_by_lint_name_without_restore_runs_to_eof() {
    let engine = create_default_engine();
    let src = ACTOR
        .replace("#pragma warning disable AK1008", "#pragma warning disable duplicate_stash_call")
        .replace("#pragma warning restore AK1008\n", "\n");

    let diags = engine.lint_source(&src).expect("linting should succeed");
    assert!(diags.is_empty(), "got: {diags:#?}");
}

#[test]
fn unrelated_pragma_does_not_suppress() {
    let engine = create_default_engine();
    let src = ACTOR.replace("AK1008", "CS0618");

    let diags = engine.lint_source(&src).expect("linting should succeed");
    assert_eq!(diags.len(), 4, "got: {diags:#?}");
}

#[test]
fn restore_by_name_ends_disable_by_code() {
    let engine = create_default_engine();
    let src = r#"
public class ResumingActor : ReceiveActor, IWithStash
{
    public ResumingActor()
    {
        Receive<string>(msg =>
        {
#pragma warning disable AK1008
            Stash.Stash();
#pragma warning restore duplicate_stash_call
            Stash.Stash();
        });
    }
}
"#;

    let diags = engine.lint_source(src).expect("linting should succeed");
    let rows: Vec<usize> = diags.iter().map(|d| d.span.start.row).collect();
    assert_eq!(rows, vec![11], "got: {diags:#?}");
}
